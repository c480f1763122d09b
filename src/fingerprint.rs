//! A deterministic, fast, non-cryptographic hash over a textual form of
//! arbitrary inputs, used to key the process-wide cache.
//!
//! The bit-mixing here is deliberately *not* `rustc_hash`/`FxHash`, even
//! though the rest of the crate reaches for that hasher (see `cache`):
//! `FxHash`'s internal mix is free to change between versions, while this
//! fingerprint must stay stable for the life of a process and identical
//! across `QueryValue` instances constructed from the same query text.

use std::fmt;

/// A short, stable, base-36 identity for a query's textual form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Computes the fingerprint of a single piece of text.
    pub fn of(text: &str) -> Self {
        Self::of_parts(std::iter::once(text))
    }

    /// Computes the fingerprint of a sequence of parts, joined with a
    /// separator that cannot appear in any individual part, so that
    /// `("ab", "c")` and `("a", "bc")` never collide.
    pub fn of_parts<'a>(parts: impl IntoIterator<Item = &'a str>) -> Self {
        const SEPARATOR: char = '\u{1f}';
        let mut canonical = String::new();
        for (i, part) in parts.into_iter().enumerate() {
            if i > 0 {
                canonical.push(SEPARATOR);
            }
            canonical.push_str(part);
        }

        let mut h: u32 = 0;
        for c in canonical.chars() {
            h = (h << 5).wrapping_sub(h).wrapping_add(c as u32);
        }

        Self(to_base36(h))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Fingerprint {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn to_base36(mut value: u32) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut buf = Vec::with_capacity(7);
    while value > 0 {
        buf.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    buf.reverse();
    // SAFETY: every byte pushed comes from the ASCII `DIGITS` table.
    String::from_utf8(buf).unwrap()
}
