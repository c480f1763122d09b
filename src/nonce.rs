//! A process-local, monotonically increasing suffix generator.
//!
//! The wrapped-text alias (`inputQuery-<rand>`) only needs to be unique
//! per process, not unpredictable, so a plain atomic counter is used
//! instead of pulling in `rand` for a non-cryptographic, non-adversarial
//! uniqueness requirement.

use std::sync::atomic::{AtomicU32, Ordering};

static NEXT: AtomicU32 = AtomicU32::new(1);

/// Returns a short, process-unique suffix suitable for disambiguating the
/// generated alias of a raw-text query.
pub(crate) fn next_suffix() -> u32 {
    NEXT.fetch_add(1, Ordering::Relaxed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suffixes_are_distinct() {
        let a = next_suffix();
        let b = next_suffix();
        assert_ne!(a, b);
    }
}
