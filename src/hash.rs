//! Hasher alias for the process-wide query cache, grounded on the
//! teacher's own `src/hash.rs` (`FxHasher`/`FxIndexMap` aliases): the cache
//! key here is already a short, pre-hashed [`crate::fingerprint::Fingerprint`]
//! string, so a fast non-cryptographic hasher over it is all that is needed.

pub(crate) type FxBuildHasher = std::hash::BuildHasherDefault<rustc_hash::FxHasher>;
pub(crate) type FxHashMap<K, V> = std::collections::HashMap<K, V, FxBuildHasher>;
