//! Hash-based collections used across the engine.
//!
//! With the `std-hash` feature the std map types and `DefaultHasher` are
//! used; otherwise `hashbrown` and `ahash`.

use std::hash::{BuildHasherDefault, Hash, Hasher};

#[cfg(feature = "std-hash")]
type FastHasher = std::collections::hash_map::DefaultHasher;
#[cfg(not(feature = "std-hash"))]
type FastHasher = ahash::AHasher;

/// Hasher builder shared by every map in this crate.
pub type BuildFastHasher = BuildHasherDefault<FastHasher>;

#[cfg(feature = "std-hash")]
pub type HashSet<T> = std::collections::HashSet<T, BuildFastHasher>;
#[cfg(not(feature = "std-hash"))]
pub type HashSet<T> = hashbrown::HashSet<T, BuildFastHasher>;

/// Insertion-ordered map used for element props. Iteration order is the
/// order props were declared in, which keeps host mutations deterministic.
pub type OrderedMap<K, V> = indexmap::IndexMap<K, V, BuildFastHasher>;

/// Hashes one value with the active hasher. Stable within a process only.
pub fn hash_one<T: Hash + ?Sized>(value: &T) -> u64 {
    let mut hasher = FastHasher::default();
    value.hash(&mut hasher);
    hasher.finish()
}
