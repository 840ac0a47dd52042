//! Hash collections with a fast, deterministic hasher.
//!
//! Iteration order over these maps is stable for a given sequence of
//! insertions, which keeps layout passes and logs reproducible.

pub use std::collections::{BTreeMap, BTreeSet, VecDeque, hash_map};

pub type HashMap<K, V> = rustc_hash::FxHashMap<K, V>;
pub type HashSet<T> = rustc_hash::FxHashSet<T>;
