//! This module provides deterministic `HashMap` and `HashSet` variants. The hashing data
//! structures in the standard library are randomly seeded, which would make iteration order, and
//! anything derived from it, differ between runs with the same random seed.
//!
//! `HashMap<K, V, S>` does not have a `new` method for a non-default hasher. Use
//! `HashMap::default()` (or `HashSet::default()`) instead.

pub use rustc_hash::{FxHashMap as HashMap, FxHashSet as HashSet};
