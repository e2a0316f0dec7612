#[cfg(not(feature = "std"))]
use alloc::collections::{BTreeMap, BTreeSet};
#[cfg(feature = "std")]
use std::collections::{HashMap, HashSet};

#[cfg(feature = "std")]
pub(crate) type IdMap<K, V> = HashMap<K, V>;
#[cfg(not(feature = "std"))]
pub(crate) type IdMap<K, V> = BTreeMap<K, V>;

#[cfg(feature = "std")]
pub(crate) type IdSet<K> = HashSet<K>;
#[cfg(not(feature = "std"))]
pub(crate) type IdSet<K> = BTreeSet<K>;

/// Bound for stable item identities (animation state, selection, rendered-row cache).
///
/// With `std` this is `Hash + Eq + Clone`; without it, `Ord + Clone`.
#[cfg(feature = "std")]
pub trait IdKey: core::hash::Hash + Eq + Clone {}
#[cfg(feature = "std")]
impl<K: core::hash::Hash + Eq + Clone> IdKey for K {}

#[cfg(not(feature = "std"))]
pub trait IdKey: Ord + Clone {}
#[cfg(not(feature = "std"))]
impl<K: Ord + Clone> IdKey for K {}
