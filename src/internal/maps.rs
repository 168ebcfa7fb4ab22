//! Hash map aliases; the `ahash` feature swaps in a faster hasher.

#[cfg(feature = "ahash")]
pub(crate) type FastMap<K, V> = std::collections::HashMap<K, V, ahash::RandomState>;
#[cfg(not(feature = "ahash"))]
pub(crate) type FastMap<K, V> = std::collections::HashMap<K, V>;

#[cfg(feature = "ahash")]
pub(crate) type FastSet<K> = std::collections::HashSet<K, ahash::RandomState>;
#[cfg(not(feature = "ahash"))]
pub(crate) type FastSet<K> = std::collections::HashSet<K>;

pub(crate) fn new_map<K, V>() -> FastMap<K, V> {
    FastMap::default()
}

pub(crate) fn new_set<K>() -> FastSet<K> {
    FastSet::default()
}
