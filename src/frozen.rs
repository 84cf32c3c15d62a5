//! `FrozenMap`: the crate's reference immutable keyed container.
//!
//! Entries are fixed at construction. Lookup goes through a hash index
//! (XxHash64, seed 0) sorted for binary search, with a linear probe over
//! equal hashes to survive collisions. Iteration follows construction order,
//! which makes suspended writes resumable by entry index.

use std::hash::{Hash, Hasher};
use std::sync::Arc;

use twox_hash::XxHash64;

use crate::map::ImmutableMap;

pub(crate) fn hash_key<K: Hash>(key: &K) -> u64 {
    let mut hasher = XxHash64::with_seed(0);
    key.hash(&mut hasher);
    hasher.finish()
}

/// An immutable associative container built once from a complete entry
/// sequence.
///
/// ```rust
/// use rescode::FrozenMap;
///
/// let map = FrozenMap::from_entries(vec![
///     ("a".to_owned(), 1),
///     ("b".to_owned(), 2),
///     ("a".to_owned(), 3), // last write wins
/// ]);
/// assert_eq!(map.len(), 2);
/// assert_eq!(map.get(&"a".to_owned()), Some(&3));
/// ```
#[derive(Debug, Clone)]
pub struct FrozenMap<K, V> {
    /// Entries in first-seen key order.
    entries: Vec<(K, V)>,
    /// `(key hash, entry position)`, sorted, for O(log n) lookup.
    index: Vec<(u64, u32)>,
}

impl<K: Eq + Hash, V> FrozenMap<K, V> {
    /// Builds a map from an entry sequence.
    ///
    /// Duplicate keys resolve last-write-wins, keeping the position of the
    /// first occurrence. This function is pure: the same sequence always
    /// produces an equivalent map.
    pub fn from_entries(entries: Vec<(K, V)>) -> Self {
        let mut deduped: Vec<(K, V)> = Vec::with_capacity(entries.len());
        let mut by_hash: std::collections::HashMap<u64, Vec<u32>> = std::collections::HashMap::new();

        for (key, value) in entries {
            let hash = hash_key(&key);
            let slots = by_hash.entry(hash).or_default();
            let existing = slots
                .iter()
                .copied()
                .find(|&pos| deduped[pos as usize].0 == key);
            match existing {
                Some(pos) => deduped[pos as usize].1 = value,
                None => {
                    slots.push(deduped.len() as u32);
                    deduped.push((key, value));
                }
            }
        }

        let mut index: Vec<(u64, u32)> = by_hash
            .into_iter()
            .flat_map(|(hash, slots)| slots.into_iter().map(move |pos| (hash, pos)))
            .collect();
        index.sort_unstable();

        Self {
            entries: deduped,
            index,
        }
    }

    /// An empty map.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: Vec::new(),
        }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the map has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Looks up a value by key.
    pub fn get(&self, key: &K) -> Option<&V> {
        let hash = hash_key(key);
        let start = self.index.partition_point(|&(h, _)| h < hash);
        self.index[start..]
            .iter()
            .take_while(|&&(h, _)| h == hash)
            .map(|&(_, pos)| &self.entries[pos as usize])
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// True when the key is present.
    pub fn contains_key(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Iterates entries in construction order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }
}

impl<K: Eq + Hash, V> Default for FrozenMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash, V> FromIterator<(K, V)> for FrozenMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_entries(iter.into_iter().collect())
    }
}

/// Element-wise equality, ignoring entry order.
impl<K: Eq + Hash, V: PartialEq> PartialEq for FrozenMap<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(k, v)| other.get(k).is_some_and(|ov| ov == v))
    }
}

impl<K, V> ImmutableMap for FrozenMap<K, V>
where
    K: Eq + Hash + 'static,
    V: 'static,
{
    type Key = K;
    type Value = V;

    fn len(&self) -> usize {
        FrozenMap::len(self)
    }

    fn entries(&self) -> Box<dyn Iterator<Item = (&K, &V)> + '_> {
        Box::new(self.iter())
    }
}

/// A shared frozen map is still frozen.
impl<K, V> ImmutableMap for Arc<FrozenMap<K, V>>
where
    K: Eq + Hash + 'static,
    V: 'static,
{
    type Key = K;
    type Value = V;

    fn len(&self) -> usize {
        FrozenMap::len(self)
    }

    fn entries(&self) -> Box<dyn Iterator<Item = (&K, &V)> + '_> {
        Box::new(self.iter())
    }
}
