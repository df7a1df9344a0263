//! Keyed-map de-duplication.

use std::collections::HashMap;
use std::hash::Hash;

/// Collapse `items` to one record per key.
///
/// Mirrors insertion into an ordered keyed map: a later record under an
/// existing key replaces the earlier record's value but keeps the slot the
/// key was first inserted at. The output is therefore ordered by first
/// occurrence of each key and holds the last value seen for it.
pub fn dedup_last_wins<T, K, F>(items: impl IntoIterator<Item = T>, key: F) -> Vec<T>
where
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    let items = items.into_iter();
    let mut slots: HashMap<K, usize> = HashMap::with_capacity(items.size_hint().0);
    let mut result: Vec<T> = Vec::with_capacity(items.size_hint().0);

    for item in items {
        let k = key(&item);
        match slots.get(&k) {
            Some(&slot) => result[slot] = item,
            None => {
                slots.insert(k, result.len());
                result.push(item);
            }
        }
    }

    result
}
