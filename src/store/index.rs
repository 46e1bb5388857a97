//! Secondary indices keyed by a kind or role tag.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

/// Map from subset tag to the ids currently in that subset
#[derive(Debug, Clone)]
pub struct SubsetIndex<K, Id> {
    subsets: HashMap<K, HashSet<Id>>,
}

impl<K, Id> Default for SubsetIndex<K, Id> {
    fn default() -> Self {
        Self {
            subsets: HashMap::new(),
        }
    }
}

impl<K, Id> SubsetIndex<K, Id>
where
    K: Copy + Eq + Hash,
    Id: Copy + Eq + Hash,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `id` to every listed subset
    pub fn insert(&mut self, id: Id, keys: &[K]) {
        for key in keys {
            self.subsets.entry(*key).or_default().insert(id);
        }
    }

    /// Remove `id` from every listed subset
    pub fn remove(&mut self, id: Id, keys: &[K]) {
        for key in keys {
            if let Some(ids) = self.subsets.get_mut(key) {
                ids.remove(&id);
            }
        }
    }

    pub fn contains(&self, key: K, id: &Id) -> bool {
        self.subsets.get(&key).is_some_and(|ids| ids.contains(id))
    }

    pub fn len(&self, key: K) -> usize {
        self.subsets.get(&key).map_or(0, HashSet::len)
    }

    pub fn is_empty(&self, key: K) -> bool {
        self.len(key) == 0
    }

    /// Snapshot of the ids in one subset
    pub fn members(&self, key: K) -> Vec<Id> {
        self.subsets
            .get(&key)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn iter(&self, key: K) -> impl Iterator<Item = &Id> + '_ {
        self.subsets.get(&key).into_iter().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Tag {
        A,
        B,
    }

    #[test]
    fn test_insert_and_remove_across_subsets() {
        let mut index: SubsetIndex<Tag, u32> = SubsetIndex::new();
        index.insert(1, &[Tag::A, Tag::B]);
        index.insert(2, &[Tag::A]);

        assert_eq!(index.len(Tag::A), 2);
        assert!(index.contains(Tag::B, &1));
        assert!(!index.contains(Tag::B, &2));

        index.remove(1, &[Tag::A, Tag::B]);
        assert_eq!(index.members(Tag::A), vec![2]);
        assert!(index.is_empty(Tag::B));
    }

    #[test]
    fn test_unknown_subset_is_empty() {
        let index: SubsetIndex<Tag, u32> = SubsetIndex::new();
        assert!(index.is_empty(Tag::A));
        assert_eq!(index.iter(Tag::A).count(), 0);
    }
}
