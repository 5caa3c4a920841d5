#[cfg(feature = "std")]
use std::collections::HashMap;

#[cfg(not(feature = "std"))]
use alloc::collections::BTreeMap;

use super::tree::IncrementalMerkleTree;
use crate::TreeId;

/// Reads tree records out of a keyed store
pub trait TreeReader<H> {
    /// Returns the record stored under `id`, if any
    fn get(&self, id: &TreeId) -> Option<&IncrementalMerkleTree<H>>;

    /// Checks whether a record is stored under `id`
    fn contains(&self, id: &TreeId) -> bool {
        self.get(id).is_some()
    }
}

/// Writes tree records into a keyed store.
///
/// A `put` replaces the whole record at once, so a reader never observes a partially updated tree.
pub trait TreeWriter<H> {
    /// Stores `record` under `id`, replacing any previous record
    fn put(&mut self, id: TreeId, record: IncrementalMerkleTree<H>);
}

/// A keyed store of tree records which the registry layers on top of
pub trait TreeStore<H>: TreeReader<H> + TreeWriter<H> + Default {}

/// An in-memory [`TreeStore`]
#[cfg(feature = "std")]
#[derive(Debug, Clone)]
pub struct MemStore<H>(HashMap<TreeId, IncrementalMerkleTree<H>>);

/// An in-memory [`TreeStore`]
#[cfg(not(feature = "std"))]
#[derive(Debug, Clone)]
pub struct MemStore<H>(BTreeMap<TreeId, IncrementalMerkleTree<H>>);

impl<H> Default for MemStore<H> {
    fn default() -> Self {
        Self(Default::default())
    }
}

impl<H> MemStore<H> {
    /// The number of stored trees
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the store holds no trees
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<H> TreeReader<H> for MemStore<H> {
    fn get(&self, id: &TreeId) -> Option<&IncrementalMerkleTree<H>> {
        self.0.get(id)
    }
}

impl<H> TreeWriter<H> for MemStore<H> {
    fn put(&mut self, id: TreeId, record: IncrementalMerkleTree<H>) {
        self.0.insert(id, record);
    }
}

impl<H> TreeStore<H> for MemStore<H> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Sha256Hasher, ZeroValues};

    #[test]
    fn test_put_replaces_record() {
        let hasher = Sha256Hasher::new();
        let zeros = ZeroValues::compute(4, &hasher);
        let id = TreeId::new([3; 32]);
        let mut store = MemStore::default();
        assert!(store.is_empty());
        assert!(!store.contains(&id));

        let mut tree = IncrementalMerkleTree::new(4, &zeros, 8).unwrap();
        store.put(id, tree.clone());
        assert!(store.contains(&id));

        tree.insert([1; 32], &hasher, &zeros).unwrap();
        store.put(id, tree.clone());
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(&id), Some(&tree));
    }
}
