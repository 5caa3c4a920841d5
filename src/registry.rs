use std::ops::Range;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, trace, warn};

use crate::incremental::db::{MemStore, TreeReader, TreeStore, TreeWriter};
use crate::incremental::error::TreeError;
use crate::incremental::proof::InclusionProof;
use crate::incremental::tree::{validate_levels, IncrementalMerkleTree, MerkleHash};
use crate::incremental::zeros::{ZeroValueCache, ZeroValues};
use crate::TreeId;

/// The number of roots each tree remembers unless configured otherwise
pub const DEFAULT_ROOT_HISTORY_SIZE: usize = 30;

/// Settings fixed for the lifetime of a [`TreeRegistry`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RegistryConfig {
    /// The number of recent roots each tree keeps. Changing this for an existing deployment
    /// changes the layout of every stored record.
    pub root_history_size: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            root_history_size: DEFAULT_ROOT_HISTORY_SIZE,
        }
    }
}

impl RegistryConfig {
    /// Returns a copy of the config with the given root history size
    pub fn with_root_history_size(mut self, root_history_size: usize) -> Self {
        self.root_history_size = root_history_size;
        self
    }

    /// Checks that the config describes a usable registry
    pub fn validate(&self) -> Result<(), TreeError> {
        if self.root_history_size == 0 || self.root_history_size > u32::MAX as usize {
            return Err(TreeError::InvalidHistorySize(self.root_history_size));
        }
        Ok(())
    }
}

/// A registry backed by the in-memory store
pub type MemRegistry<M> = TreeRegistry<MemStore<<M as MerkleHash>::Output>, M>;

/// Manages a set of incremental merkle trees keyed by [`TreeId`].
///
/// All state lives in the injected store `S`. Insertions into the same tree are serialized by a
/// per-tree lock, and each insertion commits the updated record with a single write, so readers
/// always see a consistent tree. Trees with different identifiers never contend for a tree lock.
pub struct TreeRegistry<S, M: MerkleHash> {
    store: RwLock<S>,
    tree_locks: DashMap<TreeId, Arc<Mutex<()>>>,
    zeros: ZeroValueCache<M::Output>,
    hasher: M,
    config: RegistryConfig,
}

impl<S, M> Default for TreeRegistry<S, M>
where
    S: TreeStore<M::Output>,
    M: MerkleHash + Default,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<S, M> TreeRegistry<S, M>
where
    S: TreeStore<M::Output>,
    M: MerkleHash + Default,
{
    /// Constructs an empty registry with a default hasher and config
    pub fn new() -> Self {
        Self::with_hasher(Default::default())
    }
}

impl<S, M> TreeRegistry<S, M>
where
    S: TreeStore<M::Output>,
    M: MerkleHash,
{
    /// Constructs an empty registry with the given hasher and the default config
    pub fn with_hasher(hasher: M) -> Self {
        Self::from_parts(Default::default(), hasher, RegistryConfig::default())
    }

    /// Constructs an empty registry with the given hasher and config
    pub fn with_config(hasher: M, config: RegistryConfig) -> Result<Self, TreeError> {
        Self::with_store(Default::default(), hasher, config)
    }

    /// Constructs a registry on top of an existing store
    pub fn with_store(store: S, hasher: M, config: RegistryConfig) -> Result<Self, TreeError> {
        config.validate()?;
        Ok(Self::from_parts(store, hasher, config))
    }

    fn from_parts(store: S, hasher: M, config: RegistryConfig) -> Self {
        Self {
            store: RwLock::new(store),
            tree_locks: DashMap::new(),
            zeros: ZeroValueCache::new(),
            hasher,
            config,
        }
    }

    /// Creates an empty tree of depth `levels` under `tree_id`
    pub fn create_tree(&self, tree_id: TreeId, levels: u8) -> Result<(), TreeError> {
        let mut store = self.store.write();
        if store.contains(&tree_id) {
            return Err(TreeError::AlreadyExists(tree_id));
        }
        validate_levels(levels)?;
        let zeros = self.zeros.get(levels, &self.hasher);
        let tree = IncrementalMerkleTree::new(levels, &zeros, self.config.root_history_size)?;
        store.put(tree_id, tree);
        info!(%tree_id, levels, "created tree");
        Ok(())
    }

    /// Appends a leaf to the tree and returns the index it was assigned
    pub fn insert_leaf(&self, tree_id: &TreeId, leaf: M::Output) -> Result<u64, TreeError> {
        let result = self.update(tree_id, |tree, hasher, zeros| tree.insert(leaf, hasher, zeros));
        match &result {
            Ok(leaf_index) => debug!(%tree_id, leaf_index, "inserted leaf"),
            Err(TreeError::TreeFull { capacity }) => {
                warn!(%tree_id, capacity, "rejected leaf for full tree")
            }
            Err(_) => {}
        }
        result
    }

    /// Hashes `data` into a leaf with the registry's hasher, appends it, and returns its index
    pub fn insert_data(&self, tree_id: &TreeId, data: &[u8]) -> Result<u64, TreeError> {
        let leaf = self.hasher.hash_leaf(data);
        self.insert_leaf(tree_id, leaf)
    }

    /// Appends a batch of leaves, all or nothing, and returns the indices they were assigned
    pub fn insert_leaves(
        &self,
        tree_id: &TreeId,
        leaves: &[M::Output],
    ) -> Result<Range<u64>, TreeError> {
        let result = self.update(tree_id, |tree, hasher, zeros| {
            tree.insert_batch(leaves, hasher, zeros)
        });
        match &result {
            Ok(range) => debug!(%tree_id, start = range.start, end = range.end, "inserted leaves"),
            Err(TreeError::TreeFull { capacity }) => {
                warn!(%tree_id, capacity, batch = leaves.len(), "rejected batch for full tree")
            }
            Err(_) => {}
        }
        result
    }

    /// Returns the most recent root of the tree
    pub fn get_last_root(&self, tree_id: &TreeId) -> Result<M::Output, TreeError> {
        self.read(tree_id, |tree| tree.last_root().clone())
    }

    /// Checks whether `root` is still held in the tree's root history
    pub fn is_known_root(&self, tree_id: &TreeId, root: &M::Output) -> Result<bool, TreeError> {
        self.read(tree_id, |tree| tree.is_known_root(root))
    }

    /// Checks that `proof` shows `leaf` to be an inserted leaf of the tree, against any root still
    /// held in its history
    pub fn verify_membership(
        &self,
        tree_id: &TreeId,
        leaf: &M::Output,
        proof: &InclusionProof<M::Output>,
    ) -> Result<bool, TreeError> {
        self.read(tree_id, |tree| {
            if proof.levels() != tree.levels() as usize
                || proof.leaf_index >= tree.next_leaf_index()
            {
                return false;
            }
            let root = proof.compute_root(leaf, &self.hasher);
            tree.is_known_root(&root)
        })
    }

    /// Returns a copy of the tree's current record
    pub fn snapshot(
        &self,
        tree_id: &TreeId,
    ) -> Result<IncrementalMerkleTree<M::Output>, TreeError> {
        self.read(tree_id, |tree| tree.clone())
    }

    /// Checks whether a tree exists under `tree_id`
    pub fn contains(&self, tree_id: &TreeId) -> bool {
        self.store.read().contains(tree_id)
    }

    /// Returns the zero values used by trees of the given depth
    pub fn zero_values(&self, levels: u8) -> Result<Arc<ZeroValues<M::Output>>, TreeError> {
        validate_levels(levels)?;
        Ok(self.zeros.get(levels, &self.hasher))
    }

    /// Returns the hasher used by every tree in the registry
    pub fn hasher(&self) -> &M {
        &self.hasher
    }

    /// Returns the registry's config
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    fn read<T>(
        &self,
        tree_id: &TreeId,
        f: impl FnOnce(&IncrementalMerkleTree<M::Output>) -> T,
    ) -> Result<T, TreeError> {
        let store = self.store.read();
        let tree = store.get(tree_id).ok_or(TreeError::NotFound(*tree_id))?;
        self.check_record(tree_id, tree)?;
        trace!(%tree_id, "read tree");
        Ok(f(tree))
    }

    fn update<T>(
        &self,
        tree_id: &TreeId,
        op: impl FnOnce(
            &mut IncrementalMerkleTree<M::Output>,
            &M,
            &ZeroValues<M::Output>,
        ) -> Result<T, TreeError>,
    ) -> Result<T, TreeError> {
        let lock = self.tree_lock(tree_id)?;
        let _guard = lock.lock();

        // Operate on a copy, so a failed operation never reaches the store
        let mut tree = self.snapshot(tree_id)?;
        let zeros = self.zeros.get(tree.levels(), &self.hasher);
        let output = op(&mut tree, &self.hasher, &*zeros)?;
        self.store.write().put(*tree_id, tree);
        Ok(output)
    }

    fn check_record(
        &self,
        tree_id: &TreeId,
        tree: &IncrementalMerkleTree<M::Output>,
    ) -> Result<(), TreeError> {
        let stored = tree.roots().capacity();
        if stored != self.config.root_history_size {
            warn!(
                %tree_id,
                stored,
                configured = self.config.root_history_size,
                "stored tree has a different root history size"
            );
            return Err(TreeError::MalformedRecord(
                "root history size does not match the registry config",
            ));
        }
        Ok(())
    }

    fn tree_lock(&self, tree_id: &TreeId) -> Result<Arc<Mutex<()>>, TreeError> {
        if let Some(lock) = self.tree_locks.get(tree_id) {
            return Ok(lock.value().clone());
        }
        // Only allocate locks for trees which exist. Trees are never deleted, so the check
        // cannot go stale.
        if !self.contains(tree_id) {
            return Err(TreeError::NotFound(*tree_id));
        }
        Ok(self.tree_locks.entry(*tree_id).or_default().value().clone())
    }
}
