use super::error::TreeError;
use super::history::RootHistory;
use super::zeros::ZeroValues;
use crate::maybestd::{fmt::Debug, hash::Hash, ops::Range, vec::Vec};

/// The deepest tree which may be created. A full tree of this depth holds 2^32 leaves.
pub const MAX_LEVELS: u8 = 32;

/// A trait for hashing data into a merkle tree
pub trait MerkleHash {
    /// The output of this hasher.
    type Output: Debug + PartialEq + Eq + Clone + Default + Hash;

    /// The digest standing in for a leaf slot which has not been filled yet. This *must* be domain
    /// separated from both leaf and node hashes, so that an empty slot can never be confused with
    /// a leaf that was actually inserted.
    fn empty_leaf(&self) -> Self::Output;
    /// Hashes data as a "leaf" of the tree. This operation *should* be domain separated.
    fn hash_leaf(&self, data: &[u8]) -> Self::Output;
    /// Hashes two digests into one. This operation *should* be domain separated.
    fn hash_nodes(&self, l: &Self::Output, r: &Self::Output) -> Self::Output;
}

/// Checks that a tree depth lies within `1..=MAX_LEVELS`
pub(crate) fn validate_levels(levels: u8) -> Result<(), TreeError> {
    if levels == 0 || levels > MAX_LEVELS {
        return Err(TreeError::InvalidLevels(levels));
    }
    Ok(())
}

/// An append-only merkle tree which keeps only the nodes needed to extend it, plus a window of
/// its recent roots.
///
/// For every level the tree caches the most recent left-hand node (the "filled subtree") until
/// its right-hand sibling arrives. Inserting a leaf therefore costs exactly one hash per level,
/// however many leaves came before it.
///
/// The tree stores no leaves, and no hasher: callers pass the hasher and the matching
/// [`ZeroValues`] to every mutating call.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "borsh", derive(borsh::BorshSerialize))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(
        try_from = "TreeParts<H>",
        bound(deserialize = "H: serde::Deserialize<'de>")
    )
)]
pub struct IncrementalMerkleTree<H> {
    levels: u8,
    next_leaf_index: u64,
    filled_subtrees: Vec<H>,
    roots: RootHistory<H>,
}

/// The fields of an [`IncrementalMerkleTree`] as decoded, before they are checked
#[cfg(any(feature = "serde", feature = "borsh"))]
#[cfg_attr(feature = "borsh", derive(borsh::BorshDeserialize))]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(bound(deserialize = "H: serde::Deserialize<'de>"))
)]
struct TreeParts<H> {
    levels: u8,
    next_leaf_index: u64,
    filled_subtrees: Vec<H>,
    roots: RootHistory<H>,
}

#[cfg(any(feature = "serde", feature = "borsh"))]
impl<H> TryFrom<TreeParts<H>> for IncrementalMerkleTree<H> {
    type Error = TreeError;

    fn try_from(parts: TreeParts<H>) -> Result<Self, Self::Error> {
        Self::from_parts(
            parts.levels,
            parts.next_leaf_index,
            parts.filled_subtrees,
            parts.roots,
        )
    }
}

#[cfg(feature = "borsh")]
impl<H: borsh::BorshDeserialize> borsh::BorshDeserialize for IncrementalMerkleTree<H> {
    fn deserialize_reader<R: borsh::io::Read>(reader: &mut R) -> borsh::io::Result<Self> {
        let parts = <TreeParts<H> as borsh::BorshDeserialize>::deserialize_reader(reader)?;
        Self::try_from(parts).map_err(super::error::invalid_data)
    }
}

impl<H> IncrementalMerkleTree<H>
where
    H: Clone + Default + PartialEq,
{
    /// Creates an empty tree of the given depth whose history holds `root_history_size` roots.
    pub fn new(
        levels: u8,
        zeros: &ZeroValues<H>,
        root_history_size: usize,
    ) -> Result<Self, TreeError> {
        validate_levels(levels)?;
        check_zeros(levels, zeros)?;
        let filled_subtrees = zeros.as_slice()[..levels as usize].to_vec();
        let roots = RootHistory::new(root_history_size, zeros.at(levels as usize).clone())?;
        Ok(Self {
            levels,
            next_leaf_index: 0,
            filled_subtrees,
            roots,
        })
    }

    /// Appends a leaf to the tree and returns its index.
    ///
    /// At each level, the parity of the running index decides the side: an even index is a left
    /// child, cached in `filled_subtrees` and paired with an empty right sibling; an odd index is
    /// a right child, paired with the cached left sibling.
    pub fn insert<M>(
        &mut self,
        leaf: H,
        hasher: &M,
        zeros: &ZeroValues<H>,
    ) -> Result<u64, TreeError>
    where
        M: MerkleHash<Output = H>,
    {
        check_zeros(self.levels, zeros)?;
        if self.is_full() {
            return Err(TreeError::TreeFull {
                capacity: self.capacity(),
            });
        }
        let leaf_index = self.next_leaf_index;
        let mut index = leaf_index;
        let mut current = leaf;
        for (height, filled) in self.filled_subtrees.iter_mut().enumerate() {
            current = if index & 1 == 0 {
                let parent = hasher.hash_nodes(&current, zeros.at(height));
                *filled = current;
                parent
            } else {
                hasher.hash_nodes(filled, &current)
            };
            index >>= 1;
        }
        self.roots.push(current);
        self.next_leaf_index += 1;
        Ok(leaf_index)
    }

    /// Hashes `data` into a leaf with [`MerkleHash::hash_leaf`], appends it, and returns its index
    pub fn insert_data<M>(
        &mut self,
        data: &[u8],
        hasher: &M,
        zeros: &ZeroValues<H>,
    ) -> Result<u64, TreeError>
    where
        M: MerkleHash<Output = H>,
    {
        self.insert(hasher.hash_leaf(data), hasher, zeros)
    }

    /// Appends a batch of leaves and returns the range of indices they were assigned.
    ///
    /// Either every leaf is inserted or, if the batch does not fit, none is. The effect is the
    /// same as inserting the leaves one at a time, including one new root per leaf.
    pub fn insert_batch<M>(
        &mut self,
        leaves: &[H],
        hasher: &M,
        zeros: &ZeroValues<H>,
    ) -> Result<Range<u64>, TreeError>
    where
        M: MerkleHash<Output = H>,
    {
        if leaves.len() as u64 > self.remaining_capacity() {
            return Err(TreeError::TreeFull {
                capacity: self.capacity(),
            });
        }
        let start = self.next_leaf_index;
        for leaf in leaves {
            self.insert(leaf.clone(), hasher, zeros)?;
        }
        Ok(start..self.next_leaf_index)
    }

    /// Returns the most recent root
    pub fn last_root(&self) -> &H {
        self.roots.last()
    }

    /// Checks whether `root` is one of the roots still held in the history
    pub fn is_known_root(&self, root: &H) -> bool {
        self.roots.contains(root)
    }
}

impl<H> IncrementalMerkleTree<H> {
    /// Reassembles a tree from a previously stored record.
    ///
    /// Fails unless the depth is valid, there is one filled subtree per level, the leaf count fits
    /// the capacity, and the history cursor sits where that many insertions would leave it.
    pub fn from_parts(
        levels: u8,
        next_leaf_index: u64,
        filled_subtrees: Vec<H>,
        roots: RootHistory<H>,
    ) -> Result<Self, TreeError> {
        validate_levels(levels)?;
        if filled_subtrees.len() != levels as usize {
            return Err(TreeError::MalformedRecord(
                "filled subtree count does not match the tree depth",
            ));
        }
        if next_leaf_index > 1u64 << levels {
            return Err(TreeError::MalformedRecord(
                "leaf count exceeds the tree capacity",
            ));
        }
        if next_leaf_index % roots.capacity() as u64 != roots.current_index() as u64 {
            return Err(TreeError::MalformedRecord(
                "root history cursor does not match the leaf count",
            ));
        }
        Ok(Self {
            levels,
            next_leaf_index,
            filled_subtrees,
            roots,
        })
    }

    /// The depth of the tree
    pub fn levels(&self) -> u8 {
        self.levels
    }

    /// The number of leaves inserted so far, which is also the index the next leaf will get
    pub fn next_leaf_index(&self) -> u64 {
        self.next_leaf_index
    }

    /// The maximum number of leaves the tree can hold
    pub fn capacity(&self) -> u64 {
        1u64 << self.levels
    }

    /// The number of leaves which can still be inserted
    pub fn remaining_capacity(&self) -> u64 {
        self.capacity() - self.next_leaf_index
    }

    /// Whether the tree has no room for another leaf
    pub fn is_full(&self) -> bool {
        self.next_leaf_index >= self.capacity()
    }

    /// The cached left-hand node at each level, leaf level first
    pub fn filled_subtrees(&self) -> &[H] {
        &self.filled_subtrees
    }

    /// The window of recent roots
    pub fn roots(&self) -> &RootHistory<H> {
        &self.roots
    }
}

fn check_zeros<H: Clone>(levels: u8, zeros: &ZeroValues<H>) -> Result<(), TreeError> {
    if zeros.levels() < levels {
        return Err(TreeError::ZeroValuesTooShallow {
            zeros: zeros.levels(),
            levels,
        });
    }
    Ok(())
}
