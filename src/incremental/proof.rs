use super::error::TreeError;
use super::tree::{validate_levels, MerkleHash};
use super::zeros::ZeroValues;
use crate::maybestd::vec::Vec;

/// A proof that a leaf sits at a particular index of a tree with a particular root.
///
/// The siblings run from the leaf level up to the level just below the root, so a proof against
/// a tree of depth `levels` has exactly `levels` siblings. Bit `i` of the leaf index tells whether
/// the path is a right child (`1`) or a left child (`0`) at height `i`.
#[derive(Debug, PartialEq, Clone)]
#[cfg_attr(
    feature = "borsh",
    derive(borsh::BorshSerialize, borsh::BorshDeserialize)
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InclusionProof<H> {
    /// The index of the proven leaf
    pub leaf_index: u64,
    /// The sibling hashes, leaf level first
    pub siblings: Vec<H>,
}

impl<H: Clone + PartialEq> InclusionProof<H> {
    /// Builds a proof for the leaf at `leaf_index` from the full list of leaves of a tree of
    /// depth `levels`. Slots past the end of `leaves` are treated as empty.
    pub fn from_leaves<M>(
        leaves: &[H],
        leaf_index: u64,
        levels: u8,
        hasher: &M,
    ) -> Result<Self, TreeError>
    where
        M: MerkleHash<Output = H>,
    {
        check_fits(leaves.len(), levels)?;
        if leaf_index >= leaves.len() as u64 {
            return Err(TreeError::LeafIndexOutOfRange {
                index: leaf_index,
                len: leaves.len() as u64,
            });
        }
        let zeros = ZeroValues::compute(levels, hasher);
        let mut siblings = Vec::with_capacity(levels as usize);
        let mut nodes = leaves.to_vec();
        let mut index = leaf_index as usize;
        for height in 0..levels as usize {
            let sibling = nodes
                .get(index ^ 1)
                .unwrap_or_else(|| zeros.at(height))
                .clone();
            siblings.push(sibling);
            nodes = parent_layer(&nodes, zeros.at(height), hasher);
            index >>= 1;
        }
        Ok(Self {
            leaf_index,
            siblings,
        })
    }

    /// The depth of the tree this proof was built against
    pub fn levels(&self) -> usize {
        self.siblings.len()
    }

    /// Folds the leaf together with the siblings and returns the resulting root
    pub fn compute_root<M>(&self, leaf: &H, hasher: &M) -> H
    where
        M: MerkleHash<Output = H>,
    {
        let mut index = self.leaf_index;
        let mut current = leaf.clone();
        for sibling in self.siblings.iter() {
            current = if index & 1 == 0 {
                hasher.hash_nodes(&current, sibling)
            } else {
                hasher.hash_nodes(sibling, &current)
            };
            index >>= 1;
        }
        current
    }

    /// Checks that `leaf` sits at this proof's index in the tree with the given root
    pub fn verify<M>(&self, root: &H, leaf: &H, hasher: &M) -> bool
    where
        M: MerkleHash<Output = H>,
    {
        // An index with bits above the proof's depth cannot name a leaf of that tree
        if self.levels() < 64 && self.leaf_index >> self.levels() != 0 {
            return false;
        }
        &self.compute_root(leaf, hasher) == root
    }
}

/// Computes the root of a tree of depth `levels` holding `leaves` by hashing every level in full.
///
/// This costs `O(2^levels)` in the worst case and exists to cross-check the incremental tree and
/// to build proofs; it agrees with [`IncrementalMerkleTree`](crate::IncrementalMerkleTree) after
/// the same leaves are inserted in the same order.
pub fn compute_root_from_leaves<M: MerkleHash>(
    leaves: &[M::Output],
    levels: u8,
    hasher: &M,
) -> Result<M::Output, TreeError> {
    check_fits(leaves.len(), levels)?;
    let zeros = ZeroValues::compute(levels, hasher);
    let mut nodes = leaves.to_vec();
    for height in 0..levels as usize {
        nodes = parent_layer(&nodes, zeros.at(height), hasher);
    }
    match nodes.pop() {
        Some(root) => Ok(root),
        None => Ok(zeros.empty_root().clone()),
    }
}

fn check_fits(num_leaves: usize, levels: u8) -> Result<(), TreeError> {
    validate_levels(levels)?;
    let capacity = 1u64 << levels;
    if num_leaves as u64 > capacity {
        return Err(TreeError::TooManyLeaves {
            leaves: num_leaves as u64,
            capacity,
        });
    }
    Ok(())
}

/// Hashes each pair of nodes into their parent, padding an odd trailing node with `zero`
fn parent_layer<M: MerkleHash>(
    nodes: &[M::Output],
    zero: &M::Output,
    hasher: &M,
) -> Vec<M::Output> {
    nodes
        .chunks(2)
        .map(|pair| match pair {
            [left, right] => hasher.hash_nodes(left, right),
            [left] => hasher.hash_nodes(left, zero),
            _ => unreachable!("chunks(2) yields one or two nodes"),
        })
        .collect()
}
