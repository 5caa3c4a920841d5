#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]
//! This crate implements an append-only incremental merkle tree with a bounded history of roots,
//! along with a registry which manages many such trees keyed by a [`TreeId`].
//!
//! Leaves are inserted left to right. Each insertion touches exactly one node per level: the tree
//! only remembers the most recent left-hand node at each level (its "filled subtrees") and
//! substitutes a precomputed [zero value](ZeroValues) for every subtree which is still empty.
//!
//! ```
//! # #[cfg(feature = "std")] {
//! use imt_rs::{MemRegistry, Sha256Hasher, TreeId};
//!
//! let registry = MemRegistry::<Sha256Hasher>::new();
//! let tree = TreeId::new([7; 32]);
//! registry.create_tree(tree, 20).unwrap();
//! let index = registry.insert_leaf(&tree, [1; 32]).unwrap();
//! assert_eq!(index, 0);
//!
//! let root = registry.get_last_root(&tree).unwrap();
//! assert!(registry.is_known_root(&tree, &root).unwrap());
//! # }
//! ```

#[cfg(not(feature = "std"))]
extern crate alloc;

mod maybestd {
    #[cfg(not(feature = "std"))]
    pub use alloc::{string, sync, vec};
    #[cfg(not(feature = "std"))]
    pub use core::{fmt, hash, ops};

    #[cfg(feature = "std")]
    pub use std::{fmt, hash, ops, string, sync, vec};
}

/// The incremental merkle tree and its supporting machinery.
pub mod incremental;
#[cfg(feature = "keccak")]
mod keccak_hash;
#[cfg(feature = "std")]
mod registry;
mod sha256_hash;
mod tree_id;

pub use incremental::db::{MemStore, TreeReader, TreeStore, TreeWriter};
pub use incremental::error::{ErrorKind, TreeError};
pub use incremental::history::RootHistory;
pub use incremental::proof::{compute_root_from_leaves, InclusionProof};
pub use incremental::tree::{IncrementalMerkleTree, MerkleHash, MAX_LEVELS};
#[cfg(feature = "std")]
pub use incremental::zeros::ZeroValueCache;
pub use incremental::zeros::ZeroValues;
#[cfg(feature = "keccak")]
pub use keccak_hash::Keccak256Hasher;
#[cfg(feature = "std")]
pub use registry::{MemRegistry, RegistryConfig, TreeRegistry, DEFAULT_ROOT_HISTORY_SIZE};
pub use sha256_hash::Sha256Hasher;
pub use tree_id::{TreeId, TREE_ID_LEN};
