//! Implements an append-only incremental merkle tree with a bounded window of historical roots.

/// Defines traits and types for storing tree records.
pub mod db;
/// Defines errors that might arise while operating on trees.
pub mod error;
/// Defines the ring of recent roots.
pub mod history;
/// Defines inclusion proofs and full recomputation of roots.
pub mod proof;
/// Defines the incremental tree itself.
pub mod tree;
/// Defines the roots of empty subtrees.
pub mod zeros;
