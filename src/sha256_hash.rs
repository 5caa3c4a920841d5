use sha2::{Digest, Sha256};

use crate::incremental::tree::MerkleHash;

/// A domain separator indicating that a node is a leaf
pub const LEAF_DOMAIN_SEPARATOR: [u8; 1] = [0u8];
/// A domain separator indicating that a node is internal
pub const INTERNAL_NODE_DOMAIN_SEPARATOR: [u8; 1] = [1u8];
/// A domain separator for the empty leaf constant
pub const EMPTY_LEAF_DOMAIN_SEPARATOR: [u8; 1] = [2u8];

/// A sha256 hasher with leaf, node, and empty-leaf domain separation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sha256Hasher;

impl Sha256Hasher {
    /// Create a new instance of the hasher
    pub fn new() -> Self {
        Sha256Hasher
    }

    /// sha256(0x02), the digest of an unfilled leaf slot
    pub const EMPTY_LEAF: [u8; 32] = [
        219, 193, 180, 201, 0, 255, 228, 141, 87, 91, 93, 165, 198, 56, 4, 1, 37, 246, 93, 176,
        254, 62, 36, 73, 75, 118, 234, 152, 100, 87, 217, 134,
    ];
}

impl MerkleHash for Sha256Hasher {
    type Output = [u8; 32];

    fn empty_leaf(&self) -> Self::Output {
        Self::EMPTY_LEAF
    }

    fn hash_leaf(&self, data: &[u8]) -> Self::Output {
        let mut hasher = Sha256::new_with_prefix(LEAF_DOMAIN_SEPARATOR);
        hasher.update(data);
        hasher.finalize().into()
    }

    fn hash_nodes(&self, left: &Self::Output, right: &Self::Output) -> Self::Output {
        let mut hasher = Sha256::new_with_prefix(INTERNAL_NODE_DOMAIN_SEPARATOR);
        hasher.update(left);
        hasher.update(right);
        hasher.finalize().into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_leaf_matches_domain_hash() {
        let computed: [u8; 32] = Sha256::digest(EMPTY_LEAF_DOMAIN_SEPARATOR).into();
        assert_eq!(computed, Sha256Hasher::EMPTY_LEAF);
        assert_eq!(
            hex::encode(Sha256Hasher::new().empty_leaf()),
            "dbc1b4c900ffe48d575b5da5c638040125f65db0fe3e24494b76ea986457d986"
        );
    }

    #[test]
    fn test_domains_are_separated() {
        let hasher = Sha256Hasher::new();
        let data = [7u8; 64];
        let (left, right) = data.split_at(32);
        let left: [u8; 32] = left.try_into().unwrap();
        let right: [u8; 32] = right.try_into().unwrap();
        assert_ne!(hasher.hash_leaf(&data), hasher.hash_nodes(&left, &right));
        assert_ne!(hasher.hash_leaf(&[]), hasher.empty_leaf());
    }
}
