use tiny_keccak::{Hasher, Keccak};

use crate::incremental::tree::MerkleHash;
use crate::sha256_hash::{
    EMPTY_LEAF_DOMAIN_SEPARATOR, INTERNAL_NODE_DOMAIN_SEPARATOR, LEAF_DOMAIN_SEPARATOR,
};

fn keccak(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    for part in parts {
        hasher.update(part);
    }
    let mut output = [0u8; 32];
    hasher.finalize(&mut output);
    output
}

/// A keccak256 hasher using the same domain separators as [`Sha256Hasher`](crate::Sha256Hasher)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Keccak256Hasher;

impl Keccak256Hasher {
    /// Create a new instance of the hasher
    pub fn new() -> Self {
        Keccak256Hasher
    }
}

impl MerkleHash for Keccak256Hasher {
    type Output = [u8; 32];

    fn empty_leaf(&self) -> Self::Output {
        keccak(&[&EMPTY_LEAF_DOMAIN_SEPARATOR])
    }

    fn hash_leaf(&self, data: &[u8]) -> Self::Output {
        keccak(&[&LEAF_DOMAIN_SEPARATOR, data])
    }

    fn hash_nodes(&self, left: &Self::Output, right: &Self::Output) -> Self::Output {
        keccak(&[&INTERNAL_NODE_DOMAIN_SEPARATOR, left, right])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keccak_of_empty_input() {
        assert_eq!(
            hex::encode(keccak(&[])),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn test_differs_from_sha256() {
        let keccak = Keccak256Hasher::new();
        let sha = crate::Sha256Hasher::new();
        assert_ne!(keccak.empty_leaf(), sha.empty_leaf());
        assert_ne!(
            keccak.hash_nodes(&[1; 32], &[2; 32]),
            sha.hash_nodes(&[1; 32], &[2; 32])
        );
    }
}
