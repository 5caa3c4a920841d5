use crate::maybestd::fmt;

/// The length of a tree identifier in bytes
pub const TREE_ID_LEN: usize = 32;

/// An opaque identifier naming one tree inside a registry
#[derive(Debug, PartialEq, PartialOrd, Eq, Ord, Copy, Clone, Hash, Default)]
#[cfg_attr(
    feature = "borsh",
    derive(borsh::BorshSerialize, borsh::BorshDeserialize)
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TreeId(pub [u8; TREE_ID_LEN]);

impl TreeId {
    /// Wraps the given bytes as a tree identifier
    pub const fn new(bytes: [u8; TREE_ID_LEN]) -> Self {
        Self(bytes)
    }

    /// Returns the raw bytes of the identifier
    pub fn as_bytes(&self) -> &[u8; TREE_ID_LEN] {
        &self.0
    }
}

impl From<[u8; TREE_ID_LEN]> for TreeId {
    fn from(bytes: [u8; TREE_ID_LEN]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for TreeId {
    fn as_ref(&self) -> &[u8] {
        self.0.as_ref()
    }
}

impl fmt::Display for TreeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0.iter() {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_lowercase_hex() {
        let mut bytes = [0u8; TREE_ID_LEN];
        bytes[0] = 0xab;
        bytes[31] = 0x01;
        let id = TreeId::new(bytes);
        assert_eq!(id.to_string(), hex::encode(bytes));
    }

    #[test]
    fn test_borsh_roundtrip() {
        let id = TreeId::new([9; TREE_ID_LEN]);
        let encoded = borsh::to_vec(&id).unwrap();
        assert_eq!(encoded.len(), TREE_ID_LEN);
        let decoded: TreeId = borsh::from_slice(&encoded).unwrap();
        assert_eq!(id, decoded);
    }
}
