use crate::TreeId;

/// An error that occurred while creating, updating, or querying an incremental merkle tree.
///
/// Every operation which returns one of these errors leaves the affected tree untouched.
#[derive(Debug, PartialEq, Eq, Clone, Copy, thiserror::Error)]
pub enum TreeError {
    /// The requested depth is zero or exceeds [`MAX_LEVELS`](crate::MAX_LEVELS)
    #[error("invalid tree depth {0}: must be between 1 and 32")]
    InvalidLevels(u8),
    /// The root history must hold between 1 and `u32::MAX` roots
    #[error("invalid root history size {0}: must be between 1 and 4294967295")]
    InvalidHistorySize(usize),
    /// The zero values handed to a tree were computed for a shallower tree
    #[error("zero values of depth {zeros} cannot serve a tree of depth {levels}")]
    ZeroValuesTooShallow {
        /// The depth the zero values were computed for
        zeros: u8,
        /// The depth of the tree
        levels: u8,
    },
    /// A stored or decoded tree record breaks one of the tree's invariants
    #[error("malformed tree record: {0}")]
    MalformedRecord(&'static str),
    /// A tree with this identifier has already been created
    #[error("tree {0} already exists")]
    AlreadyExists(TreeId),
    /// No tree with this identifier has been created
    #[error("tree {0} not found")]
    NotFound(TreeId),
    /// The tree already holds `capacity` leaves, or the requested batch would overflow it
    #[error("tree is full: capacity is {capacity} leaves")]
    TreeFull {
        /// The maximum number of leaves the tree can hold
        capacity: u64,
    },
    /// A proof was requested for a leaf that is not present
    #[error("leaf index {index} out of range for {len} leaves")]
    LeafIndexOutOfRange {
        /// The requested leaf
        index: u64,
        /// The number of leaves available
        len: u64,
    },
    /// More leaves were supplied than a tree of the given depth can hold
    #[error("{leaves} leaves do not fit in a tree of capacity {capacity}")]
    TooManyLeaves {
        /// The number of leaves supplied
        leaves: u64,
        /// The maximum number of leaves the tree can hold
        capacity: u64,
    },
}

/// The broad category of a [`TreeError`].
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum ErrorKind {
    /// The caller supplied an argument which can never succeed
    Validation,
    /// The operation conflicts with existing state
    Conflict,
    /// The addressed tree does not exist
    NotFound,
    /// The tree has no room left
    Capacity,
    /// A stored record is inconsistent and cannot be operated on
    Integrity,
}

impl TreeError {
    /// Classifies the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            TreeError::InvalidLevels(_)
            | TreeError::InvalidHistorySize(_)
            | TreeError::ZeroValuesTooShallow { .. }
            | TreeError::LeafIndexOutOfRange { .. } => ErrorKind::Validation,
            TreeError::AlreadyExists(_) => ErrorKind::Conflict,
            TreeError::NotFound(_) => ErrorKind::NotFound,
            TreeError::TreeFull { .. } | TreeError::TooManyLeaves { .. } => ErrorKind::Capacity,
            TreeError::MalformedRecord(_) => ErrorKind::Integrity,
        }
    }
}

/// Turns a failed record check into the error borsh reports for undecodable input
#[cfg(feature = "borsh")]
pub(crate) fn invalid_data(err: TreeError) -> borsh::io::Error {
    use crate::maybestd::string::ToString;
    borsh::io::Error::new(borsh::io::ErrorKind::InvalidData, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        let id = TreeId::new([1; 32]);
        assert_eq!(TreeError::InvalidLevels(0).kind(), ErrorKind::Validation);
        assert_eq!(TreeError::AlreadyExists(id).kind(), ErrorKind::Conflict);
        assert_eq!(TreeError::NotFound(id).kind(), ErrorKind::NotFound);
        assert_eq!(
            TreeError::TreeFull { capacity: 2 }.kind(),
            ErrorKind::Capacity
        );
        assert_eq!(
            TreeError::ZeroValuesTooShallow { zeros: 3, levels: 4 }.kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            TreeError::MalformedRecord("bad").kind(),
            ErrorKind::Integrity
        );
    }

    #[test]
    fn test_messages_name_the_tree() {
        let id = TreeId::new([0xff; 32]);
        let message = TreeError::NotFound(id).to_string();
        assert!(message.contains(&"ff".repeat(32)));
        assert_eq!(
            TreeError::InvalidLevels(33).to_string(),
            "invalid tree depth 33: must be between 1 and 32"
        );
        assert_eq!(
            TreeError::InvalidHistorySize(0).to_string(),
            "invalid root history size 0: must be between 1 and 4294967295"
        );
    }
}
