use super::error::TreeError;
use crate::maybestd::vec::Vec;

/// A fixed-capacity ring of the most recently produced roots of a tree.
///
/// Writing always advances the cursor by one slot, wrapping around, so the oldest root is evicted
/// by being overwritten. Slots which have never been written hold the digest's `Default` value,
/// which is never reported as a known root.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "borsh", derive(borsh::BorshSerialize))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(
        try_from = "RootHistoryParts<H>",
        bound(deserialize = "H: serde::Deserialize<'de>")
    )
)]
pub struct RootHistory<H> {
    roots: Vec<H>,
    current_index: u32,
}

/// The fields of a [`RootHistory`] as decoded, before they are checked
#[cfg(any(feature = "serde", feature = "borsh"))]
#[cfg_attr(feature = "borsh", derive(borsh::BorshDeserialize))]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
struct RootHistoryParts<H> {
    roots: Vec<H>,
    current_index: u32,
}

#[cfg(any(feature = "serde", feature = "borsh"))]
impl<H> TryFrom<RootHistoryParts<H>> for RootHistory<H> {
    type Error = TreeError;

    fn try_from(parts: RootHistoryParts<H>) -> Result<Self, Self::Error> {
        Self::from_parts(parts.roots, parts.current_index)
    }
}

#[cfg(feature = "borsh")]
impl<H: borsh::BorshDeserialize> borsh::BorshDeserialize for RootHistory<H> {
    fn deserialize_reader<R: borsh::io::Read>(reader: &mut R) -> borsh::io::Result<Self> {
        let parts = <RootHistoryParts<H> as borsh::BorshDeserialize>::deserialize_reader(reader)?;
        Self::try_from(parts).map_err(super::error::invalid_data)
    }
}

impl<H> RootHistory<H> {
    /// Reassembles a history from its raw slots and cursor.
    ///
    /// The ring must hold between 1 and `u32::MAX` slots and the cursor must name one of them.
    pub fn from_parts(roots: Vec<H>, current_index: u32) -> Result<Self, TreeError> {
        if roots.is_empty() || roots.len() > u32::MAX as usize {
            return Err(TreeError::InvalidHistorySize(roots.len()));
        }
        if current_index as usize >= roots.len() {
            return Err(TreeError::MalformedRecord(
                "root history cursor lies outside the ring",
            ));
        }
        Ok(Self {
            roots,
            current_index,
        })
    }

    /// The number of roots the ring can hold
    pub fn capacity(&self) -> usize {
        self.roots.len()
    }

    /// The slot holding the most recent root
    pub fn current_index(&self) -> u32 {
        self.current_index
    }

    /// Returns the raw ring slots in storage order
    pub fn as_slice(&self) -> &[H] {
        &self.roots
    }
}

impl<H> RootHistory<H>
where
    H: Clone + Default + PartialEq,
{
    /// Creates a history with room for `capacity` roots, seeded with `initial_root`.
    pub fn new(capacity: usize, initial_root: H) -> Result<Self, TreeError> {
        if capacity == 0 || capacity > u32::MAX as usize {
            return Err(TreeError::InvalidHistorySize(capacity));
        }
        let mut roots = Vec::with_capacity(capacity);
        roots.push(initial_root);
        roots.resize(capacity, H::default());
        Ok(Self {
            roots,
            current_index: 0,
        })
    }

    /// Records a new root, evicting the oldest one if the ring is full
    pub fn push(&mut self, root: H) {
        let next = (self.current_index as usize + 1) % self.roots.len();
        self.roots[next] = root;
        self.current_index = next as u32;
    }

    /// Returns the most recently recorded root
    pub fn last(&self) -> &H {
        &self.roots[self.current_index as usize]
    }

    /// Checks whether `root` is still held in the ring
    pub fn contains(&self, root: &H) -> bool {
        if *root == H::default() {
            return false;
        }
        self.iter_recent().any(|known| known == root)
    }

    /// Iterates over the populated slots, newest root first
    pub fn iter_recent(&self) -> impl Iterator<Item = &H> + '_ {
        let len = self.roots.len();
        let newest = self.current_index as usize;
        let sentinel = H::default();
        (0..len)
            .map(move |offset| &self.roots[(newest + len - offset) % len])
            .filter(move |root| **root != sentinel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn digest(byte: u8) -> [u8; 32] {
        let mut out = [0u8; 32];
        out[31] = byte;
        out
    }

    #[test]
    fn test_rejects_empty_ring() {
        assert_eq!(
            RootHistory::new(0, digest(1)),
            Err(TreeError::InvalidHistorySize(0))
        );
    }

    #[test]
    fn test_push_and_wrap() {
        let mut history = RootHistory::new(3, digest(1)).unwrap();
        assert_eq!(history.last(), &digest(1));
        history.push(digest(2));
        history.push(digest(3));
        assert_eq!(history.current_index(), 2);
        assert!(history.contains(&digest(1)));

        // The fourth root overwrites the first
        history.push(digest(4));
        assert_eq!(history.current_index(), 0);
        assert_eq!(history.last(), &digest(4));
        assert!(!history.contains(&digest(1)));
        assert!(history.contains(&digest(2)));
        assert!(history.contains(&digest(3)));
    }

    #[test]
    fn test_sentinel_is_never_known() {
        let history = RootHistory::new(8, digest(1)).unwrap();
        assert!(!history.contains(&[0u8; 32]));
        assert!(!history.contains(&digest(2)));
    }

    #[test]
    fn test_iter_recent_is_newest_first() {
        let mut history = RootHistory::new(4, digest(1)).unwrap();
        let recent: Vec<_> = history.iter_recent().cloned().collect();
        assert_eq!(recent, vec![digest(1)]);

        for byte in 2..=6 {
            history.push(digest(byte));
        }
        let recent: Vec<_> = history.iter_recent().cloned().collect();
        assert_eq!(recent, vec![digest(6), digest(5), digest(4), digest(3)]);
    }

    #[test]
    fn test_capacity_one() {
        let mut history = RootHistory::new(1, digest(1)).unwrap();
        history.push(digest(2));
        assert_eq!(history.current_index(), 0);
        assert_eq!(history.last(), &digest(2));
        assert!(!history.contains(&digest(1)));
    }

    #[test]
    fn test_postcard_roundtrip() {
        let mut history = RootHistory::new(4, digest(1)).unwrap();
        history.push(digest(2));
        let encoded = postcard::to_allocvec(&history).unwrap();
        let decoded: RootHistory<[u8; 32]> = postcard::from_bytes(&encoded).unwrap();
        assert_eq!(decoded, history);
    }

    #[test]
    fn test_from_parts_checks_ring() {
        let empty: Vec<[u8; 32]> = Vec::new();
        assert_eq!(
            RootHistory::from_parts(empty, 0),
            Err(TreeError::InvalidHistorySize(0))
        );
        assert_eq!(
            RootHistory::from_parts(vec![digest(1), digest(2)], 2),
            Err(TreeError::MalformedRecord(
                "root history cursor lies outside the ring"
            ))
        );
        let history = RootHistory::from_parts(vec![digest(1), digest(2)], 1).unwrap();
        assert_eq!(history.last(), &digest(2));
    }

    #[test]
    fn test_decoding_rejects_malformed_ring() {
        let json = r#"{"roots":[],"current_index":0}"#;
        assert!(serde_json::from_str::<RootHistory<[u8; 32]>>(json).is_err());

        let history = RootHistory::new(2, digest(1)).unwrap();
        let mut value = serde_json::to_value(&history).unwrap();
        value["current_index"] = serde_json::json!(5);
        assert!(serde_json::from_value::<RootHistory<[u8; 32]>>(value).is_err());

        // A borsh ring of length zero followed by a zero cursor
        let encoded = borsh::to_vec(&(Vec::<[u8; 32]>::new(), 0u32)).unwrap();
        assert!(borsh::from_slice::<RootHistory<[u8; 32]>>(&encoded).is_err());

        let encoded = borsh::to_vec(&history).unwrap();
        let decoded: RootHistory<[u8; 32]> = borsh::from_slice(&encoded).unwrap();
        assert_eq!(decoded, history);
    }
}
