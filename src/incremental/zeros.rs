use super::tree::MerkleHash;
use crate::maybestd::vec::Vec;
#[cfg(feature = "std")]
use crate::maybestd::sync::Arc;

/// The roots of entirely empty subtrees, indexed by height.
///
/// Entry `0` is the hasher's [empty leaf](MerkleHash::empty_leaf), and entry `i` is the hash of
/// two copies of entry `i - 1`. A table computed for `levels` therefore has `levels + 1` entries,
/// the last of which is the root of an empty tree of that depth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZeroValues<H>(Vec<H>);

impl<H: Clone> ZeroValues<H> {
    /// Computes the zero values for a tree of the given depth
    pub fn compute<M: MerkleHash<Output = H>>(levels: u8, hasher: &M) -> Self {
        let mut zeros = Vec::with_capacity(levels as usize + 1);
        let mut current = hasher.empty_leaf();
        for _ in 0..levels {
            let next = hasher.hash_nodes(&current, &current);
            zeros.push(current);
            current = next;
        }
        zeros.push(current);
        Self(zeros)
    }

    /// The depth this table was computed for
    pub fn levels(&self) -> u8 {
        (self.0.len() - 1) as u8
    }

    /// Returns the root of an empty subtree of the given height. Panics if `height > levels`.
    pub fn at(&self, height: usize) -> &H {
        &self.0[height]
    }

    /// Returns the root of an empty tree of the full depth
    pub fn empty_root(&self) -> &H {
        // A table always holds at least the empty leaf
        &self.0[self.0.len() - 1]
    }

    /// Returns all entries, leaf level first
    pub fn as_slice(&self) -> &[H] {
        &self.0
    }
}

/// Memoizes [`ZeroValues`] tables by depth.
///
/// The tables only depend on the depth and the hash function, so one cache may be shared by every
/// tree built with the same hasher.
#[cfg(feature = "std")]
pub struct ZeroValueCache<H> {
    tables: dashmap::DashMap<u8, Arc<ZeroValues<H>>>,
}

#[cfg(feature = "std")]
impl<H> Default for ZeroValueCache<H> {
    fn default() -> Self {
        Self {
            tables: dashmap::DashMap::new(),
        }
    }
}

#[cfg(feature = "std")]
impl<H: Clone> ZeroValueCache<H> {
    /// Creates an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the table for the given depth, computing it on first use
    pub fn get<M: MerkleHash<Output = H>>(&self, levels: u8, hasher: &M) -> Arc<ZeroValues<H>> {
        if let Some(table) = self.tables.get(&levels) {
            return table.value().clone();
        }
        let table = Arc::new(ZeroValues::compute(levels, hasher));
        tracing::trace!(levels, "computed zero values");
        // Another thread may have raced us here; keep whichever table landed first
        self.tables.entry(levels).or_insert(table).value().clone()
    }

    /// The number of depths with a cached table
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Whether no table has been computed yet
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Sha256Hasher;

    #[test]
    fn test_zero_chain() {
        let hasher = Sha256Hasher::new();
        let zeros = ZeroValues::compute(4, &hasher);
        assert_eq!(zeros.levels(), 4);
        assert_eq!(zeros.as_slice().len(), 5);
        assert_eq!(zeros.at(0), &Sha256Hasher::EMPTY_LEAF);
        for i in 1..=4 {
            assert_eq!(
                zeros.at(i),
                &hasher.hash_nodes(zeros.at(i - 1), zeros.at(i - 1))
            );
        }
        assert_eq!(zeros.empty_root(), zeros.at(4));
    }

    #[test]
    fn test_shallow_table_is_prefix_of_deep_table() {
        let hasher = Sha256Hasher::new();
        let shallow = ZeroValues::compute(7, &hasher);
        let deep = ZeroValues::compute(32, &hasher);
        assert_eq!(shallow.as_slice(), &deep.as_slice()[..8]);
    }

    #[test]
    fn test_known_values() {
        let zeros = ZeroValues::compute(32, &Sha256Hasher::new());
        assert_eq!(
            hex::encode(zeros.at(20)),
            "2c043ee807c9516380324306e6dcb3507cf1248a87f95792092a1eddcb919f1a"
        );
        assert_eq!(
            hex::encode(zeros.empty_root()),
            "372dff623e3923c79c469004c2c4e185213873aa92f5014cc5ce2dea403f4172"
        );
    }

    #[test]
    fn test_cache_memoizes_by_depth() {
        let hasher = Sha256Hasher::new();
        let cache = ZeroValueCache::new();
        assert!(cache.is_empty());
        let first = cache.get(10, &hasher);
        let second = cache.get(10, &hasher);
        assert!(Arc::ptr_eq(&first, &second));
        cache.get(11, &hasher);
        assert_eq!(cache.len(), 2);
        assert_eq!(*first, ZeroValues::compute(10, &hasher));
    }
}
