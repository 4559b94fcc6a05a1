//! Hash spreading, bucket indexing and table sizing constants.

/// Capacity used when the first insertion allocates a table that was created
/// without an explicit initial capacity.
pub const DEFAULT_INITIAL_CAPACITY: usize = 1 << 4;

/// Largest bucket array the table will allocate. Growth stops here and the
/// threshold is pinned instead.
pub const MAXIMUM_CAPACITY: usize = 1 << 30;

pub const DEFAULT_LOAD_FACTOR: f32 = 0.75;

/// Chain length at which a bucket is converted to a tree.
pub const TREEIFY_THRESHOLD: usize = 8;

/// Node count at or below which a split tree half becomes a chain again.
pub const UNTREEIFY_THRESHOLD: usize = 6;

/// Smallest capacity at which buckets may be treeified; below it a long chain
/// triggers a resize instead.
pub const MIN_TREEIFY_CAPACITY: usize = 64;

/// Folds a 64-bit hasher output into the 32-bit raw hash and spreads its high
/// half into the low bits used for indexing.
#[inline]
pub(crate) fn spread(raw: u64) -> u32 {
    let h = (raw ^ (raw >> 32)) as u32;
    h ^ (h >> 16)
}

/// Bucket index of `hash` in a table of `capacity` buckets. `capacity` must be
/// a non-zero power of two.
#[inline]
pub(crate) fn index_for(hash: u32, capacity: usize) -> usize {
    debug_assert!(capacity.is_power_of_two());
    (capacity - 1) & hash as usize
}

/// Smallest power of two that holds `cap` buckets, clamped to
/// `[1, MAXIMUM_CAPACITY]`.
#[inline]
pub(crate) fn table_size_for(cap: usize) -> usize {
    if cap >= MAXIMUM_CAPACITY {
        MAXIMUM_CAPACITY
    } else {
        cap.max(1).next_power_of_two()
    }
}

/// `floor(capacity * load_factor)`, or `usize::MAX` once either side reaches
/// the maximum capacity.
#[inline]
pub(crate) fn threshold_for(capacity: usize, load_factor: f32) -> usize {
    let ft = capacity as f32 * load_factor;
    if capacity < MAXIMUM_CAPACITY && ft < MAXIMUM_CAPACITY as f32 {
        ft as usize
    } else {
        usize::MAX
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spread_mixes_high_bits_into_low_bits() {
        // Two hashes that differ only above bit 16 collide without spreading.
        let a = 0x0001_0000u64;
        let b = 0x0002_0000u64;
        assert_eq!(index_for(a as u32, 16), index_for(b as u32, 16));
        assert_ne!(index_for(spread(a), 16), index_for(spread(b), 16));
    }

    #[test]
    fn spread_keeps_small_hashes() {
        for h in [0u64, 1, 16, 32, 48, 0xffff] {
            assert_eq!(spread(h), h as u32);
        }
    }

    #[test]
    fn spread_folds_upper_word() {
        assert_eq!(spread(1u64 << 32), 1);
    }

    #[test]
    fn table_size_rounds_up_and_clamps() {
        assert_eq!(table_size_for(0), 1);
        assert_eq!(table_size_for(1), 1);
        assert_eq!(table_size_for(10), 16);
        assert_eq!(table_size_for(16), 16);
        assert_eq!(table_size_for(17), 32);
        assert_eq!(table_size_for(usize::MAX), MAXIMUM_CAPACITY);
    }

    #[test]
    fn threshold_is_floor_of_product() {
        assert_eq!(threshold_for(16, 0.75), 12);
        assert_eq!(threshold_for(32, 0.1), 3);
        assert_eq!(threshold_for(1, 0.75), 0);
        assert_eq!(threshold_for(MAXIMUM_CAPACITY, 0.75), usize::MAX);
        assert_eq!(threshold_for(1 << 20, 4096.0), usize::MAX);
    }
}
