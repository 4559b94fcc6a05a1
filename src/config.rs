//! Map configuration.

use crate::error::Result;
use crate::hash::DEFAULT_LOAD_FACTOR;
use crate::hooks::{Hooks, NoHooks};
use crate::map::{DefaultHashBuilder, HybridHashMap};
use crate::table::RawTable;
use crate::tree::KeyOrder;
use core::hash::{BuildHasher, Hash};

/// Builder for a `HybridHashMap` with non-default settings.
///
/// ```
/// use hybrid_hashmap::HybridHashMap;
///
/// let map = HybridHashMap::<u64, &str>::builder()
///     .initial_capacity(100)
///     .load_factor(0.5)
///     .ordered_keys()
///     .build()
///     .unwrap();
/// assert_eq!(map.threshold(), 128);
/// ```
pub struct Builder<K, V, S = DefaultHashBuilder, H = NoHooks> {
    initial_capacity: Option<usize>,
    load_factor: f32,
    hasher: S,
    hooks: H,
    key_order: Option<KeyOrder<K>>,
    _pd: core::marker::PhantomData<fn() -> V>,
}

impl<K, V> Builder<K, V> {
    pub fn new() -> Self {
        Self {
            initial_capacity: None,
            load_factor: DEFAULT_LOAD_FACTOR,
            hasher: Default::default(),
            hooks: NoHooks,
            key_order: None,
            _pd: core::marker::PhantomData,
        }
    }
}

impl<K, V> Default for Builder<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S, H> Builder<K, V, S, H> {
    /// Number of buckets to allocate on first insertion, rounded up to a
    /// power of two and capped at `MAXIMUM_CAPACITY`.
    pub fn initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = Some(capacity);
        self
    }

    /// Checked by `build`.
    pub fn load_factor(mut self, load_factor: f32) -> Self {
        self.load_factor = load_factor;
        self
    }

    pub fn hasher<S2>(self, hasher: S2) -> Builder<K, V, S2, H> {
        Builder {
            initial_capacity: self.initial_capacity,
            load_factor: self.load_factor,
            hasher,
            hooks: self.hooks,
            key_order: self.key_order,
            _pd: core::marker::PhantomData,
        }
    }

    pub fn hooks<H2>(self, hooks: H2) -> Builder<K, V, S, H2> {
        Builder {
            initial_capacity: self.initial_capacity,
            load_factor: self.load_factor,
            hasher: self.hasher,
            hooks,
            key_order: self.key_order,
            _pd: core::marker::PhantomData,
        }
    }

    /// Break hash ties inside tree buckets with `Ord` before falling back to
    /// an arbitrary tie-break. Tree lookups for owned keys then descend a single path.
    pub fn ordered_keys(mut self) -> Self
    where
        K: Ord,
    {
        self.key_order = Some(<K as Ord>::cmp);
        self
    }

    pub fn build(self) -> Result<HybridHashMap<K, V, S, H>>
    where
        K: Eq + Hash,
        S: BuildHasher,
        H: Hooks<K, V>,
    {
        let table = RawTable::new(self.initial_capacity, self.load_factor, self.key_order)?;
        Ok(HybridHashMap::from_parts(self.hasher, self.hooks, table))
    }
}
