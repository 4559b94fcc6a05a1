//! HybridHashMap: the public facade over `RawTable`.
//!
//! The map owns a `BuildHasher`, a `Hooks` strategy and the table. Every
//! operation hashes the key once, spreads the hash and forwards to the table
//! together with `&mut self.hooks`.

use crate::config::Builder;
use crate::cursor::Cursor;
use crate::error::Result;
use crate::hash::{spread, DEFAULT_LOAD_FACTOR};
use crate::hooks::{Hooks, NoHooks};
use crate::info::MapInfo;
use crate::iter::{BucketIter, IntoIter, Iter, IterMut, Keys, Values, ValuesMut};
use crate::node::{BucketKind, NodeId};
use crate::table::{PutOutcome, RawTable, Slot};
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};

pub type DefaultHashBuilder = hashbrown::hash_map::DefaultHashBuilder;

/// A hash map whose buckets are singly-linked chains that turn into
/// red-black trees once they hold `TREEIFY_THRESHOLD` colliding entries.
///
/// Entries live in an arena and are addressed by `NodeId`, which stays valid
/// across resizes and bucket conversions until the entry is removed.
pub struct HybridHashMap<K, V, S = DefaultHashBuilder, H = NoHooks> {
    pub(crate) hasher: S,
    pub(crate) hooks: H,
    pub(crate) table: RawTable<K, V>,
}

impl<K, V> HybridHashMap<K, V>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self::with_hasher(Default::default())
    }

    /// Create a map that allocates room for `capacity` buckets (rounded up to
    /// a power of two) on first insertion.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, Default::default())
    }

    /// Fails with `Error::IllegalLoadFactor` unless `load_factor` is positive.
    pub fn with_capacity_and_load_factor(capacity: usize, load_factor: f32) -> Result<Self> {
        Ok(Self {
            hasher: Default::default(),
            hooks: NoHooks,
            table: RawTable::new(Some(capacity), load_factor, None)?,
        })
    }

    pub fn builder() -> Builder<K, V> {
        Builder::new()
    }
}

impl<K, V> Default for HybridHashMap<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> HybridHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    pub fn with_hasher(hasher: S) -> Self {
        Self::from_parts(hasher, NoHooks, raw_table(None))
    }

    pub fn with_capacity_and_hasher(capacity: usize, hasher: S) -> Self {
        Self::from_parts(hasher, NoHooks, raw_table(Some(capacity)))
    }
}

fn raw_table<K, V>(capacity: Option<usize>) -> RawTable<K, V> {
    RawTable::new(capacity, DEFAULT_LOAD_FACTOR, None).expect("default load factor is positive")
}

impl<K, V, S, H> HybridHashMap<K, V, S, H> {
    pub(crate) fn from_parts(hasher: S, hooks: H, table: RawTable<K, V>) -> Self {
        Self {
            hasher,
            hooks,
            table,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.table.len() == 0
    }

    /// Number of buckets; 0 until the first insertion allocates the table.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    /// Size above which the next insertion doubles the table. Before the
    /// table is allocated this is the pending initial capacity.
    #[inline]
    pub fn threshold(&self) -> usize {
        self.table.threshold
    }

    #[inline]
    pub fn load_factor(&self) -> f32 {
        self.table.load_factor
    }

    /// Count of structural modifications so far.
    #[inline]
    pub fn mod_count(&self) -> u64 {
        self.table.mod_count.get()
    }

    /// Representation of bucket `index`, or `None` if out of range.
    pub fn bucket_kind(&self, index: usize) -> Option<BucketKind> {
        self.table.buckets.get(index).map(|b| b.kind())
    }

    /// Entries of bucket `index` in traversal order.
    pub fn bucket(&self, index: usize) -> BucketIter<'_, K, V> {
        BucketIter::new(&self.table, index)
    }

    /// Resolve a node handle, e.g. one passed to a hook.
    pub fn node(&self, id: NodeId) -> Option<(&K, &V)> {
        self.table.nodes.get(id).map(|n| (&n.key, &n.value))
    }

    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    pub fn hooks_mut(&mut self) -> &mut H {
        &mut self.hooks
    }

    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    /// Start a fail-fast traversal. See `Cursor`.
    pub fn cursor(&self) -> Cursor {
        Cursor::new(self)
    }

    /// Describe the bucket layout. With `verbose` each bucket's entries are
    /// listed as well.
    pub fn map_info(&self, verbose: bool) -> MapInfo
    where
        K: fmt::Debug,
        V: fmt::Debug,
    {
        MapInfo::capture(&self.table, verbose)
    }

    /// Entries in bucket order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(&self.table)
    }

    /// Entries in arena order, which is unrelated to bucket order.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut::new(&mut self.table.nodes)
    }

    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys::new(self.iter())
    }

    pub fn values(&self) -> Values<'_, K, V> {
        Values::new(self.iter())
    }

    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V> {
        ValuesMut::new(self.iter_mut())
    }

    pub fn contains_value(&self, value: &V) -> bool
    where
        V: PartialEq,
    {
        self.table.nodes.iter().any(|(_, n)| n.value == *value)
    }

    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(&K, &V),
    {
        for (k, v) in self.iter() {
            f(k, v);
        }
    }

    /// Replace every value with `f(key, value)`. Not a structural change.
    pub fn replace_all<F>(&mut self, mut f: F)
    where
        F: FnMut(&K, &V) -> V,
    {
        for (_, node) in self.table.nodes.iter_mut() {
            node.value = f(&node.key, &node.value);
        }
    }
}

impl<K, V, S, H> HybridHashMap<K, V, S, H>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    #[inline]
    fn make_hash<Q>(&self, q: &Q) -> u32
    where
        Q: ?Sized + Hash,
    {
        spread(self.hasher.hash_one(q))
    }

    pub fn get<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.get_key_value(q).map(|(_, v)| v)
    }

    pub fn get_key_value<Q>(&self, q: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let id = self.table.get_node(self.make_hash(q), q)?;
        self.node(id)
    }

    pub fn get_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let id = self.table.get_node(self.make_hash(q), q)?;
        self.table.nodes.get_mut(id).map(|n| &mut n.value)
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.table.get_node(self.make_hash(q), q).is_some()
    }
}

impl<K, V, S, H> HybridHashMap<K, V, S, H>
where
    K: Eq + Hash,
    S: BuildHasher,
    H: Hooks<K, V>,
{
    /// Insert or overwrite; returns the previous value.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let hash = self.make_hash(&key);
        match self
            .table
            .put_val(&mut self.hooks, hash, key, value, false, true)
        {
            PutOutcome::Replaced(_, old) => Some(old),
            PutOutcome::Inserted(_) | PutOutcome::Kept(..) => None,
        }
    }

    /// Insert only if `key` is absent. Returns the existing value when the
    /// key was present, `None` when the pair was inserted.
    pub fn put_if_absent(&mut self, key: K, value: V) -> Option<&V> {
        let hash = self.make_hash(&key);
        match self
            .table
            .put_val(&mut self.hooks, hash, key, value, true, true)
        {
            PutOutcome::Kept(id, _) => self.node(id).map(|(_, v)| v),
            PutOutcome::Inserted(_) | PutOutcome::Replaced(..) => None,
        }
    }

    pub fn remove<Q>(&mut self, q: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.remove_entry(q).map(|(_, v)| v)
    }

    pub fn remove_entry<Q>(&mut self, q: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.make_hash(q);
        self.table
            .remove_node(&mut self.hooks, hash, q, |_| true)
            .map(|n| (n.key, n.value))
    }

    /// Remove `q` only while it maps to `expected`.
    pub fn remove_if<Q>(&mut self, q: &Q, expected: &V) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        V: PartialEq,
    {
        let hash = self.make_hash(q);
        self.table
            .remove_node(&mut self.hooks, hash, q, |v| v == expected)
            .is_some()
    }

    /// Remove every entry. Capacity is kept.
    pub fn clear(&mut self) {
        self.table.clear(&mut self.hooks);
    }

    /// If `key` is absent, insert `f(&key)` unless it yields `None`. Returns
    /// the value now associated with `key`.
    pub fn compute_if_absent<F>(&mut self, key: K, f: F) -> Option<&V>
    where
        F: FnOnce(&K) -> Option<V>,
    {
        let hash = self.make_hash(&key);
        let id = match self.table.find_slot(&mut self.hooks, hash, &key) {
            Slot::Occupied(id) => {
                let node = &self.table.nodes[id];
                self.hooks.after_node_access(id, &node.key, &node.value);
                id
            }
            Slot::Vacant(vacant) => {
                let value = f(&key)?;
                self.table
                    .insert_vacant(&mut self.hooks, vacant, key, value, true)
            }
        };
        self.node(id).map(|(_, v)| v)
    }

    /// If `q` is present, replace its value with `f(key, value)`, or remove
    /// the entry when `f` yields `None`.
    pub fn compute_if_present<Q, F>(&mut self, q: &Q, f: F) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        F: FnOnce(&K, &V) -> Option<V>,
    {
        let id = self.table.get_node(self.make_hash(q), q)?;
        self.apply(id, f)
    }

    /// Recompute the mapping for `key` from its current value, if any.
    /// `None` from `f` removes an existing entry or leaves the key absent.
    pub fn compute<F>(&mut self, key: K, f: F) -> Option<&V>
    where
        F: FnOnce(&K, Option<&V>) -> Option<V>,
    {
        let hash = self.make_hash(&key);
        match self.table.find_slot(&mut self.hooks, hash, &key) {
            Slot::Occupied(id) => self.apply(id, |k, v| f(k, Some(v))),
            Slot::Vacant(vacant) => {
                let value = f(&key, None)?;
                let id = self
                    .table
                    .insert_vacant(&mut self.hooks, vacant, key, value, true);
                self.node(id).map(|(_, v)| v)
            }
        }
    }

    /// Insert `value` if `key` is absent, otherwise combine it with the
    /// current value via `f`; `None` from `f` removes the entry.
    pub fn merge<F>(&mut self, key: K, value: V, f: F) -> Option<&V>
    where
        F: FnOnce(&V, V) -> Option<V>,
    {
        let hash = self.make_hash(&key);
        match self.table.find_slot(&mut self.hooks, hash, &key) {
            Slot::Occupied(id) => self.apply(id, |_, old| f(old, value)),
            Slot::Vacant(vacant) => {
                let id = self
                    .table
                    .insert_vacant(&mut self.hooks, vacant, key, value, true);
                self.node(id).map(|(_, v)| v)
            }
        }
    }

    // Replace or remove an existing node's value depending on `f`.
    fn apply<F>(&mut self, id: NodeId, f: F) -> Option<&V>
    where
        F: FnOnce(&K, &V) -> Option<V>,
    {
        let node = self.table.nodes.get_mut(id)?;
        match f(&node.key, &node.value) {
            Some(value) => {
                node.value = value;
                self.hooks.after_node_access(id, &node.key, &node.value);
            }
            None => {
                self.table.remove_by_id(&mut self.hooks, id, true);
                return None;
            }
        }
        self.node(id).map(|(_, v)| v)
    }
}

impl<K, V, S, H> fmt::Debug for HybridHashMap<K, V, S, H>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, S, H> Clone for HybridHashMap<K, V, S, H>
where
    K: Clone,
    V: Clone,
    S: Clone,
    H: Clone,
{
    fn clone(&self) -> Self {
        Self {
            hasher: self.hasher.clone(),
            hooks: self.hooks.clone(),
            table: self.table.clone(),
        }
    }
}

impl<K, V, S, H> PartialEq for HybridHashMap<K, V, S, H>
where
    K: Eq + Hash,
    V: PartialEq,
    S: BuildHasher,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

impl<K, V, S, H> Eq for HybridHashMap<K, V, S, H>
where
    K: Eq + Hash,
    V: Eq,
    S: BuildHasher,
{
}

impl<K, V, S, H> Extend<(K, V)> for HybridHashMap<K, V, S, H>
where
    K: Eq + Hash,
    S: BuildHasher,
    H: Hooks<K, V>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        self.table.reserve_for(&mut self.hooks, iter.size_hint().0);
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<K, V, S, H> FromIterator<(K, V)> for HybridHashMap<K, V, S, H>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
    H: Hooks<K, V> + Default,
{
    /// Bulk copy: hooks see every insertion but eviction is suppressed.
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::from_parts(S::default(), H::default(), raw_table(None));
        let iter = iter.into_iter();
        map.table.reserve_for(&mut map.hooks, iter.size_hint().0);
        for (k, v) in iter {
            let hash = map.make_hash(&k);
            map.table.put_val(&mut map.hooks, hash, k, v, false, false);
        }
        map
    }
}

impl<'a, K, V, S, H> IntoIterator for &'a HybridHashMap<K, V, S, H> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V, S, H> IntoIterator for &'a mut HybridHashMap<K, V, S, H> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<K, V, S, H> IntoIterator for HybridHashMap<K, V, S, H> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter::new(self.table.nodes)
    }
}
