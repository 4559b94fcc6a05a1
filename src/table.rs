//! The bucket table.
//!
//! `RawTable` owns the bucket array and the node arena and implements every
//! structural operation in terms of already-spread 32-bit hashes. It knows
//! nothing about `BuildHasher`s; `HybridHashMap` hashes keys and forwards here.
//! Hooks are threaded through each call as `&mut H` so the table never stores
//! a collaborator.

use crate::error::{Error, Result};
use crate::hash::{index_for, table_size_for, TREEIFY_THRESHOLD};
use crate::hooks::Hooks;
use crate::modcount::ModCount;
use crate::node::{Arena, Bucket, Node, NodeId, NodeKind};
use crate::tree::{KeyOrder, TreeInsert};
use core::borrow::Borrow;
use core::mem;

/// Result of `RawTable::put_val`.
pub(crate) enum PutOutcome<V> {
    /// A new node was linked in.
    Inserted(NodeId),
    /// The key existed and its value was overwritten; carries the old value.
    Replaced(NodeId, V),
    /// The key existed and `only_if_absent` was set; carries the rejected
    /// value.
    Kept(NodeId, V),
}

/// Where `find_slot` located a key.
pub(crate) enum Slot {
    Occupied(NodeId),
    Vacant(Vacant),
}

/// Insertion point for a key known to be absent. Valid only until the next
/// structural change.
pub(crate) struct Vacant {
    index: usize,
    hash: u32,
    tail: Tail,
}

enum Tail {
    Empty,
    Chain { last: NodeId, len: usize },
    Tree(NodeId),
}

#[derive(Clone)]
pub(crate) struct RawTable<K, V> {
    pub(crate) buckets: Vec<Bucket>,
    pub(crate) nodes: Arena<K, V>,
    /// Next size at which to resize. Before the first allocation it holds the
    /// requested initial capacity instead (0 for the default).
    pub(crate) threshold: usize,
    pub(crate) load_factor: f32,
    pub(crate) mod_count: ModCount,
    pub(crate) key_order: Option<KeyOrder<K>>,
}

impl<K, V> RawTable<K, V> {
    pub(crate) fn new(
        initial_capacity: Option<usize>,
        load_factor: f32,
        key_order: Option<KeyOrder<K>>,
    ) -> Result<Self> {
        if !(load_factor > 0.0) {
            return Err(Error::IllegalLoadFactor(load_factor));
        }
        Ok(Self {
            buckets: Vec::new(),
            nodes: Arena::new(),
            threshold: initial_capacity.map_or(0, table_size_for),
            load_factor,
            mod_count: ModCount::new(),
            key_order,
        })
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.buckets.len()
    }

    /// Iterate the nodes of bucket `index` in traversal order.
    pub(crate) fn bucket_ids(&self, index: usize) -> impl Iterator<Item = NodeId> + '_ {
        let mut cur = self.buckets.get(index).and_then(|b| b.head());
        core::iter::from_fn(move || {
            let id = cur?;
            cur = self.nodes[id].next;
            Some(id)
        })
    }
}

impl<K: Eq, V> RawTable<K, V> {
    /// Look up a node by borrowed key. Tree buckets are searched without the
    /// key order, which only applies to owned keys.
    pub(crate) fn get_node<Q>(&self, hash: u32, q: &Q) -> Option<NodeId>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        if self.buckets.is_empty() {
            return None;
        }
        match self.buckets[index_for(hash, self.buckets.len())] {
            Bucket::Empty => None,
            Bucket::Chain(head) => {
                let mut cur = Some(head);
                while let Some(id) = cur {
                    let node = &self.nodes[id];
                    if node.hash == hash && node.key.borrow() == q {
                        return Some(id);
                    }
                    cur = node.next;
                }
                None
            }
            Bucket::Tree(head) => {
                let root = self.nodes.root_of(head);
                self.nodes
                    .find(Some(root), hash, &|k: &K| k.borrow() == q, &|_: &K| None)
            }
        }
    }

    /// Like `get_node` for an owned key, letting the key order steer tree
    /// searches.
    fn find_key(&self, hash: u32, key: &K, head: NodeId) -> Option<NodeId> {
        let key_order = self.key_order;
        let root = self.nodes.root_of(head);
        self.nodes.find(
            Some(root),
            hash,
            &|k: &K| k == key,
            &|k: &K| key_order.map(|f| f(key, k)),
        )
    }

    /// Insert or update `key`.
    ///
    /// `evict` gates removal of the node nominated by
    /// `Hooks::after_node_insertion`.
    pub(crate) fn put_val<H: Hooks<K, V>>(
        &mut self,
        hooks: &mut H,
        hash: u32,
        key: K,
        value: V,
        only_if_absent: bool,
        evict: bool,
    ) -> PutOutcome<V> {
        if self.buckets.is_empty() {
            self.resize(hooks);
        }
        let i = index_for(hash, self.buckets.len());
        let id = match self.buckets[i] {
            Bucket::Empty => {
                let id = self.nodes.insert(Node::new(hash, key, value));
                self.buckets[i] = Bucket::Chain(id);
                hooks.new_node(id, NodeKind::Chain);
                id
            }
            Bucket::Tree(first) => {
                match self.put_tree_val(hooks, i, first, hash, key, value, false) {
                    TreeInsert::Inserted(id) => id,
                    TreeInsert::Found(id, _, value) => {
                        return self.on_existing(hooks, id, value, only_if_absent)
                    }
                }
            }
            Bucket::Chain(head) => {
                let mut e = head;
                let mut bin_count = 1;
                loop {
                    let node = &self.nodes[e];
                    if node.hash == hash && node.key == key {
                        return self.on_existing(hooks, e, value, only_if_absent);
                    }
                    match node.next {
                        Some(next) => {
                            e = next;
                            bin_count += 1;
                        }
                        None => break,
                    }
                }
                let id = self.nodes.insert(Node::new(hash, key, value));
                self.nodes[e].next = Some(id);
                hooks.new_node(id, NodeKind::Chain);
                if bin_count + 1 >= TREEIFY_THRESHOLD {
                    self.treeify_bin(hooks, i);
                }
                id
            }
        };
        self.finish_insert(hooks, id, evict);
        PutOutcome::Inserted(id)
    }

    fn on_existing<H: Hooks<K, V>>(
        &mut self,
        hooks: &mut H,
        id: NodeId,
        value: V,
        only_if_absent: bool,
    ) -> PutOutcome<V> {
        let node = &mut self.nodes[id];
        let outcome = if only_if_absent {
            PutOutcome::Kept(id, value)
        } else {
            PutOutcome::Replaced(id, mem::replace(&mut node.value, value))
        };
        hooks.after_node_access(id, &node.key, &node.value);
        outcome
    }

    /// Bookkeeping shared by every path that links in a new node.
    fn finish_insert<H: Hooks<K, V>>(&mut self, hooks: &mut H, id: NodeId, evict: bool) {
        self.mod_count.bump();
        if self.nodes.len() > self.threshold {
            self.resize(hooks);
        }
        let node = &self.nodes[id];
        if let Some(victim) = hooks.after_node_insertion(id, &node.key, &node.value) {
            if evict {
                self.remove_by_id(hooks, victim, true);
            }
        }
    }

    /// Locate `key` for a compute-style operation, allocating the table
    /// first if needed so that a vacant slot can be filled without a second
    /// search.
    pub(crate) fn find_slot<H: Hooks<K, V>>(&mut self, hooks: &mut H, hash: u32, key: &K) -> Slot {
        if self.buckets.is_empty() || self.nodes.len() > self.threshold {
            self.resize(hooks);
        }
        let index = index_for(hash, self.buckets.len());
        let tail = match self.buckets[index] {
            Bucket::Empty => Tail::Empty,
            Bucket::Chain(head) => {
                let mut e = head;
                let mut len = 1;
                loop {
                    let node = &self.nodes[e];
                    if node.hash == hash && node.key == *key {
                        return Slot::Occupied(e);
                    }
                    match node.next {
                        Some(next) => {
                            e = next;
                            len += 1;
                        }
                        None => break,
                    }
                }
                Tail::Chain { last: e, len }
            }
            Bucket::Tree(head) => match self.find_key(hash, key, head) {
                Some(id) => return Slot::Occupied(id),
                None => Tail::Tree(head),
            },
        };
        Slot::Vacant(Vacant { index, hash, tail })
    }

    /// Fill a slot returned by `find_slot`.
    pub(crate) fn insert_vacant<H: Hooks<K, V>>(
        &mut self,
        hooks: &mut H,
        vacant: Vacant,
        key: K,
        value: V,
        evict: bool,
    ) -> NodeId {
        let Vacant { index, hash, tail } = vacant;
        let id = match tail {
            Tail::Empty => {
                let id = self.nodes.insert(Node::new(hash, key, value));
                self.buckets[index] = Bucket::Chain(id);
                hooks.new_node(id, NodeKind::Chain);
                id
            }
            Tail::Chain { last, len } => {
                let id = self.nodes.insert(Node::new(hash, key, value));
                self.nodes[last].next = Some(id);
                hooks.new_node(id, NodeKind::Chain);
                if len + 1 >= TREEIFY_THRESHOLD {
                    self.treeify_bin(hooks, index);
                }
                id
            }
            Tail::Tree(first) => {
                match self.put_tree_val(hooks, index, first, hash, key, value, true) {
                    TreeInsert::Inserted(id) => id,
                    // absent per find_slot; keep the map consistent regardless
                    TreeInsert::Found(id, _, value) => {
                        self.nodes[id].value = value;
                        return id;
                    }
                }
            }
        };
        self.finish_insert(hooks, id, evict);
        id
    }

    /// Remove the node for `q` if `value_matches` accepts its value.
    pub(crate) fn remove_node<Q, H, F>(
        &mut self,
        hooks: &mut H,
        hash: u32,
        q: &Q,
        value_matches: F,
    ) -> Option<Node<K, V>>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
        H: Hooks<K, V>,
        F: FnOnce(&V) -> bool,
    {
        let id = self.get_node(hash, q)?;
        if !value_matches(&self.nodes[id].value) {
            return None;
        }
        self.remove_by_id(hooks, id, true)
    }

    /// Unlink and free node `id`.
    ///
    /// `movable` allows tree removal to move the root to the bucket head or
    /// to fall back to a chain; cursor removal passes `false` so the part of
    /// the traversal list not yet visited stays in place.
    pub(crate) fn remove_by_id<H: Hooks<K, V>>(
        &mut self,
        hooks: &mut H,
        id: NodeId,
        movable: bool,
    ) -> Option<Node<K, V>> {
        let hash = self.nodes.get(id)?.hash;
        let i = index_for(hash, self.buckets.len());
        match self.buckets[i] {
            Bucket::Empty => return None,
            Bucket::Tree(_) => self.remove_tree_node(hooks, i, id, movable),
            Bucket::Chain(head) if head == id => {
                self.buckets[i] = self.nodes[id].next.map_or(Bucket::Empty, Bucket::Chain);
            }
            Bucket::Chain(head) => {
                let mut pred = head;
                loop {
                    match self.nodes[pred].next {
                        Some(next) if next == id => break,
                        Some(next) => pred = next,
                        None => return None,
                    }
                }
                self.nodes[pred].next = self.nodes[id].next;
            }
        }
        let node = self.nodes.remove(id)?;
        self.mod_count.bump();
        hooks.after_node_removal(id, &node.key, &node.value);
        Some(node)
    }

    /// Drop every entry but keep the allocated capacity.
    pub(crate) fn clear<H: Hooks<K, V>>(&mut self, hooks: &mut H) {
        self.mod_count.bump();
        if !self.nodes.is_empty() {
            self.buckets.fill(Bucket::Empty);
            self.nodes.clear();
        }
        hooks.after_clear();
    }

    /// Full structural audit, used by tests after every mutation.
    #[cfg(test)]
    pub(crate) fn validate(&self) -> core::result::Result<(), String> {
        use crate::node::TreeLinks;

        let cap = self.buckets.len();
        if cap == 0 {
            return if self.nodes.len() == 0 {
                Ok(())
            } else {
                Err("nodes without a table".into())
            };
        }
        if !cap.is_power_of_two() {
            return Err(format!("capacity {cap} is not a power of two"));
        }
        let mut seen = 0usize;
        for (i, bucket) in self.buckets.iter().enumerate() {
            let Some(head) = bucket.head() else {
                continue;
            };
            let mut prev: Option<NodeId> = None;
            let mut count = 0usize;
            for id in self.bucket_ids(i) {
                let node = self.nodes.get(id).ok_or("dangling id in bucket")?;
                if index_for(node.hash, cap) != i {
                    return Err(format!("node with hash {} misplaced in bucket {i}", node.hash));
                }
                match bucket {
                    Bucket::Chain(_) if node.tree != TreeLinks::default() => {
                        return Err(format!("chain node in bucket {i} carries tree links"));
                    }
                    Bucket::Tree(_) if node.tree.prev != prev => {
                        return Err(format!("broken prev link in bucket {i}"));
                    }
                    _ => {}
                }
                prev = Some(id);
                count += 1;
            }
            if let Bucket::Tree(_) = bucket {
                let root = self.nodes.root_of(head);
                if self.nodes.links(root).red {
                    return Err(format!("red root in bucket {i}"));
                }
                if !self.nodes.check_invariants(root) {
                    return Err(format!("tree invariants broken in bucket {i}"));
                }
                let mut tree_count = 0;
                self.black_height(root, &mut tree_count)?;
                if tree_count != count {
                    return Err(format!(
                        "bucket {i}: {tree_count} nodes in tree, {count} in traversal order"
                    ));
                }
            }
            seen += count;
        }
        if seen != self.nodes.len() {
            return Err(format!("{seen} reachable nodes, {} allocated", self.nodes.len()));
        }
        Ok(())
    }

    #[cfg(test)]
    fn black_height(&self, id: NodeId, count: &mut usize) -> core::result::Result<usize, String> {
        *count += 1;
        let links = *self.nodes.links(id);
        let lh = match links.left {
            Some(l) => self.black_height(l, count)?,
            None => 1,
        };
        let rh = match links.right {
            Some(r) => self.black_height(r, count)?,
            None => 1,
        };
        if lh != rh {
            return Err(format!("unequal black height below hash {}", self.nodes[id].hash));
        }
        Ok(lh + usize::from(!links.red))
    }
}
