//! Arena-allocated entries and the bucket sum type.
//!
//! Every entry of the map is a `Node` stored in a `SlotMap`. Buckets, chain
//! links and tree links all refer to nodes by `NodeId`, so nodes never own
//! each other; the arena owns all of them. A node carries tree links at all
//! times, but they are only meaningful while its bucket is a `Bucket::Tree`.

use core::ops::{Index, IndexMut};
use slotmap::SlotMap;

slotmap::new_key_type! {
    /// Stable handle to an entry. Survives resizes and chain/tree conversions;
    /// a removed entry's id never resolves again, even if its slot is reused.
    pub struct NodeId;
}

/// Representation a node currently participates in.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum NodeKind {
    Chain,
    Tree,
}

/// Representation of one bucket, as reported by `HybridHashMap::bucket_kind`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum BucketKind {
    Empty,
    Chain,
    Tree,
}

/// One slot of the bucket array. The id is the first node in the bucket's
/// traversal order; for trees it is normally also the root.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub(crate) enum Bucket {
    #[default]
    Empty,
    Chain(NodeId),
    Tree(NodeId),
}

impl Bucket {
    #[inline]
    pub(crate) fn head(self) -> Option<NodeId> {
        match self {
            Bucket::Empty => None,
            Bucket::Chain(id) | Bucket::Tree(id) => Some(id),
        }
    }

    #[inline]
    pub(crate) fn kind(self) -> BucketKind {
        match self {
            Bucket::Empty => BucketKind::Empty,
            Bucket::Chain(_) => BucketKind::Chain,
            Bucket::Tree(_) => BucketKind::Tree,
        }
    }
}

/// Red-black links plus the backward half of the traversal list.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub(crate) struct TreeLinks {
    pub(crate) parent: Option<NodeId>, // non-owning
    pub(crate) left: Option<NodeId>,
    pub(crate) right: Option<NodeId>,
    pub(crate) prev: Option<NodeId>,
    pub(crate) red: bool,
}

#[derive(Clone, Debug)]
pub(crate) struct Node<K, V> {
    pub(crate) hash: u32,
    pub(crate) key: K,
    pub(crate) value: V,
    pub(crate) next: Option<NodeId>,
    pub(crate) tree: TreeLinks,
}

impl<K, V> Node<K, V> {
    pub(crate) fn new(hash: u32, key: K, value: V) -> Self {
        Self {
            hash,
            key,
            value,
            next: None,
            tree: TreeLinks::default(),
        }
    }
}

/// Storage for all nodes of one table.
#[derive(Clone, Debug)]
pub(crate) struct Arena<K, V> {
    slots: SlotMap<NodeId, Node<K, V>>,
}

impl<K, V> Arena<K, V> {
    pub(crate) fn new() -> Self {
        Self {
            slots: SlotMap::with_key(),
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    #[inline]
    pub(crate) fn insert(&mut self, node: Node<K, V>) -> NodeId {
        self.slots.insert(node)
    }

    #[inline]
    pub(crate) fn remove(&mut self, id: NodeId) -> Option<Node<K, V>> {
        self.slots.remove(id)
    }

    #[inline]
    pub(crate) fn get(&self, id: NodeId) -> Option<&Node<K, V>> {
        self.slots.get(id)
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut Node<K, V>> {
        self.slots.get_mut(id)
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
    }

    #[inline]
    pub(crate) fn links(&self, id: NodeId) -> &TreeLinks {
        &self.slots[id].tree
    }

    #[inline]
    pub(crate) fn links_mut(&mut self, id: NodeId) -> &mut TreeLinks {
        &mut self.slots[id].tree
    }

    pub(crate) fn iter(&self) -> slotmap::basic::Iter<'_, NodeId, Node<K, V>> {
        self.slots.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> slotmap::basic::IterMut<'_, NodeId, Node<K, V>> {
        self.slots.iter_mut()
    }

    pub(crate) fn into_nodes(self) -> slotmap::basic::IntoIter<NodeId, Node<K, V>> {
        self.slots.into_iter()
    }
}

impl<K, V> Index<NodeId> for Arena<K, V> {
    type Output = Node<K, V>;

    #[inline]
    fn index(&self, id: NodeId) -> &Node<K, V> {
        &self.slots[id]
    }
}

impl<K, V> IndexMut<NodeId> for Arena<K, V> {
    #[inline]
    fn index_mut(&mut self, id: NodeId) -> &mut Node<K, V> {
        &mut self.slots[id]
    }
}
