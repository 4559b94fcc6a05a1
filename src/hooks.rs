//! Extension points for decorating variants of the map.
//!
//! A `Hooks` implementation is owned by the map and is handed `&mut` access
//! at fixed points of each structural operation. It never sees the table
//! itself, only node ids and the affected key/value, so it cannot break
//! bucket invariants. A typical collaborator keeps its own per-node state in
//! a `slotmap::SecondaryMap<NodeId, _>` (for example an insertion-ordered
//! list) and resolves ids back to entries through `HybridHashMap::node`.

use crate::node::{NodeId, NodeKind};

pub trait Hooks<K, V> {
    /// A node was created for a new entry.
    #[inline]
    fn new_node(&mut self, _id: NodeId, _kind: NodeKind) {}

    /// An existing node changed representation during treeify or untreeify.
    #[inline]
    fn replacement_node(&mut self, _id: NodeId, _from: NodeKind, _to: NodeKind) {}

    /// An existing entry was found by an insert or compute operation and its
    /// value may have been replaced.
    #[inline]
    fn after_node_access(&mut self, _id: NodeId, _key: &K, _value: &V) {}

    /// A new entry was linked in and the table has settled (any resize has
    /// already happened). The returned node, if any, is removed when the
    /// insertion allows side effects; bulk copies suppress eviction.
    #[inline]
    fn after_node_insertion(&mut self, _id: NodeId, _key: &K, _value: &V) -> Option<NodeId> {
        None
    }

    /// An entry was unlinked. The id no longer resolves.
    #[inline]
    fn after_node_removal(&mut self, _id: NodeId, _key: &K, _value: &V) {}

    /// All entries were dropped at once.
    #[inline]
    fn after_clear(&mut self) {}
}

/// Default strategy: every hook is a no-op.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct NoHooks;

impl<K, V> Hooks<K, V> for NoHooks {}
