//! Conversions between chain and tree buckets.

use crate::hash::MIN_TREEIFY_CAPACITY;
use crate::hooks::Hooks;
use crate::node::{Bucket, NodeId, NodeKind, TreeLinks};
use crate::table::RawTable;
use log::trace;

impl<K: Eq, V> RawTable<K, V> {
    /// Convert the chain at `index` into a tree, or grow the table instead
    /// while it is still smaller than `MIN_TREEIFY_CAPACITY`.
    pub(crate) fn treeify_bin<H: Hooks<K, V>>(&mut self, hooks: &mut H, index: usize) {
        let capacity = self.buckets.len();
        if capacity < MIN_TREEIFY_CAPACITY {
            trace!("bucket {index} overflowed at capacity {capacity}; resizing instead of treeifying");
            self.resize(hooks);
            return;
        }
        let Bucket::Chain(head) = self.buckets[index] else {
            return;
        };
        let mut prev: Option<NodeId> = None;
        let mut cur = Some(head);
        while let Some(id) = cur {
            self.nodes[id].tree = TreeLinks {
                prev,
                ..TreeLinks::default()
            };
            hooks.replacement_node(id, NodeKind::Chain, NodeKind::Tree);
            prev = Some(id);
            cur = self.nodes[id].next;
        }
        trace!("treeifying bucket {index}");
        self.buckets[index] = Bucket::Tree(head);
        self.treeify(index, head);
    }

    /// Strip tree links from the traversal list starting at `head`, turning it
    /// back into a plain chain. Returns the chain head for the caller to
    /// install.
    pub(crate) fn untreeify<H: Hooks<K, V>>(&mut self, hooks: &mut H, head: NodeId) -> NodeId {
        let mut cur = Some(head);
        while let Some(id) = cur {
            self.nodes[id].tree = TreeLinks::default();
            hooks.replacement_node(id, NodeKind::Tree, NodeKind::Chain);
            cur = self.nodes[id].next;
        }
        head
    }
}

#[cfg(test)]
mod tests {
    use crate::hooks::{Hooks, NoHooks};
    use crate::node::{BucketKind, NodeId, NodeKind};
    use crate::table::{PutOutcome, RawTable};

    #[derive(Default)]
    struct Replacements(Vec<(NodeId, NodeKind, NodeKind)>);

    impl Hooks<u32, u32> for Replacements {
        fn replacement_node(&mut self, id: NodeId, from: NodeKind, to: NodeKind) {
            self.0.push((id, from, to));
        }
    }

    fn put<H: Hooks<u32, u32>>(t: &mut RawTable<u32, u32>, hooks: &mut H, key: u32) -> NodeId {
        match t.put_val(hooks, key, key, key, false, true) {
            PutOutcome::Inserted(id) => id,
            _ => panic!("key {key} already present"),
        }
    }

    #[test]
    fn small_table_resizes_instead_of_treeifying() {
        let mut t: RawTable<u32, u32> = RawTable::new(None, 0.75, None).unwrap();
        // Eight keys that share bucket 0 at capacity 16 but not at 32.
        for i in 0..8 {
            put(&mut t, &mut NoHooks, i * 16);
        }
        assert_eq!(t.buckets.len(), 32);
        assert!(t.buckets.iter().all(|b| b.kind() != BucketKind::Tree));
        t.validate().unwrap();
    }

    #[test]
    fn treeify_then_untreeify_reports_each_node() {
        let mut t: RawTable<u32, u32> = RawTable::new(Some(64), 0.75, None).unwrap();
        let mut hooks = Replacements::default();
        let ids: Vec<NodeId> = (0..8).map(|i| put(&mut t, &mut hooks, i * 64)).collect();
        assert_eq!(t.buckets[0].kind(), BucketKind::Tree);
        assert_eq!(hooks.0.len(), 8);
        assert!(hooks
            .0
            .iter()
            .all(|&(_, from, to)| from == NodeKind::Chain && to == NodeKind::Tree));
        t.validate().unwrap();

        hooks.0.clear();
        let head = t.buckets[0].head().unwrap();
        let head = t.untreeify(&mut hooks, head);
        t.buckets[0] = crate::node::Bucket::Chain(head);
        assert_eq!(hooks.0.len(), 8);
        for id in ids {
            assert!(hooks.0.iter().any(|&(x, from, _)| x == id && from == NodeKind::Tree));
        }
        t.validate().unwrap();
    }
}
