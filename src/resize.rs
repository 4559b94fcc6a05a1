//! Table growth.
//!
//! Doubling a power-of-two table sends every node of bucket `j` either to `j`
//! or to `j + old_cap`, decided by the single hash bit `old_cap`. Buckets are
//! therefore split in place into a "lo" and a "hi" list that keep their
//! relative order; nothing is rehashed.

use crate::hash::{
    index_for, table_size_for, threshold_for, DEFAULT_INITIAL_CAPACITY, MAXIMUM_CAPACITY,
    UNTREEIFY_THRESHOLD,
};
use crate::hooks::Hooks;
use crate::node::{Bucket, NodeId};
use crate::table::RawTable;
use log::{debug, trace};
use std::mem;

/// Accumulates one half of a split bucket.
#[derive(Default)]
struct Half {
    head: Option<NodeId>,
    tail: Option<NodeId>,
    len: usize,
}

impl<K: Eq, V> RawTable<K, V> {
    /// Allocate the initial table or double the existing one.
    pub(crate) fn resize<H: Hooks<K, V>>(&mut self, hooks: &mut H) {
        let old_cap = self.buckets.len();
        let new_cap = if old_cap > 0 {
            if old_cap >= MAXIMUM_CAPACITY {
                debug!("table at maximum capacity {old_cap}; no longer growing");
                self.threshold = usize::MAX;
                return;
            }
            old_cap << 1
        } else if self.threshold > 0 {
            self.threshold
        } else {
            DEFAULT_INITIAL_CAPACITY
        };
        self.threshold = threshold_for(new_cap, self.load_factor);
        trace!(
            "resizing table {old_cap} -> {new_cap} buckets ({} entries, threshold {})",
            self.nodes.len(),
            self.threshold
        );
        let old = mem::replace(&mut self.buckets, vec![Bucket::Empty; new_cap]);
        if old_cap == 0 {
            return;
        }
        self.mod_count.bump();
        for (j, bucket) in old.into_iter().enumerate() {
            match bucket {
                Bucket::Empty => {}
                Bucket::Chain(head) if self.nodes[head].next.is_none() => {
                    let i = index_for(self.nodes[head].hash, new_cap);
                    self.buckets[i] = Bucket::Chain(head);
                }
                Bucket::Chain(head) => self.split_chain(head, j, old_cap),
                Bucket::Tree(head) => self.split_tree(hooks, head, j, old_cap),
            }
        }
    }

    fn split_chain(&mut self, head: NodeId, j: usize, bit: usize) {
        let (mut lo, mut hi) = (Half::default(), Half::default());
        let mut cur = Some(head);
        while let Some(e) = cur {
            cur = self.nodes[e].next.take();
            let half = if self.nodes[e].hash as usize & bit == 0 {
                &mut lo
            } else {
                &mut hi
            };
            match half.tail {
                Some(t) => self.nodes[t].next = Some(e),
                None => half.head = Some(e),
            }
            half.tail = Some(e);
        }
        if let Some(h) = lo.head {
            self.buckets[j] = Bucket::Chain(h);
        }
        if let Some(h) = hi.head {
            self.buckets[j + bit] = Bucket::Chain(h);
        }
    }

    /// Split a tree bucket along its traversal order. A half that is small
    /// enough becomes a chain; a half that received every node keeps its
    /// existing tree shape.
    fn split_tree<H: Hooks<K, V>>(&mut self, hooks: &mut H, head: NodeId, j: usize, bit: usize) {
        let (mut lo, mut hi) = (Half::default(), Half::default());
        let mut cur = Some(head);
        while let Some(e) = cur {
            cur = self.nodes[e].next.take();
            let half = if self.nodes[e].hash as usize & bit == 0 {
                &mut lo
            } else {
                &mut hi
            };
            self.nodes.links_mut(e).prev = half.tail;
            match half.tail {
                Some(t) => self.nodes[t].next = Some(e),
                None => half.head = Some(e),
            }
            half.tail = Some(e);
            half.len += 1;
        }
        let hi_empty = hi.head.is_none();
        let lo_empty = lo.head.is_none();
        self.place_half(hooks, lo, j, hi_empty);
        self.place_half(hooks, hi, j + bit, lo_empty);
    }

    fn place_half<H: Hooks<K, V>>(
        &mut self,
        hooks: &mut H,
        half: Half,
        index: usize,
        other_empty: bool,
    ) {
        let Some(head) = half.head else {
            return;
        };
        if half.len <= UNTREEIFY_THRESHOLD {
            let head = self.untreeify(hooks, head);
            self.buckets[index] = Bucket::Chain(head);
        } else {
            self.buckets[index] = Bucket::Tree(head);
            if !other_empty {
                self.treeify(index, head);
            }
        }
    }

    /// Grow ahead of adding `additional` entries in bulk.
    ///
    /// An unallocated table only raises its pending initial capacity; an
    /// allocated one is doubled until the combined size fits.
    pub(crate) fn reserve_for<H: Hooks<K, V>>(&mut self, hooks: &mut H, additional: usize) {
        if additional == 0 {
            return;
        }
        if self.buckets.is_empty() {
            let ft = additional as f32 / self.load_factor + 1.0;
            let t = if ft < MAXIMUM_CAPACITY as f32 {
                ft as usize
            } else {
                MAXIMUM_CAPACITY
            };
            if t > self.threshold {
                self.threshold = table_size_for(t);
            }
        } else {
            let wanted = self.nodes.len().saturating_add(additional);
            while wanted > self.threshold && self.buckets.len() < MAXIMUM_CAPACITY {
                self.resize(hooks);
            }
        }
    }
}
