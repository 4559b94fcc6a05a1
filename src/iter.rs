//! Iterators over `HybridHashMap`.
//!
//! Shared iteration walks the bucket array and each bucket's traversal list,
//! so it visits entries in the same order a cursor does. Mutable and owning
//! iteration go straight through the arena instead.

use crate::node::{Arena, Bucket, Node, NodeId};
use crate::table::RawTable;
use core::iter::FusedIterator;

/// Iterator over `(&K, &V)` in bucket order.
pub struct Iter<'a, K, V> {
    buckets: core::slice::Iter<'a, Bucket>,
    nodes: &'a Arena<K, V>,
    next: Option<NodeId>,
    remaining: usize,
}

impl<'a, K, V> Iter<'a, K, V> {
    pub(crate) fn new(table: &'a RawTable<K, V>) -> Self {
        Self {
            buckets: table.buckets.iter(),
            nodes: &table.nodes,
            next: None,
            remaining: table.len(),
        }
    }
}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            buckets: self.buckets.clone(),
            nodes: self.nodes,
            next: self.next,
            remaining: self.remaining,
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let nodes = self.nodes;
        loop {
            if let Some(id) = self.next {
                let node = &nodes[id];
                self.next = node.next;
                self.remaining -= 1;
                return Some((&node.key, &node.value));
            }
            self.next = self.buckets.next()?.head();
        }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
impl<K, V> FusedIterator for Iter<'_, K, V> {}

/// Iterator over `(&K, &mut V)` in arena order.
pub struct IterMut<'a, K, V> {
    it: slotmap::basic::IterMut<'a, NodeId, Node<K, V>>,
}

impl<'a, K, V> IterMut<'a, K, V> {
    pub(crate) fn new(nodes: &'a mut Arena<K, V>) -> Self {
        Self {
            it: nodes.iter_mut(),
        }
    }
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|(_, n)| (&n.key, &mut n.value))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}
impl<K, V> FusedIterator for IterMut<'_, K, V> {}

pub struct Keys<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Keys<'a, K, V> {
    pub(crate) fn new(inner: Iter<'a, K, V>) -> Self {
        Self { inner }
    }
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    #[inline]
    fn next(&mut self) -> Option<&'a K> {
        self.inner.next().map(|(k, _)| k)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}
impl<K, V> FusedIterator for Keys<'_, K, V> {}

pub struct Values<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Values<'a, K, V> {
    pub(crate) fn new(inner: Iter<'a, K, V>) -> Self {
        Self { inner }
    }
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    #[inline]
    fn next(&mut self) -> Option<&'a V> {
        self.inner.next().map(|(_, v)| v)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}
impl<K, V> FusedIterator for Values<'_, K, V> {}

pub struct ValuesMut<'a, K, V> {
    inner: IterMut<'a, K, V>,
}

impl<'a, K, V> ValuesMut<'a, K, V> {
    pub(crate) fn new(inner: IterMut<'a, K, V>) -> Self {
        Self { inner }
    }
}

impl<'a, K, V> Iterator for ValuesMut<'a, K, V> {
    type Item = &'a mut V;

    #[inline]
    fn next(&mut self) -> Option<&'a mut V> {
        self.inner.next().map(|(_, v)| v)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for ValuesMut<'_, K, V> {}
impl<K, V> FusedIterator for ValuesMut<'_, K, V> {}

/// Owning iterator, in arena order.
pub struct IntoIter<K, V> {
    it: slotmap::basic::IntoIter<NodeId, Node<K, V>>,
}

impl<K, V> IntoIter<K, V> {
    pub(crate) fn new(nodes: Arena<K, V>) -> Self {
        Self {
            it: nodes.into_nodes(),
        }
    }
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    #[inline]
    fn next(&mut self) -> Option<(K, V)> {
        self.it.next().map(|(_, n)| (n.key, n.value))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}
impl<K, V> FusedIterator for IntoIter<K, V> {}

/// Entries of a single bucket in traversal order. For a tree bucket this is
/// the linked order, not the in-order walk of the tree.
pub struct BucketIter<'a, K, V> {
    nodes: &'a Arena<K, V>,
    next: Option<NodeId>,
}

impl<'a, K, V> BucketIter<'a, K, V> {
    pub(crate) fn new(table: &'a RawTable<K, V>, index: usize) -> Self {
        Self {
            nodes: &table.nodes,
            next: table.buckets.get(index).and_then(|b| b.head()),
        }
    }
}

impl<'a, K, V> Iterator for BucketIter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let nodes = self.nodes;
        let node = &nodes[self.next?];
        self.next = node.next;
        Some((&node.key, &node.value))
    }
}

impl<K, V> FusedIterator for BucketIter<'_, K, V> {}

#[cfg(test)]
mod tests {
    use crate::HybridHashMap;

    #[test]
    fn iter_visits_every_entry_once() {
        let m: HybridHashMap<u32, u32> = (0..100).map(|i| (i, i + 1)).collect();
        let it = m.iter();
        assert_eq!(it.len(), 100);
        let mut keys: Vec<u32> = it.map(|(k, _)| *k).collect();
        keys.sort_unstable();
        assert_eq!(keys, (0..100).collect::<Vec<_>>());
        assert_eq!(m.values().copied().sum::<u32>(), (1..=100u32).sum::<u32>());
        assert_eq!(m.keys().len(), 100);
    }

    #[test]
    fn iter_follows_bucket_order() {
        let m: HybridHashMap<u32, ()> = (0..40).map(|i| (i, ())).collect();
        let from_buckets: Vec<u32> = (0..m.capacity())
            .flat_map(|i| m.bucket(i).map(|(k, _)| *k))
            .collect();
        let from_iter: Vec<u32> = m.keys().copied().collect();
        assert_eq!(from_iter, from_buckets);
    }

    #[test]
    fn values_mut_updates_in_place() {
        let mut m: HybridHashMap<u32, u32> = (0..10).map(|i| (i, i)).collect();
        for v in m.values_mut() {
            *v *= 3;
        }
        for (k, v) in &mut m {
            *v += *k;
        }
        for (k, v) in &m {
            assert_eq!(*v, k * 4);
        }
    }

    #[test]
    fn mutable_and_owning_iterators_report_exact_len() {
        let mut m: HybridHashMap<u32, u32> = (0..25).map(|i| (i, i)).collect();
        m.remove(&3);
        let mut it = m.iter_mut();
        assert_eq!(it.len(), 24);
        it.next();
        assert_eq!(it.len(), 23);
        assert_eq!(m.values_mut().len(), 24);

        let mut owned = m.into_iter();
        assert_eq!(owned.len(), 24);
        assert_eq!(owned.by_ref().count(), 24);
        assert_eq!(owned.next(), None);
        assert_eq!(owned.next(), None);
    }

    #[test]
    fn empty_map_iterates_nothing() {
        let m: HybridHashMap<u32, u32> = HybridHashMap::new();
        assert_eq!(m.iter().next(), None);
        assert_eq!(m.bucket(0).next(), None);
        assert_eq!(m.into_iter().count(), 0);
    }
}
