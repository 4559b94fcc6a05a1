//! Fail-fast traversal that can remove as it goes.
//!
//! A `Cursor` borrows nothing. It remembers the map's modification count at
//! creation and is driven by passing the map to each call, so the map may be
//! mutated in between; any structural change not made through the cursor
//! itself is reported as `Error::ConcurrentModification` on the next step.

use crate::error::{Error, Result};
use crate::hooks::Hooks;
use crate::map::HybridHashMap;
use crate::modcount::Expected;
use crate::node::NodeId;
use crate::table::RawTable;

/// Position in a bucket-order traversal of a `HybridHashMap`.
///
/// A cursor is bound to the map that created it and must only be driven
/// with that map. Passing another map is not detected reliably: a stale node
/// id surfaces as `Error::ConcurrentModification`, and a map whose
/// modification count happens to match is walked from the remembered
/// position.
///
/// ```
/// use hybrid_hashmap::HybridHashMap;
///
/// let mut map: HybridHashMap<u32, u32> = (0..10).map(|i| (i, i)).collect();
/// let mut cursor = map.cursor();
/// while let Some((_, v)) = cursor.next(&map).unwrap() {
///     if *v % 2 == 1 {
///         cursor.remove(&mut map).unwrap();
///     }
/// }
/// assert_eq!(map.len(), 5);
/// ```
#[derive(Clone, Debug)]
pub struct Cursor {
    expected: Expected,
    next: Option<NodeId>,
    current: Option<NodeId>,
    index: usize,
}

impl Cursor {
    pub(crate) fn new<K, V, S, H>(map: &HybridHashMap<K, V, S, H>) -> Self {
        let mut cursor = Self {
            expected: map.table.mod_count.snapshot(),
            next: None,
            current: None,
            index: 0,
        };
        cursor.advance(&map.table);
        cursor
    }

    // Move `next` to the head of the next non-empty bucket.
    fn advance<K, V>(&mut self, table: &RawTable<K, V>) {
        while self.next.is_none() && self.index < table.buckets.len() {
            self.next = table.buckets[self.index].head();
            self.index += 1;
        }
    }

    /// Whether another entry remains. Does not check for modification.
    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }

    /// Step to the next entry. `Ok(None)` once the traversal is exhausted.
    pub fn next<'m, K, V, S, H>(
        &mut self,
        map: &'m HybridHashMap<K, V, S, H>,
    ) -> Result<Option<(&'m K, &'m V)>> {
        let table = &map.table;
        self.expected.check(table.mod_count)?;
        let Some(id) = self.next else {
            return Ok(None);
        };
        let node = table.nodes.get(id).ok_or(Error::ConcurrentModification)?;
        self.current = Some(id);
        self.next = node.next;
        self.advance(table);
        Ok(Some((&node.key, &node.value)))
    }

    /// Remove the entry last returned by `next`.
    ///
    /// Tree buckets keep their root in place so the remaining traversal order
    /// is undisturbed; the cursor then adopts the new modification count.
    pub fn remove<K, V, S, H>(&mut self, map: &mut HybridHashMap<K, V, S, H>) -> Result<(K, V)>
    where
        K: Eq,
        H: Hooks<K, V>,
    {
        let id = self.current.ok_or(Error::IllegalState)?;
        self.expected.check(map.table.mod_count)?;
        self.current = None;
        let node = map
            .table
            .remove_by_id(&mut map.hooks, id, false)
            .ok_or(Error::ConcurrentModification)?;
        self.expected = map.table.mod_count.snapshot();
        Ok((node.key, node.value))
    }
}
