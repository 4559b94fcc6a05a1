//! Human-readable snapshot of the table layout.

use crate::node::BucketKind;
use crate::table::RawTable;
use core::fmt;

/// Layout of a map at the moment `HybridHashMap::map_info` was called.
///
/// The `Display` form lists the table parameters, one kind per bucket and,
/// when captured verbosely, the entries of every non-empty bucket in
/// traversal order.
#[derive(Clone, Debug, PartialEq)]
pub struct MapInfo {
    pub capacity: usize,
    pub load_factor: f32,
    pub len: usize,
    pub threshold: usize,
    pub buckets: Vec<BucketKind>,
    /// Per-bucket `(hash, "key=value")` listings; empty unless verbose.
    pub entries: Vec<Vec<(u32, String)>>,
}

impl MapInfo {
    pub(crate) fn capture<K: fmt::Debug, V: fmt::Debug>(
        table: &RawTable<K, V>,
        verbose: bool,
    ) -> Self {
        let buckets: Vec<BucketKind> = table.buckets.iter().map(|b| b.kind()).collect();
        let entries = if verbose {
            (0..buckets.len())
                .map(|i| {
                    table
                        .bucket_ids(i)
                        .map(|id| {
                            let n = &table.nodes[id];
                            (n.hash, format!("{:?}={:?}", n.key, n.value))
                        })
                        .collect()
                })
                .collect()
        } else {
            Vec::new()
        };
        Self {
            capacity: table.capacity(),
            load_factor: table.load_factor,
            len: table.len(),
            threshold: table.threshold,
            buckets,
            entries,
        }
    }

    /// Number of buckets of each kind: `(empty, chain, tree)`.
    pub fn kind_counts(&self) -> (usize, usize, usize) {
        self.buckets
            .iter()
            .fold((0, 0, 0), |(e, c, t), kind| match kind {
                BucketKind::Empty => (e + 1, c, t),
                BucketKind::Chain => (e, c + 1, t),
                BucketKind::Tree => (e, c, t + 1),
            })
    }
}

fn kind_name(kind: BucketKind) -> &'static str {
    match kind {
        BucketKind::Empty => "empty",
        BucketKind::Chain => "chain",
        BucketKind::Tree => "tree",
    }
}

impl fmt::Display for MapInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "capacity: {}", self.capacity)?;
        writeln!(f, "load factor: {}", self.load_factor)?;
        writeln!(f, "entries: {}", self.len)?;
        writeln!(f, "threshold: {}", self.threshold)?;
        if self.buckets.is_empty() {
            writeln!(f, "buckets: unallocated")?;
        } else {
            let kinds: Vec<&str> = self.buckets.iter().map(|k| kind_name(*k)).collect();
            writeln!(f, "buckets: [{}]", kinds.join(", "))?;
        }
        for (i, listing) in self.entries.iter().enumerate() {
            let Some((hash, _)) = listing.first() else {
                continue;
            };
            let items: Vec<&str> = listing.iter().map(|(_, s)| s.as_str()).collect();
            writeln!(
                f,
                "  [{i}] {} (hash {hash}): {}",
                kind_name(self.buckets[i]),
                items.join(" -> ")
            )?;
        }
        Ok(())
    }
}
