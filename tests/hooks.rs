// Hooks integration suite.
//
// A decorating collaborator keeps its own per-node state keyed by `NodeId`
// and reacts to the callbacks the map issues. These tests build two such
// collaborators and check the event stream they observe:
// - Creation: every new entry reports exactly one `new_node`.
// - Conversion: treeify/untreeify report one `replacement_node` per node.
// - Access: updates of existing keys report `after_node_access`.
// - Removal: every unlinked entry reports `after_node_removal`, and its id
//   no longer resolves.
// - Eviction: the node nominated by `after_node_insertion` is removed,
//   except during bulk copies.
use hybrid_hashmap::{BucketKind, Hooks, HybridHashMap, NodeId, NodeKind};
use slotmap::SecondaryMap;
use std::collections::VecDeque;
use std::hash::{BuildHasher, Hasher};

#[derive(Clone, Copy, Default)]
struct IdentityState;

#[derive(Default)]
struct Identity(u64);

impl Hasher for Identity {
    fn write(&mut self, bytes: &[u8]) {
        for b in bytes {
            self.0 = (self.0 << 8) | u64::from(*b);
        }
    }

    fn write_u64(&mut self, n: u64) {
        self.0 = n;
    }

    fn finish(&self) -> u64 {
        self.0
    }
}

impl BuildHasher for IdentityState {
    type Hasher = Identity;

    fn build_hasher(&self) -> Identity {
        Identity::default()
    }
}

// Records the representation of each live node and counts events.
#[derive(Default)]
struct Recorder {
    kinds: SecondaryMap<NodeId, NodeKind>,
    created: usize,
    converted: usize,
    accessed: usize,
    removed: usize,
    cleared: usize,
}

impl Hooks<u64, u64> for Recorder {
    fn new_node(&mut self, id: NodeId, kind: NodeKind) {
        self.created += 1;
        self.kinds.insert(id, kind);
    }

    fn replacement_node(&mut self, id: NodeId, from: NodeKind, to: NodeKind) {
        assert_eq!(self.kinds.get(id), Some(&from));
        self.converted += 1;
        self.kinds.insert(id, to);
    }

    fn after_node_access(&mut self, _: NodeId, _: &u64, _: &u64) {
        self.accessed += 1;
    }

    fn after_node_removal(&mut self, id: NodeId, _: &u64, _: &u64) {
        assert!(self.kinds.remove(id).is_some());
        self.removed += 1;
    }

    fn after_clear(&mut self) {
        self.kinds.clear();
        self.cleared += 1;
    }
}

// Insertion-ordered bounded cache: evicts the oldest entry beyond `cap`.
struct Fifo {
    cap: usize,
    order: VecDeque<NodeId>,
}

impl Fifo {
    fn new(cap: usize) -> Self {
        Self {
            cap,
            order: VecDeque::new(),
        }
    }
}

impl<K, V> Hooks<K, V> for Fifo {
    fn after_node_insertion(&mut self, id: NodeId, _: &K, _: &V) -> Option<NodeId> {
        self.order.push_back(id);
        if self.order.len() > self.cap {
            self.order.front().copied()
        } else {
            None
        }
    }

    fn after_node_removal(&mut self, id: NodeId, _: &K, _: &V) {
        self.order.retain(|&x| x != id);
    }

    fn after_clear(&mut self) {
        self.order.clear();
    }
}

fn recorded_map() -> HybridHashMap<u64, u64, IdentityState, Recorder> {
    HybridHashMap::builder()
        .hasher(IdentityState)
        .hooks(Recorder::default())
        .initial_capacity(64)
        .build()
        .unwrap()
}

// Test: creation, access and removal events line up with map operations.
#[test]
fn recorder_sees_lifecycle() {
    let mut m = recorded_map();
    m.insert(1, 1);
    m.insert(2, 2);
    m.insert(1, 10);
    m.put_if_absent(2, 20);
    m.compute(2, |_, v| v.map(|v| v + 1));
    assert_eq!(m.hooks().created, 2);
    assert_eq!(m.hooks().accessed, 3);
    assert_eq!(m.remove(&1), Some(10));
    assert_eq!(m.hooks().removed, 1);
    assert_eq!(m.hooks().kinds.len(), 1);
}

// Test: conversions report every node with its old and new representation.
#[test]
fn recorder_tracks_conversions() {
    let mut m = recorded_map();
    for i in 0..8u64 {
        m.insert(i * 64, i);
    }
    assert_eq!(m.bucket_kind(0), Some(BucketKind::Tree));
    assert_eq!(m.hooks().converted, 8);
    assert!(m.hooks().kinds.values().all(|k| *k == NodeKind::Tree));

    // A tree insertion creates a tree node directly.
    m.insert(8 * 64, 8);
    assert_eq!(m.hooks().created, 9);
    assert_eq!(m.hooks().converted, 8);

    while m.bucket_kind(0) == Some(BucketKind::Tree) {
        let (k, _) = m.iter().next().map(|(k, v)| (*k, *v)).unwrap();
        m.remove(&k);
    }
    assert!(m.hooks().kinds.values().all(|k| *k == NodeKind::Chain));
    assert_eq!(m.hooks().kinds.len(), m.len());
}

// Test: removed ids never resolve again.
#[test]
fn removed_node_ids_are_dead() {
    let mut m = recorded_map();
    m.insert(5, 50);
    let id = m.hooks().kinds.keys().next().unwrap();
    assert_eq!(m.node(id), Some((&5, &50)));
    m.remove(&5);
    assert_eq!(m.node(id), None);
    m.insert(5, 51);
    assert_eq!(m.node(id), None);
}

#[test]
fn clear_notifies_once() {
    let mut m = recorded_map();
    for i in 0..10 {
        m.insert(i, i);
    }
    m.clear();
    assert_eq!(m.hooks().cleared, 1);
    assert_eq!(m.hooks().removed, 0);
    assert!(m.hooks().kinds.is_empty());
}

// Test: an eviction hook bounds the map and removes the oldest entry first.
#[test]
fn fifo_eviction_bounds_size() {
    let mut m = HybridHashMap::<u32, &str>::builder()
        .hooks(Fifo::new(3))
        .build()
        .unwrap();
    for (k, v) in [(1, "a"), (2, "b"), (3, "c"), (4, "d"), (5, "e")] {
        m.insert(k, v);
        assert!(m.len() <= 3);
    }
    let mut keys: Vec<u32> = m.keys().copied().collect();
    keys.sort_unstable();
    assert_eq!(keys, vec![3, 4, 5]);

    // Updating an existing key is not an insertion.
    m.insert(3, "C");
    assert_eq!(m.len(), 3);
    assert_eq!(m.get(&3), Some(&"C"));

    // compute-style insertion evicts as well.
    m.compute_if_absent(6, |_| Some("f"));
    assert!(!m.contains_key(&3));
    assert_eq!(m.merge(7, "g", |a, _| Some(*a)), Some(&"g"));
    assert!(!m.contains_key(&4));
}

// Test: bulk copies suppress eviction.
#[test]
fn from_iter_does_not_evict() {
    #[derive(Default)]
    struct EvictAll;
    impl Hooks<u32, u32> for EvictAll {
        fn after_node_insertion(&mut self, id: NodeId, _: &u32, _: &u32) -> Option<NodeId> {
            Some(id)
        }
    }
    let m: HybridHashMap<u32, u32, hybrid_hashmap::DefaultHashBuilder, EvictAll> =
        (0..10).map(|i| (i, i)).collect();
    assert_eq!(m.len(), 10);

    let mut m = m;
    m.insert(100, 100);
    assert!(!m.contains_key(&100));
    assert_eq!(m.len(), 10);
}
