//! hybrid-hashmap: a single-threaded hash map whose buckets are chains
//! that turn into red-black trees under heavy collision.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: O(1) average lookups with an O(log n) worst case per bucket,
//!   even when many keys share a hash bucket or a full hash.
//! - Layers:
//!   - `hash`: folds the `BuildHasher` output to 32 bits, spreads it and
//!     maps it to a bucket index; table sizing constants.
//!   - `node`: the slotmap arena that owns every entry, and the `Bucket`
//!     sum type (`Empty`, `Chain(head)`, `Tree(head)`).
//!   - `table`: `RawTable`, the bucket array plus the arena. All
//!     structural operations live here and take a spread hash.
//!   - `resize`, `convert`, `tree`: growth with in-place lo/hi splitting,
//!     chain/tree conversion, and the bucket-local red-black tree.
//!   - `HybridHashMap<K, V, S, H>`: public API; hashes keys and threads the
//!     `Hooks` strategy into every table call.
//!
//! Buckets
//! - A chain that reaches `TREEIFY_THRESHOLD` (8) nodes is converted to a
//!   tree, unless the table is smaller than `MIN_TREEIFY_CAPACITY` (64),
//!   in which case the table doubles instead.
//! - Trees are ordered by hash. Equal hashes are ordered by the optional
//!   key order (`Builder::ordered_keys`) and then by an arbitrary
//!   tie-break, so keys never need to be `Ord`.
//! - Every tree node is also on a doubly-linked traversal list. Iteration,
//!   splitting and untreeify walk that list, never the tree.
//! - A tree goes back to a chain when a resize leaves at most
//!   `UNTREEIFY_THRESHOLD` (6) nodes in a half, or when removal leaves the
//!   root without a right child, a left child, or a left grandchild.
//!
//! Growth
//! - The table is allocated lazily. It doubles when the entry count
//!   exceeds `floor(capacity * load_factor)` and stops at
//!   `MAXIMUM_CAPACITY`, after which the threshold is pinned.
//! - Doubling splits each bucket by the single new hash bit; chains keep
//!   their relative order.
//!
//! Handles and hooks
//! - Entries are addressed by generational `NodeId`s that survive resizes
//!   and conversions. Links between nodes are ids, so no node owns another.
//! - A `Hooks` implementation is notified of node creation, conversion,
//!   access, insertion, removal and clear, and may nominate an entry for
//!   eviction after each insertion. `NoHooks` is the default.
//!
//! Structural modification
//! - A modification counter is bumped on insertion of a new key, removal,
//!   clear and resize of an allocated table. Borrowing iterators rule out
//!   interleaved mutation statically; `Cursor` is the borrow-free traversal
//!   that detects it at run time and can remove the current entry.
//!
//! Notes and non-goals
//! - Single-threaded; no interior mutability and no locking.
//! - No serialization format.
//! - The map never shrinks; `clear` keeps the capacity.

mod config;
mod convert;
mod cursor;
mod error;
mod hash;
mod hooks;
mod info;
mod iter;
mod map;
mod map_proptest;
mod modcount;
mod node;
mod resize;
mod table;
mod tree;

// Public surface
pub use config::Builder;
pub use cursor::Cursor;
pub use error::{Error, Result};
pub use hash::{
    DEFAULT_INITIAL_CAPACITY, DEFAULT_LOAD_FACTOR, MAXIMUM_CAPACITY, MIN_TREEIFY_CAPACITY,
    TREEIFY_THRESHOLD, UNTREEIFY_THRESHOLD,
};
pub use hooks::{Hooks, NoHooks};
pub use info::MapInfo;
pub use iter::{BucketIter, IntoIter, Iter, IterMut, Keys, Values, ValuesMut};
pub use map::{DefaultHashBuilder, HybridHashMap};
pub use node::{BucketKind, NodeId, NodeKind};
