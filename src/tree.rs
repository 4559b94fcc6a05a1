//! Bucket-local red-black tree.
//!
//! Nodes are ordered by hash; equal hashes fall back to the table's optional
//! key order and then to an identity tie-break on the arena id (treeify) or
//! to the right subtree (insertion into an existing tree), so a tree never
//! needs a total order on keys. Lookups therefore search both subtrees
//! when hashes tie and no order decides.
//!
//! Balancing follows the CLR formulation. Every tree node also sits on the
//! bucket's doubly-linked traversal list (`prev` in the links, `next` on the
//! node), which is unrelated to the tree shape and is what iteration, split
//! and untreeify walk.

use crate::hooks::Hooks;
use crate::node::{Arena, Bucket, Node, NodeId, NodeKind, TreeLinks};
use crate::table::RawTable;
use core::cmp::Ordering;
use slotmap::Key;

/// Optional comparison used before the identity tie-break.
pub(crate) type KeyOrder<K> = fn(&K, &K) -> Ordering;

/// Outcome of `RawTable::put_tree_val`.
pub(crate) enum TreeInsert<K, V> {
    Inserted(NodeId),
    /// The key was already present; the rejected key and value are returned.
    Found(NodeId, K, V),
}

/// Arbitrary but stable order for nodes whose hashes tie and whose keys do
/// not decide. Never returns `Equal`.
#[inline]
pub(crate) fn tie_break(a: NodeId, b: NodeId) -> Ordering {
    if a.data().as_ffi() <= b.data().as_ffi() {
        Ordering::Less
    } else {
        Ordering::Greater
    }
}

impl<K, V> Arena<K, V> {
    #[inline]
    fn is_red(&self, id: Option<NodeId>) -> bool {
        id.map_or(false, |x| self.links(x).red)
    }

    #[inline]
    fn set_red(&mut self, id: NodeId, red: bool) {
        self.links_mut(id).red = red;
    }

    pub(crate) fn root_of(&self, mut r: NodeId) -> NodeId {
        while let Some(p) = self.links(r).parent {
            r = p;
        }
        r
    }

    /// Search the subtree at `start` for a node with hash `h` whose key
    /// satisfies `matches`. `order` compares the probe with a stored key when
    /// it can; `None` or `Equal` means both subtrees must be searched.
    pub(crate) fn find(
        &self,
        start: Option<NodeId>,
        h: u32,
        matches: &dyn Fn(&K) -> bool,
        order: &dyn Fn(&K) -> Option<Ordering>,
    ) -> Option<NodeId> {
        let mut p = start;
        while let Some(id) = p {
            let node = &self[id];
            let (pl, pr) = (node.tree.left, node.tree.right);
            if node.hash > h {
                p = pl;
            } else if node.hash < h {
                p = pr;
            } else if matches(&node.key) {
                return Some(id);
            } else if pl.is_none() {
                p = pr;
            } else if pr.is_none() {
                p = pl;
            } else {
                match order(&node.key) {
                    Some(Ordering::Less) => p = pl,
                    Some(Ordering::Greater) => p = pr,
                    _ => {
                        if let Some(q) = self.find(pr, h, matches, order) {
                            return Some(q);
                        }
                        p = pl;
                    }
                }
            }
        }
        None
    }

    /// Direction for placing `x` relative to `p` when building or inserting.
    fn placement(&self, x: NodeId, p: NodeId, key_order: Option<KeyOrder<K>>) -> Ordering {
        let (xh, ph) = (self[x].hash, self[p].hash);
        if ph > xh {
            Ordering::Less
        } else if ph < xh {
            Ordering::Greater
        } else {
            key_order
                .map(|f| f(&self[x].key, &self[p].key))
                .filter(|o| *o != Ordering::Equal)
                .unwrap_or_else(|| tie_break(x, p))
        }
    }

    fn rotate_left(&mut self, mut root: NodeId, p: NodeId) -> NodeId {
        let Some(r) = self.links(p).right else {
            return root;
        };
        let rl = self.links(r).left;
        self.links_mut(p).right = rl;
        if let Some(rl) = rl {
            self.links_mut(rl).parent = Some(p);
        }
        let pp = self.links(p).parent;
        self.links_mut(r).parent = pp;
        match pp {
            None => {
                root = r;
                self.set_red(r, false);
            }
            Some(pp) => {
                if self.links(pp).left == Some(p) {
                    self.links_mut(pp).left = Some(r);
                } else {
                    self.links_mut(pp).right = Some(r);
                }
            }
        }
        self.links_mut(r).left = Some(p);
        self.links_mut(p).parent = Some(r);
        root
    }

    fn rotate_right(&mut self, mut root: NodeId, p: NodeId) -> NodeId {
        let Some(l) = self.links(p).left else {
            return root;
        };
        let lr = self.links(l).right;
        self.links_mut(p).left = lr;
        if let Some(lr) = lr {
            self.links_mut(lr).parent = Some(p);
        }
        let pp = self.links(p).parent;
        self.links_mut(l).parent = pp;
        match pp {
            None => {
                root = l;
                self.set_red(l, false);
            }
            Some(pp) => {
                if self.links(pp).right == Some(p) {
                    self.links_mut(pp).right = Some(l);
                } else {
                    self.links_mut(pp).left = Some(l);
                }
            }
        }
        self.links_mut(l).right = Some(p);
        self.links_mut(p).parent = Some(l);
        root
    }

    /// Restore red-black invariants after attaching `x` as a leaf. Returns the
    /// (possibly new) root.
    pub(crate) fn balance_insertion(&mut self, mut root: NodeId, mut x: NodeId) -> NodeId {
        self.set_red(x, true);
        loop {
            let Some(xp) = self.links(x).parent else {
                self.set_red(x, false);
                return x;
            };
            if !self.links(xp).red {
                return root;
            }
            let Some(xpp) = self.links(xp).parent else {
                return root;
            };
            let xppl = self.links(xpp).left;
            if xppl == Some(xp) {
                match self.links(xpp).right {
                    Some(uncle) if self.links(uncle).red => {
                        self.set_red(uncle, false);
                        self.set_red(xp, false);
                        self.set_red(xpp, true);
                        x = xpp;
                    }
                    _ => {
                        let (mut xp, mut xpp) = (Some(xp), Some(xpp));
                        if let Some(parent) = xp.filter(|&p| self.links(p).right == Some(x)) {
                            x = parent;
                            root = self.rotate_left(root, x);
                            xp = self.links(x).parent;
                            xpp = xp.and_then(|p| self.links(p).parent);
                        }
                        if let Some(xp) = xp {
                            self.set_red(xp, false);
                            if let Some(xpp) = xpp {
                                self.set_red(xpp, true);
                                root = self.rotate_right(root, xpp);
                            }
                        }
                    }
                }
            } else {
                match xppl {
                    Some(uncle) if self.links(uncle).red => {
                        self.set_red(uncle, false);
                        self.set_red(xp, false);
                        self.set_red(xpp, true);
                        x = xpp;
                    }
                    _ => {
                        let (mut xp, mut xpp) = (Some(xp), Some(xpp));
                        if let Some(parent) = xp.filter(|&p| self.links(p).left == Some(x)) {
                            x = parent;
                            root = self.rotate_right(root, x);
                            xp = self.links(x).parent;
                            xpp = xp.and_then(|p| self.links(p).parent);
                        }
                        if let Some(xp) = xp {
                            self.set_red(xp, false);
                            if let Some(xpp) = xpp {
                                self.set_red(xpp, true);
                                root = self.rotate_left(root, xpp);
                            }
                        }
                    }
                }
            }
        }
    }

    /// Restore red-black invariants after unlinking a black node whose place
    /// is now taken by `x`. Returns the (possibly new) root.
    pub(crate) fn balance_deletion(&mut self, mut root: NodeId, x: NodeId) -> NodeId {
        let mut x = Some(x);
        loop {
            let Some(cur) = x else {
                return root;
            };
            if cur == root {
                return root;
            }
            let Some(parent) = self.links(cur).parent else {
                self.set_red(cur, false);
                return cur;
            };
            if self.links(cur).red {
                self.set_red(cur, false);
                return root;
            }
            let mut xp = Some(parent);
            if self.links(parent).left == Some(cur) {
                let mut xpr = self.links(parent).right;
                if let Some(s) = xpr.filter(|&s| self.links(s).red) {
                    self.set_red(s, false);
                    self.set_red(parent, true);
                    root = self.rotate_left(root, parent);
                    xp = self.links(cur).parent;
                    xpr = xp.and_then(|p| self.links(p).right);
                }
                match xpr {
                    None => x = xp,
                    Some(s) => {
                        let (sl, sr) = (self.links(s).left, self.links(s).right);
                        if !self.is_red(sr) && !self.is_red(sl) {
                            self.set_red(s, true);
                            x = xp;
                        } else {
                            let mut xpr = Some(s);
                            if !self.is_red(sr) {
                                if let Some(sl) = sl {
                                    self.set_red(sl, false);
                                }
                                self.set_red(s, true);
                                root = self.rotate_right(root, s);
                                xp = self.links(cur).parent;
                                xpr = xp.and_then(|p| self.links(p).right);
                            }
                            if let Some(s) = xpr {
                                let red = self.is_red(xp);
                                self.set_red(s, red);
                                if let Some(sr) = self.links(s).right {
                                    self.set_red(sr, false);
                                }
                            }
                            if let Some(xp) = xp {
                                self.set_red(xp, false);
                                root = self.rotate_left(root, xp);
                            }
                            x = Some(root);
                        }
                    }
                }
            } else {
                let mut xpl = self.links(parent).left;
                if let Some(s) = xpl.filter(|&s| self.links(s).red) {
                    self.set_red(s, false);
                    self.set_red(parent, true);
                    root = self.rotate_right(root, parent);
                    xp = self.links(cur).parent;
                    xpl = xp.and_then(|p| self.links(p).left);
                }
                match xpl {
                    None => x = xp,
                    Some(s) => {
                        let (sl, sr) = (self.links(s).left, self.links(s).right);
                        if !self.is_red(sl) && !self.is_red(sr) {
                            self.set_red(s, true);
                            x = xp;
                        } else {
                            let mut xpl = Some(s);
                            if !self.is_red(sl) {
                                if let Some(sr) = sr {
                                    self.set_red(sr, false);
                                }
                                self.set_red(s, true);
                                root = self.rotate_left(root, s);
                                xp = self.links(cur).parent;
                                xpl = xp.and_then(|p| self.links(p).left);
                            }
                            if let Some(s) = xpl {
                                let red = self.is_red(xp);
                                self.set_red(s, red);
                                if let Some(sl) = self.links(s).left {
                                    self.set_red(sl, false);
                                }
                            }
                            if let Some(xp) = xp {
                                self.set_red(xp, false);
                                root = self.rotate_right(root, xp);
                            }
                            x = Some(root);
                        }
                    }
                }
            }
        }
    }

    /// Local consistency check of the subtree at `t`: traversal links agree,
    /// child links point back, hashes are ordered and no red node has a red
    /// child.
    pub(crate) fn check_invariants(&self, t: NodeId) -> bool {
        let node = &self[t];
        let TreeLinks {
            parent: tp,
            left: tl,
            right: tr,
            prev: tb,
            red,
        } = node.tree;
        let tn = node.next;
        if let Some(tb) = tb {
            if self[tb].next != Some(t) {
                return false;
            }
        }
        if let Some(tn) = tn {
            if self.links(tn).prev != Some(t) {
                return false;
            }
        }
        if let Some(tp) = tp {
            if self.links(tp).left != Some(t) && self.links(tp).right != Some(t) {
                return false;
            }
        }
        if let Some(tl) = tl {
            if self.links(tl).parent != Some(t) || self[tl].hash > node.hash {
                return false;
            }
        }
        if let Some(tr) = tr {
            if self.links(tr).parent != Some(t) || self[tr].hash < node.hash {
                return false;
            }
        }
        if red && (self.is_red(tl) || self.is_red(tr)) {
            return false;
        }
        tl.map_or(true, |l| self.check_invariants(l)) && tr.map_or(true, |r| self.check_invariants(r))
    }
}

impl<K: Eq, V> RawTable<K, V> {
    /// Make `root` the head of bucket `index`, moving it to the front of the
    /// traversal list.
    pub(crate) fn move_root_to_front(&mut self, index: usize, root: NodeId) {
        let first = self.buckets[index].head();
        if first != Some(root) {
            let rp = self.nodes.links(root).prev;
            let rn = self.nodes[root].next;
            if let Some(rn) = rn {
                self.nodes.links_mut(rn).prev = rp;
            }
            if let Some(rp) = rp {
                self.nodes[rp].next = rn;
            }
            if let Some(first) = first {
                self.nodes.links_mut(first).prev = Some(root);
            }
            self.nodes[root].next = first;
            self.nodes.links_mut(root).prev = None;
        }
        self.buckets[index] = Bucket::Tree(root);
        debug_assert!(self.nodes.check_invariants(root));
    }

    /// Build a red-black tree out of the traversal list starting at `head`,
    /// whose `prev`/`next` links are already in place.
    pub(crate) fn treeify(&mut self, index: usize, head: NodeId) {
        let key_order = self.key_order;
        let mut root: Option<NodeId> = None;
        let mut cur = Some(head);
        while let Some(x) = cur {
            cur = self.nodes[x].next;
            {
                let links = self.nodes.links_mut(x);
                links.left = None;
                links.right = None;
            }
            let Some(r) = root else {
                let links = self.nodes.links_mut(x);
                links.parent = None;
                links.red = false;
                root = Some(x);
                continue;
            };
            let mut p = r;
            loop {
                let dir = self.nodes.placement(x, p, key_order);
                let xp = p;
                let child = if dir == Ordering::Greater {
                    self.nodes.links(xp).right
                } else {
                    self.nodes.links(xp).left
                };
                match child {
                    Some(c) => p = c,
                    None => {
                        self.nodes.links_mut(x).parent = Some(xp);
                        if dir == Ordering::Greater {
                            self.nodes.links_mut(xp).right = Some(x);
                        } else {
                            self.nodes.links_mut(xp).left = Some(x);
                        }
                        root = Some(self.nodes.balance_insertion(r, x));
                        break;
                    }
                }
            }
        }
        if let Some(root) = root {
            self.move_root_to_front(index, root);
        }
    }

    /// Tree counterpart of the chain walk in `put_val`: returns the existing
    /// node for `key`, or links a new node in and rebalances.
    ///
    /// With `searched` set the caller has already established that the key is
    /// absent, so the one-time search of both subtrees is skipped.
    pub(crate) fn put_tree_val<H: Hooks<K, V>>(
        &mut self,
        hooks: &mut H,
        index: usize,
        first: NodeId,
        hash: u32,
        key: K,
        value: V,
        mut searched: bool,
    ) -> TreeInsert<K, V> {
        let key_order = self.key_order;
        let root = self.nodes.root_of(first);
        // Descend without touching the arena: user `eq` and key order run
        // here, and the new node is only allocated once its parent is known.
        let mut p = root;
        let (xp, dir) = loop {
            let ph = self.nodes[p].hash;
            let dir = if ph > hash {
                Ordering::Less
            } else if ph < hash {
                Ordering::Greater
            } else if self.nodes[p].key == key {
                return TreeInsert::Found(p, key, value);
            } else {
                let decided = key_order
                    .map(|f| f(&key, &self.nodes[p].key))
                    .filter(|o| *o != Ordering::Equal);
                match decided {
                    Some(dir) => dir,
                    None => {
                        if !searched {
                            searched = true;
                            if let Some(q) = self.find_in_children(p, hash, &key) {
                                return TreeInsert::Found(q, key, value);
                            }
                        }
                        // ties with existing nodes go right; `find` checks both sides
                        Ordering::Greater
                    }
                }
            };
            let child = if dir == Ordering::Greater {
                self.nodes.links(p).right
            } else {
                self.nodes.links(p).left
            };
            match child {
                Some(c) => p = c,
                None => break (p, dir),
            }
        };

        let x = self.nodes.insert(Node::new(hash, key, value));
        let xpn = self.nodes[xp].next;
        if dir == Ordering::Greater {
            self.nodes.links_mut(xp).right = Some(x);
        } else {
            self.nodes.links_mut(xp).left = Some(x);
        }
        self.nodes[xp].next = Some(x);
        self.nodes[x].next = xpn;
        {
            let links = self.nodes.links_mut(x);
            links.parent = Some(xp);
            links.prev = Some(xp);
        }
        if let Some(xpn) = xpn {
            self.nodes.links_mut(xpn).prev = Some(x);
        }
        hooks.new_node(x, NodeKind::Tree);
        let root = self.nodes.balance_insertion(root, x);
        self.move_root_to_front(index, root);
        TreeInsert::Inserted(x)
    }

    // One-time search of both subtrees of `p` for `key`.
    fn find_in_children(&self, p: NodeId, hash: u32, key: &K) -> Option<NodeId> {
        let key_order = self.key_order;
        let nodes = &self.nodes;
        let matches = |k: &K| k == key;
        let order = |k: &K| key_order.map(|f| f(key, k));
        let (pl, pr) = (nodes.links(p).left, nodes.links(p).right);
        pl.and_then(|ch| nodes.find(Some(ch), hash, &matches, &order))
            .or_else(|| pr.and_then(|ch| nodes.find(Some(ch), hash, &matches, &order)))
    }

    /// Unlink tree node `p` from bucket `index`. The node stays in the arena;
    /// the caller frees it.
    ///
    /// When `movable` is set the bucket may degenerate to a chain and the root
    /// is moved to the front afterwards. Cursor removal clears it so the
    /// traversal list ahead of the cursor is left untouched.
    pub(crate) fn remove_tree_node<H: Hooks<K, V>>(
        &mut self,
        hooks: &mut H,
        index: usize,
        p: NodeId,
        movable: bool,
    ) {
        let Some(old_first) = self.buckets[index].head() else {
            return;
        };
        let succ = self.nodes[p].next;
        let pred = self.nodes.links(p).prev;
        let first = match pred {
            None => {
                self.buckets[index] = succ.map_or(Bucket::Empty, Bucket::Tree);
                succ
            }
            Some(pred) => {
                self.nodes[pred].next = succ;
                Some(old_first)
            }
        };
        if let Some(succ) = succ {
            self.nodes.links_mut(succ).prev = pred;
        }
        let Some(first) = first else {
            return;
        };
        let mut root = self.nodes.root_of(old_first);
        if movable {
            let links = self.nodes.links(root);
            let too_small = links.right.is_none()
                || links
                    .left
                    .map_or(true, |rl| self.nodes.links(rl).left.is_none());
            if too_small {
                let head = self.untreeify(hooks, first);
                self.buckets[index] = Bucket::Chain(head);
                return;
            }
        }

        let TreeLinks {
            left: pl,
            right: pr,
            ..
        } = *self.nodes.links(p);
        let replacement = match (pl, pr) {
            (Some(pl), Some(pr)) => {
                let mut s = pr;
                while let Some(sl) = self.nodes.links(s).left {
                    s = sl;
                }
                // swap colors
                let c = self.nodes.links(s).red;
                let pc = self.nodes.links(p).red;
                self.nodes.set_red(s, pc);
                self.nodes.set_red(p, c);
                let sr = self.nodes.links(s).right;
                let pp = self.nodes.links(p).parent;
                if s == pr {
                    // p was s's direct parent
                    self.nodes.links_mut(p).parent = Some(s);
                    self.nodes.links_mut(s).right = Some(p);
                } else {
                    let sp = self.nodes.links(s).parent;
                    self.nodes.links_mut(p).parent = sp;
                    if let Some(sp) = sp {
                        if self.nodes.links(sp).left == Some(s) {
                            self.nodes.links_mut(sp).left = Some(p);
                        } else {
                            self.nodes.links_mut(sp).right = Some(p);
                        }
                    }
                    self.nodes.links_mut(s).right = Some(pr);
                    self.nodes.links_mut(pr).parent = Some(s);
                }
                self.nodes.links_mut(p).left = None;
                self.nodes.links_mut(p).right = sr;
                if let Some(sr) = sr {
                    self.nodes.links_mut(sr).parent = Some(p);
                }
                self.nodes.links_mut(s).left = Some(pl);
                self.nodes.links_mut(pl).parent = Some(s);
                self.nodes.links_mut(s).parent = pp;
                match pp {
                    None => root = s,
                    Some(pp) => {
                        if self.nodes.links(pp).left == Some(p) {
                            self.nodes.links_mut(pp).left = Some(s);
                        } else {
                            self.nodes.links_mut(pp).right = Some(s);
                        }
                    }
                }
                sr.unwrap_or(p)
            }
            (Some(pl), None) => pl,
            (None, Some(pr)) => pr,
            (None, None) => p,
        };
        if replacement != p {
            let pp = self.nodes.links(p).parent;
            self.nodes.links_mut(replacement).parent = pp;
            match pp {
                None => {
                    root = replacement;
                    self.nodes.set_red(replacement, false);
                }
                Some(pp) => {
                    if self.nodes.links(pp).left == Some(p) {
                        self.nodes.links_mut(pp).left = Some(replacement);
                    } else {
                        self.nodes.links_mut(pp).right = Some(replacement);
                    }
                }
            }
            let links = self.nodes.links_mut(p);
            links.left = None;
            links.right = None;
            links.parent = None;
        }

        let r = if self.nodes.links(p).red {
            root
        } else {
            self.nodes.balance_deletion(root, replacement)
        };

        if replacement == p {
            // detach
            let pp = self.nodes.links(p).parent;
            self.nodes.links_mut(p).parent = None;
            if let Some(pp) = pp {
                if self.nodes.links(pp).left == Some(p) {
                    self.nodes.links_mut(pp).left = None;
                } else if self.nodes.links(pp).right == Some(p) {
                    self.nodes.links_mut(pp).right = None;
                }
            }
        }
        self.nodes.set_red(r, false);
        if movable {
            self.move_root_to_front(index, r);
        }
    }
}
