//! Pooled storage for tree nodes.
//!
//! A [`Node`] is a position in a tree: it holds a value, an ordered list of children and a link
//! to its parent. Nodes live in an [`Arena`] and are addressed by [`NodeId`] handles, so a tree is
//! simply the closure of a root handle and everything reachable through `children`.
//!
//! Trees built from canonical values are cheap to throw away: [`Arena::recycle`] returns a whole
//! subtree to the arena's free list, and the next [`Arena::acquire`] reuses the slot instead of
//! growing the backing storage. Recycling is purely an optimization; a node that is never
//! recycled simply keeps its slot.
//!
//! # Ownership
//!
//! Every node has exactly one owner: either its parent, or whoever holds the root handle. The
//! arena does not reference count. Accessing a recycled node, recycling a node twice, or
//! attaching a node that already has a parent are programming errors and panic.

mod iter;

pub use iter::{BreadthFirst, PostOrder};

use std::fmt;

/// Handle to a node stored in an [`Arena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u32);

impl NodeId {
    /// Returns the raw slot index.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

/// A tree position.
#[derive(Debug, Clone, PartialEq)]
pub struct Node<T> {
    /// The value held by this node.
    pub value: T,

    /// The node's parent, if it is attached to one.
    parent: Option<NodeId>,

    /// The node's children, in order.
    children: Vec<NodeId>,
}

impl<T> Node<T> {
    /// The node's parent, if any.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// The node's children, in order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// A slot of the arena.
#[derive(Debug, Clone)]
enum Slot<T> {
    Occupied(Node<T>),
    Free { next: Option<u32> },
}

/// Usage statistics of an [`Arena`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArenaStats {
    /// Number of slots ever allocated.
    pub total_slots: usize,

    /// Number of slots currently holding a node.
    pub live: usize,

    /// Number of slots waiting in the free list.
    pub pooled: usize,
}

/// Contiguous storage for nodes with free-list reuse.
#[derive(Debug, Clone)]
pub struct Arena<T> {
    slots: Vec<Slot<T>>,
    free_head: Option<u32>,
    live: usize,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Arena<T> {
    /// Creates an empty arena.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_head: None,
            live: 0,
        }
    }

    /// Fetches a node from the pool, or allocates a new one. The node holds the given value, has
    /// no children and no parent.
    pub fn acquire(&mut self, value: T) -> NodeId {
        let node = Node { value, parent: None, children: Vec::new() };
        self.live += 1;
        match self.free_head {
            Some(idx) => {
                let slot = &mut self.slots[idx as usize];
                let Slot::Free { next } = *slot else {
                    panic!("corrupt free list at slot {}", idx);
                };
                self.free_head = next;
                *slot = Slot::Occupied(node);
                NodeId(idx)
            },
            None => {
                let idx = u32::try_from(self.slots.len()).expect("arena exceeded u32::MAX slots");
                self.slots.push(Slot::Occupied(node));
                NodeId(idx)
            },
        }
    }

    /// Wraps a bare value in a fresh childless node.
    #[inline]
    pub fn map(&mut self, value: T) -> NodeId {
        self.acquire(value)
    }

    /// Returns the node with the given handle.
    ///
    /// Panics if the node was recycled.
    pub fn get(&self, id: NodeId) -> &Node<T> {
        match self.slots.get(id.index()) {
            Some(Slot::Occupied(node)) => node,
            _ => panic!("accessing recycled or unknown node {}", id),
        }
    }

    fn get_mut(&mut self, id: NodeId) -> &mut Node<T> {
        match self.slots.get_mut(id.index()) {
            Some(Slot::Occupied(node)) => node,
            _ => panic!("accessing recycled or unknown node {}", id),
        }
    }

    /// Returns true if the handle refers to a live node.
    pub fn contains(&self, id: NodeId) -> bool {
        matches!(self.slots.get(id.index()), Some(Slot::Occupied(_)))
    }

    /// The value held by the node.
    pub fn value(&self, id: NodeId) -> &T {
        &self.get(id).value
    }

    /// Replaces the value held by the node, returning the old one.
    pub fn set_value(&mut self, id: NodeId, value: T) -> T {
        std::mem::replace(&mut self.get_mut(id).value, value)
    }

    /// The node's parent, if any.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).parent
    }

    /// The node's children, in order.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.get(id).children
    }

    /// Follows parent links up to the root of the tree containing the node.
    pub fn root(&self, mut id: NodeId) -> NodeId {
        while let Some(parent) = self.parent(id) {
            id = parent;
        }
        id
    }

    /// Returns the child indexes leading from the root of the tree to the node.
    pub fn path(&self, mut id: NodeId) -> Vec<usize> {
        let mut path = Vec::new();
        while let Some(parent) = self.parent(id) {
            let index = self.children(parent)
                .iter()
                .position(|&child| child == id)
                .expect("node is missing from its parent's children");
            path.push(index);
            id = parent;
        }
        path.reverse();
        path
    }

    /// Follows the given child indexes down from a node.
    pub fn descend(&self, mut id: NodeId, path: &[usize]) -> Option<NodeId> {
        for &index in path {
            id = *self.children(id).get(index)?;
        }
        Some(id)
    }

    /// Appends a detached node to the children of `parent`.
    ///
    /// Panics if `child` is already attached somewhere.
    pub fn add(&mut self, parent: NodeId, child: NodeId) {
        self.attach(parent, child);
        self.get_mut(parent).children.push(child);
    }

    /// Wraps the value in a fresh node and appends it to the children of `parent`.
    pub fn add_value(&mut self, parent: NodeId, value: T) -> NodeId {
        let child = self.acquire(value);
        self.add(parent, child);
        child
    }

    /// Detaches `child` from `parent`. The detached subtree is now owned by the caller.
    ///
    /// Returns false if `child` is not a child of `parent`.
    pub fn remove(&mut self, parent: NodeId, child: NodeId) -> bool {
        let children = &mut self.get_mut(parent).children;
        let Some(index) = children.iter().position(|&c| c == child) else {
            return false;
        };
        children.remove(index);
        self.get_mut(child).parent = None;
        true
    }

    /// Puts the detached node `new` in the position of `old` among the children of `parent`.
    /// `old` is detached and owned by the caller afterward.
    ///
    /// Returns false if `old` is not a child of `parent`.
    pub fn replace(&mut self, parent: NodeId, old: NodeId, new: NodeId) -> bool {
        let Some(index) = self.children(parent).iter().position(|&c| c == old) else {
            return false;
        };
        self.attach(parent, new);
        self.get_mut(parent).children[index] = new;
        self.get_mut(old).parent = None;
        true
    }

    /// Detaches and recycles every child of the node.
    pub fn clear(&mut self, id: NodeId) {
        let children = std::mem::take(&mut self.get_mut(id).children);
        for child in children {
            self.get_mut(child).parent = None;
            self.recycle(child);
        }
    }

    /// Moves every child of `from` to the end of the children of `to`, preserving their order.
    pub fn adopt_children(&mut self, to: NodeId, from: NodeId) {
        let children = std::mem::take(&mut self.get_mut(from).children);
        for &child in &children {
            self.get_mut(child).parent = Some(to);
        }
        self.get_mut(to).children.extend(children);
    }

    /// Replaces the order of the node's children. `order` must be a permutation of the current
    /// children.
    pub fn reorder_children(&mut self, id: NodeId, order: Vec<NodeId>) {
        let children = &mut self.get_mut(id).children;
        debug_assert_eq!(children.len(), order.len(), "reordering must keep every child");
        debug_assert!(order.iter().all(|child| children.contains(child)));
        *children = order;
    }

    /// Returns the subtree rooted at the node to the pool. The node is detached from its parent
    /// first. None of the recycled handles may be used afterward.
    ///
    /// Panics if the node was already recycled.
    pub fn recycle(&mut self, id: NodeId) {
        assert!(self.contains(id), "node {} recycled twice", id);
        if let Some(parent) = self.parent(id) {
            self.remove(parent, id);
        }

        let mut stack = vec![id];
        while let Some(id) = stack.pop() {
            let slot = std::mem::replace(
                &mut self.slots[id.index()],
                Slot::Free { next: self.free_head },
            );
            let Slot::Occupied(node) = slot else {
                panic!("node {} recycled twice", id);
            };
            self.free_head = Some(id.0);
            self.live -= 1;
            stack.extend(node.children);
        }
    }

    /// Marks `parent` as the parent of the detached node `child`.
    fn attach(&mut self, parent: NodeId, child: NodeId) {
        assert_ne!(parent, child, "a node cannot be its own child");
        let node = self.get_mut(child);
        assert!(node.parent.is_none(), "node {} is already attached to a parent", child);
        node.parent = Some(parent);
    }

    /// Iterates over the descendants of the node in breadth-first order, excluding the node
    /// itself.
    pub fn descendants(&self, id: NodeId) -> BreadthFirst<'_, T> {
        BreadthFirst::new(self, id)
    }

    /// Iterates over the subtree rooted at the node in left-to-right post-order (i.e.
    /// depth-first), ending with the node itself.
    pub fn post_order(&self, id: NodeId) -> PostOrder<'_, T> {
        PostOrder::new(self, id)
    }

    /// Returns usage statistics.
    pub fn stats(&self) -> ArenaStats {
        ArenaStats {
            total_slots: self.slots.len(),
            live: self.live,
            pooled: self.slots.len() - self.live,
        }
    }
}

impl<T: Clone> Arena<T> {
    /// Deep-copies the subtree rooted at the node. The copy is detached.
    pub fn clone_node(&mut self, id: NodeId) -> NodeId {
        let value = self.value(id).clone();
        let copy = self.acquire(value);
        let children = self.children(id).to_vec();
        for child in children {
            let child_copy = self.clone_node(child);
            self.add(copy, child_copy);
        }
        copy
    }

    /// Deep-copies the whole tree containing the node, and returns the node's counterpart in the
    /// copy. The copy's root can be found with [`Arena::root`].
    pub fn clone_tree(&mut self, id: NodeId) -> NodeId {
        let path = self.path(id);
        let root = self.clone_node(self.root(id));
        self.descend(root, &path)
            .expect("cloned tree has the same shape as the original")
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use super::*;

    /// Builds `a(b, c(d))`.
    fn sample(arena: &mut Arena<char>) -> [NodeId; 4] {
        let a = arena.acquire('a');
        let b = arena.add_value(a, 'b');
        let c = arena.add_value(a, 'c');
        let d = arena.add_value(c, 'd');
        [a, b, c, d]
    }

    fn values(arena: &Arena<char>, ids: impl Iterator<Item = NodeId>) -> String {
        ids.map(|id| *arena.value(id)).collect()
    }

    #[test]
    fn structure_links() {
        let mut arena = Arena::new();
        let [a, b, c, d] = sample(&mut arena);
        assert_eq!(arena.parent(b), Some(a));
        assert_eq!(arena.children(a), &[b, c]);
        assert_eq!(arena.root(d), a);
        assert_eq!(arena.path(d), vec![1, 0]);
        assert_eq!(arena.descend(a, &[1, 0]), Some(d));
    }

    #[test]
    fn traversal_orders() {
        let mut arena = Arena::new();
        let [a, ..] = sample(&mut arena);
        assert_eq!(values(&arena, arena.descendants(a)), "bcd");
        assert_eq!(values(&arena, arena.post_order(a)), "bdca");
    }

    #[test]
    fn recycled_slots_are_reused() {
        let mut arena = Arena::new();
        let [a, _, c, _] = sample(&mut arena);
        arena.recycle(c);
        assert_eq!(arena.children(a).len(), 1);
        assert_eq!(arena.stats(), ArenaStats { total_slots: 4, live: 2, pooled: 2 });

        let e = arena.acquire('e');
        assert!(e.index() < 4);
        assert_eq!(arena.stats().total_slots, 4);
        assert!(arena.children(e).is_empty());
        assert_eq!(arena.parent(e), None);
    }

    #[test]
    fn clone_tree_is_independent() {
        let mut arena = Arena::new();
        let [a, _, _, d] = sample(&mut arena);
        let d2 = arena.clone_tree(d);
        assert_ne!(d, d2);
        assert_eq!(*arena.value(d2), 'd');

        let a2 = arena.root(d2);
        arena.set_value(d2, 'x');
        assert_eq!(values(&arena, arena.post_order(a)), "bdca");
        assert_eq!(values(&arena, arena.post_order(a2)), "bxca");
    }

    #[test]
    fn replace_and_clear() {
        let mut arena = Arena::new();
        let [a, b, c, _] = sample(&mut arena);
        let e = arena.acquire('e');
        assert!(arena.replace(a, b, e));
        assert_eq!(arena.parent(b), None);
        assert_eq!(arena.children(a), &[e, c]);
        arena.recycle(b);

        arena.clear(a);
        assert!(arena.children(a).is_empty());
        assert_eq!(arena.stats().live, 1);
    }

    #[test]
    fn reorder_children_keeps_links() {
        let mut arena = Arena::new();
        let [a, b, c, d] = sample(&mut arena);
        arena.reorder_children(a, vec![c, b]);
        assert_eq!(values(&arena, arena.post_order(a)), "dcba");
        assert_eq!(arena.path(d), vec![0, 0]);
        assert_eq!(arena.parent(b), Some(a));
    }

    #[test]
    #[should_panic(expected = "recycled twice")]
    fn double_recycle_panics() {
        let mut arena = Arena::new();
        let [a, ..] = sample(&mut arena);
        arena.recycle(a);
        arena.recycle(a);
    }

    #[test]
    #[should_panic(expected = "already attached")]
    fn attaching_attached_node_panics() {
        let mut arena = Arena::new();
        let [_, b, c, _] = sample(&mut arena);
        arena.add(c, b);
    }
}
