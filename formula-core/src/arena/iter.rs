use std::collections::VecDeque;
use super::{Arena, NodeId};

/// An iterator over the descendants of a node in breadth-first order, excluding the node itself.
///
/// This iterator is created by [`Arena::descendants`].
pub struct BreadthFirst<'a, T> {
    arena: &'a Arena<T>,
    queue: VecDeque<NodeId>,
}

impl<'a, T> BreadthFirst<'a, T> {
    pub(super) fn new(arena: &'a Arena<T>, id: NodeId) -> Self {
        Self {
            arena,
            queue: arena.children(id).iter().copied().collect(),
        }
    }
}

impl<'a, T> Iterator for BreadthFirst<'a, T> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.queue.pop_front()?;
        self.queue.extend(self.arena.children(id));
        Some(id)
    }
}

/// An iterator that iteratively traverses a subtree in left-to-right post-order (i.e.
/// depth-first).
///
/// This iterator is created by [`Arena::post_order`].
pub struct PostOrder<'a, T> {
    arena: &'a Arena<T>,
    stack: Vec<NodeId>,
    last_visited: Option<NodeId>,
}

impl<'a, T> PostOrder<'a, T> {
    pub(super) fn new(arena: &'a Arena<T>, id: NodeId) -> Self {
        Self {
            arena,
            stack: vec![id],
            last_visited: None,
        }
    }

    /// Pops the current node in the stack and marks it as the last visited node.
    fn visit(&mut self) -> Option<NodeId> {
        self.last_visited = Some(self.stack.pop()?);
        self.last_visited
    }
}

impl<'a, T> Iterator for PostOrder<'a, T> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let id = *self.stack.last()?;
            let children = self.arena.children(id);
            match children.last() {
                Some(&last) if self.last_visited != Some(last) => {
                    self.stack.extend(children.iter().rev());
                },
                _ => return self.visit(),
            }
        }
    }
}
