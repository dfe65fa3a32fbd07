//! Editing expressions through node trees.
//!
//! Canonical values are immutable, so an expression is edited by mapping it to a tree of nodes
//! (one node per operand occurrence), changing the tree, and rebuilding canonical values bottom-up
//! with [`EvaluationCatalog::fix_hierarchy`]. The fixer replaces every interior node with a fresh
//! node holding the value reproduced from its children, so after a fix every node's value agrees
//! with its children again.
//!
//! Most edits go through [`EvaluationCatalog::apply_clone`], which works on a copy of the tree so
//! that the source tree is never changed, and hands back the resulting root value.

use crate::arena::{Arena, NodeId};
use crate::catalog::Catalog;
use crate::error::{DescendantOutOfRange, UnrecognizedShape};
use crate::eval::{Children, EvalId, Shape};
use crate::numeric::Numeric;
use crate::reduce::product;
use crate::registry::Registry;
use formula_error::{Error, ErrorKind};
use once_cell::sync::OnceCell;
use std::ops::Range;
use tracing::{debug, trace};

/// A [`Catalog`] paired with the [`Arena`] its node trees are built in.
#[derive(Debug)]
pub struct EvaluationCatalog<N> {
    /// The canonical values.
    pub catalog: Catalog<N>,

    /// Storage for node trees.
    pub factory: Arena<EvalId>,

    /// Operators and functions available to mutations, [`Registry::default`] unless configured.
    registry: OnceCell<Registry>,
}

impl<N: Numeric> Default for EvaluationCatalog<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: Numeric> EvaluationCatalog<N> {
    /// Creates an empty catalog that mutates with every operator and function.
    pub fn new() -> Self {
        Self {
            catalog: Catalog::new(),
            factory: Arena::new(),
            registry: OnceCell::new(),
        }
    }

    /// Creates an empty catalog that mutates with the given operators and functions.
    pub fn with_registry(registry: Registry) -> Self {
        Self {
            catalog: Catalog::new(),
            factory: Arena::new(),
            registry: OnceCell::with_value(registry),
        }
    }

    /// The operators and functions available to mutations.
    pub fn registry(&self) -> &Registry {
        self.registry.get_or_init(Registry::default)
    }

    /// The value held by the node.
    pub fn value(&self, node: NodeId) -> EvalId {
        *self.factory.value(node)
    }

    /// Builds the full node tree of the value. The caller owns the returned root.
    pub fn map(&mut self, id: EvalId) -> NodeId {
        let node = self.factory.map(id);
        let operands = self.catalog.operands(id).to_vec();
        for op in operands {
            let child = self.map(op);
            self.factory.add(node, child);
        }
        node
    }

    /// Replaces the subtree under the node with the full tree of `id`.
    pub fn assign(&mut self, node: NodeId, id: EvalId) {
        self.factory.clear(node);
        self.factory.set_value(node, id);
        let operands = self.catalog.operands(id).to_vec();
        for op in operands {
            let child = self.map(op);
            self.factory.add(node, child);
        }
    }

    /// Returns the subtree rooted at the node to the arena.
    pub fn recycle(&mut self, node: NodeId) {
        self.factory.recycle(node);
    }

    /// The byte range of the node's value inside the canonical string form of its tree's root.
    pub fn node_span(&self, node: NodeId) -> Range<usize> {
        let root = self.factory.root(node);
        let root_value = self.value(root);
        self.catalog
            .locate(root_value, &self.factory.path(node))
            .unwrap_or(0..self.catalog.key(root_value).len())
    }

    /// Creates an error highlighting the node inside its tree's root.
    pub fn error_at_node(&self, node: NodeId, kind: impl ErrorKind + 'static) -> Error {
        Error::new(vec![self.node_span(node)], kind)
    }

    /// Rebuilds the values of the subtree rooted at `target` from its leaves up.
    ///
    /// Leaves keep their value and lose any children. Every interior node is replaced by a fresh
    /// node whose value is reproduced from its fixed children and registered. The fresh node takes
    /// the old node's place under its parent, and the old node is recycled.
    ///
    /// If `operate_directly` is false, a detached copy of the subtree is fixed instead and the
    /// original is left untouched.
    ///
    /// Returns the node now standing in for `target`.
    pub fn fix_hierarchy(&mut self, target: NodeId, operate_directly: bool) -> Result<NodeId, Error> {
        let target = if operate_directly {
            target
        } else {
            self.factory.clone_node(target)
        };
        self.fix_node(target)
    }

    fn fix_node(&mut self, target: NodeId) -> Result<NodeId, Error> {
        let value = self.value(target);
        let Some(shape) = self.catalog.get(value).shape() else {
            self.factory.clear(target);
            return Ok(target);
        };

        let children = self.factory.children(target).to_vec();
        let mut fixed = Vec::with_capacity(children.len());
        for child in children {
            let child = self.fix_node(child)?;
            fixed.push(self.value(child));
        }

        let found = fixed.len();
        let children = match shape {
            Shape::Sequence => Some(Children::Sequence(fixed)),
            Shape::Pair => match fixed[..] {
                [lhs, rhs] => Some(Children::Pair(lhs, rhs)),
                _ => None,
            },
        };
        let Some(reproduced) = children.and_then(|children| self.catalog.get(value).reproduce(children)) else {
            let symbol = self.catalog.get(value).symbol().unwrap_or('?');
            return Err(self.error_at_node(target, UnrecognizedShape { symbol, expected: 2, found }));
        };

        let id = self.catalog.register(reproduced);
        trace!(from = self.catalog.key(value), to = self.catalog.key(id), "fixed node");

        let node = self.factory.map(id);
        self.factory.adopt_children(node, target);
        self.order_children(node);
        if let Some(parent) = self.factory.parent(target) {
            self.factory.replace(parent, target, node);
        }
        self.factory.recycle(target);
        Ok(node)
    }

    /// Orders the children of a freshly fixed node to match the operands of its value, which may
    /// have been sorted on registration.
    fn order_children(&mut self, node: NodeId) {
        let operands = self.catalog.operands(self.value(node)).to_vec();
        let mut remaining = self.factory.children(node).to_vec();
        if remaining.iter().map(|&child| self.value(child)).eq(operands.iter().copied()) {
            return;
        }

        let mut ordered = Vec::with_capacity(remaining.len());
        for op in operands {
            let Some(index) = remaining.iter().position(|&child| self.value(child) == op) else {
                return;
            };
            ordered.push(remaining.remove(index));
        }
        self.factory.reorder_children(node, ordered);
    }

    /// Copies the whole tree containing `source`, runs `handler` on the copy of `source`, fixes
    /// the copied tree, and returns its new root value. The copy is recycled afterward, including
    /// when an error occurs.
    pub fn apply_clone<F>(&mut self, source: NodeId, handler: F) -> Result<EvalId, Error>
    where
        F: FnOnce(&mut Self, NodeId) -> Result<(), Error>,
    {
        let clone = self.factory.clone_tree(source);
        let root = self.factory.root(clone);
        match handler(self, clone).and_then(|()| self.fix_node(root)) {
            Ok(fixed) => {
                let value = self.value(fixed);
                self.factory.recycle(fixed);
                debug!(result = self.catalog.key(value), "applied edit to clone");
                Ok(value)
            },
            Err(err) => {
                self.factory.recycle(root);
                Err(err)
            },
        }
    }

    /// Detaches and recycles the node, then fixes the tree it was part of in place.
    ///
    /// Returns the new root, or [`None`] if the node was a root itself.
    pub fn remove_node(&mut self, node: NodeId) -> Result<Option<NodeId>, Error> {
        if self.factory.parent(node).is_none() {
            return Ok(None);
        }

        let root = self.factory.root(node);
        self.factory.recycle(node);
        self.fix_node(root).map(Some)
    }

    /// Returns the root value of a copy of the tree with the `index`-th descendant of `source`
    /// (in breadth-first order) removed.
    pub fn remove_descendant_at(&mut self, source: NodeId, index: usize) -> Result<EvalId, Error> {
        let count = self.factory.descendants(source).count();
        if index >= count {
            return Err(self.error_at_node(source, DescendantOutOfRange { index, count }));
        }

        self.apply_clone(source, |this, node| {
            let target = this.factory.descendants(node).nth(index);
            if let Some(target) = target {
                this.factory.recycle(target);
            }
            Ok(())
        })
    }

    /// Returns the root value of a copy of the tree with a constant appended to the operands of
    /// `source`, or [`None`] if `source` is not an operator.
    pub fn add_constant(&mut self, source: NodeId, value: N) -> Result<Option<EvalId>, Error> {
        if !matches!(self.catalog.get(self.value(source)).shape(), Some(Shape::Sequence)) {
            return Ok(None);
        }

        let constant = self.catalog.constant(value);
        self.apply_clone(source, |this, node| {
            this.factory.add_value(node, constant);
            Ok(())
        }).map(Some)
    }

    /// The constant multiple of the value: the value itself for constants, the product of its
    /// constant operands for products, and `1` otherwise.
    pub fn multiple_of(&self, id: EvalId) -> N {
        product::multiple_of(&self.catalog, id)
    }

    /// Returns the root value of a copy of the tree with the node multiplied by `multiple`.
    pub fn multiply_node(&mut self, node: NodeId, multiple: N) -> Result<EvalId, Error> {
        let value = self.value(node);
        let scaled = match self.catalog.get(value).as_constant().map(|n| n.times(&multiple)) {
            Some(n) => self.catalog.constant(n),
            None => self.catalog.product_of(multiple, value),
        };

        self.apply_clone(node, |this, clone| {
            this.assign(clone, scaled);
            Ok(())
        })
    }

    /// Returns the root value of a copy of the tree with `delta` added to the constant multiple of
    /// the node.
    ///
    /// `({0} * 3)` adjusted by `-1` becomes `({0} * 2)`; `{0}` adjusted by `1` becomes
    /// `({0} * 2)`.
    pub fn adjust_node_multiple(&mut self, node: NodeId, delta: N) -> Result<EvalId, Error> {
        let value = self.value(node);
        let adjusted = match self.catalog.get(value).as_constant().map(|n| n.plus(&delta)) {
            Some(n) => self.catalog.constant(n),
            None => match product::split_multiple(&mut self.catalog, value) {
                Some((remaining, multiple)) => {
                    self.catalog.product_of(multiple.plus(&delta), remaining)
                },
                None => self.catalog.product_of(N::one().plus(&delta), value),
            },
        };

        self.apply_clone(node, |this, clone| {
            this.assign(clone, adjusted);
            Ok(())
        })
    }
}
