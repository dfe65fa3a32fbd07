//! Interning of expression values.
//!
//! A [`Catalog`] stores every [`Evaluation`] it has seen exactly once, keyed by its **canonical
//! string form**. Registering a value that prints the same as an existing one returns the existing
//! handle, so handle equality is structural equality.
//!
//! Before a value is keyed, it is brought into canonical form:
//!
//! - Constants are normalized (so `-0` and `0` are the same constant).
//! - The operands of commutative operators are sorted: parameters first in ID order, then compound
//!   expressions, then constants last.
//!
//! The canonical string forms look like this:
//!
//! | Value | Form |
//! | --- | --- |
//! | `Constant(2.5)` | `2.5` |
//! | `Parameter(3)` | `{3}` |
//! | `Sum(a, b, c)` | `(a + b + c)` |
//! | `Product(a, b)` | `(a * b)` |
//! | `Exponent(a, b)` | `(a^b)` |
//!
//! Operators with fewer than two operands spell out their symbol, as in `(+)` or `(* {0})`, so
//! they never collide with each other.
//!
//! The catalog also owns the memo of reduced forms; see [`crate::reduce`].

mod evaluate;

use crate::eval::{EvalId, Evaluation, FunctionKind, OperatorKind};
use crate::numeric::Numeric;
use std::{collections::{BTreeSet, HashMap}, ops::Range, rc::Rc};
use tracing::trace;

/// A registered value and its canonical string form.
#[derive(Debug, Clone)]
struct Entry<N> {
    value: Evaluation<N>,
    key: Rc<str>,
}

/// Interns [`Evaluation`]s by their canonical string form.
#[derive(Debug, Clone)]
pub struct Catalog<N> {
    /// Registered values, indexed by [`EvalId`].
    items: Vec<Entry<N>>,

    /// Canonical string forms (and aliases given to [`Catalog::register_with`]) to handles.
    index: HashMap<Rc<str>, EvalId>,

    /// Memo of reduced forms, from source to reduced value.
    pub(crate) reduced: HashMap<EvalId, EvalId>,
}

impl<N> Default for Catalog<N> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            index: HashMap::new(),
            reduced: HashMap::new(),
        }
    }
}

/// The opening of an operator's canonical string form, up to its first operand.
fn operator_prefix(kind: OperatorKind, len: usize) -> String {
    match len {
        0 => format!("({}", kind.symbol()),
        1 => format!("({} ", kind.symbol()),
        _ => "(".to_string(),
    }
}

impl<N: Numeric> Catalog<N> {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of distinct registered values.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the registered value.
    ///
    /// Panics if the handle was created by another catalog.
    pub fn get(&self, id: EvalId) -> &Evaluation<N> {
        &self.items[id.index()].value
    }

    /// Returns the canonical string form of the registered value.
    pub fn key(&self, id: EvalId) -> &str {
        &self.items[id.index()].key
    }

    /// Returns the operands of the registered value, empty for constants and parameters.
    pub fn operands(&self, id: EvalId) -> &[EvalId] {
        self.get(id).operands()
    }

    /// Looks up a registered value by its canonical string form or alias.
    pub fn try_get_item(&self, key: &str) -> Option<EvalId> {
        self.index.get(key).copied()
    }

    /// Registers the value, returning the handle of the structurally equal value if one was
    /// registered before.
    ///
    /// Panics if more than `u32::MAX` distinct values are registered.
    pub fn register(&mut self, value: Evaluation<N>) -> EvalId {
        let value = self.canonicalize(value);
        let key = self.render(&value);
        if let Some(&id) = self.index.get(key.as_str()) {
            return id;
        }

        let id = EvalId(u32::try_from(self.items.len()).expect("catalog exceeded u32::MAX entries"));
        let key: Rc<str> = key.into();
        trace!(%id, key = &*key, "registered evaluation");
        self.index.insert(Rc::clone(&key), id);
        self.items.push(Entry { value, key });
        id
    }

    /// Returns the value registered under `key`, or builds it with `factory` and registers it.
    ///
    /// If the built value's canonical string form differs from `key`, `key` becomes an alias that
    /// [`Catalog::try_get_item`] resolves to the same handle.
    pub fn register_with(
        &mut self,
        key: &str,
        factory: impl FnOnce(&str) -> Evaluation<N>,
    ) -> EvalId {
        if let Some(id) = self.try_get_item(key) {
            return id;
        }

        let id = self.register(factory(key));
        if self.key(id) != key {
            trace!(%id, alias = key, "aliased evaluation");
            self.index.insert(Rc::from(key), id);
        }
        id
    }

    /// Registers a constant.
    pub fn constant(&mut self, n: N) -> EvalId {
        let n = n.normalize();
        let key = n.to_string();
        self.register_with(&key, move |_| Evaluation::Constant(n))
    }

    /// Registers a parameter.
    pub fn parameter(&mut self, id: u16) -> EvalId {
        self.register_with(&format!("{{{}}}", id), |_| Evaluation::Parameter(id))
    }

    /// Registers an operator applied to the operands.
    pub fn operator(&mut self, kind: OperatorKind, operands: Vec<EvalId>) -> EvalId {
        self.register(Evaluation::Operator(kind, operands))
    }

    /// Registers the sum of the operands.
    pub fn sum(&mut self, operands: Vec<EvalId>) -> EvalId {
        self.operator(OperatorKind::Sum, operands)
    }

    /// Registers the product of the operands.
    pub fn product(&mut self, operands: Vec<EvalId>) -> EvalId {
        self.operator(OperatorKind::Product, operands)
    }

    /// Registers a function applied to two operands.
    pub fn function(&mut self, kind: FunctionKind, lhs: EvalId, rhs: EvalId) -> EvalId {
        self.register(Evaluation::Function(kind, [lhs, rhs]))
    }

    /// Registers `base ^ power`.
    pub fn exponent(&mut self, base: EvalId, power: EvalId) -> EvalId {
        self.function(FunctionKind::Exponent, base, power)
    }

    /// The set of parameter IDs appearing anywhere in the value, including the value itself.
    pub fn parameters(&self, id: EvalId) -> BTreeSet<u16> {
        let mut found = BTreeSet::new();
        let mut stack = vec![id];
        while let Some(id) = stack.pop() {
            match self.get(id) {
                Evaluation::Parameter(p) => {
                    found.insert(*p);
                },
                value => stack.extend(value.operands()),
            }
        }
        found
    }

    /// The number of distinct parameters appearing anywhere in the value.
    pub fn distinct_parameters(&self, id: EvalId) -> usize {
        self.parameters(id).len()
    }

    /// Returns true if the value is an exponent whose power is the constant `0.5`.
    pub fn is_square_root(&self, id: EvalId) -> bool {
        match self.get(id) {
            Evaluation::Function(FunctionKind::Exponent, [_, power]) => self.get(*power)
                .as_constant()
                .map_or(false, |n| n.to_f64() == 0.5),
            _ => false,
        }
    }

    /// Finds the byte range of a sub-expression inside the canonical string form of `root`. The
    /// sub-expression is reached by following operand indexes from `root`.
    pub fn locate(&self, root: EvalId, path: &[usize]) -> Option<Range<usize>> {
        let mut start = 0;
        let mut id = root;
        for &index in path {
            let value = self.get(id);
            let (prefix, separator) = match value {
                Evaluation::Operator(kind, operands) => {
                    (operator_prefix(*kind, operands.len()).len(), kind.separator().len())
                },
                Evaluation::Function(kind, _) => (1, kind.symbol().len_utf8()),
                _ => return None,
            };

            let operands = value.operands();
            let target = *operands.get(index)?;
            start += prefix + operands[..index]
                .iter()
                .map(|&op| self.key(op).len() + separator)
                .sum::<usize>();
            id = target;
        }
        Some(start..start + self.key(id).len())
    }

    /// Brings the value into canonical form.
    fn canonicalize(&self, value: Evaluation<N>) -> Evaluation<N> {
        match value {
            Evaluation::Constant(n) => Evaluation::Constant(n.normalize()),
            Evaluation::Operator(kind, mut operands) => {
                operands.sort_by_key(|&id| self.order(id));
                Evaluation::Operator(kind, operands)
            },
            value => value,
        }
    }

    /// Sort key of an operand of a commutative operator.
    fn order(&self, id: EvalId) -> (u8, u16, &str) {
        match self.get(id) {
            Evaluation::Parameter(p) => (0, *p, ""),
            Evaluation::Operator(..) | Evaluation::Function(..) => (1, 0, self.key(id)),
            Evaluation::Constant(_) => (2, 0, self.key(id)),
        }
    }

    /// Builds the canonical string form of a canonical value.
    fn render(&self, value: &Evaluation<N>) -> String {
        match value {
            Evaluation::Constant(n) => n.to_string(),
            Evaluation::Parameter(p) => format!("{{{}}}", p),
            Evaluation::Operator(kind, operands) => {
                let mut out = operator_prefix(*kind, operands.len());
                for (i, &op) in operands.iter().enumerate() {
                    if i > 0 {
                        out.push_str(kind.separator());
                    }
                    out.push_str(self.key(op));
                }
                out.push(')');
                out
            },
            Evaluation::Function(kind, [lhs, rhs]) => {
                format!("({}{}{})", self.key(*lhs), kind.symbol(), self.key(*rhs))
            },
        }
    }
}
