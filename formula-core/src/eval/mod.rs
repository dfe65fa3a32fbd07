//! The closed set of expression values.
//!
//! An [`Evaluation`] is one of four kinds:
//!
//! - [`Evaluation::Constant`]: a number.
//! - [`Evaluation::Parameter`]: an ordinal ID, resolved against a [`Context`] when evaluated.
//! - [`Evaluation::Operator`]: an n-ary, associative and commutative operator, such as a sum.
//! - [`Evaluation::Function`]: a fixed-arity function of exactly two operands, such as
//!   exponentiation.
//!
//! Operands are referred to by [`EvalId`], a handle into a [`Catalog`](crate::catalog::Catalog).
//! Handles are only handed out by registration, so every operand of every value is canonical,
//! while the value itself may be a fresh, unregistered intermediate until it is passed to
//! [`Catalog::register`](crate::catalog::Catalog::register).
//!
//! Values are immutable: an edit never changes a value, it builds a new one with
//! [`Evaluation::reproduce`].

mod ctxt;

pub use ctxt::Context;

use crate::numeric::Numeric;
use std::fmt;

/// Handle to a canonical [`Evaluation`] registered in a [`Catalog`](crate::catalog::Catalog).
///
/// Two handles from the same catalog are equal if and only if they refer to structurally equal
/// expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EvalId(pub(crate) u32);

impl EvalId {
    /// Returns the raw slot index.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for EvalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EvalId({})", self.0)
    }
}

/// An n-ary operator that is both associative and commutative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorKind {
    /// Addition of all operands.
    Sum,

    /// Multiplication of all operands.
    Product,
}

impl OperatorKind {
    /// Every operator kind.
    pub const ALL: [OperatorKind; 2] = [OperatorKind::Sum, OperatorKind::Product];

    /// The symbol displayed for this operator.
    pub fn symbol(self) -> char {
        match self {
            Self::Sum => '+',
            Self::Product => '*',
        }
    }

    /// The string placed between operands in the canonical string form.
    pub fn separator(self) -> &'static str {
        match self {
            Self::Sum => " + ",
            Self::Product => " * ",
        }
    }

    /// The name used to select this operator in a [`Registry`](crate::registry::Registry).
    pub fn name(self) -> &'static str {
        match self {
            Self::Sum => "sum",
            Self::Product => "product",
        }
    }

    /// Looks up an operator by its registry name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// The identity element: the result of combining an empty set of operands.
    pub fn identity<N: Numeric>(self) -> N {
        match self {
            Self::Sum => N::zero(),
            Self::Product => N::one(),
        }
    }

    /// Combines two values with this operator.
    pub fn combine<N: Numeric>(self, lhs: &N, rhs: &N) -> N {
        match self {
            Self::Sum => lhs.plus(rhs),
            Self::Product => lhs.times(rhs),
        }
    }
}

/// A function of exactly two operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionKind {
    /// `base ^ power`.
    Exponent,
}

impl FunctionKind {
    /// Every function kind.
    pub const ALL: [FunctionKind; 1] = [FunctionKind::Exponent];

    /// The symbol displayed for this function, between its two operands.
    pub fn symbol(self) -> char {
        match self {
            Self::Exponent => '^',
        }
    }

    /// The name used to select this function in a [`Registry`](crate::registry::Registry).
    pub fn name(self) -> &'static str {
        match self {
            Self::Exponent => "exponent",
        }
    }

    /// Looks up a function by its registry name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Applies the function, returning [`None`] if the result is undefined.
    pub fn apply<N: Numeric>(self, lhs: &N, rhs: &N) -> Option<N> {
        match self {
            Self::Exponent => lhs.power(rhs),
        }
    }
}

/// How an interior value is rebuilt from new children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// Any number of operands, in order.
    Sequence,

    /// Exactly two operands.
    Pair,
}

/// New children for [`Evaluation::reproduce`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Children {
    /// Operands of an operator.
    Sequence(Vec<EvalId>),

    /// Operands of a function.
    Pair(EvalId, EvalId),
}

/// An expression value.
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation<N> {
    /// A number.
    Constant(N),

    /// A value supplied by the evaluation context.
    Parameter(u16),

    /// An operator applied to any number of operands.
    Operator(OperatorKind, Vec<EvalId>),

    /// A function applied to exactly two operands.
    Function(FunctionKind, [EvalId; 2]),
}

impl<N> Evaluation<N> {
    /// Describes the kind of value, for error messages.
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Constant(_) => "a constant",
            Self::Parameter(_) => "a parameter",
            Self::Operator(..) => "an operator",
            Self::Function(..) => "a function",
        }
    }

    /// The symbol of an operator or function.
    pub fn symbol(&self) -> Option<char> {
        match self {
            Self::Operator(kind, _) => Some(kind.symbol()),
            Self::Function(kind, _) => Some(kind.symbol()),
            _ => None,
        }
    }

    /// The operands of the value, empty for constants and parameters.
    pub fn operands(&self) -> &[EvalId] {
        match self {
            Self::Operator(_, operands) => operands,
            Self::Function(_, operands) => operands,
            _ => &[],
        }
    }

    /// Returns true if the value is a [`Evaluation::Constant`].
    pub fn is_constant(&self) -> bool {
        matches!(self, Self::Constant(_))
    }

    /// If the value is a [`Evaluation::Constant`], returns a reference to the number.
    pub fn as_constant(&self) -> Option<&N> {
        match self {
            Self::Constant(n) => Some(n),
            _ => None,
        }
    }

    /// Returns true if the value is an operator of the given kind.
    pub fn is_operator(&self, kind: OperatorKind) -> bool {
        matches!(self, Self::Operator(k, _) if *k == kind)
    }

    /// How the value is rebuilt from new children, or [`None`] for values that cannot have
    /// children.
    pub fn shape(&self) -> Option<Shape> {
        match self {
            Self::Operator(..) => Some(Shape::Sequence),
            Self::Function(..) => Some(Shape::Pair),
            _ => None,
        }
    }

    /// Builds a new value of the same kind from the given children.
    ///
    /// Returns [`None`] if the children do not match [`Evaluation::shape`].
    pub fn reproduce(&self, children: Children) -> Option<Evaluation<N>> {
        match (self, children) {
            (Self::Operator(kind, _), Children::Sequence(operands)) => {
                Some(Self::Operator(*kind, operands))
            },
            (Self::Function(kind, _), Children::Pair(lhs, rhs)) => {
                Some(Self::Function(*kind, [lhs, rhs]))
            },
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use super::*;

    #[test]
    fn reproduce_matches_shape() {
        let sum = Evaluation::<f64>::Operator(OperatorKind::Sum, vec![EvalId(0), EvalId(1)]);
        assert_eq!(
            sum.reproduce(Children::Sequence(vec![EvalId(2)])),
            Some(Evaluation::Operator(OperatorKind::Sum, vec![EvalId(2)])),
        );
        assert_eq!(sum.reproduce(Children::Pair(EvalId(2), EvalId(3))), None);

        let exp = Evaluation::<f64>::Function(FunctionKind::Exponent, [EvalId(0), EvalId(1)]);
        assert_eq!(
            exp.reproduce(Children::Pair(EvalId(1), EvalId(0))),
            Some(Evaluation::Function(FunctionKind::Exponent, [EvalId(1), EvalId(0)])),
        );
        assert_eq!(exp.reproduce(Children::Sequence(vec![EvalId(1)])), None);
    }

    #[test]
    fn leaves_have_no_shape() {
        assert_eq!(Evaluation::Constant(1.0).shape(), None);
        assert_eq!(Evaluation::<f64>::Parameter(0).shape(), None);
        assert!(Evaluation::<f64>::Parameter(0).operands().is_empty());
    }

    #[test]
    fn operator_identities() {
        assert_eq!(OperatorKind::Sum.identity::<i64>(), 0);
        assert_eq!(OperatorKind::Product.identity::<i64>(), 1);
        assert_eq!(OperatorKind::Product.combine(&3, &4), 12i64);
        assert_eq!(OperatorKind::from_name("product"), Some(OperatorKind::Product));
        assert_eq!(FunctionKind::from_name("pow"), None);
    }
}
