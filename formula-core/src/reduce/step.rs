use crate::eval::OperatorKind;

/// A step taken while reducing an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// `a + (b + c) = a + b + c`
    ///
    /// An operand of the same operator was spliced into its parent.
    Flatten(OperatorKind),

    /// `() = 0`
    ///
    /// An operator with no operands collapsed to its identity.
    CollapseEmpty(OperatorKind),

    /// `(a) = a`
    Unwrap(OperatorKind),

    /// `2a + 4a = 6a`
    FactorProducts,

    /// `2 + 3 = 5`, `2 * 3 = 6` or `2 ^ 3 = 8`
    FoldConstants,

    /// `0 * a = 0`
    MultiplyZero,

    /// `a ^ 1 = a`
    PowerOne,
}
