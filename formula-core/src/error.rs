//! Error kinds reported by the catalog, the hierarchy fixer, the mutation engine and evaluation.
//!
//! Spans attached to these errors are byte ranges inside the canonical string form of the root
//! expression the operation was applied to.

use ariadne::Fmt;
use formula_attrs::ErrorKind;
use formula_error::EXPR;

/// A mutation that only applies to parameters was given another kind of value.
#[derive(Debug, Clone, ErrorKind, PartialEq)]
#[error(
    message = format!("expected a parameter, found {}", self.found),
    labels = ["this expression"],
    help = "parameter substitution only applies to parameter nodes",
)]
pub struct NotAParameter {
    /// Description of the value that was found.
    pub found: &'static str,
}

/// A mutation that only applies to operators and functions was given a leaf value.
#[derive(Debug, Clone, ErrorKind, PartialEq)]
#[error(
    message = format!("expected an operator or function, found {}", self.found),
    labels = ["this expression"],
)]
pub struct NotAnOperation {
    /// Description of the value that was found.
    pub found: &'static str,
}

/// An operand cannot be appended to a leaf value.
#[derive(Debug, Clone, ErrorKind, PartialEq)]
#[error(
    message = format!("{} cannot have operands", self.found),
    labels = ["this expression"],
    help = "operands can only be added to operators",
)]
pub struct CannotHaveOperands {
    /// Description of the value that was found.
    pub found: &'static str,
}

/// The option given to the sign mutation is outside of the supported range.
#[derive(Debug, Clone, ErrorKind, PartialEq)]
#[error(
    message = format!("sign mutation option `{}` is out of range", self.options),
    labels = ["while mutating this expression"],
    help = format!(
        "use {} to always negate, or {} to pick among that many sign mutations",
        "0".fg(EXPR),
        "1..=3".fg(EXPR),
    ),
)]
pub struct OptionOutOfRange {
    /// The option that was given.
    pub options: u8,
}

/// The node has fewer descendants than the requested index.
#[derive(Debug, Clone, ErrorKind, PartialEq)]
#[error(
    message = format!("there is no descendant at index {}", self.index),
    labels = [format!("this expression has {} descendant(s)", self.count)],
)]
pub struct DescendantOutOfRange {
    /// The requested breadth-first index.
    pub index: usize,

    /// The number of descendants of the node.
    pub count: usize,
}

/// An interior value could not be rebuilt from the children of its node.
#[derive(Debug, Clone, ErrorKind, PartialEq)]
#[error(
    message = format!("cannot rebuild `{}` from {} operand(s)", self.symbol, self.found),
    labels = ["this expression"],
    help = format!("`{}` takes exactly {} operands", self.symbol.fg(EXPR), self.expected),
)]
pub struct UnrecognizedShape {
    /// The symbol of the value being rebuilt.
    pub symbol: char,

    /// The number of operands the value takes.
    pub expected: usize,

    /// The number of children the node had.
    pub found: usize,
}

/// An operator with no operands was evaluated.
#[derive(Debug, Clone, ErrorKind, PartialEq)]
#[error(
    message = format!("cannot evaluate `{}` with no operands", self.symbol),
    labels = ["this operation"],
    help = "reduce the expression first: an empty sum reduces to `0`",
)]
pub struct EmptyOperation {
    /// The symbol of the empty operator.
    pub symbol: char,
}

/// The evaluation context has no value for a parameter.
#[derive(Debug, Clone, ErrorKind, PartialEq)]
#[error(
    message = format!("parameter `{{{}}}` is not bound", self.id),
    labels = ["this parameter"],
    help = "the evaluation context must provide a value for every parameter in the expression",
)]
pub struct UnboundParameter {
    /// The ID of the unbound parameter.
    pub id: u16,
}

/// A power is undefined for the numeric type, such as a negative base raised to a fractional
/// power.
#[derive(Debug, Clone, ErrorKind, PartialEq)]
#[error(
    message = format!("`{}^{}` is undefined", self.base, self.exponent),
    labels = ["this power"],
)]
pub struct UndefinedPower {
    /// The evaluated base.
    pub base: String,

    /// The evaluated exponent.
    pub exponent: String,
}

/// An operator or function name given to the registry does not exist.
#[derive(Debug, Clone, ErrorKind, PartialEq)]
#[error(
    message = format!("the `{}` arithmetic does not exist", self.name),
    labels = ["this name"],
    help = if self.suggestions.is_empty() {
        "the available operators are `sum` and `product`, and the available function is `exponent`"
            .to_string()
    } else if self.suggestions.len() == 1 {
        format!("did you mean `{}`?", (&*self.suggestions[0]).fg(EXPR))
    } else {
        format!(
            "did you mean one of these? {}",
            self.suggestions
                .iter()
                .map(|s| format!("`{}`", s.fg(EXPR)))
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
)]
pub struct UnknownArithmetic {
    /// The name that was given.
    pub name: String,

    /// Known names within a small edit distance of the given name.
    pub suggestions: Vec<String>,
}
