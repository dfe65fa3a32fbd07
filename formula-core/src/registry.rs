//! The set of operators and functions that mutations may introduce.

use crate::error::UnknownArithmetic;
use crate::eval::{FunctionKind, OperatorKind};
use formula_error::Error;
use levenshtein::levenshtein;
use rand::{seq::SliceRandom, Rng};

/// An operator or a function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arithmetic {
    /// An n-ary operator.
    Operator(OperatorKind),

    /// A function of two operands.
    Function(FunctionKind),
}

impl Arithmetic {
    /// The registry name of the operator or function.
    pub fn name(self) -> &'static str {
        match self {
            Self::Operator(kind) => kind.name(),
            Self::Function(kind) => kind.name(),
        }
    }

    /// The displayed symbol of the operator or function.
    pub fn symbol(self) -> char {
        match self {
            Self::Operator(kind) => kind.symbol(),
            Self::Function(kind) => kind.symbol(),
        }
    }
}

/// The operators and functions available to mutations.
///
/// The default registry contains every operator and function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registry {
    operators: Vec<OperatorKind>,
    functions: Vec<FunctionKind>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new(OperatorKind::ALL.to_vec(), FunctionKind::ALL.to_vec())
    }
}

impl Registry {
    /// Creates a registry of the given operators and functions. Duplicates are ignored.
    pub fn new(operators: Vec<OperatorKind>, functions: Vec<FunctionKind>) -> Self {
        let mut registry = Self { operators: Vec::new(), functions: Vec::new() };
        for kind in operators {
            if !registry.operators.contains(&kind) {
                registry.operators.push(kind);
            }
        }
        for kind in functions {
            if !registry.functions.contains(&kind) {
                registry.functions.push(kind);
            }
        }
        registry
    }

    /// Creates a registry from operator and function names, such as `"sum"` or `"exponent"`.
    pub fn from_names(operators: &[&str], functions: &[&str]) -> Result<Self, Error> {
        let operators = operators.iter()
            .map(|name| OperatorKind::from_name(name).ok_or_else(|| unknown(name)))
            .collect::<Result<Vec<_>, _>>()?;
        let functions = functions.iter()
            .map(|name| FunctionKind::from_name(name).ok_or_else(|| unknown(name)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(operators, functions))
    }

    /// The registered operators.
    pub fn operators(&self) -> &[OperatorKind] {
        &self.operators
    }

    /// The registered functions.
    pub fn functions(&self) -> &[FunctionKind] {
        &self.functions
    }

    /// Returns true if the symbol belongs to a registered function.
    pub fn is_function(&self, symbol: char) -> bool {
        self.functions.iter().any(|kind| kind.symbol() == symbol)
    }

    /// Returns true if the symbol belongs to a registered operator.
    pub fn is_operator(&self, symbol: char) -> bool {
        self.operators.iter().any(|kind| kind.symbol() == symbol)
    }

    /// Picks a registered operator other than `exclude`.
    pub fn random_operator<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        exclude: Option<OperatorKind>,
    ) -> Option<OperatorKind> {
        let candidates = self.operators.iter()
            .copied()
            .filter(|&kind| Some(kind) != exclude)
            .collect::<Vec<_>>();
        candidates.choose(rng).copied()
    }

    /// Picks a registered function other than `exclude`.
    pub fn random_function<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        exclude: Option<FunctionKind>,
    ) -> Option<FunctionKind> {
        let candidates = self.functions.iter()
            .copied()
            .filter(|&kind| Some(kind) != exclude)
            .collect::<Vec<_>>();
        candidates.choose(rng).copied()
    }

    /// Picks any registered operator or function, uniformly.
    pub fn random_arithmetic<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Arithmetic> {
        let count = self.operators.len() + self.functions.len();
        if count == 0 {
            return None;
        }

        let index = rng.gen_range(0..count);
        Some(match self.operators.get(index) {
            Some(&kind) => Arithmetic::Operator(kind),
            None => Arithmetic::Function(self.functions[index - self.operators.len()]),
        })
    }
}

/// Builds the error for an unknown name, suggesting similarly named operators and functions.
fn unknown(name: &str) -> Error {
    let suggestions = OperatorKind::ALL.iter()
        .map(|kind| kind.name())
        .chain(FunctionKind::ALL.iter().map(|kind| kind.name()))
        .filter(|known| levenshtein(known, name) < 2)
        .map(str::to_string)
        .collect();
    Error::new(Vec::new(), UnknownArithmetic { name: name.to_string(), suggestions })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rand::{rngs::StdRng, SeedableRng};
    use super::*;

    #[test]
    fn from_names() {
        let registry = Registry::from_names(&["product", "sum", "sum"], &[]).unwrap();
        assert_eq!(registry.operators(), &[OperatorKind::Product, OperatorKind::Sum]);
        assert!(registry.functions().is_empty());
        assert!(registry.is_operator('*'));
        assert!(!registry.is_function('^'));
    }

    #[test]
    fn unknown_name_suggests() {
        let err = Registry::from_names(&["sum", "prodct"], &["exponent"]).unwrap_err();
        let kind = err.downcast_ref::<UnknownArithmetic>().unwrap();
        assert_eq!(kind.name, "prodct");
        assert_eq!(kind.suggestions, vec!["product".to_string()]);

        let err = Registry::from_names(&[], &["pow"]).unwrap_err();
        assert_eq!(err.to_string(), "the `pow` arithmetic does not exist");
        assert!(err.downcast_ref::<UnknownArithmetic>().unwrap().suggestions.is_empty());
    }

    #[test]
    fn random_choices_respect_exclusion() {
        let mut rng = StdRng::seed_from_u64(7);
        let registry = Registry::default();
        for _ in 0..32 {
            assert_eq!(
                registry.random_operator(&mut rng, Some(OperatorKind::Sum)),
                Some(OperatorKind::Product),
            );
        }
        assert_eq!(registry.random_function(&mut rng, Some(FunctionKind::Exponent)), None);
    }

    #[test]
    fn random_arithmetic_covers_registry() {
        let mut rng = StdRng::seed_from_u64(11);
        let registry = Registry::default();
        let mut seen = Vec::new();
        for _ in 0..256 {
            let arithmetic = registry.random_arithmetic(&mut rng).unwrap();
            if !seen.contains(&arithmetic) {
                seen.push(arithmetic);
            }
        }
        assert_eq!(seen.len(), 3);

        let empty = Registry::new(Vec::new(), Vec::new());
        assert_eq!(empty.random_arithmetic(&mut rng), None);
    }
}
