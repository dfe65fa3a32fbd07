//! Reduction of expressions into simpler, equivalent forms.
//!
//! Every interior value kind has a reducer. The reducers for operators share the same pipeline,
//! described here for [`sum`]:
//!
//! 1. **Flatten**: each operand is reduced, and operands of the same operator kind are spliced
//!    into the parent.
//! 2. **Collapse**: no operands reduce to the identity, a single operand reduces to itself.
//! 3. **Factor**: products that differ only in their constant multiple are merged, so
//!    `2a + 4a` becomes `6a`.
//! 4. **Fold**: all constants are combined into one.
//! 5. **Unwrap**: a single remaining operand is returned on its own.
//! 6. **Register**: the result is registered in the catalog.
//!
//! Reduced forms are memoized in the [`Catalog`], so each value is reduced at most once. Reducing
//! a reduced value returns it unchanged.
//!
//! The steps taken during a reduction can be recorded with a [`StepCollector`].

pub mod exponent;
pub mod product;
pub mod step;
pub mod sum;

pub use step::Step;

use crate::catalog::Catalog;
use crate::eval::{EvalId, Evaluation, FunctionKind, OperatorKind};
use crate::numeric::Numeric;
use crate::step_collector::StepCollector;
use tracing::debug;

impl<N: Numeric> Catalog<N> {
    /// Returns the reduced form of the value.
    pub fn get_reduced(&mut self, id: EvalId) -> EvalId {
        self.get_reduced_with(id, &mut ())
    }

    /// Returns the reduced form of the value, along with the steps taken to reach it. No steps are
    /// returned if the reduced form was already known.
    pub fn get_reduced_with_steps(&mut self, id: EvalId) -> (EvalId, Vec<Step>) {
        let mut steps = Vec::new();
        let reduced = self.get_reduced_with(id, &mut steps);
        (reduced, steps)
    }

    /// Returns the reduced form of the value if it differs from the value itself.
    pub fn try_get_reduced(&mut self, id: EvalId) -> Option<EvalId> {
        let reduced = self.get_reduced(id);
        (reduced != id).then_some(reduced)
    }

    /// Returns the reduced form of the value, recording the steps taken in `steps`.
    pub fn get_reduced_with(&mut self, id: EvalId, steps: &mut dyn StepCollector<Step>) -> EvalId {
        if let Some(&reduced) = self.reduced.get(&id) {
            return reduced;
        }

        let reduced = match self.get(id) {
            Evaluation::Constant(_) | Evaluation::Parameter(_) => id,
            Evaluation::Operator(kind, operands) => {
                let (kind, operands) = (*kind, operands.clone());
                match kind {
                    OperatorKind::Sum => sum::reduce(self, &operands, steps),
                    OperatorKind::Product => product::reduce(self, &operands, steps),
                }
            },
            Evaluation::Function(FunctionKind::Exponent, [base, power]) => {
                let (base, power) = (*base, *power);
                exponent::reduce(self, base, power, steps)
            },
        };

        if reduced != id {
            debug!(source = self.key(id), reduced = self.key(reduced), "reduced evaluation");
        }
        self.reduced.insert(id, reduced);
        reduced
    }

    /// Reduces each child and splices the operands of children that are operators of the same
    /// kind into the result.
    pub fn flatten(&mut self, kind: OperatorKind, children: &[EvalId]) -> Vec<EvalId> {
        self.flatten_with(kind, children, &mut ())
    }

    /// [`Catalog::flatten`], recording the steps taken in `steps`.
    pub fn flatten_with(
        &mut self,
        kind: OperatorKind,
        children: &[EvalId],
        steps: &mut dyn StepCollector<Step>,
    ) -> Vec<EvalId> {
        let mut flat = Vec::with_capacity(children.len());
        for &child in children {
            let reduced = self.get_reduced_with(child, steps);
            match self.get(reduced) {
                Evaluation::Operator(k, operands) if *k == kind => {
                    let operands = operands.clone();
                    steps.push(Step::Flatten(kind));
                    flat.extend(self.flatten_with(kind, &operands, steps));
                },
                _ => flat.push(reduced),
            }
        }
        flat
    }

    /// Returns the reduced product of the value and a constant multiple.
    pub fn product_of(&mut self, multiple: N, value: EvalId) -> EvalId {
        let multiple = self.constant(multiple);
        let product = self.product(vec![value, multiple]);
        self.get_reduced(product)
    }
}

/// Splits the constants out of `operands` and combines them with `kind`. Returns the non-constant
/// operands and the combined constant, or [`None`] if there were no constants.
pub(crate) fn fold_constants<N: Numeric>(
    catalog: &Catalog<N>,
    kind: OperatorKind,
    operands: &[EvalId],
) -> (Vec<EvalId>, Option<(N, usize)>) {
    let mut rest = Vec::with_capacity(operands.len());
    let mut folded: Option<(N, usize)> = None;
    for &op in operands {
        match catalog.get(op).as_constant() {
            Some(n) => {
                folded = Some(match folded {
                    Some((acc, count)) => (kind.combine(&acc, n), count + 1),
                    None => (n.clone(), 1),
                });
            },
            None => rest.push(op),
        }
    }
    (rest, folded)
}
