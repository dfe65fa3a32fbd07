//! Reduction of exponents.

use crate::catalog::Catalog;
use crate::eval::EvalId;
use crate::numeric::Numeric;
use crate::step_collector::StepCollector;
use super::Step;

/// Reduces `base ^ power`.
///
/// `2 ^ 3 = 8`
/// `a ^ 1 = a`
///
/// Constant powers whose result is undefined are left in place, so that evaluation reports them.
pub fn reduce<N: Numeric>(
    catalog: &mut Catalog<N>,
    base: EvalId,
    power: EvalId,
    steps: &mut dyn StepCollector<Step>,
) -> EvalId {
    let base = catalog.get_reduced_with(base, steps);
    let power = catalog.get_reduced_with(power, steps);

    if let (Some(b), Some(p)) = (catalog.get(base).as_constant(), catalog.get(power).as_constant()) {
        if let Some(value) = b.power(p) {
            steps.push(Step::FoldConstants);
            return catalog.constant(value);
        }
    }

    if catalog.get(power).as_constant().map_or(false, |p| *p == N::one()) {
        steps.push(Step::PowerOne);
        return base;
    }

    catalog.exponent(base, power)
}
