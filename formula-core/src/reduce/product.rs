//! Reduction of products.
//!
//! Products go through the same pipeline as sums, except that there is no factoring step, and a
//! folded constant of zero annihilates the whole product.

use crate::catalog::Catalog;
use crate::eval::{EvalId, Evaluation, OperatorKind};
use crate::numeric::Numeric;
use crate::step_collector::StepCollector;
use super::{fold_constants, Step};

/// Reduces the product of the operands.
pub fn reduce<N: Numeric>(
    catalog: &mut Catalog<N>,
    operands: &[EvalId],
    steps: &mut dyn StepCollector<Step>,
) -> EvalId {
    let children = catalog.flatten_with(OperatorKind::Product, operands, steps);

    match children.len() {
        0 => {
            steps.push(Step::CollapseEmpty(OperatorKind::Product));
            return catalog.constant(N::one());
        },
        1 => {
            steps.push(Step::Unwrap(OperatorKind::Product));
            return children[0];
        },
        _ => (),
    }

    let (mut children, folded) = fold_constants(catalog, OperatorKind::Product, &children);
    if let Some((constant, count)) = folded {
        if constant.is_zero() {
            steps.push(Step::MultiplyZero);
            return catalog.constant(N::zero());
        }

        if count > 1 {
            steps.push(Step::FoldConstants);
        }
        children.push(catalog.constant(constant));
    }

    if children.len() == 1 {
        children[0]
    } else {
        catalog.product(children)
    }
}

/// Splits a product into the product of its non-constant operands and its constant multiple. The
/// multiple is `1` if the product has no constant operands.
///
/// Returns [`None`] if the value is not a product, or is a product of constants only.
pub fn split_multiple<N: Numeric>(catalog: &mut Catalog<N>, id: EvalId) -> Option<(EvalId, N)> {
    let Evaluation::Operator(OperatorKind::Product, operands) = catalog.get(id) else {
        return None;
    };

    let operands = operands.clone();
    let (others, folded) = fold_constants(catalog, OperatorKind::Product, &operands);
    let remaining = match others.len() {
        0 => return None,
        1 => others[0],
        _ => catalog.product(others),
    };
    Some((remaining, folded.map_or_else(N::one, |(multiple, _)| multiple)))
}

/// Returns the constant multiple of the value: the value itself for constants, the product of the
/// constant operands for products, and `1` for everything else.
pub fn multiple_of<N: Numeric>(catalog: &Catalog<N>, id: EvalId) -> N {
    match catalog.get(id) {
        Evaluation::Constant(n) => n.clone(),
        Evaluation::Operator(OperatorKind::Product, operands) => {
            match fold_constants(catalog, OperatorKind::Product, operands).1 {
                Some((multiple, _)) => multiple,
                None => N::one(),
            }
        },
        _ => N::one(),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use super::*;

    #[test]
    fn zero_annihilates() {
        let mut catalog = Catalog::<f64>::new();
        let p0 = catalog.parameter(0);
        let two = catalog.constant(2.0);
        let zero = catalog.constant(0.0);
        let product = catalog.product(vec![p0, two, zero]);

        let (reduced, steps) = catalog.get_reduced_with_steps(product);
        assert_eq!(reduced, zero);
        assert_eq!(steps, vec![Step::MultiplyZero]);
    }

    #[test]
    fn constant_one_is_kept() {
        let mut catalog = Catalog::<f64>::new();
        let p0 = catalog.parameter(0);
        let half = catalog.constant(0.5);
        let two = catalog.constant(2.0);
        let product = catalog.product(vec![half, p0, two]);
        let reduced = catalog.get_reduced(product);
        assert_eq!(catalog.key(reduced), "({0} * 1)");
    }

    #[test]
    fn nested_products_flatten() {
        let mut catalog = Catalog::<i64>::new();
        let p0 = catalog.parameter(0);
        let p1 = catalog.parameter(1);
        let three = catalog.constant(3);
        let inner = catalog.product(vec![p1, three]);
        let product = catalog.product(vec![inner, p0, three]);

        let reduced = catalog.get_reduced(product);
        assert_eq!(catalog.key(reduced), "({0} * {1} * 9)");
        assert_eq!(catalog.evaluate(reduced, &[2, 5]).unwrap(), 90);
    }

    #[test]
    fn degenerate_products_collapse() {
        let mut catalog = Catalog::<f64>::new();
        let p0 = catalog.parameter(0);
        let empty = catalog.product(vec![]);
        let single = catalog.product(vec![p0]);
        let reduced = catalog.get_reduced(empty);
        assert_eq!(catalog.key(reduced), "1");
        assert_eq!(catalog.get_reduced(single), p0);
    }

    #[test]
    fn split_products() {
        let mut catalog = Catalog::<f64>::new();
        let p0 = catalog.parameter(0);
        let p1 = catalog.parameter(1);
        let three = catalog.constant(3.0);
        let scaled = catalog.product(vec![p0, three]);
        let bare = catalog.product(vec![p0, p1]);
        let constants = catalog.product(vec![three, three]);

        assert_eq!(split_multiple(&mut catalog, scaled), Some((p0, 3.0)));
        assert_eq!(split_multiple(&mut catalog, bare), Some((bare, 1.0)));
        assert_eq!(split_multiple(&mut catalog, constants), None);
        assert_eq!(split_multiple(&mut catalog, p0), None);

        assert_eq!(multiple_of(&catalog, scaled), 3.0);
        assert_eq!(multiple_of(&catalog, three), 3.0);
        assert_eq!(multiple_of(&catalog, p1), 1.0);
    }
}
