//! Reduction of sums.

use crate::catalog::Catalog;
use crate::eval::{EvalId, OperatorKind};
use crate::numeric::Numeric;
use crate::step_collector::StepCollector;
use super::{fold_constants, product, Step};

/// Reduces the sum of the operands.
pub fn reduce<N: Numeric>(
    catalog: &mut Catalog<N>,
    operands: &[EvalId],
    steps: &mut dyn StepCollector<Step>,
) -> EvalId {
    let mut children = catalog.flatten_with(OperatorKind::Sum, operands, steps);

    match children.len() {
        0 => {
            steps.push(Step::CollapseEmpty(OperatorKind::Sum));
            return catalog.constant(N::zero());
        },
        1 => {
            steps.push(Step::Unwrap(OperatorKind::Sum));
            return children[0];
        },
        _ => (),
    }

    factor_products(catalog, &mut children, steps);

    let (mut children, folded) = fold_constants(catalog, OperatorKind::Sum, &children);
    if let Some((constant, count)) = folded {
        if count > 1 {
            steps.push(Step::FoldConstants);
        }
        children.push(catalog.constant(constant));
    }

    if children.len() == 1 {
        children[0]
    } else {
        catalog.sum(children)
    }
}

/// Merges products that share everything but their constant multiple.
///
/// `2a + 4a + b = b + 6a`
///
/// Each merged group is appended after the untouched children.
fn factor_products<N: Numeric>(
    catalog: &mut Catalog<N>,
    children: &mut Vec<EvalId>,
    steps: &mut dyn StepCollector<Step>,
) {
    // group child indexes by the product they multiply
    let mut groups: Vec<(EvalId, Vec<(usize, N)>)> = Vec::new();
    for (i, &child) in children.iter().enumerate() {
        let Some((remaining, multiple)) = product::split_multiple(catalog, child) else {
            continue;
        };
        match groups.iter_mut().find(|(r, _)| *r == remaining) {
            Some((_, members)) => members.push((i, multiple)),
            None => groups.push((remaining, vec![(i, multiple)])),
        }
    }

    let mut merged_indexes = vec![false; children.len()];
    let mut merged = Vec::new();
    for (remaining, members) in groups.into_iter().filter(|(_, members)| members.len() > 1) {
        let multiple = members.iter().fold(N::zero(), |acc, (_, m)| acc.plus(m));
        for (i, _) in &members {
            merged_indexes[*i] = true;
        }

        let multiple = catalog.constant(multiple);
        let product = catalog.product(vec![remaining, multiple]);
        merged.push(catalog.get_reduced_with(product, steps));
    }

    if merged.is_empty() {
        return;
    }

    steps.push(Step::FactorProducts);
    let mut i = 0;
    children.retain(|_| {
        let keep = !merged_indexes[i];
        i += 1;
        keep
    });
    children.extend(merged);
}
