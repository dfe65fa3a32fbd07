//! Randomized edits of expression trees.
//!
//! Every mutation is applied to a copy of the tree containing the node (see
//! [`EvaluationCatalog::apply_clone`]), so the source tree is never changed. A mutation returns the
//! canonical root value of the edited copy.
//!
//! Mutations validate the kind of the node's value up front and fail with an error if it does not
//! apply. Mutations that may find no alternative to pick from return `Ok(None)` instead.

mod random;

pub use random::random_excluding;

use crate::arena::NodeId;
use crate::error::{CannotHaveOperands, NotAParameter, NotAnOperation, OptionOutOfRange};
use crate::eval::{EvalId, Evaluation, FunctionKind};
use crate::hierarchy::EvaluationCatalog;
use crate::numeric::Numeric;
use crate::registry::Arithmetic;
use formula_error::Error;
use rand::Rng;
use tracing::debug;

impl<N: Numeric> EvaluationCatalog<N> {
    /// Returns a view of the catalog that applies mutations.
    pub fn mutation(&mut self) -> MutationCatalog<'_, N> {
        MutationCatalog { source: self }
    }
}

/// Applies randomized edits to nodes of an [`EvaluationCatalog`].
#[derive(Debug)]
pub struct MutationCatalog<'a, N> {
    source: &'a mut EvaluationCatalog<N>,
}

impl<'a, N: Numeric> MutationCatalog<'a, N> {
    /// The catalog being mutated.
    pub fn source(&mut self) -> &mut EvaluationCatalog<N> {
        self.source
    }

    /// Changes the sign or the constant multiple of the node.
    ///
    /// A branch is picked at random from `0..options` (`0` when `options` is `0`):
    ///
    /// - `0`: multiply by `-1`.
    /// - `1`: decrease the constant multiple by one.
    /// - `2`: increase the constant multiple by one.
    ///
    /// The multiple of the root is never brought to zero, and nodes directly beneath a square root
    /// are never negated nor given a non-positive multiple. A branch that would do so falls through
    /// to another one.
    pub fn mutate_sign<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        node: NodeId,
        options: u8,
    ) -> Result<EvalId, Error> {
        if options > 3 {
            return Err(self.source.error_at_node(node, OptionOutOfRange { options }));
        }

        let value = self.source.value(node);
        let parent = self.source.factory.parent(node);
        let is_root = parent.is_none();
        let beneath_square_root = parent
            .map_or(false, |parent| self.source.catalog.is_square_root(self.source.value(parent)));
        let multiple = self.source.multiple_of(value);
        let (one, minus_one) = (N::one(), N::from_i32(-1));

        let mut branch = if options == 0 { 0 } else { rng.gen_range(0..options) };
        let result = loop {
            match branch {
                0 if beneath_square_root => branch = if rng.gen_bool(0.5) { 1 } else { 2 },
                0 => break self.source.multiply_node(node, minus_one)?,
                1 if (is_root && multiple == one) || (beneath_square_root && multiple <= one) => {
                    branch = 2;
                },
                1 => break self.source.adjust_node_multiple(node, minus_one)?,
                _ if is_root && multiple == minus_one => branch = 1,
                _ => break self.source.adjust_node_multiple(node, one)?,
            }
        };

        debug!(mutation = "sign", branch, result = self.source.catalog.key(result));
        Ok(result)
    }

    /// Replaces a parameter with a different parameter.
    ///
    /// If the parameter is the root, a lower ID is picked. Otherwise the ID is picked from the
    /// parameters already in the tree plus possibly one new ID, favoring existing ones.
    pub fn mutate_parameter<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        node: NodeId,
    ) -> Result<EvalId, Error> {
        let value = self.source.value(node);
        let Evaluation::Parameter(id) = *self.source.catalog.get(value) else {
            let found = self.source.catalog.get(value).describe();
            return Err(self.source.error_at_node(node, NotAParameter { found }));
        };

        let root = self.source.factory.root(node);
        let range = if root == node {
            id as usize
        } else {
            let count = self.source.catalog.distinct_parameters(self.source.value(root));
            count + if id == 0 { 1 } else { rng.gen_range(0..2) }
        };
        let next = random_excluding(rng, range, id as usize)
            .and_then(|next| u16::try_from(next).ok())
            .unwrap_or_else(|| id.saturating_add(1));

        let parameter = self.source.catalog.parameter(next);
        let result = self.source.apply_clone(node, |this, clone| {
            this.assign(clone, parameter);
            Ok(())
        })?;

        debug!(mutation = "parameter", from = id, to = next, result = self.source.catalog.key(result));
        Ok(result)
    }

    /// Replaces the operator or function with a different one from the registry, keeping the
    /// operands.
    ///
    /// A function with no alternative function is replaced with an operator if it has at least
    /// two operands. Returns `Ok(None)` if there is no alternative.
    pub fn change_operation<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        node: NodeId,
    ) -> Result<Option<EvalId>, Error> {
        let value = self.source.value(node);
        let registry = self.source.registry();
        let replacement = match self.source.catalog.get(value) {
            Evaluation::Operator(kind, operands) => registry
                .random_operator(rng, Some(*kind))
                .map(|kind| Evaluation::Operator(kind, operands.clone())),
            Evaluation::Function(kind, operands) => match registry.random_function(rng, Some(*kind)) {
                Some(kind) => Some(Evaluation::Function(kind, *operands)),
                None if operands.len() >= 2 => registry
                    .random_operator(rng, None)
                    .map(|kind| Evaluation::Operator(kind, operands.to_vec())),
                None => None,
            },
            other => {
                let found = other.describe();
                return Err(self.source.error_at_node(node, NotAnOperation { found }));
            },
        };

        let Some(replacement) = replacement else {
            debug!(mutation = "operation", "no alternative operation");
            return Ok(None);
        };

        let replacement = self.source.catalog.register(replacement);
        let result = self.source.apply_clone(node, |this, clone| {
            this.assign(clone, replacement);
            Ok(())
        })?;

        debug!(mutation = "operation", result = self.source.catalog.key(result));
        Ok(Some(result))
    }

    /// Appends a parameter to the operands of an operator. The ID is picked from the parameters
    /// beneath the node plus one new ID.
    ///
    /// Returns `Ok(None)` for functions, whose operand count is fixed.
    pub fn add_parameter<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        node: NodeId,
    ) -> Result<Option<EvalId>, Error> {
        let value = self.source.value(node);
        match self.source.catalog.get(value) {
            Evaluation::Operator(..) => (),
            Evaluation::Function(..) => return Ok(None),
            other => {
                let found = other.describe();
                return Err(self.source.error_at_node(node, CannotHaveOperands { found }));
            },
        }

        let count = self.source.catalog.distinct_parameters(value);
        let id = u16::try_from(rng.gen_range(0..=count)).unwrap_or(u16::MAX);
        let parameter = self.source.catalog.parameter(id);
        let result = self.source.apply_clone(node, |this, clone| {
            this.factory.add_value(clone, parameter);
            Ok(())
        })?;

        debug!(mutation = "add parameter", id, result = self.source.catalog.key(result));
        Ok(Some(result))
    }

    /// Wraps the node in a random operator or function from the registry, together with a
    /// parameter already used in the tree.
    ///
    /// Returns `Ok(None)` if the registry is empty.
    pub fn branch_operation<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        node: NodeId,
    ) -> Result<Option<EvalId>, Error> {
        let value = self.source.value(node);
        let root = self.source.factory.root(node);
        let count = self.source.catalog.distinct_parameters(self.source.value(root));
        let Some(arithmetic) = self.source.registry().random_arithmetic(rng) else {
            debug!(mutation = "branch", "empty registry");
            return Ok(None);
        };

        let id = if count == 0 { 0 } else { rng.gen_range(0..count) };
        let parameter = self.source.catalog.parameter(u16::try_from(id).unwrap_or(u16::MAX));
        let is_function = matches!(self.source.catalog.get(value), Evaluation::Function(..));
        let operands = if (is_function || rng.gen_ratio(1, 4)) && rng.gen_bool(0.5) {
            [value, parameter]
        } else {
            [parameter, value]
        };

        let branch = match arithmetic {
            Arithmetic::Operator(kind) => Evaluation::Operator(kind, operands.to_vec()),
            Arithmetic::Function(kind) => Evaluation::Function(kind, operands),
        };
        let branch = self.source.catalog.register(branch);
        let result = self.source.apply_clone(node, |this, clone| {
            this.assign(clone, branch);
            Ok(())
        })?;

        debug!(mutation = "branch", arithmetic = arithmetic.name(), result = self.source.catalog.key(result));
        Ok(Some(result))
    }

    /// Squares the node. The power of an exponent is doubled, anything else is raised to the
    /// power of two.
    pub fn square(&mut self, node: NodeId) -> Result<EvalId, Error> {
        let value = self.source.value(node);
        let result = match *self.source.catalog.get(value) {
            Evaluation::Function(FunctionKind::Exponent, [_, power]) => {
                let doubled = self.source.catalog.product_of(N::from_i32(2), power);
                self.source.apply_clone(node, |this, clone| {
                    let power_node = this.factory.children(clone)[1];
                    this.assign(power_node, doubled);
                    Ok(())
                })?
            },
            _ => {
                let two = self.source.catalog.constant(N::from_i32(2));
                let squared = self.source.catalog.exponent(value, two);
                self.source.apply_clone(node, |this, clone| {
                    this.assign(clone, squared);
                    Ok(())
                })?
            },
        };

        debug!(mutation = "square", result = self.source.catalog.key(result));
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use crate::error::{NotAParameter, NotAnOperation, OptionOutOfRange};
    use crate::registry::Registry;
    use pretty_assertions::assert_eq;
    use rand::{rngs::StdRng, SeedableRng};
    use super::*;

    /// Registers and maps `{0} + {1}`.
    fn pair_sum(ctx: &mut EvaluationCatalog<f64>) -> NodeId {
        let p0 = ctx.catalog.parameter(0);
        let p1 = ctx.catalog.parameter(1);
        let sum = ctx.catalog.sum(vec![p0, p1]);
        ctx.map(sum)
    }

    fn key(ctx: &EvaluationCatalog<f64>, id: EvalId) -> &str {
        ctx.catalog.key(id)
    }

    #[test]
    fn negate_child() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut ctx = EvaluationCatalog::new();
        let root = pair_sum(&mut ctx);
        let p0 = ctx.factory.children(root)[0];

        let result = ctx.mutation().mutate_sign(&mut rng, p0, 0).unwrap();
        assert_eq!(key(&ctx, result), "({1} + ({0} * -1))");
        assert_eq!(key(&ctx, ctx.value(root)), "({0} + {1})");
    }

    #[test]
    fn sign_options_out_of_range() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut ctx = EvaluationCatalog::new();
        let root = pair_sum(&mut ctx);
        let err = ctx.mutation().mutate_sign(&mut rng, root, 4).unwrap_err();
        assert_eq!(err.downcast_ref::<OptionOutOfRange>(), Some(&OptionOutOfRange { options: 4 }));
    }

    #[test]
    fn root_multiple_never_zeroed() {
        let mut ctx = EvaluationCatalog::<f64>::new();
        let p0 = ctx.catalog.parameter(0);
        let root = ctx.map(p0);
        for seed in 0..32 {
            let mut rng = StdRng::seed_from_u64(seed);
            let result = ctx.mutation().mutate_sign(&mut rng, root, 3).unwrap();
            assert!(
                ["({0} * -1)", "({0} * 2)"].contains(&key(&ctx, result)),
                "unexpected mutation {}",
                key(&ctx, result),
            );
        }
    }

    #[test]
    fn square_root_operand_stays_positive() {
        let mut ctx = EvaluationCatalog::<f64>::new();
        let p0 = ctx.catalog.parameter(0);
        let half = ctx.catalog.constant(0.5);
        let sqrt = ctx.catalog.exponent(p0, half);
        let root = ctx.map(sqrt);
        let base = ctx.factory.children(root)[0];

        for seed in 0..16 {
            let mut rng = StdRng::seed_from_u64(seed);
            let result = ctx.mutation().mutate_sign(&mut rng, base, 2).unwrap();
            assert_eq!(key(&ctx, result), "(({0} * 2)^0.5)");
        }
    }

    #[test]
    fn substitute_parameter() {
        let mut ctx = EvaluationCatalog::new();
        let root = pair_sum(&mut ctx);
        let p1 = ctx.factory.children(root)[1];

        for seed in 0..32 {
            let mut rng = StdRng::seed_from_u64(seed);
            let result = ctx.mutation().mutate_parameter(&mut rng, p1).unwrap();
            assert!(
                ["({0} + {0})", "({0} + {2})"].contains(&key(&ctx, result)),
                "unexpected mutation {}",
                key(&ctx, result),
            );
        }
    }

    #[test]
    fn substitute_root_parameter() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut ctx = EvaluationCatalog::<f64>::new();
        let p2 = ctx.catalog.parameter(2);
        let root = ctx.map(p2);
        for _ in 0..16 {
            let result = ctx.mutation().mutate_parameter(&mut rng, root).unwrap();
            assert!(["{0}", "{1}"].contains(&key(&ctx, result)));
        }

        let p0 = ctx.catalog.parameter(0);
        let root = ctx.map(p0);
        let result = ctx.mutation().mutate_parameter(&mut rng, root).unwrap();
        assert_eq!(key(&ctx, result), "{1}");
    }

    #[test]
    fn substitute_requires_parameter() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut ctx = EvaluationCatalog::new();
        let root = pair_sum(&mut ctx);
        let err = ctx.mutation().mutate_parameter(&mut rng, root).unwrap_err();
        assert_eq!(err.downcast_ref::<NotAParameter>(), Some(&NotAParameter { found: "an operator" }));
        assert_eq!(err.spans, vec![0..11]);
    }

    #[test]
    fn swap_operator() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut ctx = EvaluationCatalog::new();
        let root = pair_sum(&mut ctx);

        let result = ctx.mutation().change_operation(&mut rng, root).unwrap().unwrap();
        assert_eq!(key(&ctx, result), "({0} * {1})");

        let p0 = ctx.factory.children(root)[0];
        let err = ctx.mutation().change_operation(&mut rng, p0).unwrap_err();
        assert!(err.is::<NotAnOperation>());
        assert_eq!(&key(&ctx, ctx.value(root))[err.spans[0].clone()], "{0}");
    }

    #[test]
    fn swap_function_falls_back_to_operator() {
        let mut ctx = EvaluationCatalog::<f64>::new();
        let p0 = ctx.catalog.parameter(0);
        let three = ctx.catalog.constant(3.0);
        let cube = ctx.catalog.exponent(p0, three);
        let root = ctx.map(cube);

        for seed in 0..16 {
            let mut rng = StdRng::seed_from_u64(seed);
            let result = ctx.mutation().change_operation(&mut rng, root).unwrap().unwrap();
            assert!(["({0} + 3)", "({0} * 3)"].contains(&key(&ctx, result)));
        }
    }

    #[test]
    fn swap_without_alternative() {
        let mut rng = StdRng::seed_from_u64(9);
        let registry = Registry::from_names(&["sum"], &["exponent"]).unwrap();
        let mut ctx = EvaluationCatalog::with_registry(registry);
        let root = pair_sum(&mut ctx);
        assert_eq!(ctx.mutation().change_operation(&mut rng, root).unwrap(), None);
    }

    #[test]
    fn add_parameter_to_operator() {
        let mut ctx = EvaluationCatalog::new();
        let root = pair_sum(&mut ctx);
        for seed in 0..16 {
            let mut rng = StdRng::seed_from_u64(seed);
            let result = ctx.mutation().add_parameter(&mut rng, root).unwrap().unwrap();
            assert!(
                ["({0} + {0} + {1})", "({0} + {1} + {1})", "({0} + {1} + {2})"]
                    .contains(&key(&ctx, result)),
            );
        }

        let mut rng = StdRng::seed_from_u64(0);
        let p0 = ctx.factory.children(root)[0];
        let err = ctx.mutation().add_parameter(&mut rng, p0).unwrap_err();
        assert!(err.is::<CannotHaveOperands>());

        let two = ctx.catalog.constant(2.0);
        let p0_value = ctx.value(p0);
        let square = ctx.catalog.exponent(p0_value, two);
        let square = ctx.map(square);
        assert_eq!(ctx.mutation().add_parameter(&mut rng, square).unwrap(), None);
    }

    #[test]
    fn branch_wraps_node() {
        let mut rng = StdRng::seed_from_u64(2);
        let registry = Registry::from_names(&["product"], &[]).unwrap();
        let mut ctx = EvaluationCatalog::<f64>::with_registry(registry);
        let p0 = ctx.catalog.parameter(0);
        let root = ctx.map(p0);

        let result = ctx.mutation().branch_operation(&mut rng, root).unwrap().unwrap();
        assert_eq!(key(&ctx, result), "({0} * {0})");

        let mut ctx = EvaluationCatalog::<f64>::with_registry(Registry::new(Vec::new(), Vec::new()));
        let root = pair_sum(&mut ctx);
        assert_eq!(ctx.mutation().branch_operation(&mut rng, root).unwrap(), None);
    }

    #[test]
    fn branch_with_function() {
        let registry = Registry::from_names(&[], &["exponent"]).unwrap();
        let mut ctx = EvaluationCatalog::with_registry(registry);
        let root = pair_sum(&mut ctx);
        let p1 = ctx.factory.children(root)[1];

        for seed in 0..16 {
            let mut rng = StdRng::seed_from_u64(seed);
            let result = ctx.mutation().branch_operation(&mut rng, p1).unwrap().unwrap();
            let k = key(&ctx, result);
            assert!(k.starts_with("({0} + ({"), "unexpected mutation {}", k);
            assert!(k.contains('^'));
        }
    }

    #[test]
    fn square_nodes() {
        let mut ctx = EvaluationCatalog::<f64>::new();
        let p0 = ctx.catalog.parameter(0);
        let p1 = ctx.catalog.parameter(1);
        let three = ctx.catalog.constant(3.0);

        let root = ctx.map(p0);
        let result = ctx.mutation().square(root).unwrap();
        assert_eq!(key(&ctx, result), "({0}^2)");

        let cube = ctx.catalog.exponent(p0, three);
        let root = ctx.map(cube);
        let result = ctx.mutation().square(root).unwrap();
        assert_eq!(key(&ctx, result), "({0}^6)");

        let power = ctx.catalog.exponent(p0, p1);
        let root = ctx.map(power);
        let result = ctx.mutation().square(root).unwrap();
        assert_eq!(key(&ctx, result), "({0}^({1} * 2))");
        assert_eq!(ctx.catalog.evaluate(result, &[2.0, 1.5]).unwrap(), 8.0);
    }

    #[test]
    fn mutations_do_not_leak_nodes() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut ctx = EvaluationCatalog::new();
        let root = pair_sum(&mut ctx);
        let p0 = ctx.factory.children(root)[0];
        let live = ctx.factory.stats().live;

        let mut mutation = ctx.mutation();
        mutation.mutate_sign(&mut rng, p0, 3).unwrap();
        mutation.mutate_parameter(&mut rng, p0).unwrap();
        mutation.change_operation(&mut rng, root).unwrap();
        mutation.add_parameter(&mut rng, root).unwrap();
        mutation.branch_operation(&mut rng, p0).unwrap();
        mutation.square(root).unwrap();

        assert_eq!(ctx.factory.stats().live, live);
        assert_eq!(key(&ctx, ctx.value(root)), "({0} + {1})");
    }
}
