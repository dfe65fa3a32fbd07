use crate::error::{EmptyOperation, UnboundParameter, UndefinedPower};
use crate::eval::{Context, EvalId, Evaluation};
use crate::numeric::Numeric;
use formula_error::{Error, ErrorKind};
use super::Catalog;

impl<N: Numeric> Catalog<N> {
    /// Evaluates the value, reading parameters from the context.
    ///
    /// Errors point at the offending sub-expression inside the canonical string form of `id`.
    pub fn evaluate<C: Context<N> + ?Sized>(&self, id: EvalId, ctxt: &C) -> Result<N, Error> {
        let mut path = Vec::new();
        self.evaluate_at(id, id, ctxt, &mut path)
    }

    fn evaluate_at<C: Context<N> + ?Sized>(
        &self,
        root: EvalId,
        id: EvalId,
        ctxt: &C,
        path: &mut Vec<usize>,
    ) -> Result<N, Error> {
        match self.get(id) {
            Evaluation::Constant(n) => Ok(n.clone()),
            Evaluation::Parameter(p) => ctxt.parameter(*p)
                .ok_or_else(|| self.error_at(root, path, UnboundParameter { id: *p })),
            Evaluation::Operator(kind, operands) => {
                if operands.is_empty() {
                    return Err(self.error_at(root, path, EmptyOperation { symbol: kind.symbol() }));
                }

                let mut acc = kind.identity::<N>();
                for (i, &op) in operands.iter().enumerate() {
                    path.push(i);
                    let value = self.evaluate_at(root, op, ctxt, path)?;
                    path.pop();
                    acc = kind.combine(&acc, &value);
                }
                Ok(acc)
            },
            Evaluation::Function(kind, operands) => {
                let mut values = Vec::with_capacity(2);
                for (i, &op) in operands.iter().enumerate() {
                    path.push(i);
                    values.push(self.evaluate_at(root, op, ctxt, path)?);
                    path.pop();
                }

                let (lhs, rhs) = (&values[0], &values[1]);
                kind.apply(lhs, rhs).ok_or_else(|| self.error_at(root, path, UndefinedPower {
                    base: lhs.to_string(),
                    exponent: rhs.to_string(),
                }))
            },
        }
    }

    /// Creates an error highlighting the sub-expression at `path`.
    fn error_at(&self, root: EvalId, path: &[usize], kind: impl ErrorKind + 'static) -> Error {
        let span = self.locate(root, path).unwrap_or(0..self.key(root).len());
        Error::new(vec![span], kind)
    }
}

#[cfg(test)]
mod tests {
    use assert_float_eq::{
        afe_abs,
        afe_relative_error_msg,
        afe_is_relative_eq,
        assert_float_relative_eq,
    };
    use ariadne::Source;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use super::*;

    /// Builds `({0} * 2) + ({0} * 4)`.
    fn scaled_terms(catalog: &mut Catalog<f64>) -> EvalId {
        let p0 = catalog.parameter(0);
        let two = catalog.constant(2.0);
        let four = catalog.constant(4.0);
        let a = catalog.product(vec![two, p0]);
        let b = catalog.product(vec![four, p0]);
        catalog.sum(vec![a, b])
    }

    #[test]
    fn evaluate_with_slice() {
        let mut catalog = Catalog::new();
        let sum = scaled_terms(&mut catalog);
        assert_float_relative_eq!(catalog.evaluate(sum, &[5.0]).unwrap(), 30.0);
    }

    #[test]
    fn evaluate_with_map() {
        let mut catalog = Catalog::<i64>::new();
        let p1 = catalog.parameter(1);
        let three = catalog.constant(3);
        let cube = catalog.exponent(p1, three);
        let ctxt = HashMap::<u16, i64>::from([(1, -2)]);
        assert_eq!(catalog.evaluate(cube, &ctxt).unwrap(), -8);
    }

    #[test]
    fn unbound_parameter_points_at_parameter() {
        let mut catalog = Catalog::<f64>::new();
        let p0 = catalog.parameter(0);
        let p1 = catalog.parameter(1);
        let sum = catalog.sum(vec![p0, p1]);

        let err = catalog.evaluate(sum, &[1.0]).unwrap_err();
        assert_eq!(err.downcast_ref::<UnboundParameter>(), Some(&UnboundParameter { id: 1 }));
        assert_eq!(&catalog.key(sum)[err.spans[0].clone()], "{1}");
    }

    #[test]
    fn empty_operator_cannot_be_evaluated() {
        let mut catalog = Catalog::<f64>::new();
        let empty = catalog.sum(vec![]);
        let err = catalog.evaluate(empty, &Vec::new()).unwrap_err();
        assert!(err.is::<EmptyOperation>());
        assert_eq!(err.spans, vec![0..3]);
    }

    #[test]
    fn undefined_power() {
        let mut catalog = Catalog::<f64>::new();
        let p0 = catalog.parameter(0);
        let half = catalog.constant(0.5);
        let root = catalog.exponent(p0, half);
        let two = catalog.constant(2.0);
        let sum = catalog.sum(vec![root, two]);

        assert_float_relative_eq!(catalog.evaluate(sum, &[9.0]).unwrap(), 5.0);
        let err = catalog.evaluate(sum, &[-9.0]).unwrap_err();
        assert_eq!(err.to_string(), "`-9^0.5` is undefined");
        assert_eq!(&catalog.key(sum)[err.spans[0].clone()], "({0}^0.5)");
    }

    #[test]
    fn render_report() {
        let mut catalog = Catalog::<f64>::new();
        let p0 = catalog.parameter(0);
        let p7 = catalog.parameter(7);
        let product = catalog.product(vec![p0, p7]);
        let err = catalog.evaluate(product, &[2.0]).unwrap_err();

        let mut buf = Vec::new();
        err.build_report("input")
            .write(("input", Source::from(catalog.key(product))), &mut buf)
            .unwrap();
        let report = String::from_utf8(strip_ansi_escapes::strip(buf)).unwrap();
        assert!(report.contains("parameter `{7}` is not bound"));
        assert!(report.contains("this parameter"));
    }
}
