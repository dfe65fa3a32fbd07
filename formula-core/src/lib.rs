//! Canonical formula trees: interning, reduction and copy-on-write mutation.
//!
//! Expressions are built from four kinds of [`Evaluation`]: constants, parameters, n-ary
//! operators (sum and product) and two-operand functions (exponentiation). Every value is
//! registered in a [`Catalog`], which stores structurally equal expressions exactly once and hands
//! out [`EvalId`] handles to them, so two handles are equal exactly when their expressions are.
//!
//! The catalog reduces values into simpler forms with the pipeline described in [`reduce`], and
//! memoizes the result. Values are edited by mapping them to node trees in an [`Arena`], changing
//! a copy of the tree, and rebuilding canonical values from the leaves up; see [`hierarchy`].
//! [`mutation`] builds randomized edits on top of that.
//!
//! ```
//! use formula_core::EvaluationCatalog;
//!
//! let mut ctx = EvaluationCatalog::<f64>::new();
//! let catalog = &mut ctx.catalog;
//! let p0 = catalog.parameter(0);
//! let two = catalog.constant(2.0);
//! let four = catalog.constant(4.0);
//! let a = catalog.product(vec![two, p0]);
//! let b = catalog.product(vec![four, p0]);
//! let sum = catalog.sum(vec![a, b]);
//!
//! let reduced = catalog.get_reduced(sum);
//! assert_eq!(catalog.key(reduced), "({0} * 6)");
//! assert_eq!(catalog.evaluate(reduced, &[5.0]).unwrap(), 30.0);
//!
//! // the square is built from a copy of the tree under `root`
//! let root = ctx.map(reduced);
//! let squared = ctx.mutation().square(root).unwrap();
//! assert_eq!(ctx.catalog.key(squared), "(({0} * 6)^2)");
//! ```

pub mod arena;
pub mod catalog;
pub mod error;
pub mod eval;
pub mod hierarchy;
pub mod mutation;
pub mod numeric;
pub mod reduce;
pub mod registry;
pub mod step_collector;

pub use arena::{Arena, NodeId};
pub use catalog::Catalog;
pub use eval::{Context, EvalId, Evaluation, FunctionKind, OperatorKind};
pub use formula_error::Error;
pub use hierarchy::EvaluationCatalog;
pub use mutation::MutationCatalog;
pub use numeric::Numeric;
pub use registry::{Arithmetic, Registry};
