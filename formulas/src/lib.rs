//! Copyright (c) 2005–2025 IKH Software, Inc.
//!
//! Released under the terms of the GNU Lesser General Public License, version 3.0
//! or (at your option) any later version (LGPL-3.0-or-later).
//!
//! # formulas
//!
//! Evaluates arithmetic formulas such as `quadratic(x, 1, -2, 1) / 2^k`
//! against caller-supplied variables and functions.
//!
//! The language is defined by a grammar and a lexicon that [`lrkit`] turns
//! into an SLR(1) parser; the value is computed by semantic actions run on
//! every reduction.
//!
//! ## Modules
//!
//! - [`arithmetic`]: the grammar, the lexicon and the evaluator
//! - [`function`]: callables and the [`FunctionTable`]
//! - [`variables`]: the [`VariableTable`]
//! - [`error`]: [`EvalError`]
//!
//! ## Example
//!
//! ```rust
//! use formulas::{ArithmeticParser, FunctionTable, VariableTable};
//!
//! let parser = ArithmeticParser::new().unwrap();
//!
//! let mut functions = FunctionTable::new();
//! functions.register("sigmoid", |x: f64| 1.0 / ((-x).exp() + 1.0));
//!
//! let mut variables = VariableTable::new();
//! variables.set("k", 2.0);
//!
//! let v = parser.evaluate(&functions, &variables, "sigmoid(0) * 2^k").unwrap();
//! assert_eq!(v, 2.0);
//! ```
pub mod arithmetic;
pub mod error;
pub mod function;
pub mod variables;

pub use arithmetic::{ArithmeticParser, ArithmeticRule, GRAMMAR, LEXICON};
pub use error::EvalError;
pub use function::{ArityError, ClosureFunction, Function, FunctionTable, IntoFunction, NativeFunction};
pub use variables::VariableTable;
