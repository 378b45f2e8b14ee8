//! Operator-precedence expression engine for user-defined mixfix operator
//! tables.
//!
//! An [`Algebra`] is built from an ordered list of [`Operator`]s — infix,
//! prefix, postfix, or multi-symbol forms like `? :` and `( )` — and parses
//! text into [`Expression`] trees:
//!
//! - Table order is precedence order: index 0 binds loosest and ends up
//!   outermost, the last index binds tightest.
//! - Constants are opaque identifier strings; a [`Resolver`] gives them
//!   values at evaluation time, so one tree can be evaluated against many
//!   environments.
//! - Operators evaluate their operands lazily, which makes short-circuit
//!   forms like `&` and `? :` natural to write.
//! - Trees render back to parseable text, and
//!   [`escape_where_necessary`](Algebra::escape_where_necessary) quotes
//!   arbitrary strings so they survive a round trip as a single constant.
//!
//! # Quick start
//!
//! ```rust
//! use mixfix::{Algebra, Operator};
//!
//! let algebra: Algebra<i64> = Algebra::new([
//!     Operator::infix("+", |r, ops| Ok(ops[0].evaluate(r)? + ops[1].evaluate(r)?)),
//!     Operator::infix("*", |r, ops| Ok(ops[0].evaluate(r)? * ops[1].evaluate(r)?)),
//! ]);
//!
//! let expr = algebra.parse("a + b * c")?;
//! assert_eq!(expr.to_string(), "a + b * c");
//!
//! let lookup = |name: &str| match name {
//!     "a" => 2,
//!     "b" => 3,
//!     _ => 4,
//! };
//! assert_eq!(expr.evaluate(Some(&lookup)), Ok(14));
//! # Ok::<(), mixfix::ParseError>(())
//! ```

pub mod algebra;
pub mod error;
pub mod expr;
pub mod operator;
pub mod rules;

// Re-exports for convenience.
pub use algebra::Algebra;
pub use error::{EvalError, ParseError};
pub use expr::{Expression, Operation, Resolver};
pub use operator::{EvalFn, Fixity, Operator};
pub use rules::{Rules, SimpleRules};
