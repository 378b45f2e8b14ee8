//! Expression trees: constants, operations, evaluation, traversal, rendering.

use std::fmt;
use std::sync::Arc;

use crate::error::EvalError;
use crate::operator::Operator;

// ── Resolver ──────────────────────────────────────────────────────────────────

/// Maps variable identifiers to values during evaluation.
///
/// Blanket-implemented for any `Fn(&str) -> T`, so a closure works directly:
///
/// ```rust
/// use mixfix::{Algebra, Operator};
///
/// let algebra: Algebra<i64> = Algebra::new([Operator::infix("+", |r, ops| {
///     Ok(ops[0].evaluate(r)? + ops[1].evaluate(r)?)
/// })]);
/// let expr = algebra.parse("a + a").unwrap();
/// assert_eq!(expr.evaluate(Some(&|_: &str| 21)), Ok(42));
/// ```
pub trait Resolver<T> {
    fn resolve(&self, identifier: &str) -> T;
}

impl<T, F> Resolver<T> for F
where
    F: Fn(&str) -> T,
{
    fn resolve(&self, identifier: &str) -> T {
        self(identifier)
    }
}

// ── Expression ────────────────────────────────────────────────────────────────

/// A parsed expression tree.
///
/// Immutable once built; pure value with no back-reference to the engine, so
/// it may be rendered and evaluated repeatedly and concurrently. `Clone`,
/// `Debug`, and `PartialEq` are implemented for every `T`; operations compare
/// equal when they share the same operator (by table identity) and have equal
/// operands.
pub enum Expression<T> {
    /// A free variable reference, resolved only at evaluation time.
    Constant(String),
    /// An operator applied to its operands.
    Operation(Operation<T>),
}

/// An operator application: the operator plus exactly
/// [`arity`](Operator::arity) operand expressions in positional order (left
/// outer operand first, then one operand per symbol gap, then the right outer
/// operand).
pub struct Operation<T> {
    operator: Arc<Operator<T>>,
    operands: Vec<Expression<T>>,
}

impl<T> Operation<T> {
    /// Build an operation node directly (parsing normally does this for you).
    ///
    /// # Panics
    ///
    /// Panics if `operands.len() != operator.arity()`.
    pub fn new(operator: Arc<Operator<T>>, operands: Vec<Expression<T>>) -> Self {
        assert_eq!(
            operands.len(),
            operator.arity(),
            "operation built with {} operands for an arity-{} operator",
            operands.len(),
            operator.arity(),
        );
        Operation { operator, operands }
    }

    pub fn operator(&self) -> &Arc<Operator<T>> {
        &self.operator
    }

    /// Operand expressions in positional order.
    pub fn operands(&self) -> &[Expression<T>] {
        &self.operands
    }

    /// Copy of this operation with the operand at `index` replaced. The
    /// rebuild-style alternative to in-place operand mutation: trees stay
    /// immutable.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn with_operand(&self, index: usize, operand: Expression<T>) -> Self {
        let mut operands = self.operands.clone();
        operands[index] = operand;
        Operation {
            operator: Arc::clone(&self.operator),
            operands,
        }
    }
}

impl<T> Expression<T> {
    /// Evaluate against `resolver`.
    ///
    /// A [`Constant`](Expression::Constant) resolves its identifier, failing
    /// if `resolver` is `None`. An [`Operation`](Expression::Operation) hands
    /// the resolver and its **unevaluated** operands to the operator's
    /// evaluation function, which chooses what to evaluate and in what order
    /// — a short-circuit operator simply never touches the skipped operand.
    pub fn evaluate(&self, resolver: Option<&dyn Resolver<T>>) -> Result<T, EvalError> {
        match self {
            Expression::Constant(identifier) => match resolver {
                Some(resolver) => Ok(resolver.resolve(identifier)),
                None => Err(EvalError::NoResolver {
                    identifier: identifier.clone(),
                }),
            },
            Expression::Operation(op) => op.operator.evaluate(resolver, &op.operands),
        }
    }

    /// Visit every [`Constant`](Expression::Constant) identifier depth-first,
    /// pre-order, left to right — structurally, independent of any operator's
    /// evaluation-time short-circuiting.
    ///
    /// `visitor` returning `false` stops the walk immediately; the call
    /// returns `true` only if the walk ran to completion.
    pub fn walk_variables<F>(&self, mut visitor: F) -> bool
    where
        F: FnMut(&str) -> bool,
    {
        self.walk(&mut visitor)
    }

    fn walk(&self, visitor: &mut dyn FnMut(&str) -> bool) -> bool {
        match self {
            Expression::Constant(identifier) => visitor(identifier),
            Expression::Operation(op) => op.operands.iter().all(|operand| operand.walk(visitor)),
        }
    }

    /// Every variable identifier in encounter order, duplicates included.
    pub fn variables(&self) -> Vec<String> {
        let mut vars = Vec::new();
        self.walk_variables(|name| {
            vars.push(name.to_string());
            true
        });
        vars
    }

    /// Render back to parseable text, mapping each identifier through
    /// `formatter`.
    ///
    /// Each operator symbol gets one space on each side except against a
    /// missing outer operand: prefix operators render tight on the left
    /// (`!a`), postfix tight on the right (`a!`), circumfix tight inside
    /// (`(a)`), infix fully spaced (`a + b`, `a ? b : c`). The result
    /// re-parses to an equal tree provided no symbol collides with constant
    /// text.
    pub fn render<F>(&self, formatter: F) -> String
    where
        F: Fn(&str) -> String,
    {
        let mut out = String::new();
        self.render_into(&mut out, &formatter);
        out
    }

    fn render_into(&self, out: &mut String, formatter: &dyn Fn(&str) -> String) {
        match self {
            Expression::Constant(identifier) => out.push_str(&formatter(identifier)),
            Expression::Operation(op) => {
                let symbols = op.operator.symbols();
                let last = symbols.len() - 1;
                let has_left = op.operator.fixity().has_left();
                let has_right = op.operator.fixity().has_right();

                let mut operands = op.operands.iter();
                if has_left {
                    if let Some(operand) = operands.next() {
                        operand.render_into(out, formatter);
                    }
                }
                for (i, symbol) in symbols.iter().enumerate() {
                    if (i > 0 || has_left) && (i != last || has_right) {
                        out.push(' ');
                    }
                    out.push_str(symbol);
                    if i < last || has_right {
                        if i != 0 || has_left {
                            out.push(' ');
                        }
                        if let Some(operand) = operands.next() {
                            operand.render_into(out, formatter);
                        }
                    }
                }
            }
        }
    }
}

/// Renders with the identity formatter.
impl<T> fmt::Display for Expression<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(|s| s.to_string()))
    }
}

// Manual impls so `T` needs no bounds: only operator pointers and strings are
// touched.

impl<T> Clone for Expression<T> {
    fn clone(&self) -> Self {
        match self {
            Expression::Constant(identifier) => Expression::Constant(identifier.clone()),
            Expression::Operation(op) => Expression::Operation(op.clone()),
        }
    }
}

impl<T> Clone for Operation<T> {
    fn clone(&self) -> Self {
        Operation {
            operator: Arc::clone(&self.operator),
            operands: self.operands.clone(),
        }
    }
}

impl<T> fmt::Debug for Expression<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Constant(identifier) => {
                f.debug_tuple("Constant").field(identifier).finish()
            }
            Expression::Operation(op) => op.fmt(f),
        }
    }
}

impl<T> fmt::Debug for Operation<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation")
            .field("operator", &self.operator.symbols())
            .field("operands", &self.operands)
            .finish()
    }
}

impl<T> PartialEq for Expression<T> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Expression::Constant(a), Expression::Constant(b)) => a == b,
            (Expression::Operation(a), Expression::Operation(b)) => a == b,
            _ => false,
        }
    }
}

impl<T> PartialEq for Operation<T> {
    // Operator identity, not symbol text: two tables may both define "+".
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.operator, &other.operator) && self.operands == other.operands
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operator::Fixity;

    fn var(name: &str) -> Expression<i64> {
        Expression::Constant(name.into())
    }

    fn add() -> Arc<Operator<i64>> {
        Arc::new(Operator::infix("+", |r, ops| {
            Ok(ops[0].evaluate(r)? + ops[1].evaluate(r)?)
        }))
    }

    #[test]
    fn constant_resolves_through_the_resolver() {
        let expr = var("x");
        assert_eq!(expr.evaluate(Some(&|_: &str| 7)), Ok(7));
    }

    #[test]
    fn constant_without_resolver_fails() {
        let expr = var("x");
        assert_eq!(
            expr.evaluate(None),
            Err(EvalError::NoResolver {
                identifier: "x".into()
            })
        );
    }

    #[test]
    fn operands_are_passed_unevaluated() {
        // The operator ignores its operands entirely; an eager engine would
        // fail on the unresolvable constant below.
        let lazy: Arc<Operator<i64>> = Arc::new(Operator::infix("&&", |_, _| Ok(1)));
        let expr = Expression::Operation(Operation::new(
            Arc::clone(&lazy),
            vec![var("a"), var("b")],
        ));
        assert_eq!(expr.evaluate(None), Ok(1));
    }

    #[test]
    fn walk_is_structural_and_ordered() {
        let op = add();
        let expr = Expression::Operation(Operation::new(
            Arc::clone(&op),
            vec![
                Expression::Operation(Operation::new(Arc::clone(&op), vec![var("a"), var("b")])),
                var("c"),
            ],
        ));
        assert_eq!(expr.variables(), ["a", "b", "c"]);
    }

    #[test]
    fn walk_stops_on_false() {
        let op = add();
        let expr =
            Expression::Operation(Operation::new(Arc::clone(&op), vec![var("a"), var("b")]));
        let mut visited = 0;
        let completed = expr.walk_variables(|_| {
            visited += 1;
            false
        });
        assert!(!completed);
        assert_eq!(visited, 1);
    }

    #[test]
    fn render_spacing_per_fixity() {
        let infix = Expression::Operation(Operation::new(add(), vec![var("a"), var("b")]));
        assert_eq!(infix.to_string(), "a + b");

        let prefix: Arc<Operator<i64>> = Arc::new(Operator::prefix("!", |_, _| Ok(0)));
        let expr = Expression::Operation(Operation::new(prefix, vec![var("a")]));
        assert_eq!(expr.to_string(), "!a");

        let postfix: Arc<Operator<i64>> = Arc::new(Operator::postfix("!", |_, _| Ok(0)));
        let expr = Expression::Operation(Operation::new(postfix, vec![var("a")]));
        assert_eq!(expr.to_string(), "a!");

        let parens: Arc<Operator<i64>> = Arc::new(Operator::circumfix("(", ")", |_, _| Ok(0)));
        let expr = Expression::Operation(Operation::new(parens, vec![var("a")]));
        assert_eq!(expr.to_string(), "(a)");

        let ternary: Arc<Operator<i64>> =
            Arc::new(Operator::new(Fixity::Infix, ["?", ":"], |_, _| Ok(0)));
        let expr = Expression::Operation(Operation::new(
            ternary,
            vec![var("a"), var("b"), var("c")],
        ));
        assert_eq!(expr.to_string(), "a ? b : c");
    }

    #[test]
    fn render_applies_the_formatter() {
        let expr = Expression::Operation(Operation::new(add(), vec![var("a"), var("b")]));
        assert_eq!(expr.render(|s| format!("<{s}>")), "<a> + <b>");
    }

    #[test]
    fn with_operand_rebuilds() {
        let op = add();
        let expr = Operation::new(Arc::clone(&op), vec![var("a"), var("b")]);
        let swapped = expr.with_operand(1, var("z"));
        assert_eq!(swapped.operands()[1], var("z"));
        // The original is untouched.
        assert_eq!(expr.operands()[1], var("b"));
    }

    #[test]
    #[should_panic(expected = "arity")]
    fn operation_arity_is_checked() {
        Operation::new(add(), vec![var("a")]);
    }

    #[test]
    fn equality_is_by_operator_identity() {
        let op = add();
        let a = Expression::Operation(Operation::new(Arc::clone(&op), vec![var("a"), var("b")]));
        let b = Expression::Operation(Operation::new(Arc::clone(&op), vec![var("a"), var("b")]));
        assert_eq!(a, b);

        // Same symbols, different table entry: not equal.
        let other = add();
        let c = Expression::Operation(Operation::new(other, vec![var("a"), var("b")]));
        assert_ne!(a, c);
    }
}
