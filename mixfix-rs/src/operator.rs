//! Operator definitions: symbols, fixity, arity, and evaluation behavior.

use std::fmt;

use crate::error::EvalError;
use crate::expr::{Expression, Resolver};

// ── Fixity ────────────────────────────────────────────────────────────────────

/// Whether an operator expects a left and/or right outer operand.
///
/// Multi-symbol operators additionally take one inner operand between each
/// pair of adjacent symbols, whatever their fixity: `["?", ":"]` with
/// [`Fixity::Infix`] is the classic ternary, `["(", ")"]` with
/// [`Fixity::Atomic`] is parenthesization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fixity {
    /// No outer operands (`( x )`).
    Atomic,
    /// Right outer operand only (`! x`).
    Prefix,
    /// Left outer operand only (`x !`).
    Postfix,
    /// Both outer operands (`x + y`).
    Infix,
}

impl Fixity {
    /// `true` if an operand binds to the left of the first symbol.
    pub fn has_left(self) -> bool {
        matches!(self, Fixity::Postfix | Fixity::Infix)
    }

    /// `true` if an operand binds to the right of the last symbol.
    pub fn has_right(self) -> bool {
        matches!(self, Fixity::Prefix | Fixity::Infix)
    }
}

// ── Operator ──────────────────────────────────────────────────────────────────

/// Evaluation behavior stored on an [`Operator`].
///
/// Receives the resolver (if any) and the operation's operand expressions
/// **unevaluated**. The function decides which operands to evaluate and in
/// what order — which is what makes short-circuit operators possible.
pub type EvalFn<T> =
    dyn Fn(Option<&dyn Resolver<T>>, &[Expression<T>]) -> Result<T, EvalError> + Send + Sync;

/// One entry of an operator table.
///
/// An ordered list of literal symbols plus a [`Fixity`] and an evaluation
/// function. A single-symbol [`Infix`](Fixity::Infix) operator is the
/// ordinary binary case (`a + b`); each additional symbol inserts one operand
/// between the adjacent pair (`a ? b : c`). Operators are immutable once
/// built; precedence comes from their position in the
/// [`Algebra`](crate::Algebra) table, not from the operator itself.
pub struct Operator<T> {
    symbols: Vec<String>,
    fixity: Fixity,
    eval: Box<EvalFn<T>>,
}

impl<T> Operator<T> {
    /// Build an operator from its symbol sequence, fixity, and evaluation
    /// function.
    ///
    /// # Panics
    ///
    /// Panics if `symbols` is empty or contains an empty string — a
    /// zero-length symbol can never be matched by the tokenizer.
    pub fn new<S, F>(fixity: Fixity, symbols: impl IntoIterator<Item = S>, eval: F) -> Self
    where
        S: Into<String>,
        F: Fn(Option<&dyn Resolver<T>>, &[Expression<T>]) -> Result<T, EvalError>
            + Send
            + Sync
            + 'static,
    {
        let symbols: Vec<String> = symbols.into_iter().map(Into::into).collect();
        assert!(
            !symbols.is_empty(),
            "operator must have at least one symbol"
        );
        assert!(
            symbols.iter().all(|s| !s.is_empty()),
            "operator symbols must be non-empty"
        );
        Operator {
            symbols,
            fixity,
            eval: Box::new(eval),
        }
    }

    /// Single-symbol operator with operands on both sides (`a + b`).
    pub fn infix<F>(symbol: impl Into<String>, eval: F) -> Self
    where
        F: Fn(Option<&dyn Resolver<T>>, &[Expression<T>]) -> Result<T, EvalError>
            + Send
            + Sync
            + 'static,
    {
        Operator::new(Fixity::Infix, [symbol.into()], eval)
    }

    /// Single-symbol operator with its operand on the right (`! a`).
    pub fn prefix<F>(symbol: impl Into<String>, eval: F) -> Self
    where
        F: Fn(Option<&dyn Resolver<T>>, &[Expression<T>]) -> Result<T, EvalError>
            + Send
            + Sync
            + 'static,
    {
        Operator::new(Fixity::Prefix, [symbol.into()], eval)
    }

    /// Single-symbol operator with its operand on the left (`a !`).
    pub fn postfix<F>(symbol: impl Into<String>, eval: F) -> Self
    where
        F: Fn(Option<&dyn Resolver<T>>, &[Expression<T>]) -> Result<T, EvalError>
            + Send
            + Sync
            + 'static,
    {
        Operator::new(Fixity::Postfix, [symbol.into()], eval)
    }

    /// Two symbols enclosing a single operand and taking no outer operands —
    /// parenthesization (`( a )`).
    pub fn circumfix<F>(open: impl Into<String>, close: impl Into<String>, eval: F) -> Self
    where
        F: Fn(Option<&dyn Resolver<T>>, &[Expression<T>]) -> Result<T, EvalError>
            + Send
            + Sync
            + 'static,
    {
        Operator::new(Fixity::Atomic, [open.into(), close.into()], eval)
    }

    /// The literal symbols, in match order.
    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn fixity(&self) -> Fixity {
        self.fixity
    }

    /// Number of operand expressions an occurrence takes: one per gap between
    /// adjacent symbols, plus the outer operands the fixity asks for.
    pub fn arity(&self) -> usize {
        self.symbols.len() - 1
            + usize::from(self.fixity.has_left())
            + usize::from(self.fixity.has_right())
    }

    /// Run the evaluation function over `operands` (passed unevaluated).
    pub fn evaluate(
        &self,
        resolver: Option<&dyn Resolver<T>>,
        operands: &[Expression<T>],
    ) -> Result<T, EvalError> {
        (self.eval)(resolver, operands)
    }
}

impl<T> fmt::Debug for Operator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operator")
            .field("symbols", &self.symbols)
            .field("fixity", &self.fixity)
            .finish_non_exhaustive()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn nop(_: Option<&dyn Resolver<i64>>, _: &[Expression<i64>]) -> Result<i64, EvalError> {
        Ok(0)
    }

    #[test]
    fn arity_counts_gaps_and_outer_operands() {
        assert_eq!(Operator::infix("+", nop).arity(), 2);
        assert_eq!(Operator::prefix("!", nop).arity(), 1);
        assert_eq!(Operator::postfix("!", nop).arity(), 1);
        assert_eq!(Operator::circumfix("(", ")", nop).arity(), 1);
        // Ternary: two symbols, both outer operands.
        assert_eq!(Operator::new(Fixity::Infix, ["?", ":"], nop).arity(), 3);
        // Atomic single symbol: a niladic token.
        assert_eq!(Operator::new(Fixity::Atomic, ["pi"], nop).arity(), 0);
    }

    #[test]
    fn fixity_flags() {
        assert!(!Fixity::Atomic.has_left() && !Fixity::Atomic.has_right());
        assert!(!Fixity::Prefix.has_left() && Fixity::Prefix.has_right());
        assert!(Fixity::Postfix.has_left() && !Fixity::Postfix.has_right());
        assert!(Fixity::Infix.has_left() && Fixity::Infix.has_right());
    }

    #[test]
    #[should_panic(expected = "at least one symbol")]
    fn rejects_empty_symbol_list() {
        Operator::new(Fixity::Atomic, Vec::<String>::new(), nop);
    }

    #[test]
    #[should_panic(expected = "non-empty")]
    fn rejects_empty_symbol() {
        Operator::new(Fixity::Infix, [""], nop);
    }

    #[test]
    fn evaluate_delegates_to_the_closure() {
        let op = Operator::infix("+", |_, _| Ok(41));
        assert_eq!(op.evaluate(None, &[]), Ok(41));
    }

    #[test]
    fn debug_shows_symbols_and_fixity() {
        let op: Operator<i64> = Operator::infix("+", nop);
        let repr = format!("{op:?}");
        assert!(repr.contains("\"+\""), "unexpected debug repr: {repr}");
        assert!(repr.contains("Infix"), "unexpected debug repr: {repr}");
    }
}
