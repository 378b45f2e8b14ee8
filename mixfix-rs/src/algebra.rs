//! The engine host: tokenizer, precedence reducer, and escaper.
//!
//! An [`Algebra`] owns the tokenization [`Rules`] and the ordered operator
//! table. Table order is precedence order: index 0 binds loosest (its
//! occurrences end up outermost), the highest index binds tightest.

use std::fmt;
use std::sync::Arc;

use aho_corasick::{AhoCorasick, AhoCorasickBuilder, MatchKind};

use crate::error::ParseError;
use crate::expr::{Expression, Operation};
use crate::operator::Operator;
use crate::rules::{Rules, SimpleRules};

// ── Symbol matcher ────────────────────────────────────────────────────────────

/// Anchored automaton over every symbol of every operator, in table order.
///
/// Leftmost-first match kind on an anchored search returns the first pattern
/// in insertion order matching at the cursor — the "scan the table, first hit
/// wins" rule, with no longest-match bias.
struct SymbolMatcher {
    automaton: AhoCorasick,
    /// Pattern id → (operator table index, symbol index within the operator).
    origins: Vec<(usize, usize)>,
}

impl SymbolMatcher {
    fn build<T>(operators: &[Arc<Operator<T>>]) -> Self {
        let mut patterns = Vec::new();
        let mut origins = Vec::new();
        for (tier, operator) in operators.iter().enumerate() {
            for (part, symbol) in operator.symbols().iter().enumerate() {
                patterns.push(symbol.clone());
                origins.push((tier, part));
            }
        }
        let automaton = AhoCorasickBuilder::new()
            .match_kind(MatchKind::LeftmostFirst)
            .anchored(true)
            .build(&patterns);
        SymbolMatcher { automaton, origins }
    }

    /// First symbol matching at the start of `haystack`, as
    /// `(tier, part, byte length)`.
    fn symbol_at(&self, haystack: &str) -> Option<(usize, usize, usize)> {
        let m = self.automaton.find(haystack)?;
        let (tier, part) = self.origins[m.pattern()];
        Some((tier, part, m.end()))
    }
}

// ── Tokens ────────────────────────────────────────────────────────────────────

/// Transient parse token; never escapes the engine.
enum Token<T> {
    /// Identifier span, escape characters already stripped.
    Constant { offset: usize, text: String },
    /// One symbol of one operator occurrence.
    Symbol { offset: usize, tier: usize, part: usize },
    /// An already-reduced subtree.
    Reduced { offset: usize, expr: Expression<T> },
}

impl<T> Token<T> {
    fn offset(&self) -> usize {
        match self {
            Token::Constant { offset, .. }
            | Token::Symbol { offset, .. }
            | Token::Reduced { offset, .. } => *offset,
        }
    }
}

/// Close an identifier span, stripping the recorded escape characters.
fn constant_token<T>(text: &str, start: usize, end: usize, escapes: &mut Vec<usize>) -> Token<T> {
    let mut out = String::with_capacity(end - start);
    let mut skip = escapes.iter().copied().peekable();
    for (i, c) in text[start..end].char_indices() {
        if skip.peek() == Some(&(start + i)) {
            skip.next();
            continue;
        }
        out.push(c);
    }
    escapes.clear();
    Token::Constant {
        offset: start,
        text: out,
    }
}

// ── Reducer bookkeeping ───────────────────────────────────────────────────────

/// One partially-matched occurrence of the tier's operator.
struct Frame<T> {
    /// Offset of the occurrence's first symbol; becomes the folded node's
    /// representative offset.
    start_offset: usize,
    /// Offset of the most recently matched symbol.
    sym_offset: usize,
    /// Index of the most recently matched symbol.
    sym_index: usize,
    /// Operands reduced so far, with their representative offsets.
    operands: Vec<(usize, Expression<T>)>,
    /// Raw tokens accumulated since the last matched symbol.
    span: Vec<Token<T>>,
}

/// What to blame for an empty operand span at the end of a reduction window.
///
/// A reduction window is a slice of the surrounding token stream, and an
/// empty span at its edge is blamed on the neighboring token, which may live
/// outside the window: `( a + )` blames the `)`.
#[derive(Clone, Copy)]
enum Blame {
    /// A token follows the window; empty spans on the window edge blame it.
    After(usize),
    /// The window ends the stream; empty spans blame the nearest preceding
    /// token, falling back to this inherited offset.
    AtEnd(usize),
}

impl Blame {
    /// Offset for a window that turned out to be entirely empty.
    fn offset(self) -> usize {
        match self {
            Blame::After(offset) | Blame::AtEnd(offset) => offset,
        }
    }
}

/// Offset of the token positionally last in the window so far: the top
/// marker's newest operand, then older markers' pending tokens and operands,
/// then the reduced prefix.
fn local_before<T>(done: &[Token<T>], stack: &[Frame<T>]) -> Option<usize> {
    for (depth, frame) in stack.iter().rev().enumerate() {
        if depth > 0 {
            if let Some(token) = frame.span.last() {
                return Some(token.offset());
            }
        }
        if let Some((offset, _)) = frame.operands.last() {
            return Some(*offset);
        }
    }
    done.last().map(Token::offset)
}

// ── Algebra ───────────────────────────────────────────────────────────────────

/// An ordered operator table plus tokenization rules; parses text into
/// [`Expression`] trees.
///
/// ```rust
/// use mixfix::{Algebra, Expression, Operator};
///
/// let algebra: Algebra<bool> = Algebra::new([
///     Operator::infix("|", |r, ops| Ok(ops[0].evaluate(r)? || ops[1].evaluate(r)?)),
///     Operator::infix("&", |r, ops| Ok(ops[0].evaluate(r)? && ops[1].evaluate(r)?)),
///     Operator::prefix("!", |r, ops: &[Expression<bool>]| Ok(!ops[0].evaluate(r)?)),
/// ]);
///
/// let expr = algebra.parse("!a & b").unwrap();
/// assert_eq!(expr.evaluate(Some(&|name: &str| name == "b")), Ok(true));
/// assert_eq!(expr.to_string(), "!a & b");
/// ```
pub struct Algebra<T> {
    rules: Box<dyn Rules + Send + Sync>,
    operators: Vec<Arc<Operator<T>>>,
    matcher: SymbolMatcher,
    diagnostics: Box<dyn Fn(&str) + Send + Sync>,
}

impl<T> Algebra<T> {
    /// An algebra over `operators` with [`SimpleRules::default`].
    ///
    /// Operator order is precedence order: the first operator binds loosest
    /// (outermost), the last tightest (innermost).
    pub fn new(operators: impl IntoIterator<Item = Operator<T>>) -> Self {
        Algebra::with_rules(SimpleRules::default(), operators)
    }

    /// An algebra with an explicit tokenization policy.
    pub fn with_rules(
        rules: impl Rules + Send + Sync + 'static,
        operators: impl IntoIterator<Item = Operator<T>>,
    ) -> Self {
        let operators: Vec<Arc<Operator<T>>> = operators.into_iter().map(Arc::new).collect();
        let matcher = SymbolMatcher::build(&operators);
        Algebra {
            rules: Box::new(rules),
            operators,
            matcher,
            diagnostics: Box::new(|_| {}),
        }
    }

    /// Append `operator` at the tightest-binding end of the table and return
    /// its table index.
    ///
    /// Indices are stable for the lifetime of the algebra; hosts that persist
    /// operator choices can key on them.
    pub fn register(&mut self, operator: Operator<T>) -> usize {
        self.operators.push(Arc::new(operator));
        self.matcher = SymbolMatcher::build(&self.operators);
        self.operators.len() - 1
    }

    /// The operator table in precedence order.
    pub fn operators(&self) -> &[Arc<Operator<T>>] {
        &self.operators
    }

    /// The active tokenization rules.
    pub fn rules(&self) -> &dyn Rules {
        &*self.rules
    }

    /// Swap the tokenization policy (between parses; `&mut self` enforces
    /// that no parse is in flight).
    pub fn set_rules(&mut self, rules: impl Rules + Send + Sync + 'static) {
        self.rules = Box::new(rules);
    }

    /// Install a sink for internal-error reports. Advisory only: it never
    /// changes what `parse` returns. Defaults to a no-op.
    pub fn set_diagnostics(&mut self, sink: impl Fn(&str) + Send + Sync + 'static) {
        self.diagnostics = Box::new(sink);
    }

    /// Parse `text` into a single expression tree.
    pub fn parse(&self, text: &str) -> Result<Expression<T>, ParseError> {
        let tokens = self.tokenize(text)?;
        let (_, expr) = self.reduce(tokens, 0, Blame::AtEnd(0))?;
        Ok(expr)
    }

    /// Like [`parse`](Algebra::parse), but absence-based: `None` on any
    /// malformed input.
    pub fn try_parse(&self, text: &str) -> Option<Expression<T>> {
        self.parse(text).ok()
    }

    /// Escape `text` so it parses back as a single
    /// [`Constant`](Expression::Constant) carrying exactly this text.
    ///
    /// Inserts the escape character before whitespace, before any position
    /// where an operator symbol would match, and before the escape character
    /// itself. Returns `text` unchanged when no escape character is
    /// configured or nothing needs escaping.
    pub fn escape_where_necessary(&self, text: &str) -> String {
        let escape = match self.rules.escape_char() {
            Some(c) => c,
            None => return text.to_string(),
        };

        let needs_escape = |i: usize, c: char| {
            c == escape
                || self.rules.is_whitespace(c)
                || self.matcher.symbol_at(&text[i..]).is_some()
        };

        if !text.char_indices().any(|(i, c)| needs_escape(i, c)) {
            return text.to_string();
        }

        let mut out = String::with_capacity(text.len() + 4);
        for (i, c) in text.char_indices() {
            if needs_escape(i, c) {
                out.push(escape);
            }
            out.push(c);
        }
        out
    }

    // ── Tokenizer ─────────────────────────────────────────────────────────────

    /// Scan `text` into constant and symbol tokens per the active rules.
    fn tokenize(&self, text: &str) -> Result<Vec<Token<T>>, ParseError> {
        let escape_char = self.rules.escape_char();

        let mut tokens = Vec::new();
        let mut pending: Option<usize> = None; // open identifier span
        let mut escapes: Vec<usize> = Vec::new(); // escape offsets in the span
        let mut escaped: Option<usize> = None; // offset of a pending escape
        let mut i = 0;

        while i < text.len() {
            let c = match text[i..].chars().next() {
                Some(c) => c,
                None => break,
            };

            if escaped.is_none() && escape_char == Some(c) {
                escaped = Some(i);
                escapes.push(i);
                i += c.len_utf8();
                continue;
            }

            if escaped.is_none() {
                if self.rules.is_illegal(c) {
                    return Err(ParseError::new(format!("illegal character '{c}'"), i));
                }
                if self.rules.is_whitespace(c) {
                    if let Some(start) = pending.take() {
                        tokens.push(constant_token(text, start, i, &mut escapes));
                    }
                    i += c.len_utf8();
                    continue;
                }
                if let Some((tier, part, len)) = self.matcher.symbol_at(&text[i..]) {
                    if let Some(start) = pending.take() {
                        tokens.push(constant_token(text, start, i, &mut escapes));
                    }
                    tokens.push(Token::Symbol {
                        offset: i,
                        tier,
                        part,
                    });
                    i += len;
                    continue;
                }
            }

            // Literal identifier character. A span opened by an escaped
            // character starts at the escape itself, so the recorded escape
            // offsets always fall inside their span.
            let origin = escaped.take();
            if pending.is_none() {
                pending = Some(origin.unwrap_or(i));
            }
            i += c.len_utf8();
        }

        if let Some(start) = pending {
            tokens.push(constant_token(text, start, text.len(), &mut escapes));
        }
        Ok(tokens)
    }

    // ── Reducer ───────────────────────────────────────────────────────────────

    /// Collapse `items` into one expression, considering tiers `min_tier`
    /// and tighter.
    ///
    /// Returns the expression plus its representative offset (a constant's
    /// own offset, or the first-symbol offset of a folded operation).
    fn reduce(
        &self,
        items: Vec<Token<T>>,
        min_tier: usize,
        blame: Blame,
    ) -> Result<(usize, Expression<T>), ParseError> {
        if items.is_empty() {
            return Err(ParseError::new("expected expression", blame.offset()));
        }

        let mut items = items;
        for tier in min_tier..self.operators.len() {
            items = self.reduce_tier(items, tier, min_tier, blame)?;
        }

        if items.len() > 1 {
            return Err(ParseError::new("expected operator", items[1].offset()));
        }
        match items.pop() {
            Some(Token::Constant { offset, text }) => Ok((offset, Expression::Constant(text))),
            Some(Token::Reduced { offset, expr }) => Ok((offset, expr)),
            Some(Token::Symbol { offset, .. }) => {
                Err(self.internal_error("unconsumed operator symbol", offset))
            }
            None => Err(self.internal_error("empty reduction window", blame.offset())),
        }
    }

    /// One tier pass: fold every occurrence of `self.operators[tier]`,
    /// leaving a shorter token sequence for the next tier.
    ///
    /// Operand spans between symbols blame the symbol that demanded them;
    /// the trailing span inherits this window's own [`Blame`].
    fn reduce_tier(
        &self,
        items: Vec<Token<T>>,
        tier: usize,
        min_tier: usize,
        blame: Blame,
    ) -> Result<Vec<Token<T>>, ParseError> {
        let operator = &self.operators[tier];
        let symbols = operator.symbols();
        let last = symbols.len() - 1;
        let has_left = operator.fixity().has_left();
        let has_right = operator.fixity().has_right();

        let mut done: Vec<Token<T>> = Vec::with_capacity(items.len());
        let mut stack: Vec<Frame<T>> = Vec::new();

        for item in items {
            let (part, offset) = match item {
                Token::Symbol { tier: t, part, offset } if t == tier => (part, offset),
                Token::Symbol { tier: t, offset, .. } if t < tier => {
                    return Err(self.internal_error("operator tier out of order", offset));
                }
                other => {
                    match stack.last_mut() {
                        Some(frame) => frame.span.push(other),
                        None => done.push(other),
                    }
                    continue;
                }
            };

            // Re-dispatch loop: an eager fold replays the same symbol against
            // the enclosing marker.
            loop {
                let fold_open = matches!(
                    stack.last(),
                    Some(frame) if frame.sym_index == last && has_left && has_right
                );
                if fold_open {
                    // `a + b + c`: fold the pending occurrence before starting
                    // the next, so same-tier chains associate left.
                    let span = match stack.last_mut() {
                        Some(frame) => std::mem::take(&mut frame.span),
                        None => Vec::new(),
                    };
                    let operand = self.reduce(span, min_tier + 1, Blame::After(offset))?;
                    if let Some(frame) = stack.last_mut() {
                        frame.operands.push(operand);
                    }
                    self.fold_top(&mut done, &mut stack, operator)?;
                    continue;
                }

                if part == 0 {
                    let mut operands = Vec::new();
                    if has_left {
                        let span = match stack.last_mut() {
                            Some(frame) => std::mem::take(&mut frame.span),
                            None => std::mem::take(&mut done),
                        };
                        operands.push(self.reduce(span, min_tier + 1, Blame::After(offset))?);
                    }
                    stack.push(Frame {
                        start_offset: offset,
                        sym_offset: offset,
                        sym_index: 0,
                        operands,
                        span: Vec::new(),
                    });
                } else {
                    match stack.last_mut() {
                        Some(frame) if part == frame.sym_index + 1 => {
                            let span = std::mem::take(&mut frame.span);
                            let operand = self.reduce(span, min_tier + 1, Blame::After(offset))?;
                            frame.operands.push(operand);
                            frame.sym_index = part;
                            frame.sym_offset = offset;
                        }
                        _ => {
                            return Err(ParseError::new(
                                format!("unexpected token '{}'", symbols[part]),
                                offset,
                            ));
                        }
                    }
                }

                let complete = matches!(
                    stack.last(),
                    Some(frame) if frame.sym_index == last
                );
                if complete && !has_right {
                    self.fold_top(&mut done, &mut stack, operator)?;
                }
                break;
            }
        }

        // Markers that take their final operand from the rest of the window,
        // innermost first.
        loop {
            let ready = matches!(
                stack.last(),
                Some(frame) if frame.sym_index == last && has_right
            );
            if !ready {
                break;
            }
            let trailing = match blame {
                Blame::After(offset) => Blame::After(offset),
                Blame::AtEnd(fallback) => {
                    Blame::AtEnd(local_before(&done, &stack).unwrap_or(fallback))
                }
            };
            let span = match stack.last_mut() {
                Some(frame) => std::mem::take(&mut frame.span),
                None => Vec::new(),
            };
            let operand = self.reduce(span, min_tier + 1, trailing)?;
            if let Some(frame) = stack.last_mut() {
                frame.operands.push(operand);
            }
            self.fold_top(&mut done, &mut stack, operator)?;
        }

        if let Some(frame) = stack.last() {
            let expected = &symbols[frame.sym_index + 1];
            let matched = &symbols[frame.sym_index];
            return Err(ParseError::new(
                format!("expected symbol '{expected}'"),
                frame.sym_offset + matched.len(),
            ));
        }

        Ok(done)
    }

    /// Pop the top marker and fold its operands into an [`Operation`],
    /// pushing the result onto the enclosing span.
    fn fold_top(
        &self,
        done: &mut Vec<Token<T>>,
        stack: &mut Vec<Frame<T>>,
        operator: &Arc<Operator<T>>,
    ) -> Result<(), ParseError> {
        let frame = match stack.pop() {
            Some(frame) => frame,
            None => return Err(self.internal_error("fold with no open operator", 0)),
        };
        if !frame.span.is_empty() {
            return Err(self.internal_error("unreduced span at fold", frame.start_offset));
        }
        if frame.operands.len() != operator.arity() {
            return Err(self.internal_error(
                &format!(
                    "operand count {} does not match arity {}",
                    frame.operands.len(),
                    operator.arity()
                ),
                frame.start_offset,
            ));
        }
        let operands = frame.operands.into_iter().map(|(_, expr)| expr).collect();
        let expr = Expression::Operation(Operation::new(Arc::clone(operator), operands));
        let token = Token::Reduced {
            offset: frame.start_offset,
            expr,
        };
        match stack.last_mut() {
            Some(outer) => outer.span.push(token),
            None => done.push(token),
        }
        Ok(())
    }

    /// Route an invariant violation through the diagnostic sink and surface
    /// it as a regular [`ParseError`].
    fn internal_error(&self, detail: &str, offset: usize) -> ParseError {
        (self.diagnostics)(&format!("internal parse error: {detail} (offset {offset})"));
        ParseError::new(format!("internal error: {detail}"), offset)
    }
}

impl<T> fmt::Debug for Algebra<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Algebra")
            .field("operators", &self.operators)
            .finish_non_exhaustive()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
