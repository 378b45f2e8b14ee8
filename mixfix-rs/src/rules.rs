//! Character-classification policy for the tokenizer.
//!
//! [`Rules`] decides which characters separate identifiers (whitespace),
//! which abort a parse outright (illegal), and which escape the character
//! after them. A policy is read-only during a parse and may be swapped
//! between parses with [`Algebra::set_rules`](crate::Algebra::set_rules).

/// Tokenizer character policy.
pub trait Rules {
    /// The escape character, if one is configured.
    ///
    /// The character following an unescaped escape character is treated as
    /// literal identifier text, whatever the other classifiers say.
    fn escape_char(&self) -> Option<char>;

    /// Whitespace separates tokens and emits nothing.
    fn is_whitespace(&self, c: char) -> bool;

    /// Illegal characters fail the parse at their offset unless escaped.
    fn is_illegal(&self, c: char) -> bool;
}

// ── SimpleRules ───────────────────────────────────────────────────────────────

/// Stock [`Rules`] backed by explicit character sets.
///
/// The default policy escapes with `\`, treats Unicode whitespace as
/// whitespace, and marks nothing illegal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleRules {
    escape: Option<char>,
    /// `None` = Unicode whitespace; `Some` = exactly these characters.
    whitespace: Option<Vec<char>>,
    illegal: Vec<char>,
}

impl SimpleRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the escape character. `None` disables escaping entirely.
    pub fn with_escape(mut self, escape: Option<char>) -> Self {
        self.escape = escape;
        self
    }

    /// Use an explicit whitespace set instead of Unicode whitespace.
    pub fn with_whitespace(mut self, chars: impl IntoIterator<Item = char>) -> Self {
        self.whitespace = Some(chars.into_iter().collect());
        self
    }

    /// Mark characters as illegal (default: none).
    pub fn with_illegal(mut self, chars: impl IntoIterator<Item = char>) -> Self {
        self.illegal = chars.into_iter().collect();
        self
    }
}

impl Default for SimpleRules {
    fn default() -> Self {
        SimpleRules {
            escape: Some('\\'),
            whitespace: None,
            illegal: Vec::new(),
        }
    }
}

impl Rules for SimpleRules {
    fn escape_char(&self) -> Option<char> {
        self.escape
    }

    fn is_whitespace(&self, c: char) -> bool {
        match &self.whitespace {
            Some(set) => set.contains(&c),
            None => c.is_whitespace(),
        }
    }

    fn is_illegal(&self, c: char) -> bool {
        self.illegal.contains(&c)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
