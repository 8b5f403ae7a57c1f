//! Source spans and the error types shared by the grammar reader, the lexicon
//! reader, the tokenizer and the parser.
//!
//! # Examples
//!
//! ```rust
//! # use lrkit::{ParseError, Span};
//! let sp = Span::new(3, 7);
//! assert_eq!(sp.len(), 4);
//! assert_eq!(sp.slice("let x = 1"), " x =");
//!
//! let err = ParseError::Lexical { span: sp };
//! assert!(err.to_string().contains("3..7"));
//! ```

use regex_automata::dfa::dense::BuildError;
use smartstring::alias::String;
use std::fmt;
use thiserror::Error;

/// A half-open byte range `[start, end)` into the text being tokenized.
///
/// Spans always refer to the original text; tokens never own a copy of the
/// matched characters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Span {
    /// Starting byte offset (inclusive).
    pub start: usize,
    /// Ending byte offset (exclusive).
    pub end: usize,
}

impl Span {
    /// Creates a new `Span`.
    #[inline]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Returns `true` if the span covers no bytes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Number of bytes covered by the span.
    #[inline]
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Returns the covered part of `text`, or `""` when the span does not
    /// fall on character boundaries of `text`.
    #[inline]
    pub fn slice<'a>(&self, text: &'a str) -> &'a str {
        text.get(self.start..self.end).unwrap_or_default()
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Failures raised while tokenizing or parsing one input text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// No lexicon rule matches the text at `span.start`.
    #[error("unrecognized input at {span}")]
    Lexical {
        /// Location of the first character no rule could match.
        span: Span,
    },

    /// The token at `span` is not acceptable in the current parser state.
    #[error("unexpected {found} at {span}")]
    Syntax {
        /// Terminal name of the offending token (`end of input` at the end).
        found: String,
        /// Location of the offending token.
        span: Span,
    },

    /// The table or the DFA is in a state that construction should have
    /// ruled out.
    #[error("internal parser error: {0}")]
    Internal(String),
}

/// Failures raised while reading a lexicon description or compiling it.
#[derive(Debug, Error)]
pub enum LexiconError {
    /// A line is neither a fragment definition nor a rule.
    #[error("unrecognized lexicon line ({line}): {text:?}")]
    Syntax { line: usize, text: String },

    /// A rule declared a mode other than `emit` or `skip`.
    #[error("unknown mode <{mode}> at lexicon line {line}")]
    Mode { line: usize, mode: String },

    /// A `{{NAME}}` reference names no fragment defined above it.
    #[error("unknown variable(s) {names} at lexicon line {line}")]
    UnknownVariable { line: usize, names: String },

    /// Fragment expansion did not settle, most likely a cycle.
    #[error("variable expansion exceeded depth at lexicon line {line} (possible cycle)")]
    ExpansionDepth { line: usize },

    /// Two rules share one name.
    #[error("lexicon rule {name} is declared twice")]
    Duplicate { name: String },

    /// The lexicon has no rules at all.
    #[error("lexicon declares no rules")]
    Empty,

    /// The patterns could not be compiled into a DFA.
    #[error("failed to compile lexicon patterns: {0}")]
    Build(#[from] BuildError),
}

/// Failures raised while reading a grammar description or building its
/// parse table.
#[derive(Debug, Error)]
pub enum GrammarError {
    /// The grammar text contains a character sequence that is not a symbol,
    /// an arrow, a comment or a line break.
    #[error("unrecognized grammar input {text:?} at line {line}")]
    Lex { line: usize, text: String },

    /// The grammar text is not a sequence of `Lhs -> symbols` lines.
    #[error("malformed production at grammar line {line}")]
    Parse { line: usize },

    /// The grammar text declares no productions.
    #[error("grammar declares no rules")]
    NoRules,

    /// Rule 0 cannot serve as the augmented start rule.
    #[error(
        "start rule {lhs} must have a single production and must not appear on any right-hand side"
    )]
    BadStartRule { lhs: String },

    /// A nonterminal is referenced but has no production.
    #[error("nonterminal {name} is used but never defined")]
    UndefinedNonterminal { name: String },

    /// A grammar terminal has no emitted lexicon rule.
    #[error("terminal {name} has no emitted lexicon rule")]
    UndefinedTerminal { name: String },

    /// A table cell received more than one action.
    #[error("grammar is not SLR(1): state {state} on {symbol} allows {actions}")]
    Conflict {
        state: usize,
        symbol: String,
        actions: String,
    },

    /// The lexicon paired with the grammar is invalid.
    #[error(transparent)]
    Lexicon(#[from] LexiconError),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn _assert_send_sync_static<T: Send + Sync + 'static>() {}

    #[test]
    fn errors_are_send_sync_static() {
        _assert_send_sync_static::<ParseError>();
        _assert_send_sync_static::<LexiconError>();
        _assert_send_sync_static::<GrammarError>();
    }

    #[test]
    fn empty_span_at_end_of_text() {
        let text = "1+2";
        let sp = Span::new(text.len(), text.len());
        assert!(sp.is_empty());
        assert_eq!(sp.len(), 0);
        assert_eq!(sp.slice(text), "");
    }

    #[test]
    fn slice_off_char_boundary_is_empty() {
        let text = "é1";
        assert_eq!(Span::new(0, 1).slice(text), "");
        assert_eq!(Span::new(0, 2).slice(text), "é");
    }

    #[test]
    fn syntax_error_mentions_found_and_span() {
        let err = ParseError::Syntax {
            found: "comma".into(),
            span: Span::new(5, 6),
        };
        let msg = err.to_string();
        assert!(msg.contains("comma"));
        assert!(msg.contains("5..6"));
    }

    #[test]
    fn lexicon_error_lifts_into_grammar_error() {
        let err: GrammarError = LexiconError::Empty.into();
        assert!(matches!(err, GrammarError::Lexicon(LexiconError::Empty)));
        assert_eq!(err.to_string(), "lexicon declares no rules");
    }
}
