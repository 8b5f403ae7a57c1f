//! # Evaluation Error Type
//!
//! [`EvalError`] is the single error surface of [`ArithmeticParser::evaluate`].
//! It covers failures reported by the parsing engine (unrecognized input,
//! unexpected tokens), failures of the semantic actions (unknown names,
//! arity mismatches, malformed literals) and violations of the evaluator's
//! own stack invariants.
//!
//! [`ArithmeticParser::evaluate`]: crate::ArithmeticParser::evaluate
use lrkit::{ParseError, Span};
use smartstring::alias::String;
use std::num::ParseFloatError;
use thiserror::Error;

/// Represents all possible errors of one evaluation.
///
/// # Examples
/// ```rust
/// # use formulas::EvalError;
/// # use lrkit::{ParseError, Span};
/// let err: EvalError = ParseError::Lexical { span: Span::new(2, 3) }.into();
/// assert!(matches!(err, EvalError::Lexical { .. }));
/// assert!(!err.is_internal());
/// ```
#[derive(Debug, Error)]
pub enum EvalError {
    /// No token pattern matches the text at `span`.
    #[error("unrecognized input at {span}")]
    Lexical { span: Span },

    /// The token at `span` does not fit the grammar here.
    #[error("unexpected {found} at {span}")]
    Syntax { found: String, span: Span },

    /// An identifier used as a value is not in the variable table.
    #[error("undefined variable {name:?} at {span}")]
    UndefinedVariable { name: String, span: Span },

    /// An identifier used as a callee is not in the function table.
    #[error("undefined function {name:?} at {span}")]
    UndefinedFunction { name: String, span: Span },

    /// A function was called with the wrong number of arguments.
    #[error("function {name} takes {expected} arguments but {supplied} were supplied")]
    ArityMismatch {
        name: String,
        expected: usize,
        supplied: usize,
    },

    /// A number token is not a valid floating-point literal.
    #[error("malformed number {text:?}")]
    MalformedNumber {
        text: String,
        #[source]
        source: ParseFloatError,
    },

    /// The evaluator's stacks are in a state that a well-formed event
    /// stream cannot produce.
    #[error("internal evaluator fault: {0}")]
    InternalFault(String),
}

impl EvalError {
    /// Returns `true` for faults of the evaluator or the engine itself, as
    /// opposed to problems with the formula or the tables.
    pub fn is_internal(&self) -> bool {
        matches!(self, EvalError::InternalFault(_))
    }

    pub(crate) fn fault(msg: impl Into<String>) -> Self {
        EvalError::InternalFault(msg.into())
    }
}

impl From<ParseError> for EvalError {
    fn from(err: ParseError) -> Self {
        match err {
            ParseError::Lexical { span } => EvalError::Lexical { span },
            ParseError::Syntax { found, span } => EvalError::Syntax { found, span },
            ParseError::Internal(msg) => EvalError::InternalFault(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn _assert_send_sync_static<T: Send + Sync + 'static>() {}

    #[test]
    fn eval_error_is_send_sync_static() {
        _assert_send_sync_static::<EvalError>();
    }

    #[test]
    fn engine_errors_map_by_kind() {
        let err: EvalError = ParseError::Syntax {
            found: "comma".into(),
            span: Span::new(1, 2),
        }
        .into();
        assert!(matches!(err, EvalError::Syntax { ref found, .. } if found == "comma"));

        let err: EvalError = ParseError::Internal("no goto".into()).into();
        assert!(err.is_internal());
    }

    #[test]
    fn arity_message_names_both_counts() {
        let err = EvalError::ArityMismatch {
            name: "add".into(),
            expected: 2,
            supplied: 3,
        };
        assert_eq!(
            err.to_string(),
            "function add takes 2 arguments but 3 were supplied"
        );
    }

    #[test]
    fn malformed_number_keeps_source() {
        use std::error::Error as _;
        let source = "1.2.3".parse::<f64>().unwrap_err();
        let err = EvalError::MalformedNumber {
            text: "1.2.3".into(),
            source,
        };
        assert!(err.source().is_some());
    }
}
