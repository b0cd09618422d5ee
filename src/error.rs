// ABOUTME: Error types for reader and evaluation failures

use thiserror::Error;

/// Errors produced while tokenizing or reading. These are reported on the
/// diagnostic channel by the caller; the reader itself only returns them so
/// the caller can decide whether to keep reading.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReaderError {
    #[error("unexpected end of input inside list (missing ')')")]
    UnterminatedList,

    #[error("unexpected ')'")]
    UnexpectedCloseParen,

    #[error("malformed dotted pair: expected exactly one object after '.'")]
    MalformedDottedPair,

    #[error("unterminated string literal")]
    UnterminatedString,
}

/// Errors produced while evaluating. These are reported and the offending
/// operation yields `NIL`; they never unwind the evaluator's caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    #[error("{form}: expected {expected} argument{s}, got {actual}", s = if *.expected == "1" { "" } else { "s" })]
    Arity {
        form: String,
        expected: String,
        actual: usize,
    },

    #[error("{form}: expected {expected}, got {actual}")]
    TypeMismatch {
        form: String,
        expected: String,
        actual: String,
    },

    #[error("symbol '{0}' is not defined")]
    UndefinedSymbol(String),

    #[error("cannot apply: {0}")]
    NotApplicable(String),

    #[error("division by zero in {0}")]
    DivisionByZero(&'static str),

    #[error("{0}")]
    Custom(String),
}

impl EvalError {
    pub fn arity(form: &str, expected: impl Into<String>, actual: usize) -> Self {
        EvalError::Arity {
            form: form.to_string(),
            expected: expected.into(),
            actual,
        }
    }

    pub fn type_mismatch(form: &str, expected: &str, actual: &str) -> Self {
        EvalError::TypeMismatch {
            form: form.to_string(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }
}

/// A fatal, unrecoverable condition. The caller should print the message
/// and exit the process with status 1 — there is no exception mechanism to
/// unwind through. Sink exhaustion is deliberately not here: it is
/// reported as a diagnostic and the interpreter keeps running with the
/// offending cell unrooted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FatalError {
    #[error("out of memory: arena is at capacity ({0} cells) after a collection")]
    ArenaExhausted(usize),
}
