//! Fatal grammar errors.
//!
//! Every problem found while reading or analysing a grammar aborts generation
//! with one [`GrammarError`] that names the offending source line. Conflicts
//! are not errors; they are counted and reported separately.

use thiserror::Error;

/// An error that stops parser generation.
///
/// Line numbers are 1-based. Limits that only become visible after the
/// automaton is built (state counts, packed table sizes) have no single
/// source line and use line 0.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrammarError {
    /// Malformed declarations or rules, unterminated code blocks, bad characters.
    #[error("line {line}: syntax error: {message}")]
    Syntax { line: usize, message: String },

    /// Well-formed input that does not describe a usable grammar.
    #[error("line {line}: {message}")]
    Semantic { line: usize, message: String },

    /// A fixed capacity of the generator or of the emitted tables was exceeded.
    #[error("line {line}: limit exceeded: {message}")]
    Limit { line: usize, message: String },
}

impl GrammarError {
    pub(crate) fn syntax(line: usize, message: impl Into<String>) -> Self {
        GrammarError::Syntax {
            line,
            message: message.into(),
        }
    }

    pub(crate) fn semantic(line: usize, message: impl Into<String>) -> Self {
        GrammarError::Semantic {
            line,
            message: message.into(),
        }
    }

    pub(crate) fn limit(line: usize, message: impl Into<String>) -> Self {
        GrammarError::Limit {
            line,
            message: message.into(),
        }
    }

    /// The source line the error refers to.
    pub fn line(&self) -> usize {
        match self {
            GrammarError::Syntax { line, .. }
            | GrammarError::Semantic { line, .. }
            | GrammarError::Limit { line, .. } => *line,
        }
    }
}
