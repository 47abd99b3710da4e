//! Runtime errors reported by the table-driven parser.
//!
//! A generated parser never panics on bad input. Every failure surfaces as a
//! [`ParseError`], and each variant maps to a distinct negative code through
//! [`ParseError::code`], so callers that only care about the classic yacc
//! return convention can still get it.
//!
//! ```rust
//! # use ayacc::ParseError;
//! let err = ParseError::Syntax { state: 3, token: 43 };
//! assert_eq!(err.code(), -1);
//! assert!(err.to_string().contains("syntax error"));
//! ```

use thiserror::Error;

/// Code returned for a syntax error.
pub const SYNTAX_ERROR: i32 = -1;
/// Code returned when the parse stack exceeds its depth bound.
pub const STACK_OVERFLOW: i32 = -2;
/// Code returned when the lexer or a semantic action fails.
pub const CALLBACK_ERROR: i32 = -3;

/// Errors produced by [`Parser::parse`](crate::Parser::parse).
#[derive(Debug, Error)]
pub enum ParseError {
    /// No action exists for the lookahead in the current state, the lookahead
    /// was declared non-associative at this point, or the lexer returned a
    /// token code unknown to the grammar.
    #[error("syntax error in state {state} on token code {token}")]
    Syntax {
        /// Parser state in which the error was detected.
        state: usize,
        /// External code of the offending token.
        token: i32,
    },

    /// The value/state stack would grow past its configured bound.
    #[error("parse stack overflow (depth {depth})")]
    StackOverflow {
        /// The depth bound that was hit.
        depth: usize,
    },

    /// The lexer failed to produce the next token.
    #[error("lexer error: {0}")]
    Lexer(#[source] anyhow::Error),

    /// A semantic action failed while reducing `rule`.
    #[error("action error in rule {rule}: {source}")]
    Action {
        /// Index of the rule being reduced.
        rule: usize,
        /// The error returned by the action.
        #[source]
        source: anyhow::Error,
    },
}

impl ParseError {
    /// Returns the negative return code associated with this error.
    pub fn code(&self) -> i32 {
        match self {
            ParseError::Syntax { .. } => SYNTAX_ERROR,
            ParseError::StackOverflow { .. } => STACK_OVERFLOW,
            ParseError::Lexer(_) | ParseError::Action { .. } => CALLBACK_ERROR,
        }
    }
}
