//! Copyright (c) 2005–2025 IKH Software, Inc.
//!
//! Released under the terms of the GNU Lesser General Public License, version 3.0
//! or (at your option) any later version (LGPL-3.0-or-later).
//!
//! Runtime for parsers generated by `ayacc-gen`.
//!
//! A generated parser is nothing but a set of compacted integer tables plus a
//! semantic action function. This crate supplies the rest:
//!  * [`Tables`]: a borrowed view over the emitted arrays with action and
//!    goto decoding,
//!  * [`Parser`]: the shift-reduce drive loop,
//!  * [`Lexer`]: the trait a token source implements,
//!  * [`ParseError`]: runtime failures with classic negative return codes.

mod error;
mod parser;
mod tables;

pub use crate::error::{CALLBACK_ERROR, ParseError, STACK_OVERFLOW, SYNTAX_ERROR};
pub use crate::parser::{DEFAULT_MAX_DEPTH, Lexer, Parser, ParserStats};
pub use crate::tables::{Action, Tables};
