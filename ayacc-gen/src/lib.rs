//! Copyright (c) 2005–2025 IKH Software, Inc.
//!
//! Released under the terms of the GNU Lesser General Public License, version 3.0
//! or (at your option) any later version (LGPL-3.0-or-later).
//!
//! LALR(1) parser generator for yacc-style grammars.
//!
//! A grammar file goes through these stages:
//!  * [`reader`]: tokenizes and parses the declarations and rules into a
//!    numbered [`grammar::Grammar`],
//!  * [`first`]: nullability and FIRST sets,
//!  * [`lalr`]: the LALR(1) item-set automaton,
//!  * [`table`]: action and goto rows with conflict resolution,
//!  * [`compact`]: row-displacement packing into `i16` arrays,
//!  * [`emit`] and [`report`]: the generated Rust module and the
//!    human-readable `.output` report.
//!
//! [`generate`] ties the stages together and is meant to be called from a
//! `build.rs` script. Generated parsers run on the `ayacc` runtime crate.

pub mod compact;
pub mod emit;
pub mod error;
pub mod first;
pub mod generate;
pub mod grammar;
pub mod lalr;
pub mod reader;
pub mod report;
pub mod symset;
pub mod symtab;
pub mod table;

pub use error::GrammarError;
pub use generate::{Compiled, Summary, compile, generate};
