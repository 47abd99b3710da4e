//! # ayacc-calc
//!
//! A small integer calculator whose parser is generated at build time by
//! `ayacc-gen` from `src/calc.y` and driven by the `ayacc` runtime.
//!
//! ```rust
//! assert_eq!(ayacc_calc::eval("1 + 2 * 3").unwrap(), 7);
//! assert_eq!(ayacc_calc::eval("(1 + 2) * 3").unwrap(), 9);
//! assert_eq!(ayacc_calc::eval("1 +").unwrap_err().code(), -1);
//! ```

pub mod lexer;

/// Tables and actions generated from `calc.y`.
pub mod parser {
    include!(concat!(env!("OUT_DIR"), "/calc_parser.rs"));
}

pub use ayacc::ParseError;
pub use lexer::CalcLexer;

/// Evaluates one expression.
pub fn eval(src: &str) -> Result<i64, ParseError> {
    let value = parser::yyparse(&mut CalcLexer::new(src))?;
    log::debug!("{} = {}", src.trim(), value);
    Ok(value)
}
