//! Token source for the calculator grammar.
//!
//! Numbers become `NUM` tokens carrying their value; operators and
//! parentheses are passed through as single-character token codes.

use crate::parser::NUM;
use anyhow::{Result, anyhow};
use logos::Logos;

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n]+")]
enum Tok {
    #[regex("[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    Num(i64),

    #[regex(r"[-+*/()]", |lex| lex.slice().chars().next())]
    Op(char),
}

/// Lexer over one expression string.
pub struct CalcLexer<'s> {
    inner: logos::Lexer<'s, Tok>,
}

impl<'s> CalcLexer<'s> {
    pub fn new(src: &'s str) -> Self {
        Self {
            inner: Tok::lexer(src),
        }
    }
}

impl ayacc::Lexer for CalcLexer<'_> {
    type Value = i64;

    fn lex(&mut self) -> Result<(i32, i64)> {
        let tok = match self.inner.next() {
            None => return Ok((0, 0)),
            Some(tok) => tok,
        };
        match tok {
            Ok(Tok::Num(n)) => {
                log::trace!("NUM {}", n);
                Ok((NUM, n))
            }
            Ok(Tok::Op(c)) => Ok((c as i32, 0)),
            Err(()) => Err(anyhow!(
                "unexpected {:?} at offset {}",
                self.inner.slice(),
                self.inner.span().start
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ayacc::Lexer;

    fn codes(src: &str) -> Vec<(i32, i64)> {
        let mut lexer = CalcLexer::new(src);
        let mut out = Vec::new();
        loop {
            let tok = lexer.lex().unwrap();
            if tok.0 == 0 {
                return out;
            }
            out.push(tok);
        }
    }

    #[test]
    fn numbers_and_operators() {
        assert_eq!(
            codes(" 12*(3 -\n4)"),
            vec![
                (NUM, 12),
                ('*' as i32, 0),
                ('(' as i32, 0),
                (NUM, 3),
                ('-' as i32, 0),
                (NUM, 4),
                (')' as i32, 0),
            ]
        );
        assert!(codes("").is_empty());
    }

    #[test]
    fn rejects_unknown_characters() {
        let mut lexer = CalcLexer::new("1 # 2");
        assert_eq!(lexer.lex().unwrap(), (NUM, 1));
        let err = lexer.lex().unwrap_err();
        assert!(err.to_string().contains("offset 2"));
    }

    #[test]
    fn oversized_number_is_an_error() {
        let mut lexer = CalcLexer::new("99999999999999999999");
        assert!(lexer.lex().is_err());
    }
}
