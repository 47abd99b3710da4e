//! Lexer for yacc grammar files.
//!
//! Built on [`logos`]. Declarations, rule punctuation and symbols are matched
//! declaratively by [`LogosToken`]; the three multi-line constructs (`%{ %}`
//! prologue blocks, `{ }` action blocks and `/* */` comments) are consumed by
//! callbacks that scan ahead in the remainder. The [`Lexer`] wrapper converts
//! raw tokens into [`Token`]s, tracks the source line of every token and turns
//! everything after the second `%%` into a single [`Token::Tail`].

use crate::error::GrammarError;
use logos::Logos;
use std::fmt;

/// Tokens consumed by the grammar parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// The `%%` section separator.
    Mark,
    /// Everything after the second `%%`, verbatim.
    Tail(String),
    /// Body of a `%{ ... %}` block.
    Prologue(String),
    KwToken,
    KwLeft,
    KwRight,
    KwNonassoc,
    KwType,
    KwStart,
    KwUnion,
    KwPrec,
    /// A `<tag>` without the angle brackets.
    Tag(String),
    Ident(String),
    /// A character literal token such as `'+'`.
    Char(char),
    Colon,
    Bar,
    Semi,
    /// Body of a `{ ... }` block without the outer braces.
    Code(String),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Mark => write!(f, "%%"),
            Token::Tail(_) => write!(f, "trailing code"),
            Token::Prologue(_) => write!(f, "%{{ block"),
            Token::KwToken => write!(f, "%token"),
            Token::KwLeft => write!(f, "%left"),
            Token::KwRight => write!(f, "%right"),
            Token::KwNonassoc => write!(f, "%nonassoc"),
            Token::KwType => write!(f, "%type"),
            Token::KwStart => write!(f, "%start"),
            Token::KwUnion => write!(f, "%union"),
            Token::KwPrec => write!(f, "%prec"),
            Token::Tag(t) => write!(f, "<{}>", t),
            Token::Ident(s) => write!(f, "{}", s),
            Token::Char(c) => write!(f, "{:?}", c),
            Token::Colon => write!(f, "':'"),
            Token::Bar => write!(f, "'|'"),
            Token::Semi => write!(f, "';'"),
            Token::Code(_) => write!(f, "action block"),
        }
    }
}

#[derive(Logos, Debug, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
enum LogosToken {
    #[token("%%")]
    Mark,

    #[token("%{", prologue)]
    Prologue(String),

    #[token("%token")]
    KwToken,

    #[token("%left")]
    KwLeft,

    #[token("%right")]
    KwRight,

    #[token("%nonassoc")]
    KwNonassoc,

    #[token("%type")]
    KwType,

    #[token("%start")]
    KwStart,

    #[token("%union")]
    KwUnion,

    #[token("%prec")]
    KwPrec,

    /// Any other `%word`; rejected by the wrapper.
    #[regex(r"%[A-Za-z_]+")]
    Directive,

    #[regex(r"<[A-Za-z_][A-Za-z0-9_]*>", |lex| {
        let s = lex.slice();
        s[1..s.len() - 1].to_string()
    })]
    Tag(String),

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_string())]
    Ident(String),

    #[regex(r"'([^'\\\n]|\\[^\n])'", char_literal)]
    Char(char),

    #[token(":")]
    Colon,

    #[token("|")]
    Bar,

    #[token(";")]
    Semi,

    #[token("{", code_block)]
    Code(String),

    #[token("/*", block_comment)]
    #[regex(r"//[^\n]*")]
    Comment,
}

fn prologue(lex: &mut logos::Lexer<LogosToken>) -> Option<String> {
    let rest = lex.remainder();
    let end = rest.find("%}")?;
    let body = rest[..end].to_string();
    lex.bump(end + 2);
    Some(body)
}

fn block_comment(lex: &mut logos::Lexer<LogosToken>) -> bool {
    match lex.remainder().find("*/") {
        Some(end) => {
            lex.bump(end + 2);
            true
        }
        None => false,
    }
}

fn char_literal(lex: &mut logos::Lexer<LogosToken>) -> Option<char> {
    let s = lex.slice();
    let inner = &s[1..s.len() - 1];
    let mut chars = inner.chars();
    match (chars.next()?, chars.next()) {
        ('\\', Some(e)) => match e {
            'n' => Some('\n'),
            't' => Some('\t'),
            'r' => Some('\r'),
            '0' => Some('\0'),
            '\\' | '\'' | '"' => Some(e),
            _ => None,
        },
        (c, None) => Some(c),
        _ => None,
    }
}

fn code_block(lex: &mut logos::Lexer<LogosToken>) -> Option<String> {
    let rest = lex.remainder();
    let end = closing_brace(rest)?;
    let body = rest[..end].to_string();
    lex.bump(end + 1);
    Some(body)
}

/// Finds the brace closing an already opened block in Rust code.
///
/// Braces inside string literals, character literals and comments do not
/// count. A quote that does not start a character literal is a lifetime or a
/// label and is skipped.
fn closing_brace(s: &str) -> Option<usize> {
    let b = s.as_bytes();
    let mut depth = 1usize;
    let mut i = 0;
    while i < b.len() {
        match b[i] {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            b'"' => {
                i += 1;
                while i < b.len() && b[i] != b'"' {
                    if b[i] == b'\\' {
                        i += 1;
                    }
                    i += 1;
                }
            }
            b'\'' => {
                let mut it = s[i + 1..].char_indices();
                match (it.next(), it.next()) {
                    (Some((_, '\\')), _) => {
                        i += 3;
                        while i < b.len() && b[i] != b'\'' {
                            i += 1;
                        }
                    }
                    (Some(_), Some((j, '\''))) => i += 1 + j,
                    _ => {}
                }
            }
            b'/' if b.get(i + 1) == Some(&b'/') => {
                while i < b.len() && b[i] != b'\n' {
                    i += 1;
                }
            }
            b'/' if b.get(i + 1) == Some(&b'*') => {
                i += 2;
                while i + 1 < b.len() && !(b[i] == b'*' && b[i + 1] == b'/') {
                    i += 1;
                }
                i += 1;
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Grammar source lexer.
///
/// Yields tokens together with the 1-based line on which they start.
pub struct Lexer<'source> {
    inner: logos::Lexer<'source, LogosToken>,
    /// Line of the byte at `pos`.
    line: usize,
    pos: usize,
    marks: usize,
}

impl<'source> Lexer<'source> {
    pub fn new(input: &'source str) -> Self {
        Self {
            inner: LogosToken::lexer(input),
            line: 1,
            pos: 0,
            marks: 0,
        }
    }

    /// Line of the last token returned, or of the end of input once exhausted.
    pub fn line(&self) -> usize {
        self.line
    }

    fn advance(&mut self, to: usize) {
        let src = self.inner.source();
        self.line += src[self.pos..to].bytes().filter(|&b| b == b'\n').count();
        self.pos = to;
    }

    /// Returns the next token and its line, or `None` at end of input.
    pub fn next_token(&mut self) -> Option<Result<(Token, usize), GrammarError>> {
        while let Some(kind) = self.inner.next() {
            let span = self.inner.span();
            self.advance(span.start);
            let line = self.line;
            let token = match kind {
                Ok(token) => token,
                Err(()) => {
                    let slice = self.inner.slice();
                    let message = match slice {
                        "{" => "unterminated action block".to_string(),
                        "%{" => "unterminated %{ block".to_string(),
                        "/*" => "unterminated comment".to_string(),
                        s if s.starts_with('\'') => format!("bad character literal {}", s),
                        s => format!("unexpected {:?}", s),
                    };
                    return Some(Err(GrammarError::syntax(line, message)));
                }
            };
            let token = match token {
                LogosToken::Mark => {
                    self.marks += 1;
                    if self.marks == 2 {
                        let rest = self.inner.remainder();
                        let tail = rest.to_string();
                        self.inner.bump(rest.len());
                        Token::Tail(tail)
                    } else {
                        Token::Mark
                    }
                }
                LogosToken::Prologue(body) => Token::Prologue(body),
                LogosToken::KwToken => Token::KwToken,
                LogosToken::KwLeft => Token::KwLeft,
                LogosToken::KwRight => Token::KwRight,
                LogosToken::KwNonassoc => Token::KwNonassoc,
                LogosToken::KwType => Token::KwType,
                LogosToken::KwStart => Token::KwStart,
                LogosToken::KwUnion => Token::KwUnion,
                LogosToken::KwPrec => Token::KwPrec,
                LogosToken::Directive => {
                    let message = format!("unknown directive {}", self.inner.slice());
                    return Some(Err(GrammarError::syntax(line, message)));
                }
                LogosToken::Tag(t) => Token::Tag(t),
                LogosToken::Ident(s) => Token::Ident(s),
                LogosToken::Char(c) => Token::Char(c),
                LogosToken::Colon => Token::Colon,
                LogosToken::Bar => Token::Bar,
                LogosToken::Semi => Token::Semi,
                LogosToken::Code(body) => Token::Code(body),
                LogosToken::Comment => continue,
            };
            return Some(Ok((token, line)));
        }
        let end = self.inner.source().len();
        self.advance(end);
        None
    }

    /// Tokenizes the whole input.
    ///
    /// Returns the tokens and, in a parallel vector, the line of each one.
    /// The line vector carries one extra entry for the end of input.
    pub fn tokenize_all(input: &'source str) -> Result<(Vec<Token>, Vec<usize>), GrammarError> {
        let mut lex = Lexer::new(input);
        let mut toks = Vec::new();
        let mut lines = Vec::new();
        while let Some(next) = lex.next_token() {
            let (tok, line) = next?;
            toks.push(tok);
            lines.push(line);
        }
        lines.push(lex.line());
        Ok((toks, lines))
    }
}
