//! Syntax of yacc grammar files, built with [`chumsky`] over the token slice
//! produced by the [`lexer`](super::lexer).
//!
//! The parser only checks shape. Names stay unresolved strings and every
//! construct carries the [`SimpleSpan`] of its tokens so that the semantic pass
//! can report lines.

use super::lexer::Token;
use crate::error::GrammarError;
use crate::grammar::Assoc;
use chumsky::prelude::*;

type Extra<'a> = extra::Err<Rich<'a, Token>>;

/// A symbol reference as written in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymRef {
    Name(String),
    Char(char),
}

pub type Spanned<T> = (T, SimpleSpan);

#[derive(Debug, Clone, PartialEq)]
pub enum Decl {
    Token {
        tag: Option<String>,
        syms: Vec<Spanned<SymRef>>,
    },
    Prec {
        assoc: Assoc,
        tag: Option<String>,
        syms: Vec<Spanned<SymRef>>,
    },
    Type {
        tag: String,
        syms: Vec<Spanned<SymRef>>,
    },
    Start(Spanned<String>),
    Union(Spanned<String>),
    Prologue(String),
}

/// One alternative of a rule group.
#[derive(Debug, Clone, PartialEq)]
pub struct Alt {
    pub syms: Vec<Spanned<SymRef>>,
    pub prec: Option<Spanned<SymRef>>,
    pub action: Option<Spanned<String>>,
}

/// `head : alt | alt ... ;`
#[derive(Debug, Clone, PartialEq)]
pub struct RuleGroup {
    pub head: Spanned<String>,
    pub alts: Vec<Alt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Source {
    pub decls: Vec<Decl>,
    /// Span of the `%%` separating declarations from rules.
    pub mark: SimpleSpan,
    pub rules: Vec<RuleGroup>,
    pub tail: Option<String>,
}

fn sym_ref<'a>() -> impl Parser<'a, &'a [Token], Spanned<SymRef>, Extra<'a>> + Clone {
    select! {
        Token::Ident(s) => SymRef::Name(s),
        Token::Char(c) => SymRef::Char(c),
    }
    .map_with(|s, e| (s, e.span()))
    .labelled("symbol")
}

fn name<'a>() -> impl Parser<'a, &'a [Token], Spanned<String>, Extra<'a>> + Clone {
    select! { Token::Ident(s) => s }
        .map_with(|s, e| (s, e.span()))
        .labelled("name")
}

fn code<'a>() -> impl Parser<'a, &'a [Token], Spanned<String>, Extra<'a>> + Clone {
    select! { Token::Code(c) => c }
        .map_with(|c, e| (c, e.span()))
        .labelled("action")
}

fn tag<'a>() -> impl Parser<'a, &'a [Token], String, Extra<'a>> + Clone {
    select! { Token::Tag(t) => t }.labelled("tag")
}

fn decl<'a>() -> impl Parser<'a, &'a [Token], Decl, Extra<'a>> + Clone {
    let syms = sym_ref().repeated().at_least(1).collect::<Vec<_>>();

    let token = just(Token::KwToken)
        .ignore_then(tag().or_not())
        .then(syms.clone())
        .map(|(tag, syms)| Decl::Token { tag, syms });

    let assoc = select! {
        Token::KwLeft => Assoc::Left,
        Token::KwRight => Assoc::Right,
        Token::KwNonassoc => Assoc::Nonassoc,
    };
    let prec = assoc
        .then(tag().or_not())
        .then(syms.clone())
        .map(|((assoc, tag), syms)| Decl::Prec { assoc, tag, syms });

    let typ = just(Token::KwType)
        .ignore_then(tag())
        .then(syms)
        .map(|(tag, syms)| Decl::Type { tag, syms });

    let start = just(Token::KwStart).ignore_then(name()).map(Decl::Start);
    let union = just(Token::KwUnion).ignore_then(code()).map(Decl::Union);
    let prologue = select! { Token::Prologue(c) => Decl::Prologue(c) };

    choice((token, prec, typ, start, union, prologue))
}

fn rule_group<'a>() -> impl Parser<'a, &'a [Token], RuleGroup, Extra<'a>> + Clone {
    let prec = just(Token::KwPrec).ignore_then(sym_ref());

    let alt = sym_ref()
        .repeated()
        .collect::<Vec<_>>()
        .then(prec.or_not())
        .then(code().or_not())
        .map(|((syms, prec), action)| Alt { syms, prec, action });

    name()
        .then_ignore(just(Token::Colon))
        .then(alt.separated_by(just(Token::Bar)).at_least(1).collect::<Vec<_>>())
        .then_ignore(just(Token::Semi))
        .map(|(head, alts)| RuleGroup { head, alts })
}

pub fn parser<'a>() -> impl Parser<'a, &'a [Token], Source, Extra<'a>> {
    decl()
        .repeated()
        .collect::<Vec<_>>()
        .then(just(Token::Mark).map_with(|_, e| e.span()))
        .then(rule_group().repeated().collect::<Vec<_>>())
        .then(select! { Token::Tail(t) => t }.or_not())
        .then_ignore(end())
        .map(|(((decls, mark), rules), tail)| Source {
            decls,
            mark,
            rules,
            tail,
        })
}

/// Parses a token stream, reporting the first syntax error with its line.
///
/// `lines` holds the line of every token plus one entry for the end of input.
pub fn parse(toks: &[Token], lines: &[usize]) -> Result<Source, GrammarError> {
    parser().parse(toks).into_result().map_err(|errs| {
        let Some(e) = errs.into_iter().next() else {
            return GrammarError::syntax(lines.last().copied().unwrap_or(1), "malformed grammar");
        };
        let line = line_at(lines, e.span().start);
        let message = match e.found() {
            Some(tok) => format!("unexpected {}", tok),
            None => "unexpected end of input".to_string(),
        };
        GrammarError::syntax(line, message)
    })
}

/// Line of the token at index `pos`.
pub fn line_at(lines: &[usize], pos: usize) -> usize {
    lines
        .get(pos)
        .or(lines.last())
        .copied()
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::lexer::Lexer;

    fn parse_src(src: &str) -> Result<Source, GrammarError> {
        let (toks, lines) = Lexer::tokenize_all(src)?;
        parse(&toks, &lines)
    }

    fn names(syms: &[Spanned<SymRef>]) -> Vec<SymRef> {
        syms.iter().map(|(s, _)| s.clone()).collect()
    }

    #[test]
    fn declarations() {
        let src = "%token <v> NUM ID\n%left '+' '-'\n%right UMINUS\n%type <e> expr\n%start expr\n%union { v: i64 }\n%{ use x; %}\n%%\nexpr : NUM ;\n";
        let s = parse_src(src).unwrap();
        assert_eq!(s.decls.len(), 7);
        match &s.decls[0] {
            Decl::Token { tag, syms } => {
                assert_eq!(tag.as_deref(), Some("v"));
                assert_eq!(
                    names(syms),
                    vec![SymRef::Name("NUM".into()), SymRef::Name("ID".into())]
                );
            }
            d => panic!("unexpected {:?}", d),
        }
        match &s.decls[1] {
            Decl::Prec { assoc, tag, syms } => {
                assert_eq!(*assoc, Assoc::Left);
                assert!(tag.is_none());
                assert_eq!(names(syms), vec![SymRef::Char('+'), SymRef::Char('-')]);
            }
            d => panic!("unexpected {:?}", d),
        }
        assert!(matches!(&s.decls[2], Decl::Prec { assoc: Assoc::Right, .. }));
        assert!(matches!(&s.decls[3], Decl::Type { tag, .. } if tag == "e"));
        assert!(matches!(&s.decls[4], Decl::Start((n, _)) if n == "expr"));
        assert!(matches!(&s.decls[5], Decl::Union((b, _)) if b.trim() == "v: i64"));
        assert!(matches!(&s.decls[6], Decl::Prologue(c) if c.trim() == "use x;"));
        assert_eq!(s.rules.len(), 1);
        assert!(s.tail.is_none());
    }

    #[test]
    fn alternatives_prec_and_actions() {
        let src = "%%\ne : e '+' e { a } | '-' e %prec UMINUS { b } | ;\nf : g ;\n%%\ntail";
        let s = parse_src(src).unwrap();
        assert_eq!(s.rules.len(), 2);
        let e = &s.rules[0];
        assert_eq!(e.head.0, "e");
        assert_eq!(e.alts.len(), 3);
        assert_eq!(e.alts[0].syms.len(), 3);
        assert_eq!(e.alts[0].action.as_ref().map(|(c, _)| c.trim()), Some("a"));
        assert_eq!(
            e.alts[1].prec.as_ref().map(|(s, _)| s.clone()),
            Some(SymRef::Name("UMINUS".into()))
        );
        assert!(e.alts[2].syms.is_empty() && e.alts[2].action.is_none());
        assert_eq!(s.tail.as_deref(), Some("\ntail"));
    }

    #[test]
    fn syntax_errors_carry_lines() {
        let err = parse_src("%token A\n%%\ns : A\nt : A ;\n").unwrap_err();
        assert!(matches!(err, GrammarError::Syntax { line: 4, .. }), "{err}");

        let err = parse_src("%token A\n").unwrap_err();
        assert_eq!(err, GrammarError::syntax(2, "unexpected end of input"));

        let err = parse_src("%token\n%%\n").unwrap_err();
        assert!(matches!(err, GrammarError::Syntax { line: 2, .. }), "{err}");
    }
}
