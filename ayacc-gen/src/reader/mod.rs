//! Yacc grammar reader.
//!
//! Reading happens in three stages: the [`lexer`] splits the source into
//! tokens, the [`parser`] checks the file structure, and the semantic pass in
//! this module resolves names, assigns token codes and precedence levels and
//! builds the [`Grammar`].
//!
//! Symbol numbering follows the [`grammar`](crate::grammar) conventions: `$end`
//! is terminal 0, declared tokens follow in declaration order, character
//! literals first seen in rules come next, then the non-terminals in the order
//! their rule groups appear, then `$start`.

pub mod lexer;
pub mod parser;

use crate::error::GrammarError;
use crate::grammar::{
    Action, END, Grammar, MAX_NONTERMS, MAX_RHS, MAX_RULES, MAX_TOKENS, Rule, Sym, SymInfo,
};
use crate::symtab::Symtab;
use chumsky::span::SimpleSpan;
use lexer::Lexer;
use parser::{Decl, RuleGroup, Source, Spanned, SymRef, line_at};

/// First external code handed out to named tokens.
pub const FIRST_NAMED_CODE: i32 = 257;

/// Reads a grammar from yacc source text.
pub fn read(src: &str) -> Result<Grammar, GrammarError> {
    let (toks, lines) = Lexer::tokenize_all(src)?;
    let source = parser::parse(&toks, &lines)?;
    let g = Builder::new(&lines).build(source)?;
    log::debug!(
        "read grammar: {} tokens, {} non-terminals, {} rules",
        g.ntoks,
        g.nnonterms(),
        g.rules.len()
    );
    Ok(g)
}

fn char_name(c: char) -> String {
    format!("{:?}", c)
}

struct Builder<'l> {
    lines: &'l [usize],
    terms: Symtab,
    term_info: Vec<SymInfo>,
    nts: Symtab,
    nt_tags: Vec<Option<smartstring::alias::String>>,
    next_code: i32,
    level: u32,
}

impl<'l> Builder<'l> {
    fn new(lines: &'l [usize]) -> Self {
        let mut terms = Symtab::new();
        terms.add("$end");
        Self {
            lines,
            terms,
            term_info: vec![SymInfo {
                name: "$end".into(),
                code: Some(0),
                ..Default::default()
            }],
            nts: Symtab::new(),
            nt_tags: Vec::new(),
            next_code: FIRST_NAMED_CODE,
            level: 0,
        }
    }

    fn line(&self, span: SimpleSpan) -> usize {
        line_at(self.lines, span.start)
    }

    /// Declares a terminal, or returns the existing one.
    fn token(&mut self, sym: &SymRef, span: SimpleSpan) -> Result<Sym, GrammarError> {
        let (name, code) = match sym {
            SymRef::Name(n) => (n.clone(), None),
            SymRef::Char(c) => {
                let code = *c as u32;
                if code > 255 {
                    return Err(GrammarError::limit(
                        self.line(span),
                        format!("character token {:?} has a code above 255", c),
                    ));
                }
                (char_name(*c), Some(code as i32))
            }
        };
        let (idx, fresh) = self.terms.add(&name);
        if fresh {
            let code = code.unwrap_or_else(|| {
                self.next_code += 1;
                self.next_code - 1
            });
            self.term_info.push(SymInfo {
                name: name.as_str().into(),
                code: Some(code),
                ..Default::default()
            });
            if self.terms.len() > MAX_TOKENS {
                return Err(GrammarError::limit(
                    self.line(span),
                    format!("too many tokens (at most {})", MAX_TOKENS),
                ));
            }
        }
        Ok(idx)
    }

    fn set_tag(
        slot: &mut Option<smartstring::alias::String>,
        name: &str,
        tag: &str,
        line: usize,
    ) -> Result<(), GrammarError> {
        match slot {
            Some(old) if old.as_str() != tag => Err(GrammarError::semantic(
                line,
                format!("conflicting type tags <{}> and <{}> for {}", old, tag, name),
            )),
            _ => {
                *slot = Some(tag.into());
                Ok(())
            }
        }
    }

    fn tag_token(&mut self, t: Sym, tag: &str, span: SimpleSpan) -> Result<(), GrammarError> {
        let line = self.line(span);
        let info = &mut self.term_info[t];
        let name = info.name.clone();
        Self::set_tag(&mut info.tag, &name, tag, line)
    }

    fn build(mut self, src: Source) -> Result<Grammar, GrammarError> {
        let mut prologue = Vec::new();
        let mut union: Option<String> = None;
        let mut start: Option<Spanned<String>> = None;
        let mut pending_types: Vec<(String, String, SimpleSpan)> = Vec::new();

        for decl in src.decls {
            match decl {
                Decl::Token { tag, syms } => {
                    for (s, span) in &syms {
                        let t = self.token(s, *span)?;
                        if let Some(tag) = &tag {
                            self.tag_token(t, tag, *span)?;
                        }
                    }
                }
                Decl::Prec { assoc, tag, syms } => {
                    self.level += 1;
                    for (s, span) in &syms {
                        let t = self.token(s, *span)?;
                        let line = self.line(*span);
                        let info = &mut self.term_info[t];
                        if info.prec != 0 {
                            return Err(GrammarError::semantic(
                                line,
                                format!("precedence of {} redeclared", info.name),
                            ));
                        }
                        info.prec = self.level;
                        info.assoc = assoc;
                        if let Some(tag) = &tag {
                            self.tag_token(t, tag, *span)?;
                        }
                    }
                }
                Decl::Type { tag, syms } => {
                    for (s, span) in syms {
                        match s {
                            SymRef::Name(n) if self.terms.idx(&n).is_none() => {
                                pending_types.push((n, tag.clone(), span));
                            }
                            s => {
                                let t = self.token(&s, span)?;
                                self.tag_token(t, &tag, span)?;
                            }
                        }
                    }
                }
                Decl::Start((name, span)) => {
                    if start.is_some() {
                        return Err(GrammarError::semantic(self.line(span), "%start redeclared"));
                    }
                    start = Some((name, span));
                }
                Decl::Union((body, span)) => {
                    if union.is_some() {
                        return Err(GrammarError::semantic(self.line(span), "%union redeclared"));
                    }
                    union = Some(body);
                }
                Decl::Prologue(code) => prologue.push(code),
            }
        }

        if src.rules.is_empty() {
            return Err(GrammarError::semantic(self.line(src.mark), "no rules in grammar"));
        }

        self.collect_heads(&src.rules)?;
        let ntoks = self.terms.len();

        for (name, tag, span) in pending_types {
            let line = self.line(span);
            if let Some(t) = self.terms.idx(&name) {
                self.tag_token(t, &tag, span)?;
            } else if let Some(n) = self.nts.idx(&name) {
                Self::set_tag(&mut self.nt_tags[n], &name, &tag, line)?;
            } else {
                return Err(GrammarError::semantic(
                    line,
                    format!("non-terminal {} has no rules", name),
                ));
            }
        }

        let user_start = match &start {
            None => 0,
            Some((name, span)) => {
                let line = self.line(*span);
                if self.terms.idx(name).is_some() {
                    return Err(GrammarError::semantic(
                        line,
                        format!("%start names token {}", name),
                    ));
                }
                self.nts.idx(name).ok_or_else(|| {
                    GrammarError::semantic(line, format!("start symbol {} has no rules", name))
                })?
            }
        };

        let mut rules = Vec::new();
        for group in &src.rules {
            self.rules_of(group, ntoks, &mut rules)?;
        }

        let start_sym = ntoks + self.nts.len();
        rules.push(Rule {
            lhs: start_sym,
            rhs: vec![ntoks + user_start, END],
            action: None,
            prec: 0,
            line: 0,
        });

        let mut syms = self.term_info;
        for (name, tag) in self.nts.iter().zip(self.nt_tags) {
            syms.push(SymInfo {
                name: name.clone(),
                tag,
                ..Default::default()
            });
        }
        syms.push(SymInfo {
            name: "$start".into(),
            ..Default::default()
        });

        let mut g = Grammar::new(syms, ntoks, rules);
        g.prologue = prologue;
        g.union = union;
        g.tail = src.tail;
        Ok(g)
    }

    /// Registers rule heads as non-terminals and declares character literals
    /// used in rule bodies.
    fn collect_heads(&mut self, groups: &[RuleGroup]) -> Result<(), GrammarError> {
        for group in groups {
            let (head, span) = &group.head;
            let line = self.line(*span);
            if self.terms.idx(head).is_some() {
                return Err(GrammarError::semantic(
                    line,
                    format!("token {} used as rule head", head),
                ));
            }
            let (_, fresh) = self.nts.add(head);
            if fresh {
                self.nt_tags.push(None);
                // one slot is kept for $start
                if self.nts.len() + 1 > MAX_NONTERMS {
                    return Err(GrammarError::limit(
                        line,
                        format!("too many non-terminals (at most {})", MAX_NONTERMS),
                    ));
                }
            }
            for alt in &group.alts {
                for (s, span) in alt.syms.iter().chain(alt.prec.iter()) {
                    if let SymRef::Char(_) = s {
                        self.token(s, *span)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn resolve(&self, sym: &SymRef, span: SimpleSpan, ntoks: usize) -> Result<Sym, GrammarError> {
        let name = match sym {
            SymRef::Name(n) => n.clone(),
            SymRef::Char(c) => char_name(*c),
        };
        if let Some(t) = self.terms.idx(&name) {
            return Ok(t);
        }
        match self.nts.idx(&name) {
            Some(n) => Ok(ntoks + n),
            None => Err(GrammarError::semantic(
                self.line(span),
                format!("symbol {} is undefined", name),
            )),
        }
    }

    fn rules_of(
        &self,
        group: &RuleGroup,
        ntoks: usize,
        rules: &mut Vec<Rule>,
    ) -> Result<(), GrammarError> {
        let (head, head_span) = &group.head;
        let line = self.line(*head_span);
        let lhs = self.resolve(&SymRef::Name(head.clone()), *head_span, ntoks)?;
        for alt in &group.alts {
            let mut rhs = Vec::with_capacity(alt.syms.len());
            for (s, span) in &alt.syms {
                rhs.push(self.resolve(s, *span, ntoks)?);
            }
            if rhs.len() > MAX_RHS {
                return Err(GrammarError::limit(
                    line,
                    format!("rule for {} has more than {} symbols", head, MAX_RHS),
                ));
            }
            let prec = match &alt.prec {
                Some((s, span)) => {
                    let t = self.resolve(s, *span, ntoks)?;
                    if t >= ntoks {
                        return Err(GrammarError::semantic(
                            self.line(*span),
                            format!("%prec {} is not a token", self.nts.sym(t - ntoks).unwrap_or("?")),
                        ));
                    }
                    self.term_info[t].prec
                }
                None => rhs
                    .iter()
                    .rev()
                    .find(|&&s| s < ntoks)
                    .map_or(0, |&t| self.term_info[t].prec),
            };
            let action = alt.action.as_ref().map(|(code, span)| Action {
                code: code.clone(),
                line: self.line(*span),
            });
            // one slot is kept for the start rule
            if rules.len() + 1 >= MAX_RULES {
                return Err(GrammarError::limit(
                    line,
                    format!("too many rules (at most {})", MAX_RULES),
                ));
            }
            rules.push(Rule {
                lhs,
                rhs,
                action,
                prec,
                line,
            });
        }
        Ok(())
    }
}
