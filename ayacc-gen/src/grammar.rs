//! In-memory grammar: symbol table, rules and per-symbol analysis data.
//!
//! Symbols are plain integers. Terminals occupy `0..ntoks` with the end marker
//! `$end` at 0; non-terminals occupy `ntoks..nsyms`, and the synthetic start
//! symbol `$start` is always the last one. Its single rule
//! `$start → UserStart $end` is always the last rule.
//!
//! A [`Grammar`] is the analysis context threaded through every stage: the
//! reader builds it, [`first::compute`](crate::first::compute) fills in
//! nullability and FIRST sets, and the later stages only read it.

use crate::symset::SymSet;
use smartstring::alias::String;

/// A grammar symbol (terminal or non-terminal).
pub type Sym = usize;
/// Index of a rule in [`Grammar::rules`].
pub type RuleId = usize;
/// Index of a state in the LALR automaton.
pub type StateId = usize;

/// The end-of-input terminal.
pub const END: Sym = 0;

pub const MAX_TOKENS: usize = 500;
pub const MAX_NONTERMS: usize = 500;
pub const MAX_RULES: usize = 800;
pub const MAX_RHS: usize = 32;

/// Associativity declared with `%left`, `%right` or `%nonassoc`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Assoc {
    #[default]
    None,
    Left,
    Right,
    Nonassoc,
}

/// Per-symbol metadata.
#[derive(Clone, Debug, Default)]
pub struct SymInfo {
    /// Display name. Character tokens keep their quotes, e.g. `'+'`.
    pub name: String,
    /// Value type tag from `%type <tag>` or `%token <tag>`.
    pub tag: Option<String>,
    /// External token code returned by lexers (terminals only).
    pub code: Option<i32>,
    /// Precedence level, 0 when none was declared.
    pub prec: u32,
    pub assoc: Assoc,
    pub nullable: bool,
    pub first: SymSet,
}

/// A semantic action fragment and the line it starts on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Action {
    pub code: std::string::String,
    pub line: usize,
}

#[derive(Clone, Debug)]
pub struct Rule {
    pub lhs: Sym,
    pub rhs: Vec<Sym>,
    pub action: Option<Action>,
    /// Effective precedence: the `%prec` override if any, else the precedence
    /// of the rightmost terminal, else 0.
    pub prec: u32,
    pub line: usize,
}

#[derive(Clone, Debug, Default)]
pub struct Grammar {
    pub syms: Vec<SymInfo>,
    pub ntoks: usize,
    pub rules: Vec<Rule>,
    /// Rules grouped by left-hand side, indexed by non-terminal number.
    by_lhs: Vec<Vec<RuleId>>,
    /// `%{ ... %}` blocks, verbatim.
    pub prologue: Vec<std::string::String>,
    /// Body of `%union { ... }` without the braces.
    pub union: Option<std::string::String>,
    /// Everything after the second `%%`.
    pub tail: Option<std::string::String>,
}

impl Grammar {
    /// Assembles a grammar from symbols and rules.
    ///
    /// `syms` must list the `ntoks` terminals first, and the last symbol and
    /// the last rule must be `$start` and its rule.
    pub fn new(syms: Vec<SymInfo>, ntoks: usize, rules: Vec<Rule>) -> Self {
        let mut by_lhs = vec![Vec::new(); syms.len() - ntoks];
        for (i, r) in rules.iter().enumerate() {
            by_lhs[r.lhs - ntoks].push(i);
        }
        Self {
            syms,
            ntoks,
            rules,
            by_lhs,
            prologue: Vec::new(),
            union: None,
            tail: None,
        }
    }

    pub fn nsyms(&self) -> usize {
        self.syms.len()
    }

    pub fn nnonterms(&self) -> usize {
        self.syms.len() - self.ntoks
    }

    #[inline]
    pub fn is_token(&self, sym: Sym) -> bool {
        sym < self.ntoks
    }

    /// Zero-based index of a non-terminal among non-terminals.
    #[inline]
    pub fn nt_index(&self, sym: Sym) -> usize {
        sym - self.ntoks
    }

    /// Rules whose left-hand side is the non-terminal `sym`, in declaration order.
    #[inline]
    pub fn rules_of(&self, sym: Sym) -> &[RuleId] {
        &self.by_lhs[sym - self.ntoks]
    }

    pub fn name(&self, sym: Sym) -> &str {
        &self.syms[sym].name
    }

    pub fn start_sym(&self) -> Sym {
        self.syms.len() - 1
    }

    pub fn start_rule(&self) -> RuleId {
        self.rules.len() - 1
    }

    /// Renders a rule as `lhs -> a b c`.
    pub fn rule_text(&self, rule: RuleId) -> std::string::String {
        let r = &self.rules[rule];
        let mut s = format!("{} ->", self.name(r.lhs));
        for &sym in &r.rhs {
            s.push(' ');
            s.push_str(self.name(sym));
        }
        s
    }

    /// Rightmost terminal of a right-hand side, if any.
    pub fn rightmost_token(&self, rhs: &[Sym]) -> Option<Sym> {
        rhs.iter().rev().copied().find(|&s| self.is_token(s))
    }
}
