//! Human-readable report of a generated parser (`<name>.output`).

use crate::grammar::Grammar;
use crate::lalr::{Automaton, Term};
use crate::table::{Act, ParseTables};
use std::io::{self, Write};

/// Writes the numbered rules.
///
/// # Output Format
/// ```text
/// RULES 4
///
///   0  e -> e '+' e
/// ```
pub fn write_rules<W: Write>(out: &mut W, g: &Grammar) -> io::Result<()> {
    writeln!(out, "RULES {}\n", g.rules.len())?;
    for r in 0..g.rules.len() {
        writeln!(out, "{:>4}  {}", r, g.rule_text(r))?;
    }
    writeln!(out)
}

/// Writes nullability and FIRST sets of the non-terminals.
pub fn write_first<W: Write>(out: &mut W, g: &Grammar) -> io::Result<()> {
    writeln!(out, "FIRST\n")?;
    for s in g.ntoks..g.nsyms() {
        let info = &g.syms[s];
        write!(out, "  {} {{", g.name(s))?;
        if info.nullable {
            write!(out, " `empty'")?;
        }
        for &t in &info.first {
            write!(out, " {}", g.name(t))?;
        }
        writeln!(out, " }}")?;
    }
    writeln!(out)
}

fn write_term<W: Write>(out: &mut W, g: &Grammar, t: &Term) -> io::Result<()> {
    let r = &g.rules[t.rule];
    write!(out, "    {} ->", g.name(r.lhs))?;
    for (i, &s) in r.rhs.iter().enumerate() {
        if i == t.dot {
            write!(out, " .")?;
        }
        write!(out, " {}", g.name(s))?;
    }
    if t.dot == r.rhs.len() {
        write!(out, " .")?;
    }
    write!(out, "  [")?;
    for (i, &la) in t.lookahead.iter().enumerate() {
        if i > 0 {
            write!(out, ",")?;
        }
        write!(out, " {}", g.name(la))?;
    }
    writeln!(out, " ]")
}

/// Writes every state with its terms, actions and gotos.
pub fn write_states<W: Write>(
    out: &mut W,
    g: &Grammar,
    a: &Automaton,
    t: &ParseTables,
) -> io::Result<()> {
    for (s, st) in a.states.iter().enumerate() {
        writeln!(out, "STATE {}\n", s)?;
        for term in &st.terms {
            write_term(out, g, term)?;
        }
        writeln!(out)?;
        let row = &t.actions[s];
        for (tok, act) in row.explicit() {
            match act {
                Act::Shift(n) => writeln!(out, "    {:<16} shift {}", g.name(tok), n)?,
                Act::Reduce(r) => writeln!(out, "    {:<16} reduce {}", g.name(tok), r)?,
                Act::Error => writeln!(out, "    {:<16} error", g.name(tok))?,
            }
        }
        match row.default {
            Some(Act::Reduce(r)) if r == g.start_rule() => writeln!(out, "    {:<16} accept", ".")?,
            Some(Act::Reduce(r)) => writeln!(out, "    {:<16} reduce {}", ".", r)?,
            _ => writeln!(out, "    {:<16} error", ".")?,
        }
        for nt in 0..g.nnonterms() {
            if let Some(next) = st.transition(g.ntoks + nt) {
                writeln!(out, "    {:<16} goto {}", g.name(g.ntoks + nt), next)?;
            }
        }
        writeln!(out)?;
    }
    Ok(())
}

/// Writes the conflict list followed by the summary line.
pub fn write_conflicts<W: Write>(out: &mut W, g: &Grammar, t: &ParseTables) -> io::Result<()> {
    for c in &t.conflicts {
        writeln!(out, "{}", c.describe(g))?;
    }
    writeln!(out, "{}", t.counts())
}
