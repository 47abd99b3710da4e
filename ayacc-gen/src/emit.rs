//! Rust code emitter.
//!
//! A generated parser module contains, in order: a header comment, the
//! `%{ %}` prologue blocks, the `YYSTYPE` value type, token code constants,
//! the table arrays with a [`ayacc::Tables`] view over them, the `yyaction`
//! dispatcher holding the rewritten rule actions, the `yyparse` entry point
//! and the trailing code.

use crate::compact::TableSet;
use crate::error::GrammarError;
use crate::grammar::{Grammar, RuleId};
use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use std::io::Write;

static DOLLAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$(?:<([A-Za-z_][A-Za-z0-9_]*)>)?(\$|[0-9]+)").unwrap());

/// Rewrites the action of `rule` into Rust code operating on `yyval` and the
/// right-hand side values `yyvs`.
///
/// `$$` becomes `yyval` and `$n` becomes `yyvs[n-1]`. With a `%union`, the
/// type tag of the symbol (or an explicit `$<tag>n`) is appended as a field
/// access. A rule without an action passes its first value through.
pub fn rewrite_action(g: &Grammar, rule: RuleId) -> Result<String, GrammarError> {
    let r = &g.rules[rule];
    let Some(action) = &r.action else {
        return Ok(if r.rhs.is_empty() {
            String::new()
        } else {
            "yyval = std::mem::take(&mut yyvs[0]);".to_string()
        });
    };
    let code = &action.code;
    let union = g.union.is_some();
    let mut out = String::with_capacity(code.len() + 16);
    let mut last = 0;
    for caps in DOLLAR.captures_iter(code) {
        let Some(m) = caps.get(0) else { continue };
        out.push_str(&code[last..m.start()]);
        let (place, tag) = match &caps[2] {
            "$" => ("yyval".to_string(), g.syms[r.lhs].tag.as_deref()),
            n => {
                let n = n.parse::<usize>().unwrap_or(0);
                if n == 0 || n > r.rhs.len() {
                    return Err(GrammarError::semantic(
                        action.line,
                        format!("{} out of range in action of {}", m.as_str(), g.rule_text(rule)),
                    ));
                }
                (format!("yyvs[{}]", n - 1), g.syms[r.rhs[n - 1]].tag.as_deref())
            }
        };
        out.push_str(&place);
        if union {
            if let Some(tag) = caps.get(1).map(|t| t.as_str()).or(tag) {
                out.push('.');
                out.push_str(tag);
            }
        }
        last = m.end();
    }
    out.push_str(&code[last..]);
    Ok(out)
}

/// Rewrites the actions of all user rules, indexed by rule.
pub fn rewrite_actions(g: &Grammar) -> Result<Vec<String>, GrammarError> {
    (0..g.start_rule()).map(|r| rewrite_action(g, r)).collect()
}

fn write_array<W: Write>(out: &mut W, name: &str, values: &[i16]) -> Result<()> {
    writeln!(out, "pub static {}: [i16; {}] = [", name, values.len())?;
    for chunk in values.chunks(10) {
        write!(out, "   ")?;
        for v in chunk {
            write!(out, " {},", v)?;
        }
        writeln!(out)?;
    }
    writeln!(out, "];\n")?;
    Ok(())
}

/// Writes a complete parser module.
///
/// # Parameters
/// - `out`: Destination of the generated Rust source.
/// - `g`: The grammar.
/// - `set`: Its narrowed tables.
/// - `actions`: Rewritten actions from [`rewrite_actions`].
/// - `source_name`: Grammar file name quoted in the header.
pub fn write_parser<W: Write>(
    out: &mut W,
    g: &Grammar,
    set: &TableSet,
    actions: &[String],
    source_name: &str,
) -> Result<()> {
    writeln!(out, "// Generated by ayacc from {}. Do not edit.", source_name)?;
    writeln!(out)?;

    for block in &g.prologue {
        writeln!(out, "{}", block.trim_matches('\n'))?;
    }
    if !g.prologue.is_empty() {
        writeln!(out)?;
    }

    match &g.union {
        Some(body) => {
            writeln!(out, "#[derive(Debug, Clone, Default)]")?;
            writeln!(out, "pub struct YYSTYPE {{")?;
            for line in body.trim_matches('\n').lines() {
                writeln!(out, "{}", line)?;
            }
            writeln!(out, "}}\n")?;
        }
        None => writeln!(out, "pub type YYSTYPE = i64;\n")?,
    }

    for tok in 1..g.ntoks {
        let info = &g.syms[tok];
        if let Some(code) = info.code {
            if !info.name.starts_with('\'') {
                writeln!(out, "pub const {}: i32 = {};", info.name, code)?;
            }
        }
    }
    writeln!(out)?;

    writeln!(out, "pub const YYNTOKS: usize = {};", set.ntoks)?;
    writeln!(out, "pub const YYINI: usize = {};\n", set.ini)?;
    writeln!(out, "pub static YYSYMS: [&str; {}] = [", g.nsyms())?;
    for s in 0..g.nsyms() {
        writeln!(out, "    {:?},", g.name(s))?;
    }
    writeln!(out, "];\n")?;

    write_array(out, "YYR1", &set.r1)?;
    write_array(out, "YYR2", &set.r2)?;
    write_array(out, "YYADEF", &set.adef)?;
    write_array(out, "YYGDEF", &set.gdef)?;
    write_array(out, "YYADSP", &set.adsp)?;
    write_array(out, "YYGDSP", &set.gdsp)?;
    write_array(out, "YYACT", &set.act)?;
    write_array(out, "YYCHK", &set.chk)?;
    write_array(out, "YYTRNS", &set.trns)?;

    writeln!(out, "pub static TABLES: ayacc::Tables<'static> = ayacc::Tables {{")?;
    writeln!(out, "    ntoks: YYNTOKS,")?;
    writeln!(out, "    ini: YYINI,")?;
    for (field, array) in [
        ("r1", "YYR1"),
        ("r2", "YYR2"),
        ("adef", "YYADEF"),
        ("gdef", "YYGDEF"),
        ("adsp", "YYADSP"),
        ("gdsp", "YYGDSP"),
        ("act", "YYACT"),
        ("chk", "YYCHK"),
        ("trns", "YYTRNS"),
    ] {
        writeln!(out, "    {}: &{},", field, array)?;
    }
    writeln!(out, "}};\n")?;

    writeln!(
        out,
        "#[allow(unused_mut, unused_variables, unreachable_code, clippy::all)]"
    )?;
    writeln!(
        out,
        "pub fn yyaction(yyrule: usize, yyvs: &mut [YYSTYPE]) -> anyhow::Result<YYSTYPE> {{"
    )?;
    writeln!(out, "    let mut yyval = YYSTYPE::default();")?;
    writeln!(out, "    match yyrule {{")?;
    for (rule, code) in actions.iter().enumerate() {
        writeln!(out, "        // {}", g.rule_text(rule))?;
        match &g.rules[rule].action {
            Some(action) => {
                writeln!(out, "        {} => {{", rule)?;
                writeln!(out, "            // line {}", action.line)?;
                for line in code.trim_matches('\n').lines() {
                    writeln!(out, "            {}", line.trim_end())?;
                }
                writeln!(out, "        }}")?;
            }
            None => writeln!(out, "        {} => {{ {} }}", rule, code)?,
        }
    }
    writeln!(out, "        _ => {{}}")?;
    writeln!(out, "    }}")?;
    writeln!(out, "    Ok(yyval)")?;
    writeln!(out, "}}\n")?;

    writeln!(
        out,
        "pub fn yyparse<L: ayacc::Lexer<Value = YYSTYPE>>(lexer: &mut L) -> Result<YYSTYPE, ayacc::ParseError> {{"
    )?;
    writeln!(out, "    ayacc::Parser::new(TABLES).parse(lexer, yyaction)")?;
    writeln!(out, "}}")?;

    if let Some(tail) = &g.tail {
        writeln!(out)?;
        write!(out, "{}", tail.trim_start_matches('\n'))?;
    }
    Ok(())
}
