//! Generation pipeline: grammar text in, parser module (and report) out.

use crate::compact::{TableSet, compact};
use crate::emit;
use crate::error::GrammarError;
use crate::first;
use crate::grammar::Grammar;
use crate::lalr::Automaton;
use crate::reader;
use crate::report;
use crate::table::{self, Conflicts, ParseTables};
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Everything computed for one grammar.
#[derive(Debug)]
pub struct Compiled {
    pub grammar: Grammar,
    pub automaton: Automaton,
    pub tables: ParseTables,
    pub set: TableSet,
    /// Rewritten action code per user rule.
    pub actions: Vec<String>,
}

/// Outcome of [`generate`].
#[derive(Debug, Clone)]
pub struct Summary {
    pub states: usize,
    pub rules: usize,
    pub conflicts: Conflicts,
    pub parser: PathBuf,
    pub report: Option<PathBuf>,
}

/// Runs the analysis pipeline on grammar source text.
pub fn compile(src: &str) -> Result<Compiled, GrammarError> {
    let mut grammar = reader::read(src)?;
    first::compute(&mut grammar);
    let automaton = Automaton::build(&grammar);
    let tables = table::build(&grammar, &automaton);
    let packed = compact(&tables, grammar.ntoks);
    let set = TableSet::new(&grammar, &tables, &packed)?;
    let actions = emit::rewrite_actions(&grammar)?;
    Ok(Compiled {
        grammar,
        automaton,
        tables,
        set,
        actions,
    })
}

/// Generates `<out_dir>/<name>.rs` from a grammar file, plus
/// `<out_dir>/<name>.output` when `verbose` is set.
///
/// Intended for build scripts; the `ayacc` binary is a thin wrapper.
pub fn generate<P: AsRef<Path>, Q: AsRef<Path>>(
    grammar: P,
    out_dir: Q,
    name: &str,
    verbose: bool,
) -> Result<Summary> {
    let grammar = grammar.as_ref();
    let out_dir = out_dir.as_ref();
    let src = std::fs::read_to_string(grammar)
        .with_context(|| format!("cannot read {}", grammar.display()))?;
    let c = compile(&src).with_context(|| format!("{}", grammar.display()))?;

    let source_name = grammar
        .file_name()
        .map_or_else(|| grammar.display().to_string(), |n| n.to_string_lossy().into_owned());
    let parser = out_dir.join(format!("{}.rs", name));
    let mut out = BufWriter::new(
        File::create(&parser).with_context(|| format!("cannot create {}", parser.display()))?,
    );
    emit::write_parser(&mut out, &c.grammar, &c.set, &c.actions, &source_name)?;
    out.flush()?;
    log::debug!("wrote {}", parser.display());

    let report = if verbose {
        let path = out_dir.join(format!("{}.output", name));
        let mut out = BufWriter::new(
            File::create(&path).with_context(|| format!("cannot create {}", path.display()))?,
        );
        report::write_rules(&mut out, &c.grammar)?;
        report::write_first(&mut out, &c.grammar)?;
        report::write_states(&mut out, &c.grammar, &c.automaton, &c.tables)?;
        report::write_conflicts(&mut out, &c.grammar, &c.tables)?;
        out.flush()?;
        log::debug!("wrote {}", path.display());
        Some(path)
    } else {
        None
    };

    Ok(Summary {
        states: c.automaton.nstates(),
        rules: c.grammar.rules.len(),
        conflicts: c.tables.counts(),
        parser,
        report,
    })
}
