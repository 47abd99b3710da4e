//! Action/goto table construction and conflict resolution.
//!
//! # Overview
//! Every state yields one action row with a cell per terminal, and every
//! non-terminal yields one goto row with a cell per state. Shift entries are
//! placed first, then reduce entries in ascending rule order. A cell claimed
//! twice is a conflict:
//!
//! - shift/reduce: resolved by precedence when the rule or the terminal has
//!   one (the higher level wins, equal levels fall back to the terminal's
//!   associativity); when neither has one the shift wins and the conflict is
//!   recorded;
//! - reduce/reduce: the earlier rule wins, always recorded.
//!
//! Rows are then given their most frequent entry as default (see
//! [`Row::setdef`]).
//!
//! # Components
//! - [`Row`]: one uncompressed row with its default entry.
//! - [`Conflict`], [`ConflictKind`], [`Conflicts`]: conflict records and tally.
//! - [`ParseTables`]: all rows of a grammar, produced by [`build`].
//!
//! # See Also
//! - [`crate::compact`]: packs the explicit entries of these rows.
//! - [`crate::report`]: prints rows and conflicts in the `.output` report.

use crate::grammar::{Assoc, Grammar, RuleId, StateId, Sym};
use crate::lalr::Automaton;
use std::fmt;

/// In-memory parser action.
pub use ayacc::Action as Act;

/// A table row with its default entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Row<T> {
    /// Explicit entries; `None` falls back to `default`.
    pub cells: Vec<Option<T>>,
    pub default: Option<T>,
    pub nexplicit: usize,
}

impl<T: Copy + PartialEq> Row<T> {
    pub fn new(len: usize) -> Self {
        Self {
            cells: vec![None; len],
            default: None,
            nexplicit: 0,
        }
    }

    /// Entry at `col`, taking the default into account.
    pub fn get(&self, col: usize) -> Option<T> {
        self.cells[col].or(self.default)
    }

    /// Explicit entries as `(column, value)` pairs.
    pub fn explicit(&self) -> impl Iterator<Item = (usize, T)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter_map(|(c, v)| v.map(|v| (c, v)))
    }

    /// Moves the most frequent eligible entry into the default.
    ///
    /// Values are considered in a single forward scan and a later value only
    /// replaces the current pick when it occurs strictly more often, so ties
    /// go to the value seen first.
    pub fn setdef(&mut self, eligible: impl Fn(&T) -> bool) {
        let mut best: Option<(T, usize)> = None;
        for (i, cell) in self.cells.iter().enumerate() {
            let Some(v) = cell else { continue };
            if !eligible(v) {
                continue;
            }
            let n = self.cells[i..].iter().filter(|c| c.as_ref() == Some(v)).count();
            if best.is_none_or(|(_, m)| n > m) {
                best = Some((*v, n));
            }
        }
        if let Some((v, _)) = best {
            for cell in self.cells.iter_mut() {
                if *cell == Some(v) {
                    *cell = None;
                }
            }
            self.default = Some(v);
        }
        self.nexplicit = self.cells.iter().flatten().count();
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConflictKind {
    /// The shift to `state` was kept over reducing by `rule`.
    ShiftReduce { state: StateId, rule: RuleId },
    /// `kept` won over `dropped`. For a `%nonassoc` error cell `kept` is the
    /// rule whose reduction was turned into the error.
    ReduceReduce { kept: RuleId, dropped: RuleId },
}

/// An unresolved conflict in state `state` on terminal `tok`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Conflict {
    pub state: StateId,
    pub tok: Sym,
    pub kind: ConflictKind,
}

impl Conflict {
    pub fn is_shift_reduce(&self) -> bool {
        matches!(self.kind, ConflictKind::ShiftReduce { .. })
    }

    /// Renders the conflict with symbol names.
    pub fn describe(&self, g: &Grammar) -> String {
        match self.kind {
            ConflictKind::ShiftReduce { state, rule } => format!(
                "state {}: shift/reduce conflict on {} (shift {}, reduce by rule {})",
                self.state,
                g.name(self.tok),
                state,
                rule
            ),
            ConflictKind::ReduceReduce { kept, dropped } => format!(
                "state {}: reduce/reduce conflict on {} (reduce by rule {}, reduce by rule {})",
                self.state,
                g.name(self.tok),
                kept,
                dropped
            ),
        }
    }
}

/// Conflict tally.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Conflicts {
    pub shift_reduce: usize,
    pub reduce_reduce: usize,
}

impl Conflicts {
    pub fn is_empty(&self) -> bool {
        self.shift_reduce == 0 && self.reduce_reduce == 0
    }
}

impl fmt::Display for Conflicts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} shift/reduce, {} reduce/reduce conflicts",
            self.shift_reduce, self.reduce_reduce
        )
    }
}

/// Uncompressed parse tables.
#[derive(Clone, Debug, Default)]
pub struct ParseTables {
    /// One row per state, one column per terminal.
    pub actions: Vec<Row<Act>>,
    /// One row per non-terminal, one column per state.
    pub gotos: Vec<Row<StateId>>,
    pub conflicts: Vec<Conflict>,
}

impl ParseTables {
    /// Action of `state` on terminal `tok`.
    pub fn action(&self, state: StateId, tok: Sym) -> Act {
        self.actions[state].get(tok).unwrap_or(Act::Error)
    }

    /// Successor of `state` on the non-terminal with index `nt`.
    pub fn goto(&self, state: StateId, nt: usize) -> Option<StateId> {
        self.gotos[nt].get(state)
    }

    pub fn counts(&self) -> Conflicts {
        let shift_reduce = self.conflicts.iter().filter(|c| c.is_shift_reduce()).count();
        Conflicts {
            shift_reduce,
            reduce_reduce: self.conflicts.len() - shift_reduce,
        }
    }
}

/// Resolves a shift/reduce clash by precedence.
///
/// A missing precedence counts as level 0, so a declared level on either
/// side beats it. Only when neither side has one does the shift win with a
/// conflict. Returns the winning action and whether the clash counts as a
/// conflict.
fn resolve(g: &Grammar, next: StateId, rule: RuleId, tok: Sym) -> (Act, bool) {
    let (rp, tp) = (g.rules[rule].prec, g.syms[tok].prec);
    if rp == 0 && tp == 0 {
        return (Act::Shift(next), true);
    }
    if rp > tp {
        return (Act::Reduce(rule), false);
    }
    if rp < tp {
        return (Act::Shift(next), false);
    }
    match g.syms[tok].assoc {
        Assoc::Left => (Act::Reduce(rule), false),
        Assoc::Right => (Act::Shift(next), false),
        Assoc::Nonassoc => (Act::Error, false),
        Assoc::None => (Act::Shift(next), true),
    }
}

/// Builds the action and goto tables of an automaton.
pub fn build(g: &Grammar, a: &Automaton) -> ParseTables {
    let ntoks = g.ntoks;
    let mut conflicts = Vec::new();
    let mut actions = Vec::with_capacity(a.nstates());

    for (s, st) in a.states.iter().enumerate() {
        let mut row = Row::new(ntoks);
        // rule that claimed each reduce or error cell
        let mut owner: Vec<Option<RuleId>> = vec![None; ntoks];
        for tok in 0..ntoks {
            if let Some(next) = st.transition(tok) {
                row.cells[tok] = Some(Act::Shift(next));
            }
        }
        for t in st.terms.iter().filter(|t| t.next_sym(g).is_none()) {
            for &tok in &t.lookahead {
                let kind = match row.cells[tok] {
                    None => {
                        row.cells[tok] = Some(Act::Reduce(t.rule));
                        owner[tok] = Some(t.rule);
                        None
                    }
                    Some(Act::Shift(next)) => {
                        let (act, conflict) = resolve(g, next, t.rule, tok);
                        row.cells[tok] = Some(act);
                        if act != Act::Shift(next) {
                            owner[tok] = Some(t.rule);
                        }
                        conflict.then_some(ConflictKind::ShiftReduce {
                            state: next,
                            rule: t.rule,
                        })
                    }
                    Some(Act::Reduce(_)) | Some(Act::Error) => {
                        owner[tok].map(|kept| ConflictKind::ReduceReduce {
                            kept,
                            dropped: t.rule,
                        })
                    }
                };
                if let Some(kind) = kind {
                    conflicts.push(Conflict { state: s, tok, kind });
                }
            }
        }
        row.setdef(|v| matches!(v, Act::Reduce(_)));
        actions.push(row);
    }

    let mut gotos = Vec::with_capacity(g.nnonterms());
    for nt in 0..g.nnonterms() {
        let mut row = Row::new(a.nstates());
        for (s, st) in a.states.iter().enumerate() {
            row.cells[s] = st.transition(g.ntoks + nt);
        }
        row.setdef(|_| true);
        gotos.push(row);
    }

    let tables = ParseTables {
        actions,
        gotos,
        conflicts,
    };
    let counts = tables.counts();
    if tables.conflicts.is_empty() {
        log::debug!("parse tables built without conflicts");
    } else {
        for c in &tables.conflicts {
            log::debug!("{}", c.describe(g));
        }
        log::warn!("{}", counts);
    }
    tables
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::first;
    use crate::reader::read;

    fn tables_for(src: &str) -> (Grammar, Automaton, ParseTables) {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut g = read(src).unwrap();
        first::compute(&mut g);
        let a = Automaton::build(&g);
        let t = build(&g, &a);
        (g, a, t)
    }

    fn sym(g: &Grammar, name: &str) -> Sym {
        (0..g.nsyms()).find(|&s| g.name(s) == name).unwrap()
    }

    /// State reached from the initial state along `path`.
    fn walk(g: &Grammar, a: &Automaton, path: &[&str]) -> StateId {
        path.iter()
            .fold(0, |s, name| a.states[s].transition(sym(g, name)).unwrap())
    }

    #[test]
    fn setdef_prefers_first_seen_on_ties() {
        let mut row: Row<u32> = Row::new(6);
        row.cells = vec![Some(7), Some(3), None, Some(3), Some(7), Some(9)];
        row.setdef(|_| true);
        assert_eq!(row.default, Some(7));
        assert_eq!(row.cells, vec![None, Some(3), None, Some(3), None, Some(9)]);
        assert_eq!(row.nexplicit, 3);
        assert_eq!(row.get(0), Some(7));
        assert_eq!(row.get(1), Some(3));
    }

    #[test]
    fn setdef_respects_eligibility() {
        let mut row: Row<Act> = Row::new(4);
        row.cells = vec![
            Some(Act::Shift(4)),
            Some(Act::Shift(4)),
            Some(Act::Reduce(2)),
            None,
        ];
        row.setdef(|v| matches!(v, Act::Reduce(_)));
        assert_eq!(row.default, Some(Act::Reduce(2)));
        assert_eq!(row.nexplicit, 2);

        let mut shifts: Row<Act> = Row::new(2);
        shifts.cells = vec![Some(Act::Shift(1)), Some(Act::Shift(1))];
        shifts.setdef(|v| matches!(v, Act::Reduce(_)));
        assert_eq!(shifts.default, None);
        assert_eq!(shifts.nexplicit, 2);
    }

    const AMBIGUOUS: &str = "%token NUM\n%%\ne : e '+' e | e '*' e | NUM ;\n";

    #[test]
    fn ambiguity_without_precedence_shifts() {
        let (g, a, t) = tables_for(AMBIGUOUS);
        let counts = t.counts();
        assert_eq!(counts.shift_reduce, 4);
        assert_eq!(counts.reduce_reduce, 0);
        assert_eq!(counts.to_string(), "4 shift/reduce, 0 reduce/reduce conflicts");
        let s = walk(&g, &a, &["e", "'+'", "e"]);
        assert!(matches!(t.action(s, sym(&g, "'+'")), Act::Shift(_)));
        assert!(matches!(t.action(s, sym(&g, "'*'")), Act::Shift(_)));
        assert_eq!(t.action(s, 0), Act::Reduce(0));
    }

    #[test]
    fn precedence_and_associativity() {
        let src = "%token NUM\n%left '+'\n%left '*'\n%%\ne : e '+' e | e '*' e | NUM ;\n";
        let (g, a, t) = tables_for(src);
        assert!(t.conflicts.is_empty());
        let (plus, times) = (sym(&g, "'+'"), sym(&g, "'*'"));
        let after_plus = walk(&g, &a, &["e", "'+'", "e"]);
        // left associative: reduce e + e on '+'
        assert_eq!(t.action(after_plus, plus), Act::Reduce(0));
        // '*' binds tighter: shift
        assert!(matches!(t.action(after_plus, times), Act::Shift(_)));
        let after_times = walk(&g, &a, &["e", "'*'", "e"]);
        assert_eq!(t.action(after_times, plus), Act::Reduce(1));
        assert_eq!(t.action(after_times, times), Act::Reduce(1));
    }

    #[test]
    fn right_and_nonassoc() {
        let src = "%token NUM\n%right '^'\n%nonassoc '<'\n%%\ne : e '^' e | e '<' e | NUM ;\n";
        let (g, a, t) = tables_for(src);
        assert!(t.conflicts.is_empty());
        let after_pow = walk(&g, &a, &["e", "'^'", "e"]);
        assert!(matches!(t.action(after_pow, sym(&g, "'^'")), Act::Shift(_)));
        let after_lt = walk(&g, &a, &["e", "'<'", "e"]);
        assert_eq!(t.action(after_lt, sym(&g, "'<'")), Act::Error);
        // the error cell is explicit and survives the default reduce
        assert_eq!(t.actions[after_lt].default, Some(Act::Reduce(1)));
    }

    #[test]
    fn dangling_else_has_one_conflict() {
        let src = "%token IF THEN ELSE X\n%%\ns : IF X THEN s | IF X THEN s ELSE s | X ;\n";
        let (g, a, t) = tables_for(src);
        assert_eq!(t.counts().shift_reduce, 1);
        assert_eq!(t.counts().reduce_reduce, 0);
        let c = t.conflicts[0];
        assert_eq!(c.tok, sym(&g, "ELSE"));
        let s = walk(&g, &a, &["IF", "X", "THEN", "s"]);
        assert_eq!(c.state, s);
        assert!(matches!(t.action(s, sym(&g, "ELSE")), Act::Shift(_)));
        assert!(c.describe(&g).contains("shift/reduce conflict on ELSE"));
    }

    #[test]
    fn reduce_reduce_keeps_earlier_rule() {
        let src = "%%\ns : x | y ;\nx : 'a' ;\ny : 'a' ;\n";
        let (g, a, t) = tables_for(src);
        assert_eq!(t.counts().reduce_reduce, 1);
        let s = walk(&g, &a, &["'a'"]);
        assert_eq!(t.action(s, 0), Act::Reduce(2));
        assert_eq!(
            t.conflicts[0].kind,
            ConflictKind::ReduceReduce {
                kept: 2,
                dropped: 3
            }
        );
        assert!(t.conflicts[0].describe(&g).ends_with("(reduce by rule 2, reduce by rule 3)"));
    }

    #[test]
    fn one_sided_precedence_wins_without_conflict() {
        // only '+' has a precedence; rule 1 (e '*' e) has none
        let src = "%token NUM\n%left '+'\n%%\ne : e '+' e | e '*' e | NUM ;\n";
        let (g, a, t) = tables_for(src);
        let (plus, times) = (sym(&g, "'+'"), sym(&g, "'*'"));

        // rule 0 has a precedence, '*' does not: reduce
        let after_plus = walk(&g, &a, &["e", "'+'", "e"]);
        assert_eq!(t.action(after_plus, times), Act::Reduce(0));
        assert_eq!(t.action(after_plus, plus), Act::Reduce(0));

        // '+' has a precedence, rule 1 does not: shift
        let after_times = walk(&g, &a, &["e", "'*'", "e"]);
        assert!(matches!(t.action(after_times, plus), Act::Shift(_)));

        // only the cell where neither side has a precedence is a conflict
        assert_eq!(t.counts().shift_reduce, 1);
        assert_eq!(t.counts().reduce_reduce, 0);
        assert_eq!(t.conflicts[0].state, after_times);
        assert_eq!(t.conflicts[0].tok, times);
        assert!(matches!(t.action(after_times, times), Act::Shift(_)));
    }

    #[test]
    fn nonassoc_error_cell_owns_later_reduce_conflict() {
        // both x -> A and y -> A complete on '<'; the first becomes an error
        let src = "%token A\n%nonassoc '<'\n%%\ns : x '<' | y '<' ;\nx : A %prec '<' | A '<' A ;\ny : A ;\n";
        let (g, a, t) = tables_for(src);
        let s = walk(&g, &a, &["A"]);
        let lt = sym(&g, "'<'");
        assert_eq!(t.counts().reduce_reduce, 1);
        let c = t.conflicts.iter().find(|c| !c.is_shift_reduce()).unwrap();
        assert_eq!(c.state, s);
        assert_eq!(c.tok, lt);
        assert_eq!(c.kind, ConflictKind::ReduceReduce { kept: 2, dropped: 4 });
    }

    #[test]
    fn defaults_and_gotos() {
        let (g, a, t) = tables_for("%token NUM\n%left '+'\n%%\ne : e '+' e | NUM ;\n");
        // only reduces become action defaults
        for row in &t.actions {
            assert!(matches!(row.default, None | Some(Act::Reduce(_))));
        }
        let e = g.nt_index(sym(&g, "e"));
        for s in 0..a.nstates() {
            assert_eq!(t.goto(s, e).is_some(), t.gotos[e].default.is_some() || a.states[s].transition(sym(&g, "e")).is_some());
            if let Some(target) = a.states[s].transition(sym(&g, "e")) {
                assert_eq!(t.goto(s, e), Some(target));
            }
        }
        // $start has no transitions and no default
        let start = g.nt_index(g.start_sym());
        assert_eq!(t.gotos[start].default, None);
        assert_eq!(t.gotos[start].nexplicit, 0);
    }
}
