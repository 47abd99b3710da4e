//! Row-displacement table compaction.
//!
//! # Overview
//! All explicit entries of all rows are overlaid into one `act`/`chk` array
//! pair. Row `r` is assigned a displacement `d`, and its entry for column `c`
//! is stored at slot `d + c` with a check tag identifying the row kind and
//! column: the column itself for action rows, `ntoks + nt` for the goto row of
//! non-terminal `nt`. Since an action tag only names a column, two action rows
//! at the same displacement would read each other's entries; this only happens
//! when their explicit entries are identical.
//!
//! # Components
//! - [`compact`]: places the rows and returns the [`Compacted`] arrays.
//! - [`TableSet`]: narrows those arrays, together with the per-rule and
//!   per-row arrays and the token translation, to the `i16` arrays emitted
//!   into generated parsers. [`TableSet::tables`] views them as runtime
//!   [`ayacc::Tables`].
//!
//! # Notes
//! - Empty slots carry check `-1` and action `0`.
//! - Values that do not fit in `i16` are a [`GrammarError::Limit`].

use crate::error::GrammarError;
use crate::grammar::Grammar;
use crate::table::{Act, ParseTables};
use std::collections::{HashMap, HashSet};

/// The packed arrays, before narrowing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Compacted {
    pub act: Vec<i32>,
    pub chk: Vec<i32>,
    /// Displacement per state.
    pub adsp: Vec<i32>,
    /// Displacement per non-terminal.
    pub gdsp: Vec<i32>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RowId {
    Action(usize),
    Goto(usize),
}

struct Packer {
    act: Vec<i32>,
    chk: Vec<i32>,
}

impl Packer {
    fn is_free(&self, slot: i32) -> bool {
        slot >= 0 && self.chk.get(slot as usize).is_none_or(|&c| c == -1)
    }

    fn fits(&self, disp: i32, entries: &[(usize, i32)]) -> bool {
        entries.iter().all(|&(c, _)| self.is_free(disp + c as i32))
    }

    fn place(&mut self, disp: i32, tag_of: impl Fn(usize) -> i32, entries: &[(usize, i32)]) {
        for &(c, v) in entries {
            let slot = (disp + c as i32) as usize;
            if slot >= self.chk.len() {
                self.chk.resize(slot + 1, -1);
                self.act.resize(slot + 1, 0);
            }
            self.chk[slot] = tag_of(c);
            self.act[slot] = v;
        }
    }
}

/// Packs the explicit entries of all rows.
///
/// Rows are placed in ascending order of explicit entry count (action rows
/// in state order before goto rows on ties), each at the smallest
/// displacement, starting from minus its first column, where all of its
/// entries land on free slots.
pub fn compact(t: &ParseTables, ntoks: usize) -> Compacted {
    let mut rows: Vec<(RowId, Vec<(usize, i32)>)> = Vec::new();
    for (s, row) in t.actions.iter().enumerate() {
        let entries = row.explicit().map(|(c, a)| (c, a.encode())).collect();
        rows.push((RowId::Action(s), entries));
    }
    for (nt, row) in t.gotos.iter().enumerate() {
        let entries = row.explicit().map(|(c, s)| (c, s as i32)).collect();
        rows.push((RowId::Goto(nt), entries));
    }
    rows.sort_by_key(|(_, e)| e.len());

    let mut p = Packer {
        act: Vec::new(),
        chk: Vec::new(),
    };
    let mut adsp = vec![0; t.actions.len()];
    let mut gdsp = vec![0; t.gotos.len()];
    let mut action_disps: HashSet<i32> = HashSet::new();
    let mut placed: HashMap<&[(usize, i32)], i32> = HashMap::new();

    for (id, entries) in &rows {
        let start = entries.first().map_or(0, |&(c, _)| -(c as i32));
        match *id {
            RowId::Action(s) => {
                if let Some(&d) = placed.get(entries.as_slice()) {
                    adsp[s] = d;
                    continue;
                }
                let mut d = start;
                while action_disps.contains(&d) || !p.fits(d, entries) {
                    d += 1;
                }
                p.place(d, |c| c as i32, entries);
                action_disps.insert(d);
                placed.insert(entries.as_slice(), d);
                adsp[s] = d;
            }
            RowId::Goto(nt) => {
                let mut d = start;
                while !p.fits(d, entries) {
                    d += 1;
                }
                let tag = (ntoks + nt) as i32;
                p.place(d, |_| tag, entries);
                gdsp[nt] = d;
            }
        }
    }

    log::debug!(
        "compacted {} action and {} goto rows into {} slots",
        adsp.len(),
        gdsp.len(),
        p.act.len()
    );
    Compacted {
        act: p.act,
        chk: p.chk,
        adsp,
        gdsp,
    }
}

/// The complete table artifact, narrowed to `i16`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TableSet {
    pub ntoks: usize,
    pub ini: usize,
    pub r1: Vec<i16>,
    pub r2: Vec<i16>,
    pub adef: Vec<i16>,
    pub gdef: Vec<i16>,
    pub adsp: Vec<i16>,
    pub gdsp: Vec<i16>,
    pub act: Vec<i16>,
    pub chk: Vec<i16>,
    pub trns: Vec<i16>,
}

fn narrow<T>(what: &str, values: impl IntoIterator<Item = T>) -> Result<Vec<i16>, GrammarError>
where
    T: Copy + TryInto<i16> + std::fmt::Display,
{
    values
        .into_iter()
        .map(|v| {
            v.try_into().map_err(|_| {
                GrammarError::limit(0, format!("{} value {} does not fit in 16 bits", what, v))
            })
        })
        .collect()
}

impl TableSet {
    pub fn new(g: &Grammar, t: &ParseTables, c: &Compacted) -> Result<Self, GrammarError> {
        let adef = t.actions.iter().map(|row| match row.default {
            Some(Act::Reduce(r)) => r as i64,
            _ => -1,
        });
        let gdef = t
            .gotos
            .iter()
            .map(|row| row.default.map_or(-1, |s| s as i64));

        let codes: Vec<(usize, i32)> = (0..g.ntoks)
            .filter_map(|tok| g.syms[tok].code.map(|code| (tok, code)))
            .collect();
        let len = codes.iter().map(|&(_, code)| code as usize + 1).max().unwrap_or(1);
        let mut trns = vec![-1i64; len];
        for &(tok, code) in &codes {
            trns[code as usize] = tok as i64;
        }

        Ok(TableSet {
            ntoks: g.ntoks,
            ini: 0,
            r1: narrow("rule length", g.rules.iter().map(|r| r.rhs.len() as i64))?,
            r2: narrow("rule head", g.rules.iter().map(|r| g.nt_index(r.lhs) as i64))?,
            adef: narrow("default reduction", adef)?,
            gdef: narrow("default goto", gdef)?,
            adsp: narrow("action displacement", c.adsp.iter().copied())?,
            gdsp: narrow("goto displacement", c.gdsp.iter().copied())?,
            act: narrow("action", c.act.iter().copied())?,
            chk: narrow("check", c.chk.iter().copied())?,
            trns: narrow("token translation", trns)?,
        })
    }

    /// Borrows the arrays as runtime tables.
    pub fn tables(&self) -> ayacc::Tables<'_> {
        ayacc::Tables {
            ntoks: self.ntoks,
            ini: self.ini,
            r1: &self.r1,
            r2: &self.r2,
            adef: &self.adef,
            gdef: &self.gdef,
            adsp: &self.adsp,
            gdsp: &self.gdsp,
            act: &self.act,
            chk: &self.chk,
            trns: &self.trns,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::first;
    use crate::lalr::Automaton;
    use crate::reader::read;
    use crate::table;

    fn pipeline(src: &str) -> (Grammar, Automaton, ParseTables, Compacted) {
        let mut g = read(src).unwrap();
        first::compute(&mut g);
        let a = Automaton::build(&g);
        let t = table::build(&g, &a);
        let c = compact(&t, g.ntoks);
        (g, a, t, c)
    }

    const GRAMMARS: &[&str] = &[
        "%token NUM\n%left '+' '-'\n%left '*' '/'\n%%\ne : e '+' e | e '-' e | e '*' e | e '/' e | '(' e ')' | '-' e | NUM ;\n",
        "%token IF THEN ELSE X\n%%\ns : IF X THEN s | IF X THEN s ELSE s | X ;\n",
        "%%\ns : 'a' x 'd' | 'b' y 'd' | 'a' y 'e' | 'b' x 'e' ;\nx : 'c' ;\ny : 'c' ;\n",
        "%token ID\n%%\nlist : | list item ;\nitem : ID | ID '=' ID | '{' list '}' ;\n",
    ];

    #[test]
    fn round_trip_is_exact() {
        for src in GRAMMARS {
            let (g, a, t, c) = pipeline(src);
            let set = TableSet::new(&g, &t, &c).unwrap();
            let rt = set.tables();
            for s in 0..a.nstates() {
                for tok in 0..g.ntoks {
                    assert_eq!(rt.action(s, tok), t.action(s, tok), "state {} token {}", s, tok);
                }
                for nt in 0..g.nnonterms() {
                    assert_eq!(rt.goto(s, nt), t.goto(s, nt), "state {} non-terminal {}", s, nt);
                }
            }
        }
    }

    #[test]
    fn action_rows_share_displacement_only_when_identical() {
        for src in GRAMMARS {
            let (_, _, t, c) = pipeline(src);
            for i in 0..t.actions.len() {
                for j in i + 1..t.actions.len() {
                    if c.adsp[i] == c.adsp[j] {
                        let (a, b) = (&t.actions[i], &t.actions[j]);
                        assert!(a.explicit().eq(b.explicit()), "states {} and {}", i, j);
                    }
                }
            }
        }
    }

    #[test]
    fn empty_slots_are_marked() {
        let (_, _, t, c) = pipeline(GRAMMARS[0]);
        assert_eq!(c.act.len(), c.chk.len());
        let explicit: usize = c.chk.iter().filter(|&&k| k != -1).count();
        assert!(explicit <= t.actions.iter().map(|r| r.nexplicit).sum::<usize>()
            + t.gotos.iter().map(|r| r.nexplicit).sum::<usize>());
        for (&k, &v) in c.chk.iter().zip(&c.act) {
            if k == -1 {
                assert_eq!(v, 0);
            }
        }
    }

    #[test]
    fn token_translation() {
        let (g, _, t, c) = pipeline(GRAMMARS[0]);
        let set = TableSet::new(&g, &t, &c).unwrap();
        let rt = set.tables();
        assert_eq!(set.trns.len(), 258);
        assert_eq!(rt.translate(0), Some(0));
        assert_eq!(rt.translate(257), Some(1));
        assert_eq!(rt.translate('+' as i32), Some(2));
        assert_eq!(rt.translate('(' as i32), Some(6));
        assert_eq!(rt.translate('x' as i32), None);
        assert_eq!(set.r1[g.start_rule()], 2);
        assert_eq!(set.r2[g.start_rule()] as usize, g.nt_index(g.start_sym()));
    }

    #[test]
    fn narrowing_reports_overflow() {
        let err = narrow("action", [1i32, 40_000]).unwrap_err();
        assert!(matches!(err, GrammarError::Limit { line: 0, .. }));
        assert!(err.to_string().contains("40000"));
    }
}
