//! Nullability and FIRST sets.

use crate::grammar::{Grammar, Sym};
use crate::symset::SymSet;

/// Computes the FIRST set of a symbol sequence.
///
/// A terminal at the head contributes itself and ends the scan. A
/// non-terminal contributes its FIRST set, and the scan goes on only while the
/// symbols seen so far are nullable. When the whole sequence is nullable the
/// `fallback` terminal is added, if any.
///
/// # Parameters
/// - `g`: Grammar whose FIRST sets and nullability are already known.
/// - `rhs`: The symbol sequence, typically the part of a rule after the dot.
/// - `fallback`: Lookahead terminal following the sequence.
pub fn first_of_suffix(g: &Grammar, rhs: &[Sym], fallback: Option<Sym>) -> SymSet {
    let mut out = SymSet::new();
    for &s in rhs {
        if g.is_token(s) {
            out.union(&SymSet::single(s));
            return out;
        }
        out.union(&g.syms[s].first);
        if !g.syms[s].nullable {
            return out;
        }
    }
    if let Some(f) = fallback {
        out.union(&SymSet::single(f));
    }
    out
}

/// Fills in `nullable` and `first` for every symbol.
///
/// Iterates over all rules until a full pass changes nothing. Terminals get
/// `FIRST(t) = {t}` and are never nullable.
///
/// # Returns
/// The number of passes made, including the final one that changed nothing.
pub fn compute(g: &mut Grammar) -> usize {
    for t in 0..g.ntoks {
        g.syms[t].first = SymSet::single(t);
    }
    let mut passes = 0;
    loop {
        passes += 1;
        let mut changed = false;
        for r in 0..g.rules.len() {
            let rule = &g.rules[r];
            let lhs = rule.lhs;
            let nullable = rule.rhs.iter().all(|&s| g.syms[s].nullable);
            let first = first_of_suffix(g, &rule.rhs, None);
            let info = &mut g.syms[lhs];
            if nullable && !info.nullable {
                info.nullable = true;
                changed = true;
            }
            if info.first.union(&first) {
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }
    log::debug!("FIRST sets settled after {} passes", passes);
    passes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::read;
    use std::collections::{HashSet, VecDeque};

    fn sym(g: &Grammar, name: &str) -> Sym {
        (0..g.nsyms()).find(|&s| g.name(s) == name).unwrap()
    }

    fn names(g: &Grammar, set: &SymSet) -> Vec<String> {
        set.iter().map(|&s| g.name(s).to_string()).collect()
    }

    const NULLABLE: &str = "
%token a b c
%%
s : x y z | a ;
x : | b ;
y : x x ;
z : c | y a ;
w : w a ;
";

    #[test]
    fn first_and_nullable() {
        let mut g = read(NULLABLE).unwrap();
        compute(&mut g);
        let (s, x, y, z, w) = (sym(&g, "s"), sym(&g, "x"), sym(&g, "y"), sym(&g, "z"), sym(&g, "w"));
        assert!(g.syms[x].nullable);
        assert!(g.syms[y].nullable);
        assert!(!g.syms[z].nullable);
        assert!(!g.syms[s].nullable);
        assert!(!g.syms[w].nullable);
        assert_eq!(names(&g, &g.syms[x].first), vec!["b"]);
        assert_eq!(names(&g, &g.syms[y].first), vec!["b"]);
        assert_eq!(names(&g, &g.syms[z].first), vec!["a", "b", "c"]);
        assert_eq!(names(&g, &g.syms[s].first), vec!["a", "b", "c"]);
        assert!(g.syms[w].first.is_empty());
        assert_eq!(names(&g, &g.syms[1].first), vec!["a"]);
    }

    #[test]
    fn suffix_uses_fallback_only_when_nullable() {
        let mut g = read(NULLABLE).unwrap();
        compute(&mut g);
        let (x, y, z) = (sym(&g, "x"), sym(&g, "y"), sym(&g, "z"));
        let c = sym(&g, "c");
        assert_eq!(names(&g, &first_of_suffix(&g, &[x, y], Some(c))), vec!["b", "c"]);
        assert_eq!(names(&g, &first_of_suffix(&g, &[x, z], Some(0))), vec!["a", "b", "c"]);
        assert_eq!(names(&g, &first_of_suffix(&g, &[], Some(c))), vec!["c"]);
        assert!(first_of_suffix(&g, &[x], None).as_slice() == g.syms[x].first.as_slice());
    }

    #[test]
    fn fixpoint_is_idempotent() {
        let mut g = read(NULLABLE).unwrap();
        compute(&mut g);
        let before: Vec<(bool, SymSet)> =
            g.syms.iter().map(|s| (s.nullable, s.first.clone())).collect();
        assert_eq!(compute(&mut g), 1);
        let after: Vec<(bool, SymSet)> =
            g.syms.iter().map(|s| (s.nullable, s.first.clone())).collect();
        assert_eq!(before, after);
    }

    /// Searches sentential forms made only of non-terminals for an empty one.
    fn derives_empty(g: &Grammar, from: Sym, max_len: usize) -> bool {
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([vec![from]]);
        while let Some(form) = queue.pop_front() {
            if form.is_empty() {
                return true;
            }
            if !seen.insert(form.clone()) {
                continue;
            }
            // expand the leftmost symbol; any other order reaches the same forms
            for &r in g.rules_of(form[0]) {
                let rhs = &g.rules[r].rhs;
                if rhs.iter().any(|&s| g.is_token(s)) {
                    continue;
                }
                let mut next = rhs.clone();
                next.extend_from_slice(&form[1..]);
                if next.len() <= max_len {
                    queue.push_back(next);
                }
            }
        }
        false
    }

    #[test]
    fn nullable_matches_brute_force() {
        for src in [
            NULLABLE,
            "%%\na : b c | 'x' ;\nb : c c | ;\nc : a | b 'y' ;\n",
            "%%\np : q r ;\nq : r ;\nr : p | ;\n",
            "%%\nl : l 'x' | m ;\nm : 'y' | n n n ;\nn : ;\n",
        ] {
            let mut g = read(src).unwrap();
            compute(&mut g);
            for nt in g.ntoks..g.nsyms() - 1 {
                assert_eq!(
                    g.syms[nt].nullable,
                    derives_empty(&g, nt, 8),
                    "nullable({}) in {:?}",
                    g.name(nt),
                    src
                );
            }
        }
    }
}
