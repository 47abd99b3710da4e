//! LALR(1) item engine.
//!
//! This module builds the LALR(1) automaton of a [`Grammar`] whose FIRST sets
//! have already been computed by [`crate::first`].
//!
//! # Overview
//! States are built directly with lookaheads: every state discovered by
//! [`goto`] is canonicalized by its *core* (the `(rule, dot)` pairs of its
//! terms). A state whose core is already known is not added again; its
//! lookaheads are merged into the existing state instead, which is the LALR
//! merge. When a merge grows the lookaheads of a state whose transitions were
//! already computed, the state is queued again so that the growth reaches its
//! successors.
//!
//! # Components
//! - [`Term`]: a rule, a dot position and a lookahead set.
//! - [`Item`]: a state, i.e. its sorted terms plus its transitions.
//! - [`closure`], [`goto`], [`iadd`], [`cmp_core`]: the item-set operations.
//! - [`Automaton`]: the ordered state list with insert-or-merge and [`Automaton::build`].
//!
//! # Notes
//! - State ids follow discovery order. State 0 is the initial state and is
//!   never the target of a transition.

use crate::first::first_of_suffix;
use crate::grammar::{END, Grammar, RuleId, StateId, Sym};
use crate::symset::SymSet;
use std::cmp::Ordering;
use std::collections::VecDeque;

/// An LR(1) term: a rule with a dot position and a lookahead set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Term {
    pub rule: RuleId,
    pub dot: usize,
    pub lookahead: SymSet,
}

impl Term {
    #[inline]
    fn core(&self) -> (RuleId, usize) {
        (self.rule, self.dot)
    }

    /// The symbol after the dot, if the term is not complete.
    #[inline]
    pub fn next_sym(&self, g: &Grammar) -> Option<Sym> {
        g.rules[self.rule].rhs.get(self.dot).copied()
    }
}

/// A state of the automaton.
#[derive(Clone, Debug, Default)]
pub struct Item {
    /// Terms sorted by `(rule, dot)`.
    pub terms: Vec<Term>,
    /// Target state per symbol. Empty until the state has been processed.
    pub trans: Vec<Option<StateId>>,
}

impl Item {
    pub fn transition(&self, sym: Sym) -> Option<StateId> {
        self.trans.get(sym).copied().flatten()
    }
}

/// Adds `term` to a sorted term list, merging lookaheads with an existing
/// term of the same core.
///
/// # Returns
/// Whether the list changed.
pub fn iadd(terms: &mut Vec<Term>, term: Term) -> bool {
    match terms.binary_search_by(|t| t.core().cmp(&term.core())) {
        Ok(i) => terms[i].lookahead.union(&term.lookahead),
        Err(i) => {
            terms.insert(i, term);
            true
        }
    }
}

/// Closes a term list in place.
///
/// For every term `A → α • N β` with lookahead `L`, each rule `N → γ` is
/// added as `N → • γ` with lookahead `FIRST(β a)` for all `a ∈ L`. The scan
/// restarts whenever the list changes and ends when a full scan adds nothing.
pub fn closure(g: &Grammar, terms: &mut Vec<Term>) {
    'scan: loop {
        for i in 0..terms.len() {
            let t = &terms[i];
            let rhs = &g.rules[t.rule].rhs;
            let n = match rhs.get(t.dot) {
                Some(&n) if !g.is_token(n) => n,
                _ => continue,
            };
            let rest = &rhs[t.dot + 1..];
            let mut la = SymSet::new();
            for &a in &t.lookahead {
                la.union(&first_of_suffix(g, rest, Some(a)));
            }
            let mut changed = false;
            for &r in g.rules_of(n) {
                changed |= iadd(
                    terms,
                    Term {
                        rule: r,
                        dot: 0,
                        lookahead: la.clone(),
                    },
                );
            }
            if changed {
                continue 'scan;
            }
        }
        break;
    }
}

/// Computes the closed successor of a term list on `sym`.
///
/// Returns an empty list when no term has `sym` after its dot.
pub fn goto(g: &Grammar, terms: &[Term], sym: Sym) -> Vec<Term> {
    let mut out = Vec::new();
    for t in terms {
        if t.next_sym(g) == Some(sym) {
            iadd(
                &mut out,
                Term {
                    rule: t.rule,
                    dot: t.dot + 1,
                    lookahead: t.lookahead.clone(),
                },
            );
        }
    }
    if !out.is_empty() {
        closure(g, &mut out);
    }
    out
}

/// Orders term lists by size, then lexicographically by `(rule, dot)`.
/// Lookaheads are ignored.
pub fn cmp_core(a: &[Term], b: &[Term]) -> Ordering {
    a.len()
        .cmp(&b.len())
        .then_with(|| a.iter().map(Term::core).cmp(b.iter().map(Term::core)))
}

/// Outcome of [`Automaton::insert`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Inserted {
    /// A state with a new core was added.
    New(StateId),
    /// The core was known; `grew` tells whether its lookaheads changed.
    Merged { id: StateId, grew: bool },
}

/// The LALR(1) automaton.
///
/// State ids are assigned in discovery order: state 0 is the initial state,
/// and since no rule mentions `$start` it is never the target of a
/// transition.
#[derive(Clone, Debug, Default)]
pub struct Automaton {
    pub states: Vec<Item>,
    /// State ids sorted by [`cmp_core`].
    order: Vec<StateId>,
}

impl Automaton {
    pub fn nstates(&self) -> usize {
        self.states.len()
    }

    /// Adds a closed term list, or merges it into the state with the same core.
    pub fn insert(&mut self, terms: Vec<Term>) -> Inserted {
        let states = &self.states;
        match self
            .order
            .binary_search_by(|&id| cmp_core(&states[id].terms, &terms))
        {
            Ok(pos) => {
                let id = self.order[pos];
                let mut grew = false;
                for (dst, src) in self.states[id].terms.iter_mut().zip(&terms) {
                    grew |= dst.lookahead.union(&src.lookahead);
                }
                Inserted::Merged { id, grew }
            }
            Err(pos) => {
                let id = self.states.len();
                self.states.push(Item {
                    terms,
                    trans: Vec::new(),
                });
                self.order.insert(pos, id);
                Inserted::New(id)
            }
        }
    }

    /// Builds the automaton for a grammar whose FIRST sets are computed.
    ///
    /// Starts from the closure of `$start → • S $end` with lookahead
    /// `{$end}` and processes a worklist, computing the successor on every
    /// symbol that appears after a dot.
    pub fn build(g: &Grammar) -> Self {
        let mut a = Automaton::default();
        let mut init = vec![Term {
            rule: g.start_rule(),
            dot: 0,
            lookahead: SymSet::single(END),
        }];
        closure(g, &mut init);
        a.insert(init);

        let mut queue = VecDeque::from([0]);
        let mut queued = vec![true];
        let mut requeues = 0usize;

        while let Some(s) = queue.pop_front() {
            queued[s] = false;
            let syms: SymSet = a.states[s]
                .terms
                .iter()
                .filter_map(|t| t.next_sym(g))
                .collect();
            let mut trans = vec![None; g.nsyms()];
            for &sym in &syms {
                let next = goto(g, &a.states[s].terms, sym);
                let (id, enqueue) = match a.insert(next) {
                    Inserted::New(id) => {
                        queued.push(false);
                        (id, true)
                    }
                    Inserted::Merged { id, grew } => {
                        if grew && !queued[id] {
                            requeues += 1;
                        }
                        (id, grew)
                    }
                };
                if enqueue && !queued[id] {
                    queued[id] = true;
                    queue.push_back(id);
                }
                trans[sym] = Some(id);
            }
            a.states[s].trans = trans;
        }

        log::debug!(
            "LALR automaton: {} states, {} re-queued for lookahead growth",
            a.nstates(),
            requeues
        );
        a
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::first;
    use crate::reader::read;

    fn prepare(src: &str) -> Grammar {
        let mut g = read(src).unwrap();
        first::compute(&mut g);
        g
    }

    fn sym(g: &Grammar, name: &str) -> Sym {
        (0..g.nsyms()).find(|&s| g.name(s) == name).unwrap()
    }

    fn term(rule: RuleId, dot: usize, la: &[Sym]) -> Term {
        Term {
            rule,
            dot,
            lookahead: la.iter().copied().collect(),
        }
    }

    #[test]
    fn iadd_merges_equal_cores() {
        let mut terms = Vec::new();
        assert!(iadd(&mut terms, term(2, 1, &[1])));
        assert!(iadd(&mut terms, term(0, 3, &[1])));
        assert!(iadd(&mut terms, term(2, 0, &[4])));
        assert!(iadd(&mut terms, term(2, 1, &[3])));
        assert!(!iadd(&mut terms, term(2, 1, &[1, 3])));
        let cores: Vec<_> = terms.iter().map(|t| (t.rule, t.dot)).collect();
        assert_eq!(cores, vec![(0, 3), (2, 0), (2, 1)]);
        assert_eq!(terms[2].lookahead.as_slice(), &[1, 3]);
    }

    #[test]
    fn cores_compare_by_size_then_pairs() {
        let a = vec![term(0, 1, &[1])];
        let b = vec![term(0, 1, &[2]), term(1, 0, &[2])];
        let c = vec![term(0, 2, &[1])];
        assert_eq!(cmp_core(&a, &b), Ordering::Less);
        assert_eq!(cmp_core(&a, &c), Ordering::Less);
        assert_eq!(cmp_core(&a, &[term(0, 1, &[9])]), Ordering::Equal);
    }

    #[test]
    fn closure_propagates_first_of_rest() {
        let g = prepare("%%\ns : x 'b' | x ;\nx : 'a' | ;\n");
        let mut terms = vec![term(g.start_rule(), 0, &[END])];
        closure(&g, &mut terms);
        // $start -> . s $end, s -> . x 'b', s -> . x, x -> . 'a', x -> .
        assert_eq!(terms.len(), 5);
        let b = sym(&g, "'b'");
        let x_terms: Vec<&Term> = terms
            .iter()
            .filter(|t| g.rules[t.rule].lhs == sym(&g, "x"))
            .collect();
        for t in x_terms {
            assert_eq!(t.lookahead.as_slice(), &[END, b]);
        }
    }

    #[test]
    fn states_have_distinct_cores_and_start_at_zero() {
        let g = prepare(
            "%token NUM\n%%\ne : e '+' t | t ;\nt : t '*' f | f ;\nf : '(' e ')' | NUM ;\n",
        );
        let a = Automaton::build(&g);
        // the twelve LR(0) states plus the one after shifting $end
        assert_eq!(a.nstates(), 13);
        for i in 0..a.nstates() {
            for j in i + 1..a.nstates() {
                assert_ne!(
                    cmp_core(&a.states[i].terms, &a.states[j].terms),
                    Ordering::Equal,
                    "states {} and {} share a core",
                    i,
                    j
                );
            }
        }
        assert!(a.states[0].terms.iter().any(|t| t.rule == g.start_rule() && t.dot == 0));
        for st in &a.states {
            assert!(st.trans.iter().all(|&t| t != Some(0)));
        }
    }

    #[test]
    fn merged_states_union_lookaheads() {
        // LALR merges the two `c .` states reached after `a` and after `b`
        let g = prepare(
            "%%\ns : 'a' x 'd' | 'b' y 'd' | 'a' y 'e' | 'b' x 'e' ;\nx : 'c' ;\ny : 'c' ;\n",
        );
        let a = Automaton::build(&g);
        let (x, y) = (sym(&g, "x"), sym(&g, "y"));
        let (d, e) = (sym(&g, "'d'"), sym(&g, "'e'"));
        let reduce_states: Vec<&Item> = a
            .states
            .iter()
            .filter(|st| {
                st.terms
                    .iter()
                    .any(|t| g.rules[t.rule].lhs == x && t.dot == 1)
            })
            .collect();
        assert_eq!(reduce_states.len(), 1);
        for t in &reduce_states[0].terms {
            let lhs = g.rules[t.rule].lhs;
            assert!(lhs == x || lhs == y);
            assert_eq!(t.lookahead.as_slice(), &[d, e]);
        }
    }

    #[test]
    fn lookahead_growth_reaches_successors() {
        // the state after `x` is first reached with lookahead {'b'} and later
        // merged with {$end}; its successor must see both
        let g = prepare("%%\ns : 'a' l 'b' | l ;\nl : 'x' 'y' ;\n");
        let a = Automaton::build(&g);
        let l = sym(&g, "l");
        let b = sym(&g, "'b'");
        let done: Vec<&Term> = a
            .states
            .iter()
            .flat_map(|st| st.terms.iter())
            .filter(|t| g.rules[t.rule].lhs == l && t.dot == 2)
            .collect();
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].lookahead.as_slice(), &[END, b]);
    }
}
