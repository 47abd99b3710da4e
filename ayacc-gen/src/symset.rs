//! Sorted sets of grammar symbols.
//!
//! FIRST sets and lookahead sets are small subsets of a bounded symbol
//! universe, so they are kept as sorted vectors and combined with a linear
//! merge. Every fixpoint in the generator is driven by the change flag that
//! [`SymSet::union`] returns.

use crate::grammar::Sym;
use std::fmt;

/// A sorted, duplicate-free set of symbols.
///
/// A set is never edited element by element: [`SymSet::union`] builds the
/// merged buffer and swaps it in whole, or leaves the set untouched (and
/// allocates nothing) when `other` adds no new element.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct SymSet(Vec<Sym>);

impl SymSet {
    pub fn new() -> Self {
        SymSet(Vec::new())
    }

    pub fn single(sym: Sym) -> Self {
        SymSet(vec![sym])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Sym> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Sym] {
        &self.0
    }

    /// Position of `sym` in the set, or the size of the set when `sym` is
    /// absent.
    pub fn member_index(&self, sym: Sym) -> usize {
        self.0.binary_search(&sym).unwrap_or(self.0.len())
    }

    pub fn contains(&self, sym: Sym) -> bool {
        self.member_index(sym) < self.0.len()
    }

    /// Merges `other` into `self` and reports whether `self` grew.
    pub fn union(&mut self, other: &SymSet) -> bool {
        if !self.misses_any(other) {
            return false;
        }
        let (a, b) = (&self.0, &other.0);
        let mut merged = Vec::with_capacity(a.len() + b.len());
        let (mut i, mut j) = (0, 0);
        while i < a.len() && j < b.len() {
            if a[i] < b[j] {
                merged.push(a[i]);
                i += 1;
            } else if b[j] < a[i] {
                merged.push(b[j]);
                j += 1;
            } else {
                merged.push(a[i]);
                i += 1;
                j += 1;
            }
        }
        merged.extend_from_slice(&a[i..]);
        merged.extend_from_slice(&b[j..]);
        self.0 = merged;
        true
    }

    /// Whether `other` has an element that `self` lacks.
    fn misses_any(&self, other: &SymSet) -> bool {
        let a = &self.0;
        let mut i = 0;
        for &s in &other.0 {
            while i < a.len() && a[i] < s {
                i += 1;
            }
            if i == a.len() || a[i] != s {
                return true;
            }
        }
        false
    }
}

impl FromIterator<Sym> for SymSet {
    fn from_iter<I: IntoIterator<Item = Sym>>(iter: I) -> Self {
        let mut v: Vec<Sym> = iter.into_iter().collect();
        v.sort_unstable();
        v.dedup();
        SymSet(v)
    }
}

impl<'a> IntoIterator for &'a SymSet {
    type Item = &'a Sym;
    type IntoIter = std::slice::Iter<'a, Sym>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for SymSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, s) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", s)?;
        }
        write!(f, "}}")
    }
}
