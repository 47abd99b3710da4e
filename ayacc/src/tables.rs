//! Read-only view over the compacted parse tables.
//!
//! The generator emits a handful of `i16` arrays (see the field docs below).
//! Actions and gotos share one `act`/`chk` pair: the logical cell
//! `(row, column)` lives at `disp[row] + column` and is valid only when the
//! check array holds the expected tag there. Any other probe falls back to the
//! row default.
//!
//! Action values use an involutive encoding: `v > 0` shifts to state `v`,
//! `v == -1` is an explicit error, and any other negative `v` reduces by rule
//! `-(v + 2)`.

/// A decoded parser action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    /// Shift the lookahead and enter the given state.
    Shift(usize),
    /// Reduce by the given rule.
    Reduce(usize),
    /// Reject the input.
    Error,
}

impl Action {
    /// Decodes a raw table value. Zero means "no entry".
    #[inline]
    pub fn decode(v: i32) -> Option<Action> {
        match v {
            0 => None,
            -1 => Some(Action::Error),
            v if v < 0 => Some(Action::Reduce((-(v + 2)) as usize)),
            v => Some(Action::Shift(v as usize)),
        }
    }

    /// Encodes an action into its table value.
    #[inline]
    pub fn encode(self) -> i32 {
        match self {
            Action::Shift(s) => s as i32,
            Action::Reduce(r) => -(r as i32 + 2),
            Action::Error => -1,
        }
    }
}

/// The table artifact emitted for one grammar.
#[derive(Clone, Copy, Debug)]
pub struct Tables<'a> {
    /// Number of terminals, including the end marker at index 0.
    pub ntoks: usize,
    /// Initial state.
    pub ini: usize,
    /// Right-hand side length per rule.
    pub r1: &'a [i16],
    /// Left-hand side non-terminal index (zero-based among non-terminals) per rule.
    pub r2: &'a [i16],
    /// Default reduce rule per state, or -1.
    pub adef: &'a [i16],
    /// Default goto state per non-terminal, or -1.
    pub gdef: &'a [i16],
    /// Action row displacement per state.
    pub adsp: &'a [i16],
    /// Goto row displacement per non-terminal.
    pub gdsp: &'a [i16],
    /// Shared packed values.
    pub act: &'a [i16],
    /// Shared packed check tags.
    pub chk: &'a [i16],
    /// External token code to terminal index, or -1.
    pub trns: &'a [i16],
}

impl<'a> Tables<'a> {
    /// Number of rules, including the synthetic start rule.
    pub fn nrules(&self) -> usize {
        self.r1.len()
    }

    /// Number of states.
    pub fn nstates(&self) -> usize {
        self.adsp.len()
    }

    /// The synthetic start rule. Reducing it accepts the input.
    pub fn start_rule(&self) -> usize {
        self.r1.len() - 1
    }

    /// Maps an external token code returned by a lexer to a terminal index.
    #[inline]
    pub fn translate(&self, code: i32) -> Option<usize> {
        let idx = usize::try_from(code).ok()?;
        match self.trns.get(idx) {
            Some(&t) if t >= 0 => Some(t as usize),
            _ => None,
        }
    }

    #[inline]
    fn probe(&self, disp: i16, col: usize, tag: usize) -> Option<i16> {
        let n = disp as isize + col as isize;
        if n < 0 {
            return None;
        }
        let n = n as usize;
        match self.chk.get(n) {
            Some(&c) if c as isize == tag as isize => Some(self.act[n]),
            _ => None,
        }
    }

    /// Looks up the action for terminal `tok` in `state`.
    #[inline]
    pub fn action(&self, state: usize, tok: usize) -> Action {
        if let Some(v) = self.probe(self.adsp[state], tok, tok) {
            if let Some(action) = Action::decode(v as i32) {
                return action;
            }
        }
        match self.adef[state] {
            r if r >= 0 => Action::Reduce(r as usize),
            _ => Action::Error,
        }
    }

    /// Looks up the state entered after reducing to non-terminal `nt` on top of `state`.
    #[inline]
    pub fn goto(&self, state: usize, nt: usize) -> Option<usize> {
        if let Some(v) = self.probe(self.gdsp[nt], state, self.ntoks + nt) {
            return Some(v as usize);
        }
        match self.gdef[nt] {
            s if s >= 0 => Some(s as usize),
            _ => None,
        }
    }

    /// Right-hand side length of `rule`.
    #[inline]
    pub fn rhs_len(&self, rule: usize) -> usize {
        self.r1[rule] as usize
    }

    /// Left-hand side non-terminal index of `rule`.
    #[inline]
    pub fn lhs(&self, rule: usize) -> usize {
        self.r2[rule] as usize
    }
}

/// Hand-packed tables for `S : 'a' ;`, shared by the runtime tests.
#[cfg(test)]
pub(crate) mod sample {
    use super::Tables;

    // S -> a ; start: $start -> S $end
    // state 0: a -> 1, S -> 2 ; state 1: reduce 0 ; state 2: $end -> 3 ; state 3: reduce 1
    // states 1 and 3 have no explicit entries and share a displacement
    const R1: [i16; 2] = [1, 2];
    const R2: [i16; 2] = [0, 1];
    const ADEF: [i16; 4] = [-1, 0, -1, 1];
    const GDEF: [i16; 2] = [2, -1];
    const ADSP: [i16; 4] = [0, 3, 2, 3];
    const GDSP: [i16; 2] = [3, 0];
    const ACT: [i16; 4] = [0, 1, 3, 2];
    const CHK: [i16; 4] = [-1, 1, 0, 2];
    const TRNS: [i16; 98] = {
        let mut t = [-1i16; 98];
        t[0] = 0;
        t[97] = 1;
        t
    };

    pub(crate) fn tables() -> Tables<'static> {
        Tables {
            ntoks: 2,
            ini: 0,
            r1: &R1,
            r2: &R2,
            adef: &ADEF,
            gdef: &GDEF,
            adsp: &ADSP,
            gdsp: &GDSP,
            act: &ACT,
            chk: &CHK,
            trns: &TRNS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::sample::tables;
    use super::*;

    #[test]
    fn encoding_is_involutive() {
        for a in [
            Action::Shift(1),
            Action::Shift(77),
            Action::Reduce(0),
            Action::Reduce(12),
            Action::Error,
        ] {
            assert_eq!(Action::decode(a.encode()), Some(a));
        }
        assert_eq!(Action::decode(0), None);
        assert_eq!(Action::Reduce(0).encode(), -2);
    }

    #[test]
    fn probes_fall_back_to_defaults() {
        let t = tables();
        assert_eq!(t.action(0, 1), Action::Shift(1));
        assert_eq!(t.action(0, 0), Action::Error);
        assert_eq!(t.action(1, 0), Action::Reduce(0));
        assert_eq!(t.action(1, 1), Action::Reduce(0));
        assert_eq!(t.action(2, 0), Action::Shift(3));
        assert_eq!(t.action(2, 1), Action::Error);
        assert_eq!(t.action(3, 0), Action::Reduce(1));
        assert_eq!(t.goto(0, 0), Some(2));
        assert_eq!(t.goto(0, 1), None);
    }

    #[test]
    fn translation_rejects_unknown_codes() {
        let t = tables();
        assert_eq!(t.translate(0), Some(0));
        assert_eq!(t.translate('a' as i32), Some(1));
        assert_eq!(t.translate('b' as i32), None);
        assert_eq!(t.translate(-5), None);
        assert_eq!(t.translate(10_000), None);
    }
}
