use crate::error::ParseError;
use crate::tables::{Action, Tables};
use anyhow::Result;
use smartstring::alias::String;
use std::fmt::Debug;

/// Stack depth bound used unless [`Parser::with_max_depth`] says otherwise.
pub const DEFAULT_MAX_DEPTH: usize = 1000;

/// Source of tokens for a [`Parser`].
///
/// `lex` returns the external token code together with its semantic value.
/// Code `0` marks the end of input; single-character tokens use their
/// character code and named tokens use the constants emitted by the generator.
pub trait Lexer {
    type Value;

    fn lex(&mut self) -> Result<(i32, Self::Value)>;
}

#[derive(Debug, Clone, Default)]
pub struct ParserStats {
    pub tokens: usize,
    pub shifts: usize,
    pub reductions: usize,
    pub max_depth: usize,
}

/// Shift-reduce drive loop over a set of compacted [`Tables`].
pub struct Parser<'t> {
    tables: Tables<'t>,
    max_depth: usize,
    stats: ParserStats,
}

impl<'t> Parser<'t> {
    pub fn new(tables: Tables<'t>) -> Self {
        Self {
            tables,
            max_depth: DEFAULT_MAX_DEPTH,
            stats: ParserStats::default(),
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn stats(&self) -> ParserStats {
        self.stats.clone()
    }

    /// Parses the whole token stream produced by `lexer`.
    ///
    /// `action` is called for every reduction except the synthetic start rule
    /// with the rule index and the values of its right-hand side, in order.
    /// Its result becomes the value of the left-hand side. Reducing the start
    /// rule accepts, and the value of the user start symbol is returned.
    pub fn parse<L, F>(&mut self, lexer: &mut L, mut action: F) -> Result<L::Value, ParseError>
    where
        L: Lexer,
        L::Value: Default + Debug,
        F: FnMut(usize, &mut [L::Value]) -> Result<L::Value>,
    {
        let t = self.tables;
        self.stats = ParserStats::default();
        let mut stack: Vec<(usize, L::Value)> = Vec::with_capacity(32);
        stack.push((t.ini, L::Value::default()));
        let mut look: Option<(i32, usize, L::Value)> = None;
        let mut at_end = false;

        loop {
            let state = stack[stack.len() - 1].0;
            let (code, tok) = match &look {
                Some((code, tok, _)) => (*code, *tok),
                None => {
                    // once `$end` is shifted the lexer is not consulted again
                    let (code, value) = if at_end {
                        (0, L::Value::default())
                    } else {
                        self.stats.tokens += 1;
                        lexer.lex().map_err(ParseError::Lexer)?
                    };
                    let tok = t
                        .translate(code)
                        .ok_or(ParseError::Syntax { state, token: code })?;
                    look = Some((code, tok, value));
                    (code, tok)
                }
            };

            if log::log_enabled!(log::Level::Trace) {
                dump_state(&stack, code);
            }

            match t.action(state, tok) {
                Action::Shift(next) => {
                    log::trace!("Shift {}", next);
                    self.push_check(stack.len())?;
                    if let Some((_, _, value)) = look.take() {
                        stack.push((next, value));
                    }
                    at_end = tok == 0;
                    self.stats.shifts += 1;
                }

                Action::Reduce(rule) => {
                    let base = stack.len().saturating_sub(t.rhs_len(rule)).max(1);
                    if rule == t.start_rule() {
                        log::trace!("Accept");
                        let value = stack
                            .drain(base..)
                            .next()
                            .map(|(_, v)| v)
                            .unwrap_or_default();
                        return Ok(value);
                    }
                    log::trace!("Reduce {}", rule);
                    let mut values: Vec<L::Value> = stack.drain(base..).map(|(_, v)| v).collect();
                    let value = action(rule, &mut values)
                        .map_err(|source| ParseError::Action { rule, source })?;
                    let top = stack[stack.len() - 1].0;
                    let next = t
                        .goto(top, t.lhs(rule))
                        .ok_or(ParseError::Syntax { state: top, token: code })?;
                    self.push_check(stack.len())?;
                    stack.push((next, value));
                    self.stats.reductions += 1;
                }

                Action::Error => {
                    log::trace!("Error in state {} on {}", state, code);
                    return Err(ParseError::Syntax { state, token: code });
                }
            }
        }
    }

    #[inline]
    fn push_check(&mut self, depth: usize) -> Result<(), ParseError> {
        if depth >= self.max_depth {
            return Err(ParseError::StackOverflow {
                depth: self.max_depth,
            });
        }
        self.stats.max_depth = self.stats.max_depth.max(depth + 1);
        Ok(())
    }
}

fn dump_state<V: Debug>(stack: &[(usize, V)], incoming: i32) {
    let mut output = String::new();
    for (state, value) in stack {
        output.push_str(&format!("<{}> {:?}  ", state, value));
    }
    output.push_str(&format!("<-  {}", incoming));
    log::trace!("{}", output);
}
