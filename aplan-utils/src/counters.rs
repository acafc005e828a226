//! Per-run named integer counters.
//!
//! Each kind of construct gets its own counter so generated names carry a
//! per-kind numeric suffix. The registry is owned by the translation
//! context and passed explicitly to constructors; nothing here is
//! process-wide, so two runs never contaminate each other's numbering.
use std::collections::HashMap;

/// The kinds of constructs that draw numeric suffixes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum CounterKind {
    Assignment,
    Assert,
    Module,
    Body,
    ElseBody,
    Loop,
    Condition,
    Repeat,
    Forever,
    Task,
    Enum,
    Object,
    If,
    Case,
    B,
    Struct,
    Sequence,
}

impl CounterKind {
    /// Every registered kind together with its initial value. Most kinds
    /// start at 1; the structural kinds start at 0.
    const INITIAL: [(CounterKind, u64); 17] = [
        (CounterKind::Assignment, 1),
        (CounterKind::Assert, 1),
        (CounterKind::Module, 1),
        (CounterKind::Body, 1),
        (CounterKind::ElseBody, 1),
        (CounterKind::Loop, 1),
        (CounterKind::Condition, 1),
        (CounterKind::Repeat, 1),
        (CounterKind::Forever, 1),
        (CounterKind::Task, 1),
        (CounterKind::Enum, 1),
        (CounterKind::Object, 1),
        (CounterKind::If, 0),
        (CounterKind::Case, 0),
        (CounterKind::B, 0),
        (CounterKind::Struct, 0),
        (CounterKind::Sequence, 0),
    ];
}

impl std::fmt::Display for CounterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Registry of named counters for one translation run.
#[derive(Clone, Debug)]
pub struct Counters {
    counts: HashMap<CounterKind, u64>,
}

impl Counters {
    pub fn new() -> Self {
        let mut counters = Counters {
            counts: HashMap::new(),
        };
        counters.reinit();
        counters
    }

    /// Reset every counter to its initial value. Must run once between
    /// independent translation runs that reuse the same registry.
    pub fn reinit(&mut self) {
        self.counts.clear();
        self.counts.extend(CounterKind::INITIAL);
    }

    /// Current value of `kind`. Querying an unregistered counter is fatal.
    pub fn get(&self, kind: CounterKind) -> u64 {
        match self.counts.get(&kind) {
            Some(value) => *value,
            None => panic!("counter `{kind}` is not registered"),
        }
    }

    pub fn increment(&mut self, kind: CounterKind) {
        match self.counts.get_mut(&kind) {
            Some(value) => *value += 1,
            None => panic!("counter `{kind}` is not registered"),
        }
    }

    /// Decrement `kind`, flooring at zero.
    pub fn decrement(&mut self, kind: CounterKind) {
        match self.counts.get_mut(&kind) {
            Some(value) => *value = value.saturating_sub(1),
            None => panic!("counter `{kind}` is not registered"),
        }
    }

    /// Fetch-and-increment of the sequence counter: the source of the
    /// globally unique, monotonic creation sequence on every IR node.
    pub fn next_sequence(&mut self) -> u64 {
        let seq = self.get(CounterKind::Sequence);
        self.increment(CounterKind::Sequence);
        seq
    }
}

impl Default for Counters {
    fn default() -> Self {
        Self::new()
    }
}
