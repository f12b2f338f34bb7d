// src/algorithms/sdk.rs

//! # Procedure SDK
//!
//! Shared protocol and bookkeeping for the adaptive procedures under
//! `src/algorithms/*`. A *procedure* owns a small state record, consumes one
//! [`TrialOutcome`] at a time, and moves its difficulty through step requests
//! on the [`ControlSource`] it is handed. It never owns the parameters.
//!
//! ## Lifecycle
//! 1. `start` resets state and presents the first stimulus (step requests on
//!    every source it drives).
//! 2. `submit` records one outcome, updates counters, and presents the next
//!    stimulus unless the run is now complete.
//! 3. `is_done` answers from counters (and, for duration rules, the clock).
//! 4. `final_output` reports the converged value per source. It is a pure
//!    function of the frozen state, so publishing twice gives the same values.
//!
//! ## Building blocks
//! - [`Streaks`]: consecutive correct / wrong counters.
//! - [`Reversals`]: direction-change detector with the recorded steps.
//! - [`TrialMetadata`]: ordered key/value pairs for the logging layer.
//!
//! Dispatch across procedures happens by `match` on
//! [`Algorithm`](crate::algorithms::Algorithm), not through trait objects.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::control::{ControlSource, FinalOutput, OutputSink};
use crate::error::Result;

/// One response. Partial credit is clamped to `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum TrialOutcome {
    Correct,
    Incorrect,
    Partial(f64),
}

impl TrialOutcome {
    #[inline]
    pub fn credit(&self) -> f64 {
        match *self {
            TrialOutcome::Correct => 1.0,
            TrialOutcome::Incorrect => 0.0,
            TrialOutcome::Partial(c) if c.is_finite() => c.clamp(0.0, 1.0),
            TrialOutcome::Partial(_) => 0.0,
        }
    }

    /// Binary reading used by stepping procedures: at least half credit.
    #[inline]
    pub fn is_correct(&self) -> bool {
        self.credit() >= 0.5
    }
}

impl From<bool> for TrialOutcome {
    fn from(correct: bool) -> Self {
        if correct { TrialOutcome::Correct } else { TrialOutcome::Incorrect }
    }
}

/// What a procedure sees while it runs.
pub struct RunContext<'a> {
    pub controls: &'a mut ControlSource,
    pub guess_rate: f64,
}

/// Common surface of every procedure.
pub trait Procedure {
    fn name(&self) -> &'static str;

    /// Number of independent difficulty dimensions this procedure drives.
    fn source_count(&self) -> usize;

    /// Resets counters and presents the first stimulus.
    fn start(&mut self, ctx: &mut RunContext<'_>) -> Result<()>;

    fn submit(&mut self, outcome: TrialOutcome, ctx: &mut RunContext<'_>);

    fn is_done(&self, now: Instant) -> bool;

    fn final_output(&self, source: usize) -> FinalOutput;

    fn metadata(&self) -> TrialMetadata;

    /// Arms wall-clock state at the start of a task phase.
    fn arm(&mut self, _now: Instant) {}

    /// Additional derived values (per-level scores and the like).
    fn extra_outputs(&self, _sink: &mut dyn OutputSink) {}
}

/// Consecutive-outcome counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Streaks {
    pub correct: u32,
    pub wrong: u32,
}

impl Streaks {
    #[inline]
    pub fn record(&mut self, correct: bool) {
        if correct {
            self.wrong = 0;
            self.correct += 1;
        } else {
            self.correct = 0;
            self.wrong += 1;
        }
    }

    #[inline]
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Direction-change detector.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Reversals {
    last_direction: i32,
    steps: Vec<f64>,
}

impl Reversals {
    /// Notes a move of `diff` requested from `at`. Returns true (and records
    /// `at`) when the direction flips. The first direction never counts.
    pub fn turn(&mut self, diff: i32, at: i32) -> bool {
        let dir = diff.signum();
        if dir == 0 {
            return false;
        }
        let flipped = self.last_direction != 0 && dir != self.last_direction;
        if flipped {
            self.steps.push(at as f64);
        }
        self.last_direction = dir;
        flipped
    }

    /// Records a reversal without a direction change (bounds rejection).
    pub fn record(&mut self, at: i32) {
        self.steps.push(at as f64);
    }

    pub fn count(&self) -> u32 {
        self.steps.len() as u32
    }

    pub fn steps(&self) -> &[f64] {
        &self.steps
    }

    pub fn last_direction(&self) -> i32 {
        self.last_direction
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetaValue {
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl From<u32> for MetaValue {
    fn from(v: u32) -> Self {
        MetaValue::Int(v as i64)
    }
}
impl From<i32> for MetaValue {
    fn from(v: i32) -> Self {
        MetaValue::Int(v as i64)
    }
}
impl From<usize> for MetaValue {
    fn from(v: usize) -> Self {
        MetaValue::Int(v as i64)
    }
}
impl From<f64> for MetaValue {
    fn from(v: f64) -> Self {
        MetaValue::Float(v)
    }
}
impl From<bool> for MetaValue {
    fn from(v: bool) -> Self {
        MetaValue::Bool(v)
    }
}

/// Ordered per-trial key/value pairs (e.g. `trial`, `reversals`).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TrialMetadata {
    pub entries: Vec<(String, MetaValue)>,
}

impl TrialMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl Into<MetaValue>) -> Self {
        self.entries.push((key.to_owned(), value.into()));
        self
    }

    pub fn get(&self, key: &str) -> Option<MetaValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| *v)
    }

    pub fn get_int(&self, key: &str) -> Option<i64> {
        match self.get(key)? {
            MetaValue::Int(v) => Some(v),
            _ => None,
        }
    }
}
