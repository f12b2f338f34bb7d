//! N-down / M-up staircase with reversal tracking.
//!
//! Larger step indices are harder. `correct_to_step_down` consecutive correct
//! answers move the track by `+steps_down`; `wrong_to_step_up` consecutive
//! wrong answers move it by `-steps_up`. The threshold is the mean step at
//! which the track reversed.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::algorithms::sdk::{Procedure, Reversals, RunContext, Streaks, TrialMetadata, TrialOutcome};
use crate::control::{FinalOutput, StepStatus};
use crate::error::{Error, Result};
use crate::mechanics::score;
use crate::termination::{Termination, TerminationRule};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub correct_to_step_down: u32,
    pub wrong_to_step_up: u32,
    pub steps_up: i32,
    pub steps_down: i32,
    pub starting_step: i32,
    pub termination: TerminationRule,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            correct_to_step_down: 2,
            wrong_to_step_up: 1,
            steps_up: 1,
            steps_down: 1,
            starting_step: 0,
            termination: TerminationRule::default(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> std::result::Result<(), &'static str> {
        if self.correct_to_step_down == 0 || self.wrong_to_step_up == 0 {
            return Err("streak thresholds must be positive");
        }
        if self.steps_up == 0 || self.steps_down == 0 {
            return Err("step sizes must be nonzero");
        }
        if self.starting_step < 0 {
            return Err("starting_step must be non-negative");
        }
        self.termination.validate()
    }
}

/// A committed or rejected move, kept for inspection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Move {
    pub trial: u32,
    pub from: i32,
    pub diff: i32,
    pub status: StepStatus,
}

#[derive(Clone, Debug)]
pub struct SimpleStaircase {
    cfg: Config,
    termination: Termination,
    trial: u32,
    streaks: Streaks,
    step: i32,
    reversals: Reversals,
    moves: Vec<Move>,
}

impl SimpleStaircase {
    pub fn new(cfg: Config) -> Self {
        Self {
            termination: Termination::new(cfg.termination),
            trial: 0,
            streaks: Streaks::default(),
            step: cfg.starting_step,
            reversals: Reversals::default(),
            moves: Vec::new(),
            cfg,
        }
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    pub fn trial(&self) -> u32 {
        self.trial
    }

    pub fn step(&self) -> i32 {
        self.step
    }

    pub fn streaks(&self) -> Streaks {
        self.streaks
    }

    pub fn reversal_count(&self) -> u32 {
        self.reversals.count()
    }

    pub fn reversal_steps(&self) -> &[f64] {
        self.reversals.steps()
    }

    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    /// Mean reversal step, or the current step before any reversal.
    pub fn threshold_step(&self) -> f64 {
        score::mean_or(self.reversals.steps(), self.step as f64)
    }
}

impl Procedure for SimpleStaircase {
    fn name(&self) -> &'static str {
        "simple_staircase"
    }

    fn source_count(&self) -> usize {
        1
    }

    fn start(&mut self, ctx: &mut RunContext<'_>) -> Result<()> {
        *self = Self::new(self.cfg);
        if !ctx.controls.step_to(0, self.step).is_success() {
            return Err(Error::InvalidConfig {
                algorithm: self.name(),
                reason: "starting step could not be applied to the bound parameters",
            });
        }
        Ok(())
    }

    fn submit(&mut self, outcome: TrialOutcome, ctx: &mut RunContext<'_>) {
        self.trial += 1;
        let correct = outcome.is_correct();
        self.streaks.record(correct);

        let diff = if correct {
            (self.streaks.correct >= self.cfg.correct_to_step_down).then_some(self.cfg.steps_down)
        } else {
            (self.streaks.wrong >= self.cfg.wrong_to_step_up).then_some(-self.cfg.steps_up)
        };
        let Some(diff) = diff else {
            return;
        };

        if self.reversals.turn(diff, self.step) {
            debug!(trial = self.trial, step = self.step, reversals = self.reversals.count(), "reversal");
        }

        let status = ctx.controls.step_to(0, self.step + diff);
        self.moves.push(Move { trial: self.trial, from: self.step, diff, status });
        match status {
            StepStatus::Success => self.step += diff,
            StepStatus::OutOfBounds => {
                // A wall counts as a turn-around at the current step.
                self.reversals.record(self.step);
                warn!(trial = self.trial, step = self.step, diff, "step rejected at bound; counted as reversal");
            }
            // Already reported by the control source; treat as a failed step.
            StepStatus::TypeError => {}
        }
        self.streaks.reset();
    }

    fn arm(&mut self, now: Instant) {
        self.termination.arm(now);
    }

    fn is_done(&self, now: Instant) -> bool {
        self.termination.is_done(self.trial, self.reversals.count(), now)
    }

    fn final_output(&self, _source: usize) -> FinalOutput {
        FinalOutput::Step(self.threshold_step())
    }

    fn metadata(&self) -> TrialMetadata {
        TrialMetadata::new()
            .with("trial", self.trial)
            .with("step", self.step)
            .with("reversals", self.reversals.count())
            .with("correct_streak", self.streaks.correct)
            .with("wrong_streak", self.streaks.wrong)
    }
}
