//! One-up/one-down track over a fixed number of trials.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::algorithms::sdk::{Procedure, RunContext, TrialMetadata, TrialOutcome};
use crate::control::FinalOutput;
use crate::error::{Error, Result};
use crate::mechanics::score;
use crate::termination::{Termination, TerminationRule};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub trials: u32,
    pub step_on_correct: i32,
    pub step_on_wrong: i32,
    pub starting_step: i32,
}

impl Default for Config {
    fn default() -> Self {
        Self { trials: 30, step_on_correct: 1, step_on_wrong: 1, starting_step: 0 }
    }
}

impl Config {
    pub fn validate(&self) -> std::result::Result<(), &'static str> {
        if self.trials == 0 {
            return Err("trials must be positive");
        }
        if self.step_on_correct == 0 || self.step_on_wrong == 0 {
            return Err("step sizes must be nonzero");
        }
        if self.starting_step < 0 {
            return Err("starting_step must be non-negative");
        }
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct FixedTrials {
    cfg: Config,
    termination: Termination,
    step: i32,
    presented: Vec<i32>,
}

impl FixedTrials {
    pub fn new(cfg: Config) -> Self {
        Self {
            termination: Termination::new(TerminationRule::Trials(cfg.trials)),
            step: cfg.starting_step,
            presented: Vec::with_capacity(cfg.trials as usize),
            cfg,
        }
    }

    pub fn trial(&self) -> u32 {
        self.presented.len() as u32
    }

    pub fn step(&self) -> i32 {
        self.step
    }

    /// Steps presented on each trial so far.
    pub fn presented(&self) -> &[i32] {
        &self.presented
    }

    /// Mean step over the second half of the run.
    pub fn threshold_step(&self) -> f64 {
        let tail: Vec<f64> = self.presented[self.presented.len() / 2..]
            .iter()
            .map(|&s| s as f64)
            .collect();
        score::mean_or(&tail, self.step as f64)
    }
}

impl Procedure for FixedTrials {
    fn name(&self) -> &'static str {
        "fixed_trials"
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
        self.presented.push(self.step);
        let diff = if outcome.is_correct() { self.cfg.step_on_correct } else { -self.cfg.step_on_wrong };
        if self.trial() >= self.cfg.trials {
            return;
        }
        if ctx.controls.step_to(0, self.step + diff).is_success() {
            self.step += diff;
        } else {
            debug!(step = self.step, diff, "step rejected; holding");
        }
    }

    fn is_done(&self, now: Instant) -> bool {
        self.termination.is_done(self.trial(), 0, now)
    }

    fn final_output(&self, _source: usize) -> FinalOutput {
        FinalOutput::Step(self.threshold_step())
    }

    fn metadata(&self) -> TrialMetadata {
        TrialMetadata::new()
            .with("trial", self.trial())
            .with("step", self.step)
    }
}
