//! Climb one step per correct answer until the lives run out.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::algorithms::sdk::{Procedure, RunContext, TrialMetadata, TrialOutcome};
use crate::control::{FinalOutput, StepStatus};
use crate::error::{Error, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub lives: u32,
    pub starting_step: i32,
}

impl Default for Config {
    fn default() -> Self {
        Self { lives: 3, starting_step: 0 }
    }
}

impl Config {
    pub fn validate(&self) -> std::result::Result<(), &'static str> {
        if self.lives == 0 {
            return Err("lives must be positive");
        }
        if self.starting_step < 0 {
            return Err("starting_step must be non-negative");
        }
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct Lives {
    cfg: Config,
    trial: u32,
    lives_left: u32,
    step: i32,
    best: Option<i32>,
    ceiling: bool,
}

impl Lives {
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            trial: 0,
            lives_left: cfg.lives,
            step: cfg.starting_step,
            best: None,
            ceiling: false,
        }
    }

    pub fn lives_left(&self) -> u32 {
        self.lives_left
    }

    pub fn step(&self) -> i32 {
        self.step
    }

    /// Highest step answered correctly.
    pub fn best(&self) -> Option<i32> {
        self.best
    }

    pub fn reached_ceiling(&self) -> bool {
        self.ceiling
    }
}

impl Procedure for Lives {
    fn name(&self) -> &'static str {
        "lives"
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
        if !outcome.is_correct() {
            self.lives_left = self.lives_left.saturating_sub(1);
            debug!(trial = self.trial, lives_left = self.lives_left, "life lost");
            return;
        }

        self.best = Some(self.best.map_or(self.step, |b| b.max(self.step)));
        match ctx.controls.step_to(0, self.step + 1) {
            StepStatus::Success => self.step += 1,
            _ => {
                self.ceiling = true;
                info!(step = self.step, "top of the range cleared");
            }
        }
    }

    fn is_done(&self, _now: Instant) -> bool {
        self.lives_left == 0 || self.ceiling
    }

    fn final_output(&self, _source: usize) -> FinalOutput {
        FinalOutput::Step(self.best.unwrap_or(self.cfg.starting_step) as f64)
    }

    fn metadata(&self) -> TrialMetadata {
        TrialMetadata::new()
            .with("trial", self.trial)
            .with("step", self.step)
            .with("lives", self.lives_left)
    }
}
