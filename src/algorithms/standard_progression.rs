//! Level-by-level progression: pass a level with a run of correct answers,
//! fail the test with a run of wrong ones.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::algorithms::sdk::{Procedure, RunContext, Streaks, TrialMetadata, TrialOutcome};
use crate::control::{FinalOutput, StepStatus};
use crate::error::{Error, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub correct_to_advance: u32,
    pub wrong_to_fail: u32,
    pub starting_step: i32,
    /// Hard cap on trials; 0 disables it.
    pub max_trials: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self { correct_to_advance: 2, wrong_to_fail: 2, starting_step: 0, max_trials: 0 }
    }
}

impl Config {
    pub fn validate(&self) -> std::result::Result<(), &'static str> {
        if self.correct_to_advance == 0 || self.wrong_to_fail == 0 {
            return Err("streak thresholds must be positive");
        }
        if self.starting_step < 0 {
            return Err("starting_step must be non-negative");
        }
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct StandardProgression {
    cfg: Config,
    trial: u32,
    level: i32,
    streaks: Streaks,
    passed: Option<i32>,
    failed: bool,
    ceiling: bool,
}

impl StandardProgression {
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            trial: 0,
            level: cfg.starting_step,
            streaks: Streaks::default(),
            passed: None,
            failed: false,
            ceiling: false,
        }
    }

    pub fn level(&self) -> i32 {
        self.level
    }

    pub fn passed(&self) -> Option<i32> {
        self.passed
    }

    pub fn failed(&self) -> bool {
        self.failed
    }
}

impl Procedure for StandardProgression {
    fn name(&self) -> &'static str {
        "standard_progression"
    }

    fn source_count(&self) -> usize {
        1
    }

    fn start(&mut self, ctx: &mut RunContext<'_>) -> Result<()> {
        *self = Self::new(self.cfg);
        if !ctx.controls.step_to(0, self.level).is_success() {
            return Err(Error::InvalidConfig {
                algorithm: self.name(),
                reason: "starting step could not be applied to the bound parameters",
            });
        }
        Ok(())
    }

    fn submit(&mut self, outcome: TrialOutcome, ctx: &mut RunContext<'_>) {
        self.trial += 1;
        self.streaks.record(outcome.is_correct());

        if self.streaks.wrong >= self.cfg.wrong_to_fail {
            self.failed = true;
            info!(level = self.level, "level failed");
            return;
        }
        if self.streaks.correct < self.cfg.correct_to_advance {
            return;
        }

        self.passed = Some(self.level);
        self.streaks.reset();
        match ctx.controls.step_to(0, self.level + 1) {
            StepStatus::Success => {
                self.level += 1;
                debug!(trial = self.trial, level = self.level, "advanced");
            }
            _ => {
                self.ceiling = true;
                info!(level = self.level, "last level passed");
            }
        }
    }

    fn is_done(&self, _now: Instant) -> bool {
        self.failed
            || self.ceiling
            || (self.cfg.max_trials > 0 && self.trial >= self.cfg.max_trials)
    }

    fn final_output(&self, _source: usize) -> FinalOutput {
        let fallback = (self.cfg.starting_step - 1).max(0);
        FinalOutput::Step(self.passed.unwrap_or(fallback) as f64)
    }

    fn metadata(&self) -> TrialMetadata {
        TrialMetadata::new()
            .with("trial", self.trial)
            .with("level", self.level)
            .with("correct_streak", self.streaks.correct)
            .with("wrong_streak", self.streaks.wrong)
    }
}
