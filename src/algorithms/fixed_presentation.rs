//! A fixed number of presentations with no stepping at all.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::algorithms::sdk::{Procedure, RunContext, TrialMetadata, TrialOutcome};
use crate::control::FinalOutput;
use crate::error::Result;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub trials: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self { trials: 20 }
    }
}

impl Config {
    pub fn validate(&self) -> std::result::Result<(), &'static str> {
        if self.trials == 0 {
            return Err("trials must be positive");
        }
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct FixedPresentation {
    cfg: Config,
    trial: u32,
    correct: f64,
}

impl FixedPresentation {
    pub fn new(cfg: Config) -> Self {
        Self { cfg, trial: 0, correct: 0.0 }
    }

    pub fn trial(&self) -> u32 {
        self.trial
    }

    pub fn correct(&self) -> f64 {
        self.correct
    }
}

impl Procedure for FixedPresentation {
    fn name(&self) -> &'static str {
        "fixed_presentation"
    }

    fn source_count(&self) -> usize {
        0
    }

    fn start(&mut self, _ctx: &mut RunContext<'_>) -> Result<()> {
        *self = Self::new(self.cfg);
        Ok(())
    }

    fn submit(&mut self, outcome: TrialOutcome, _ctx: &mut RunContext<'_>) {
        self.trial += 1;
        self.correct += outcome.credit();
    }

    fn is_done(&self, _now: Instant) -> bool {
        self.trial >= self.cfg.trials
    }

    /// Every bound parameter rests at step 0.
    fn final_output(&self, _source: usize) -> FinalOutput {
        FinalOutput::Step(0.0)
    }

    fn metadata(&self) -> TrialMetadata {
        TrialMetadata::new()
            .with("trial", self.trial)
            .with("correct", self.correct)
    }
}
