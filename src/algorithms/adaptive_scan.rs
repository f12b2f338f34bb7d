//! Adaptive scan: a progressive sweep that stops at the first level whose
//! block score falls below `criterion`. The threshold is interpolated
//! between the last passing level and the failing one.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::algorithms::sdk::{Procedure, RunContext, TrialMetadata, TrialOutcome};
use crate::control::{FinalOutput, OutputSink, StepStatus};
use crate::error::Result;
use crate::mechanics::score;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub steps: u32,
    pub tracks: u32,
    /// Guess-corrected block score needed to move on.
    pub criterion: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self { steps: 12, tracks: 4, criterion: 0.5 }
    }
}

impl Config {
    pub fn validate(&self) -> std::result::Result<(), &'static str> {
        if self.steps == 0 || self.tracks == 0 {
            return Err("steps and tracks must be positive");
        }
        if !self.criterion.is_finite() || self.criterion <= 0.0 || self.criterion > 1.0 {
            return Err("criterion must lie in (0, 1]");
        }
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct AdaptiveScan {
    cfg: Config,
    guess_rate: f64,
    trial: u32,
    level: u32,
    block_credit: f64,
    block_trials: u32,
    level_scores: Vec<f64>,
    stopped: bool,
}

impl AdaptiveScan {
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            guess_rate: 0.0,
            trial: 0,
            level: 0,
            block_credit: 0.0,
            block_trials: 0,
            level_scores: Vec::new(),
            stopped: false,
        }
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn trial(&self) -> u32 {
        self.trial
    }

    pub fn level_scores(&self) -> &[f64] {
        &self.level_scores
    }

    /// Fractional level where the block score crosses the criterion.
    pub fn threshold_step(&self) -> f64 {
        let scores = &self.level_scores;
        match scores.iter().position(|&s| s < self.cfg.criterion) {
            None => scores.len().saturating_sub(1) as f64,
            Some(0) => 0.0,
            Some(f) => score::crossing((f - 1) as f64, scores[f - 1], scores[f], self.cfg.criterion),
        }
    }

    fn close_block(&mut self, ctx: &mut RunContext<'_>) {
        let s = score::corrected_proportion(self.block_credit, self.block_trials as f64, self.guess_rate);
        self.level_scores.push(s);
        self.block_credit = 0.0;
        self.block_trials = 0;
        debug!(level = self.level, score = s, "block closed");

        if s < self.cfg.criterion || self.level + 1 >= self.cfg.steps {
            self.stopped = true;
            info!(level = self.level, "scan stopped");
            return;
        }
        match ctx.controls.step_to(0, self.level as i32 + 1) {
            StepStatus::Success => self.level += 1,
            status => {
                warn!(level = self.level, ?status, "scan hit the end of the parameter range");
                self.stopped = true;
            }
        }
    }
}

impl Procedure for AdaptiveScan {
    fn name(&self) -> &'static str {
        "adaptive_scan"
    }

    fn source_count(&self) -> usize {
        1
    }

    fn start(&mut self, ctx: &mut RunContext<'_>) -> Result<()> {
        *self = Self::new(self.cfg);
        self.guess_rate = ctx.guess_rate;
        let status = ctx.controls.step_to(0, 0);
        if !status.is_success() {
            warn!(?status, "first level could not be applied");
        }
        Ok(())
    }

    fn submit(&mut self, outcome: TrialOutcome, ctx: &mut RunContext<'_>) {
        self.trial += 1;
        self.block_credit += outcome.credit();
        self.block_trials += 1;
        if self.block_trials >= self.cfg.tracks {
            self.close_block(ctx);
        }
    }

    fn is_done(&self, _now: Instant) -> bool {
        self.stopped
    }

    fn final_output(&self, _source: usize) -> FinalOutput {
        FinalOutput::Step(self.threshold_step())
    }

    fn metadata(&self) -> TrialMetadata {
        TrialMetadata::new()
            .with("trial", self.trial)
            .with("level", self.level)
            .with("block_trial", self.block_trials)
    }

    fn extra_outputs(&self, sink: &mut dyn OutputSink) {
        for (k, &s) in self.level_scores.iter().enumerate() {
            sink.publish(&format!("level{k}"), s);
        }
    }
}
