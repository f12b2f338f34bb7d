//! Progressive difficulty: `tracks` trials per level, then the next level,
//! regardless of the answers. The score counts levels above chance.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::algorithms::sdk::{Procedure, RunContext, TrialMetadata, TrialOutcome};
use crate::control::{FinalOutput, OutputSink};
use crate::error::Result;
use crate::mechanics::score;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub steps: u32,
    pub tracks: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self { steps: 10, tracks: 4 }
    }
}

impl Config {
    pub fn validate(&self) -> std::result::Result<(), &'static str> {
        if self.steps == 0 || self.tracks == 0 {
            return Err("steps and tracks must be positive");
        }
        if self.total_trials().is_none() {
            return Err("steps times tracks overflows");
        }
        Ok(())
    }

    /// `tracks * steps`, or `None` on overflow.
    pub fn total_trials(&self) -> Option<u32> {
        self.tracks.checked_mul(self.steps)
    }
}

#[derive(Clone, Debug)]
pub struct Progressive {
    cfg: Config,
    guess_rate: f64,
    trial: u32,
    level: u32,
    correct: f64,
    level_credit: Vec<f64>,
}

impl Progressive {
    pub fn new(cfg: Config) -> Self {
        Self {
            guess_rate: 0.0,
            trial: 0,
            level: 0,
            correct: 0.0,
            level_credit: vec![0.0; cfg.steps as usize],
            cfg,
        }
    }

    pub fn trial(&self) -> u32 {
        self.trial
    }

    /// Run length; saturates for configs that failed validation.
    fn budget(&self) -> u32 {
        self.cfg.total_trials().unwrap_or(u32::MAX)
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn score(&self) -> f64 {
        score::corrected(self.correct, self.trial as f64, self.cfg.tracks as f64, self.guess_rate)
    }

    /// Guess-corrected proportion correct per level presented so far.
    pub fn level_scores(&self) -> Vec<f64> {
        let tracks = self.cfg.tracks as f64;
        let played = (self.trial as usize).div_ceil(self.cfg.tracks as usize);
        self.level_credit[..played.min(self.level_credit.len())]
            .iter()
            .map(|&c| score::corrected_proportion(c, tracks, self.guess_rate))
            .collect()
    }
}

impl Procedure for Progressive {
    fn name(&self) -> &'static str {
        "progressive"
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
        let credit = outcome.credit();
        self.trial += 1;
        self.correct += credit;
        if let Some(c) = self.level_credit.get_mut(self.level as usize) {
            *c += credit;
        }

        if self.trial < self.budget() && self.trial % self.cfg.tracks == 0 {
            self.level += 1;
            let status = ctx.controls.step_to(0, self.level as i32);
            if !status.is_success() {
                warn!(level = self.level, ?status, "level could not be applied");
            }
            debug!(trial = self.trial, level = self.level, "advanced level");
        }
    }

    fn is_done(&self, _now: Instant) -> bool {
        self.trial >= self.budget()
    }

    fn final_output(&self, _source: usize) -> FinalOutput {
        FinalOutput::Value(self.score())
    }

    fn metadata(&self) -> TrialMetadata {
        TrialMetadata::new()
            .with("trial", self.trial)
            .with("level", self.level)
    }

    fn extra_outputs(&self, sink: &mut dyn OutputSink) {
        for (k, s) in self.level_scores().into_iter().enumerate() {
            sink.publish(&format!("level{k}"), s);
        }
    }
}
