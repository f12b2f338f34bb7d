//! Method of constant stimuli over a grid of up to four dimensions.
//!
//! Every grid cell (times `tracks`) goes into a bag that is shuffled and
//! drained one draw per trial. The bag is refilled only once it is empty, so
//! each cell appears exactly `tracks` times per repetition, in random order.

use std::time::Instant;

use bevy_prng::WyRand;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::algorithms::sdk::{Procedure, RunContext, TrialMetadata, TrialOutcome};
use crate::control::{FinalOutput, OutputSink};
use crate::error::Result;
use crate::mechanics::{score, stoch};

pub const MAX_DIMENSIONS: usize = 4;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Step count per dimension; one entry per dimension.
    pub steps: Vec<u32>,
    pub tracks: u32,
    pub repetitions: u32,
    pub seed: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self { steps: vec![5], tracks: 1, repetitions: 4, seed: 0x5EED }
    }
}

impl Config {
    pub fn validate(&self) -> std::result::Result<(), &'static str> {
        if self.steps.is_empty() || self.steps.len() > MAX_DIMENSIONS {
            return Err("between one and four dimensions are supported");
        }
        if self.steps.iter().any(|&s| s == 0) {
            return Err("every dimension needs at least one step");
        }
        if self.tracks == 0 || self.repetitions == 0 {
            return Err("tracks and repetitions must be positive");
        }
        if self.total_trials().is_none() {
            return Err("grid size times tracks times repetitions overflows");
        }
        Ok(())
    }

    pub fn cells(&self) -> usize {
        self.steps.iter().map(|&s| s as usize).product()
    }

    /// Presentations of one step of `dim` over the whole run.
    pub fn orthogonal_count(&self, dim: usize) -> f64 {
        let others: u64 = self
            .steps
            .iter()
            .enumerate()
            .filter(|&(d, _)| d != dim)
            .map(|(_, &s)| s as u64)
            .product();
        (others * self.tracks as u64 * self.repetitions as u64) as f64
    }

    /// Trials in the whole run, or `None` if the count does not fit a `u32`.
    pub fn total_trials(&self) -> Option<u32> {
        self.steps
            .iter()
            .try_fold(1u32, |acc, &s| acc.checked_mul(s))?
            .checked_mul(self.tracks)?
            .checked_mul(self.repetitions)
    }
}

/// Credit and count for one step of one dimension.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Tally {
    pub credit: f64,
    pub presentations: u32,
}

#[derive(Clone, Debug)]
pub struct ConstantStimulus {
    cfg: Config,
    rng: WyRand,
    guess_rate: f64,
    bag: Vec<usize>,
    current: Vec<i32>,
    trial: u32,
    completed_repetitions: u32,
    correct: f64,
    tallies: Vec<Vec<Tally>>,
}

impl ConstantStimulus {
    pub fn new(cfg: Config) -> Self {
        let tallies = cfg.steps.iter().map(|&s| vec![Tally::default(); s as usize]).collect();
        Self {
            rng: stoch::seeded(cfg.seed),
            guess_rate: 0.0,
            bag: Vec::new(),
            current: vec![0; cfg.steps.len()],
            trial: 0,
            completed_repetitions: 0,
            correct: 0.0,
            tallies,
            cfg,
        }
    }

    pub fn trial(&self) -> u32 {
        self.trial
    }

    pub fn completed_repetitions(&self) -> u32 {
        self.completed_repetitions
    }

    /// Step per dimension for the stimulus currently presented.
    pub fn current(&self) -> &[i32] {
        &self.current
    }

    /// Draws left in the current repetition, excluding the one on screen.
    pub fn remaining_in_bag(&self) -> usize {
        self.bag.len()
    }

    pub fn tallies(&self, dim: usize) -> &[Tally] {
        &self.tallies[dim]
    }

    /// Guess-corrected proportion correct for each step of `dim`.
    pub fn step_scores(&self, dim: usize) -> Vec<f64> {
        self.tallies[dim]
            .iter()
            .map(|t| score::corrected_proportion(t.credit, t.presentations as f64, self.guess_rate))
            .collect()
    }

    pub fn dimension_score(&self, dim: usize) -> f64 {
        score::corrected(
            self.correct,
            self.trial as f64,
            self.cfg.orthogonal_count(dim),
            self.guess_rate,
        )
    }

    fn refill(&mut self) {
        let cells = self.cfg.cells();
        self.bag.clear();
        for _ in 0..self.cfg.tracks {
            self.bag.extend(0..cells);
        }
        stoch::shuffle(&mut self.rng, &mut self.bag);
    }

    /// Mixed-radix decode, first dimension fastest.
    fn decode(&self, mut cell: usize) -> Vec<i32> {
        self.cfg
            .steps
            .iter()
            .map(|&s| {
                let c = cell % s as usize;
                cell /= s as usize;
                c as i32
            })
            .collect()
    }

    fn present_next(&mut self, ctx: &mut RunContext<'_>) {
        let Some(cell) = self.bag.pop() else {
            return;
        };
        self.current = self.decode(cell);
        for (dim, &step) in self.current.iter().enumerate() {
            let status = ctx.controls.step_to(dim, step);
            if !status.is_success() {
                warn!(dim, step, ?status, "grid step could not be applied");
            }
        }
    }
}

impl Procedure for ConstantStimulus {
    fn name(&self) -> &'static str {
        "constant_stimulus"
    }

    fn source_count(&self) -> usize {
        self.cfg.steps.len()
    }

    fn start(&mut self, ctx: &mut RunContext<'_>) -> Result<()> {
        *self = Self::new(self.cfg.clone());
        self.guess_rate = ctx.guess_rate;
        self.refill();
        self.present_next(ctx);
        Ok(())
    }

    fn submit(&mut self, outcome: TrialOutcome, ctx: &mut RunContext<'_>) {
        let credit = outcome.credit();
        self.trial += 1;
        self.correct += credit;
        for (dim, &step) in self.current.iter().enumerate() {
            let t = &mut self.tallies[dim][step as usize];
            t.credit += credit;
            t.presentations += 1;
        }

        if self.bag.is_empty() {
            self.completed_repetitions += 1;
            debug!(trial = self.trial, repetition = self.completed_repetitions, "repetition complete");
            if self.completed_repetitions >= self.cfg.repetitions {
                return;
            }
            self.refill();
        }
        self.present_next(ctx);
    }

    fn is_done(&self, _now: Instant) -> bool {
        self.completed_repetitions >= self.cfg.repetitions
    }

    fn final_output(&self, source: usize) -> FinalOutput {
        FinalOutput::Value(self.dimension_score(source))
    }

    fn metadata(&self) -> TrialMetadata {
        let mut m = TrialMetadata::new()
            .with("trial", self.trial)
            .with("repetition", self.completed_repetitions);
        for (dim, &step) in self.current.iter().enumerate() {
            m = m.with(&format!("dim{dim}"), step);
        }
        m
    }

    fn extra_outputs(&self, sink: &mut dyn OutputSink) {
        for dim in 0..self.cfg.steps.len() {
            for (k, s) in self.step_scores(dim).into_iter().enumerate() {
                sink.publish(&format!("dim{dim}.step{k}"), s);
            }
        }
    }
}
