// src/algorithms/mod.rs

// Adaptive procedures. Each variant carries its own state record; dispatch is
// a `match` over the closed set below. Non-staircase procedures are
// feature-gated so embedders compile only what they run.

pub mod sdk;
pub mod simple_staircase;
#[cfg(feature = "algorithm-constant_stimulus")]    pub mod constant_stimulus;
#[cfg(feature = "algorithm-progressive")]          pub mod progressive;
#[cfg(feature = "algorithm-fixed_presentation")]   pub mod fixed_presentation;
#[cfg(feature = "algorithm-adaptive_scan")]        pub mod adaptive_scan;
#[cfg(feature = "algorithm-fixed_trials")]         pub mod fixed_trials;
#[cfg(feature = "algorithm-lives")]                pub mod lives;
#[cfg(feature = "algorithm-standard_progression")] pub mod standard_progression;

use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::control::{FinalOutput, OutputSink};
use crate::error::{Error, Result};

pub use sdk::{MetaValue, Procedure, RunContext, TrialMetadata, TrialOutcome};

/// Typed configuration for one procedure, as handed over by the
/// configuration layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AlgorithmConfig {
    SimpleStaircase(simple_staircase::Config),
    #[cfg(feature = "algorithm-constant_stimulus")]
    ConstantStimulus(constant_stimulus::Config),
    #[cfg(feature = "algorithm-progressive")]
    Progressive(progressive::Config),
    #[cfg(feature = "algorithm-fixed_presentation")]
    FixedPresentation(fixed_presentation::Config),
    #[cfg(feature = "algorithm-adaptive_scan")]
    AdaptiveScan(adaptive_scan::Config),
    #[cfg(feature = "algorithm-fixed_trials")]
    FixedTrials(fixed_trials::Config),
    #[cfg(feature = "algorithm-lives")]
    Lives(lives::Config),
    #[cfg(feature = "algorithm-standard_progression")]
    StandardProgression(standard_progression::Config),
}

impl AlgorithmConfig {
    pub fn name(&self) -> &'static str {
        match self {
            AlgorithmConfig::SimpleStaircase(_) => "simple_staircase",
            #[cfg(feature = "algorithm-constant_stimulus")]
            AlgorithmConfig::ConstantStimulus(_) => "constant_stimulus",
            #[cfg(feature = "algorithm-progressive")]
            AlgorithmConfig::Progressive(_) => "progressive",
            #[cfg(feature = "algorithm-fixed_presentation")]
            AlgorithmConfig::FixedPresentation(_) => "fixed_presentation",
            #[cfg(feature = "algorithm-adaptive_scan")]
            AlgorithmConfig::AdaptiveScan(_) => "adaptive_scan",
            #[cfg(feature = "algorithm-fixed_trials")]
            AlgorithmConfig::FixedTrials(_) => "fixed_trials",
            #[cfg(feature = "algorithm-lives")]
            AlgorithmConfig::Lives(_) => "lives",
            #[cfg(feature = "algorithm-standard_progression")]
            AlgorithmConfig::StandardProgression(_) => "standard_progression",
        }
    }

    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] naming the procedure and the reason.
    pub fn validate(&self) -> Result<()> {
        let checked = match self {
            AlgorithmConfig::SimpleStaircase(c) => c.validate(),
            #[cfg(feature = "algorithm-constant_stimulus")]
            AlgorithmConfig::ConstantStimulus(c) => c.validate(),
            #[cfg(feature = "algorithm-progressive")]
            AlgorithmConfig::Progressive(c) => c.validate(),
            #[cfg(feature = "algorithm-fixed_presentation")]
            AlgorithmConfig::FixedPresentation(c) => c.validate(),
            #[cfg(feature = "algorithm-adaptive_scan")]
            AlgorithmConfig::AdaptiveScan(c) => c.validate(),
            #[cfg(feature = "algorithm-fixed_trials")]
            AlgorithmConfig::FixedTrials(c) => c.validate(),
            #[cfg(feature = "algorithm-lives")]
            AlgorithmConfig::Lives(c) => c.validate(),
            #[cfg(feature = "algorithm-standard_progression")]
            AlgorithmConfig::StandardProgression(c) => c.validate(),
        };
        checked.map_err(|reason| Error::InvalidConfig { algorithm: self.name(), reason })
    }
}

/// Closed set of procedures, each with its own state.
#[derive(Clone, Debug)]
pub enum Algorithm {
    SimpleStaircase(simple_staircase::SimpleStaircase),
    #[cfg(feature = "algorithm-constant_stimulus")]
    ConstantStimulus(constant_stimulus::ConstantStimulus),
    #[cfg(feature = "algorithm-progressive")]
    Progressive(progressive::Progressive),
    #[cfg(feature = "algorithm-fixed_presentation")]
    FixedPresentation(fixed_presentation::FixedPresentation),
    #[cfg(feature = "algorithm-adaptive_scan")]
    AdaptiveScan(adaptive_scan::AdaptiveScan),
    #[cfg(feature = "algorithm-fixed_trials")]
    FixedTrials(fixed_trials::FixedTrials),
    #[cfg(feature = "algorithm-lives")]
    Lives(lives::Lives),
    #[cfg(feature = "algorithm-standard_progression")]
    StandardProgression(standard_progression::StandardProgression),
}

/// Runs `$body` with `$p` bound to the inner state of whichever variant.
macro_rules! dispatch {
    ($alg:expr, $p:ident => $body:expr) => {
        match $alg {
            Algorithm::SimpleStaircase($p) => $body,
            #[cfg(feature = "algorithm-constant_stimulus")]
            Algorithm::ConstantStimulus($p) => $body,
            #[cfg(feature = "algorithm-progressive")]
            Algorithm::Progressive($p) => $body,
            #[cfg(feature = "algorithm-fixed_presentation")]
            Algorithm::FixedPresentation($p) => $body,
            #[cfg(feature = "algorithm-adaptive_scan")]
            Algorithm::AdaptiveScan($p) => $body,
            #[cfg(feature = "algorithm-fixed_trials")]
            Algorithm::FixedTrials($p) => $body,
            #[cfg(feature = "algorithm-lives")]
            Algorithm::Lives($p) => $body,
            #[cfg(feature = "algorithm-standard_progression")]
            Algorithm::StandardProgression($p) => $body,
        }
    };
}

impl Algorithm {
    /// Fresh, unstarted state for `cfg`. Does not validate.
    pub fn from_config(cfg: &AlgorithmConfig) -> Self {
        match cfg {
            AlgorithmConfig::SimpleStaircase(c) => {
                Algorithm::SimpleStaircase(simple_staircase::SimpleStaircase::new(*c))
            }
            #[cfg(feature = "algorithm-constant_stimulus")]
            AlgorithmConfig::ConstantStimulus(c) => {
                Algorithm::ConstantStimulus(constant_stimulus::ConstantStimulus::new(c.clone()))
            }
            #[cfg(feature = "algorithm-progressive")]
            AlgorithmConfig::Progressive(c) => Algorithm::Progressive(progressive::Progressive::new(*c)),
            #[cfg(feature = "algorithm-fixed_presentation")]
            AlgorithmConfig::FixedPresentation(c) => {
                Algorithm::FixedPresentation(fixed_presentation::FixedPresentation::new(*c))
            }
            #[cfg(feature = "algorithm-adaptive_scan")]
            AlgorithmConfig::AdaptiveScan(c) => Algorithm::AdaptiveScan(adaptive_scan::AdaptiveScan::new(*c)),
            #[cfg(feature = "algorithm-fixed_trials")]
            AlgorithmConfig::FixedTrials(c) => Algorithm::FixedTrials(fixed_trials::FixedTrials::new(*c)),
            #[cfg(feature = "algorithm-lives")]
            AlgorithmConfig::Lives(c) => Algorithm::Lives(lives::Lives::new(*c)),
            #[cfg(feature = "algorithm-standard_progression")]
            AlgorithmConfig::StandardProgression(c) => {
                Algorithm::StandardProgression(standard_progression::StandardProgression::new(*c))
            }
        }
    }

    pub fn name(&self) -> &'static str {
        dispatch!(self, p => p.name())
    }

    pub fn source_count(&self) -> usize {
        dispatch!(self, p => p.source_count())
    }

    pub fn start(&mut self, ctx: &mut RunContext<'_>) -> Result<()> {
        dispatch!(self, p => p.start(ctx))
    }

    pub fn submit(&mut self, outcome: TrialOutcome, ctx: &mut RunContext<'_>) {
        dispatch!(self, p => p.submit(outcome, ctx))
    }

    pub fn arm(&mut self, now: Instant) {
        dispatch!(self, p => p.arm(now))
    }

    pub fn is_done(&self, now: Instant) -> bool {
        dispatch!(self, p => p.is_done(now))
    }

    pub fn final_output(&self, source: usize) -> FinalOutput {
        dispatch!(self, p => p.final_output(source))
    }

    pub fn metadata(&self) -> TrialMetadata {
        dispatch!(self, p => p.metadata())
    }

    pub fn extra_outputs(&self, sink: &mut dyn OutputSink) {
        dispatch!(self, p => p.extra_outputs(sink))
    }
}
