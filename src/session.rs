//! # Session
//!
//! The external protocol: one procedure, its sealed control source, and a
//! clock. A driver calls [`Session::initialize`], then alternates reading the
//! presented values and calling [`Session::submit_trial_result`] until
//! [`Session::is_done`], then [`Session::populate_outputs`].

use tracing::{debug, info};

use crate::algorithms::{Algorithm, AlgorithmConfig, RunContext, TrialMetadata, TrialOutcome};
use crate::control::{ControlSource, OutputSink, ParamValue};
use crate::error::{Error, Result};
use crate::termination::{Clock, SystemClock};

#[derive(Debug)]
pub struct Session<C: Clock = SystemClock> {
    config: AlgorithmConfig,
    controls: ControlSource,
    clock: C,
    guess_rate: f64,
    algorithm: Option<Algorithm>,
}

impl Session<SystemClock> {
    pub fn new(config: AlgorithmConfig, controls: ControlSource) -> Self {
        Self::with_clock(config, controls, SystemClock)
    }
}

impl<C: Clock> Session<C> {
    pub fn with_clock(config: AlgorithmConfig, controls: ControlSource, clock: C) -> Self {
        Self { config, controls, clock, guess_rate: 0.0, algorithm: None }
    }

    /// Validates configuration, builds fresh state, presents the first
    /// stimulus and starts the task phase. Calling it again restarts the run.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an out-of-range guess rate, an
    /// invalid procedure config, a binding to a source the procedure does not
    /// drive, or a starting step outside a bound parameter's range.
    pub fn initialize(&mut self, guess_rate: f64) -> Result<()> {
        if !guess_rate.is_finite() || !(0.0..1.0).contains(&guess_rate) {
            return Err(Error::InvalidGuessRate { value: guess_rate });
        }
        self.config.validate()?;

        self.algorithm = None;
        self.controls.reset();
        let mut algorithm = Algorithm::from_config(&self.config);
        self.controls.check_sources(algorithm.source_count())?;

        let mut ctx = RunContext { controls: &mut self.controls, guess_rate };
        algorithm.start(&mut ctx)?;
        algorithm.arm(self.clock.now());

        info!(
            algorithm = algorithm.name(),
            guess_rate,
            params = self.controls.params().len(),
            "session initialized"
        );
        self.guess_rate = guess_rate;
        self.algorithm = Some(algorithm);
        Ok(())
    }

    /// Re-arms wall-clock termination at the start of a new task phase.
    pub fn begin_task(&mut self) -> Result<()> {
        let now = self.clock.now();
        let algorithm = self.algorithm.as_mut().ok_or(Error::NotInitialized)?;
        algorithm.arm(now);
        Ok(())
    }

    /// # Errors
    ///
    /// [`Error::NotInitialized`] before `initialize`, [`Error::RunComplete`]
    /// once the procedure reports done.
    pub fn submit_trial_result(&mut self, outcome: impl Into<TrialOutcome>) -> Result<()> {
        let now = self.clock.now();
        let algorithm = self.algorithm.as_mut().ok_or(Error::NotInitialized)?;
        if algorithm.is_done(now) {
            return Err(Error::RunComplete);
        }

        let outcome = outcome.into();
        let mut ctx = RunContext { controls: &mut self.controls, guess_rate: self.guess_rate };
        algorithm.submit(outcome, &mut ctx);
        debug!(?outcome, meta = ?algorithm.metadata().entries, "trial submitted");

        if algorithm.is_done(self.clock.now()) {
            info!(algorithm = algorithm.name(), meta = ?algorithm.metadata().entries, "run complete");
        }
        Ok(())
    }

    pub fn is_done(&self) -> bool {
        self.algorithm.as_ref().is_some_and(|a| a.is_done(self.clock.now()))
    }

    /// Finalizes every bound parameter and publishes its value under the
    /// parameter's name, followed by any per-level scores. Output depends only
    /// on the frozen state, so repeated calls publish identical values.
    ///
    /// # Errors
    ///
    /// [`Error::NotInitialized`] before `initialize`, [`Error::NotDone`] while
    /// the run is still accepting trials. Nothing is finalized in either case.
    pub fn populate_outputs(&mut self, sink: &mut impl OutputSink) -> Result<()> {
        let now = self.clock.now();
        let algorithm = self.algorithm.as_ref().ok_or(Error::NotInitialized)?;
        if !algorithm.is_done(now) {
            return Err(Error::NotDone);
        }

        let sources = algorithm.source_count();
        if sources == 0 {
            self.controls.finalize_all(algorithm.final_output(0));
        } else {
            for source in 0..sources {
                self.controls.finalize(source, algorithm.final_output(source));
            }
        }
        for p in self.controls.params() {
            sink.publish(p.name(), p.value().as_f64());
        }
        algorithm.extra_outputs(sink);

        info!(algorithm = algorithm.name(), "outputs populated");
        Ok(())
    }

    /// Key/value snapshot for the logging layer. Empty before `initialize`.
    pub fn trial_metadata(&self) -> TrialMetadata {
        self.algorithm.as_ref().map(Algorithm::metadata).unwrap_or_default()
    }

    pub fn algorithm(&self) -> Option<&Algorithm> {
        self.algorithm.as_ref()
    }

    pub fn controls(&self) -> &ControlSource {
        &self.controls
    }

    /// Current value of every bound parameter, by name.
    pub fn current_values(&self) -> Vec<(&str, ParamValue)> {
        self.controls.params().iter().map(|p| (p.name(), p.value())).collect()
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }
}
