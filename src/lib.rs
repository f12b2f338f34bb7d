/*!
`adaptive_psych` — an adaptive psychophysical testing engine.

What it does
- Decides, trial by trial, which stimulus step to present next, from the
  running history of correct/incorrect (or partially correct) responses.
- Drives externally owned parameter slots through step templates, applying
  multi-parameter steps atomically (validate-all, then commit-all).
- Reports when a run is complete and publishes converged values.

How to use (call surface only)
- Bind parameter slots to sources with `control::ControlSource::builder()`.
- Pick a procedure with `algorithms::AlgorithmConfig`.
- Build a `session::Session`, call `initialize(guess_rate)`, then loop:
  read the presented values, `submit_trial_result(outcome)`, until `is_done()`.
- Call `populate_outputs(&mut sink)`.
- Or hand the loop to `run_to_completion` with a responder closure.

What it does NOT do
- No audio, no UI, no persistence format. Those live around it.
*/

pub mod algorithms;
pub mod control;
pub mod error;
pub mod mechanics;
pub mod session;
pub mod termination;

pub use algorithms::{Algorithm, AlgorithmConfig, TrialMetadata, TrialOutcome};
pub use control::{
    ControlSource, ControlSourceBuilder, ControlledParameter, FinalOutput, OutputSink, ParamValue,
    Slot, StepStatus,
};
pub use error::{Error, Result};
pub use mechanics::{StepTemplate, ValueKind};
pub use session::Session;
pub use termination::{Clock, ManualClock, SystemClock, TerminationRule};

/// Closed loop: present → respond → submit, until the run completes or
/// `max_trials` responses have been collected.
///
/// `respond` sees the session (presented values, metadata) and returns the
/// subject's outcome. Returns the number of trials run.
///
/// # Errors
///
/// Propagates [`Error::NotInitialized`] if the session was not initialized.
pub fn run_to_completion<C, R>(session: &mut Session<C>, mut respond: R, max_trials: usize) -> Result<usize>
where
    C: Clock,
    R: FnMut(&Session<C>) -> TrialOutcome,
{
    if session.algorithm().is_none() {
        return Err(Error::NotInitialized);
    }
    let mut trials = 0;
    while trials < max_trials && !session.is_done() {
        let outcome = respond(session);
        session.submit_trial_result(outcome)?;
        trials += 1;
    }
    Ok(trials)
}
