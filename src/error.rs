use thiserror::Error;

/// Errors raised by the engine.
///
/// Configuration problems surface at build or `initialize` time and are
/// fatal for the run. Out-of-bounds steps are never errors: they come back
/// as [`StepStatus::OutOfBounds`](crate::control::StepStatus) and each
/// procedure decides what they mean.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    #[error("invalid step template for `{name}`: {reason}")]
    InvalidTemplate { name: String, reason: &'static str },

    #[error("invalid {algorithm} config: {reason}")]
    InvalidConfig {
        algorithm: &'static str,
        reason: &'static str,
    },

    #[error("guess rate must be finite and in [0, 1): got {value}")]
    InvalidGuessRate { value: f64 },

    #[error("parameter `{name}` is bound to source {source_index}, but the procedure drives {sources} source(s)")]
    UnknownSource {
        name: String,
        source_index: usize,
        sources: usize,
    },

    #[error("session has not been initialized")]
    NotInitialized,

    #[error("run is complete; no further trials are accepted")]
    RunComplete,

    #[error("run is not complete; outputs are only available once it is done")]
    NotDone,
}

pub type Result<T> = std::result::Result<T, Error>;
