pub mod psychometric;
pub mod score;
pub mod stoch;
pub mod template;

pub use template::{StepTemplate, ValueKind};
