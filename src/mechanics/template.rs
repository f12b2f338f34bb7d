//! Step templates: map a step index onto a concrete parameter value.
//!
//! A template is pure. It extrapolates past its bounds on purpose; whether a
//! step is allowed is decided by the parameter that owns the template.

use serde::{Deserialize, Serialize};

/// Whether a template produces continuous or integer (ordinal) values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueKind {
    Continuous,
    Discrete,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum StepTemplate {
    /// `base * factor^(step / steps_per_factor)`.
    Exponential {
        base: f64,
        minimum: f64,
        maximum: f64,
        factor: f64,
        steps_per_factor: f64,
    },
    /// `base + step * step_size`.
    Linear {
        base: f64,
        minimum: f64,
        maximum: f64,
        step_size: f64,
    },
    /// Integer-valued `base + step * step_size`.
    Discrete {
        base: i64,
        minimum: i64,
        maximum: i64,
        step_size: i64,
    },
}

impl StepTemplate {
    /// Checks the configured bounds and growth.
    ///
    /// # Errors
    ///
    /// Returns a reason string when a field is non-finite, the growth is
    /// degenerate, or `minimum <= base <= maximum` does not hold.
    pub fn validate(&self) -> Result<(), &'static str> {
        match *self {
            StepTemplate::Exponential { base, minimum, maximum, factor, steps_per_factor } => {
                if ![base, minimum, maximum, factor, steps_per_factor]
                    .iter()
                    .all(|v| v.is_finite())
                {
                    return Err("all fields must be finite");
                }
                if base <= 0.0 {
                    return Err("exponential base must be positive");
                }
                if factor <= 0.0 || factor == 1.0 {
                    return Err("growth factor must be positive and not 1");
                }
                if steps_per_factor <= 0.0 {
                    return Err("steps_per_factor must be positive");
                }
                check_order(minimum, base, maximum)
            }
            StepTemplate::Linear { base, minimum, maximum, step_size } => {
                if ![base, minimum, maximum, step_size].iter().all(|v| v.is_finite()) {
                    return Err("all fields must be finite");
                }
                if step_size == 0.0 {
                    return Err("step_size must be nonzero");
                }
                check_order(minimum, base, maximum)
            }
            StepTemplate::Discrete { base, minimum, maximum, step_size } => {
                if step_size == 0 {
                    return Err("step_size must be nonzero");
                }
                check_order(minimum as f64, base as f64, maximum as f64)
            }
        }
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            StepTemplate::Discrete { .. } => ValueKind::Discrete,
            _ => ValueKind::Continuous,
        }
    }

    /// Value at an integer step. Not clamped.
    #[inline]
    pub fn value(&self, step: i32) -> f64 {
        self.value_at(step as f64)
    }

    /// Value at a fractional step, used when finalizing at a converged estimate.
    pub fn value_at(&self, step: f64) -> f64 {
        match *self {
            StepTemplate::Exponential { base, factor, steps_per_factor, .. } => {
                base * factor.powf(step / steps_per_factor)
            }
            StepTemplate::Linear { base, step_size, .. } => base + step * step_size,
            StepTemplate::Discrete { base, step_size, .. } => {
                base as f64 + step * step_size as f64
            }
        }
    }

    /// Fractional step at which the template would produce `value`.
    ///
    /// Reporting only: no round-trip guarantee beyond float tolerance.
    /// Non-positive values map to `-inf` for the exponential family.
    pub fn partial_step(&self, value: f64) -> f64 {
        match *self {
            StepTemplate::Exponential { base, factor, steps_per_factor, .. } => {
                if value <= 0.0 {
                    return f64::NEG_INFINITY;
                }
                steps_per_factor * (value / base).ln() / factor.ln()
            }
            StepTemplate::Linear { base, step_size, .. } => (value - base) / step_size,
            StepTemplate::Discrete { base, step_size, .. } => {
                (value - base as f64) / step_size as f64
            }
        }
    }

    pub fn bounds(&self) -> (f64, f64) {
        match *self {
            StepTemplate::Exponential { minimum, maximum, .. }
            | StepTemplate::Linear { minimum, maximum, .. } => (minimum, maximum),
            StepTemplate::Discrete { minimum, maximum, .. } => (minimum as f64, maximum as f64),
        }
    }

    #[inline]
    pub fn contains(&self, value: f64) -> bool {
        let (lo, hi) = self.bounds();
        value >= lo && value <= hi
    }

    /// True when larger steps produce larger values.
    pub fn is_increasing(&self) -> bool {
        match *self {
            StepTemplate::Exponential { factor, .. } => factor > 1.0,
            StepTemplate::Linear { step_size, .. } => step_size > 0.0,
            StepTemplate::Discrete { step_size, .. } => step_size > 0,
        }
    }

    /// Highest step index whose value is still within bounds.
    pub fn last_step(&self) -> i32 {
        let (lo, hi) = self.bounds();
        let edge = if self.is_increasing() { hi } else { lo };
        let s = self.partial_step(edge);
        if s.is_finite() {
            // Guard against float noise right at the edge.
            (s + 1e-9).floor().max(0.0) as i32
        } else {
            0
        }
    }
}

fn check_order(minimum: f64, base: f64, maximum: f64) -> Result<(), &'static str> {
    if minimum > maximum {
        return Err("minimum must not exceed maximum");
    }
    if base < minimum || base > maximum {
        return Err("base must lie within [minimum, maximum]");
    }
    Ok(())
}
