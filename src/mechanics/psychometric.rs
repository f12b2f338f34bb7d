//! Psychometric functions for simulated observers (logistic, analytic inversion).

/// Probability correct for a stimulus at `x` with a logistic core:
/// `g + (1 - g - lapse) / (1 + exp(-slope * (x - threshold)))`.
///
/// `slope > 0` means larger `x` is easier.
#[inline]
pub fn logistic(x: f64, threshold: f64, slope: f64, guess_rate: f64, lapse: f64) -> f64 {
    let core = 1.0 / (1.0 + (-slope * (x - threshold)).exp());
    (guess_rate + (1.0 - guess_rate - lapse) * core).clamp(0.0, 1.0)
}

/// Invert [`logistic`] to the stimulus giving probability `p`.
#[inline]
pub fn logistic_inverse(p: f64, threshold: f64, slope: f64, guess_rate: f64, lapse: f64) -> f64 {
    let span = 1.0 - guess_rate - lapse;
    let core = ((p - guess_rate) / span).clamp(1e-9, 1.0 - 1e-9);
    threshold - (1.0 / core - 1.0).ln() / slope
}

/// Convergence point of an N-down/1-up staircase: p such that p^n = 0.5.
#[inline]
pub fn staircase_target(correct_to_step_down: u32) -> f64 {
    0.5f64.powf(1.0 / correct_to_step_down.max(1) as f64)
}
