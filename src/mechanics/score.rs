//! Scoring mechanics: guess-rate correction and threshold averaging.

/// Guess-corrected score: (correct - trials*g) / (per_level * (1 - g)).
///
/// With `per_level` equal to the number of presentations of one level, the
/// result estimates how many levels were above chance. Non-finite results
/// (zero denominator) fall back to 0.
#[inline]
pub fn corrected(correct: f64, trials: f64, per_level: f64, guess_rate: f64) -> f64 {
    let s = (correct - trials * guess_rate) / (per_level * (1.0 - guess_rate));
    if s.is_finite() { s } else { 0.0 }
}

/// Guess-corrected proportion correct for a single cell.
#[inline]
pub fn corrected_proportion(correct: f64, trials: f64, guess_rate: f64) -> f64 {
    corrected(correct, trials, trials, guess_rate)
}

/// Arithmetic mean, or `fallback` for an empty slice.
#[inline]
pub fn mean_or(values: &[f64], fallback: f64) -> f64 {
    if values.is_empty() {
        return fallback;
    }
    let m = values.iter().sum::<f64>() / values.len() as f64;
    if m.is_finite() { m } else { fallback }
}

/// Fractional position where a falling score crosses `criterion` between
/// two adjacent levels `lo` (passing) and `lo + 1` (failing).
#[inline]
pub fn crossing(lo: f64, score_lo: f64, score_hi: f64, criterion: f64) -> f64 {
    let span = score_lo - score_hi;
    if span <= 0.0 || !span.is_finite() {
        return lo;
    }
    lo + ((score_lo - criterion) / span).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn corrected_removes_chance() {
        // 2AFC at chance: half right, score ~0.
        assert_relative_eq!(corrected_proportion(5.0, 10.0, 0.5), 0.0);
        assert_relative_eq!(corrected_proportion(10.0, 10.0, 0.5), 1.0);
        // Four levels, five trials each, perfect on three levels and chance on one.
        assert_relative_eq!(corrected(15.0 + 2.5, 20.0, 5.0, 0.5), 3.0);
    }

    #[test]
    fn degenerate_inputs_fall_back() {
        assert_eq!(corrected(1.0, 1.0, 0.0, 0.0), 0.0);
        assert_eq!(mean_or(&[], 7.0), 7.0);
        assert_relative_eq!(mean_or(&[1.0, 2.0, 6.0], 0.0), 3.0);
    }

    #[test]
    fn crossing_interpolates() {
        assert_relative_eq!(crossing(2.0, 0.9, 0.3, 0.5), 2.0 + 0.4 / 0.6);
        assert_relative_eq!(crossing(2.0, 0.4, 0.3, 0.5), 2.0);
    }
}
