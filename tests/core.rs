// tests/core.rs
use adaptive_psych::algorithms::simple_staircase::Config;
use adaptive_psych::mechanics::{psychometric, stoch};
use adaptive_psych::{
    Algorithm, AlgorithmConfig, ControlSource, ParamValue, Session, Slot, StepTemplate,
    TerminationRule, TrialOutcome, run_to_completion,
};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

/* ──────────────────────────────────────────────────────────────────────────
Simulated observer on a halving intensity scale
────────────────────────────────────────────────────────────────────────── */

/// Intensity halves every 4 steps, from 1 down to 1/1024 (step 40).
const INTENSITY: StepTemplate = StepTemplate::Exponential {
    base: 1.0,
    minimum: 1.0 / 1024.0,
    maximum: 1.0,
    factor: 0.5,
    steps_per_factor: 4.0,
};

/// Observer threshold and slope in log2 intensity units (threshold at step 16).
const THRESHOLD_LOG2: f64 = -4.0;
const SLOPE: f64 = 2.0;
const GUESS: f64 = 0.5;

fn observer_p(intensity: f64) -> f64 {
    psychometric::logistic(intensity.log2(), THRESHOLD_LOG2, SLOPE, GUESS, 0.0)
}

/// Step at which a 2-down/1-up track settles for this observer.
fn expected_step() -> f64 {
    let p = psychometric::staircase_target(2);
    let log2 = psychometric::logistic_inverse(p, THRESHOLD_LOG2, SLOPE, GUESS, 0.0);
    -4.0 * log2
}

fn intensity_session(termination: TerminationRule) -> (Slot, Session) {
    let slot = Rc::new(RefCell::new(ParamValue::Float(1.0)));
    let controls = ControlSource::builder()
        .bind_slot("intensity", 0, INTENSITY, Rc::clone(&slot))
        .unwrap()
        .build();
    let cfg = Config { correct_to_step_down: 2, wrong_to_step_up: 1, termination, ..Config::default() };
    (slot, Session::new(AlgorithmConfig::SimpleStaircase(cfg), controls))
}

fn run_observer(seed: u64) -> (f64, f64) {
    let (slot, mut s) = intensity_session(TerminationRule::Reversals(16));
    s.initialize(GUESS).unwrap();

    let mut rng = stoch::seeded(seed);
    let trials = run_to_completion(
        &mut s,
        |_| TrialOutcome::from(stoch::bernoulli(&mut rng, observer_p(slot.borrow().as_f64()))),
        5_000,
    )
    .unwrap();
    assert!(s.is_done(), "seed {seed}: not done after {trials} trials");

    let step = match s.algorithm() {
        Some(Algorithm::SimpleStaircase(st)) => st.threshold_step(),
        other => panic!("unexpected algorithm {:?}", other),
    };
    let mut out: BTreeMap<String, f64> = BTreeMap::new();
    s.populate_outputs(&mut out).unwrap();
    (step, out["intensity"])
}

#[test]
fn expected_step_is_sane() {
    let e = expected_step();
    assert!((16.0..18.0).contains(&e), "expected step {e}");
    assert!((observer_p(INTENSITY.value_at(e)) - 0.5f64.sqrt()).abs() < 1e-9);
}

#[test]
fn two_down_one_up_converges_near_seventy_one_percent() {
    let seeds = 0..20u64;
    let steps: Vec<f64> = seeds
        .map(|seed| {
            let (step, value) = run_observer(seed);
            assert!(
                (1.0 / 1024.0..=1.0).contains(&value),
                "seed {seed}: finalized intensity {value} out of range"
            );
            step
        })
        .collect();

    let mean = steps.iter().sum::<f64>() / steps.len() as f64;
    let target = expected_step();
    assert!(
        (mean - target).abs() < 4.0,
        "mean threshold step {mean:.2} too far from {target:.2}: {steps:?}"
    );
    for (seed, &step) in steps.iter().enumerate() {
        assert!((step - target).abs() < 10.0, "seed {seed}: outlier step {step:.2}");
    }
}

#[test]
fn same_seed_same_track() {
    assert_eq!(run_observer(11), run_observer(11));
}

#[test]
fn reversals_never_decrease() {
    let (slot, mut s) = intensity_session(TerminationRule::Trials(200));
    s.initialize(GUESS).unwrap();

    let mut rng = stoch::seeded(3);
    let mut last = 0;
    while !s.is_done() {
        let correct = stoch::bernoulli(&mut rng, observer_p(slot.borrow().as_f64()));
        s.submit_trial_result(correct).unwrap();
        let reversals = s.trial_metadata().get_int("reversals").unwrap();
        assert!(reversals >= last);
        last = reversals;

        let v = slot.borrow().as_f64();
        assert!((1.0 / 1024.0..=1.0).contains(&v), "presented {v} outside the template range");
    }
    assert!(last > 0);
}
