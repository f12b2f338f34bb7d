// tests/progression.rs
#![cfg(all(
    feature = "algorithm-fixed_trials",
    feature = "algorithm-lives",
    feature = "algorithm-standard_progression"
))]

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use adaptive_psych::algorithms::{fixed_trials, lives, standard_progression};
use adaptive_psych::{
    Algorithm, AlgorithmConfig, ControlSource, Error, ParamValue, Session, Slot, StepTemplate,
};
use approx::assert_relative_eq;

fn bound(max_step: u32) -> (Slot, ControlSource) {
    let slot = Rc::new(RefCell::new(ParamValue::Float(0.0)));
    let controls = ControlSource::builder()
        .bind_slot(
            "level",
            0,
            StepTemplate::Linear { base: 0.0, minimum: 0.0, maximum: max_step as f64, step_size: 1.0 },
            Rc::clone(&slot),
        )
        .unwrap()
        .build();
    (slot, controls)
}

fn play(s: &mut Session, answers: &[bool]) {
    for &a in answers {
        s.submit_trial_result(a).unwrap();
    }
}

fn output(s: &mut Session) -> f64 {
    let mut out: BTreeMap<String, f64> = BTreeMap::new();
    s.populate_outputs(&mut out).unwrap();
    out["level"]
}

/* ──────────────────────────────────────────────────────────────────────────
Fixed trials
────────────────────────────────────────────────────────────────────────── */

#[test]
fn fixed_trials_averages_the_second_half() {
    let (slot, controls) = bound(10);
    let cfg = fixed_trials::Config { trials: 6, starting_step: 2, ..Default::default() };
    let mut s = Session::new(AlgorithmConfig::FixedTrials(cfg), controls);
    s.initialize(0.5).unwrap();
    assert_eq!(*slot.borrow(), ParamValue::Float(2.0));

    play(&mut s, &[true, true, false, true, false]);
    assert!(!s.is_done());
    play(&mut s, &[false]);
    assert!(s.is_done());
    assert_eq!(s.submit_trial_result(true), Err(Error::RunComplete));

    match s.algorithm() {
        Some(Algorithm::FixedTrials(ft)) => assert_eq!(ft.presented(), &[2, 3, 4, 3, 4, 3]),
        other => panic!("unexpected algorithm {:?}", other),
    }
    assert_relative_eq!(output(&mut s), 10.0 / 3.0);
}

#[test]
fn fixed_trials_holds_at_the_floor() {
    let (slot, controls) = bound(10);
    let cfg = fixed_trials::Config { trials: 4, ..Default::default() };
    let mut s = Session::new(AlgorithmConfig::FixedTrials(cfg), controls);
    s.initialize(0.5).unwrap();

    play(&mut s, &[false, false, false]);
    assert_eq!(*slot.borrow(), ParamValue::Float(0.0));
    assert_eq!(s.trial_metadata().get_int("step"), Some(0));
}

/* ──────────────────────────────────────────────────────────────────────────
Lives
────────────────────────────────────────────────────────────────────────── */

#[test]
fn lives_stop_at_the_ceiling() {
    let (slot, controls) = bound(3);
    let cfg = lives::Config { lives: 2, starting_step: 0 };
    let mut s = Session::new(AlgorithmConfig::Lives(cfg), controls);
    s.initialize(0.0).unwrap();

    play(&mut s, &[true, false, true, true]);
    assert!(!s.is_done());
    assert_eq!(*slot.borrow(), ParamValue::Float(3.0));
    assert_eq!(s.trial_metadata().get_int("lives"), Some(1));

    play(&mut s, &[true]);
    assert!(s.is_done());
    match s.algorithm() {
        Some(Algorithm::Lives(l)) => {
            assert!(l.reached_ceiling());
            assert_eq!(l.best(), Some(3));
        }
        other => panic!("unexpected algorithm {:?}", other),
    }
    assert_relative_eq!(output(&mut s), 3.0);
}

#[test]
fn lives_exhausted_without_a_correct_answer() {
    let (_slot, controls) = bound(3);
    let cfg = lives::Config { lives: 2, starting_step: 0 };
    let mut s = Session::new(AlgorithmConfig::Lives(cfg), controls);
    s.initialize(0.0).unwrap();

    play(&mut s, &[false, false]);
    assert!(s.is_done());
    assert_relative_eq!(output(&mut s), 0.0);
}

/* ──────────────────────────────────────────────────────────────────────────
Standard progression
────────────────────────────────────────────────────────────────────────── */

#[test]
fn progression_reports_last_level_passed() {
    let (slot, controls) = bound(10);
    let cfg = standard_progression::Config::default();
    let mut s = Session::new(AlgorithmConfig::StandardProgression(cfg), controls);
    s.initialize(0.5).unwrap();

    play(&mut s, &[true, true]);
    assert_eq!(*slot.borrow(), ParamValue::Float(1.0));

    // A wrong answer breaks the streak but does not fail the level.
    play(&mut s, &[true, false, true, true]);
    assert_eq!(*slot.borrow(), ParamValue::Float(2.0));
    assert!(!s.is_done());

    play(&mut s, &[false, false]);
    assert!(s.is_done());
    assert_eq!(s.trial_metadata().get_int("trial"), Some(8));
    match s.algorithm() {
        Some(Algorithm::StandardProgression(p)) => {
            assert!(p.failed());
            assert_eq!(p.passed(), Some(1));
        }
        other => panic!("unexpected algorithm {:?}", other),
    }
    assert_relative_eq!(output(&mut s), 1.0);
}

#[test]
fn progression_failing_the_start_falls_back_below_it() {
    let (_slot, controls) = bound(10);
    let cfg = standard_progression::Config { starting_step: 3, ..Default::default() };
    let mut s = Session::new(AlgorithmConfig::StandardProgression(cfg), controls);
    s.initialize(0.5).unwrap();

    play(&mut s, &[false, false]);
    assert!(s.is_done());
    assert_relative_eq!(output(&mut s), 2.0);
}

#[test]
fn progression_trial_cap() {
    let (_slot, controls) = bound(10);
    let cfg = standard_progression::Config { max_trials: 5, ..Default::default() };
    let mut s = Session::new(AlgorithmConfig::StandardProgression(cfg), controls);
    s.initialize(0.5).unwrap();

    play(&mut s, &[true, false, true, false, true]);
    assert!(s.is_done());
    assert_eq!(s.submit_trial_result(true), Err(Error::RunComplete));
}
