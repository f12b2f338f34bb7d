// tests/simple_staircase.rs
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use adaptive_psych::algorithms::simple_staircase::{Config, SimpleStaircase};
use adaptive_psych::algorithms::sdk::Streaks;
use adaptive_psych::{
    Algorithm, AlgorithmConfig, ControlSource, Error, ManualClock, ParamValue, Session, Slot,
    StepStatus, StepTemplate, TerminationRule, TrialOutcome,
};

fn linear(max: f64) -> StepTemplate {
    StepTemplate::Linear { base: 0.0, minimum: 0.0, maximum: max, step_size: 1.0 }
}

fn bound(template: StepTemplate) -> (Slot, ControlSource) {
    let slot = Rc::new(RefCell::new(ParamValue::Float(0.0)));
    let controls = ControlSource::builder()
        .bind_slot("level", 0, template, Rc::clone(&slot))
        .expect("valid template")
        .build();
    (slot, controls)
}

fn staircase<C: adaptive_psych::Clock>(s: &Session<C>) -> &SimpleStaircase {
    match s.algorithm() {
        Some(Algorithm::SimpleStaircase(st)) => st,
        other => panic!("expected a staircase, got {:?}", other),
    }
}

#[test]
fn three_correct_trigger_exactly_one_step_down() {
    let (slot, controls) = bound(linear(20.0));
    let cfg = Config {
        correct_to_step_down: 3,
        wrong_to_step_up: 2,
        steps_up: 2,
        steps_down: 1,
        starting_step: 5,
        termination: TerminationRule::Trials(100),
    };
    let mut s = Session::new(AlgorithmConfig::SimpleStaircase(cfg), controls);
    s.initialize(0.5).expect("valid config");
    assert_eq!(*slot.borrow(), ParamValue::Float(5.0));

    s.submit_trial_result(TrialOutcome::Correct).unwrap();
    s.submit_trial_result(TrialOutcome::Correct).unwrap();
    assert!(staircase(&s).moves().is_empty());
    assert_eq!(staircase(&s).streaks(), Streaks { correct: 2, wrong: 0 });

    s.submit_trial_result(TrialOutcome::Correct).unwrap();
    let st = staircase(&s);
    assert_eq!(st.moves().len(), 1);
    assert_eq!(st.moves()[0].diff, 1);
    assert_eq!(st.moves()[0].status, StepStatus::Success);
    assert_eq!(st.step(), 6);
    assert_eq!(st.streaks(), Streaks::default());
    assert_eq!(st.reversal_count(), 0);
    assert_eq!(*slot.borrow(), ParamValue::Float(6.0));
}

#[test]
fn two_wrong_step_up_and_reverse() {
    let (slot, controls) = bound(linear(20.0));
    let cfg = Config {
        correct_to_step_down: 1,
        wrong_to_step_up: 2,
        steps_up: 2,
        steps_down: 1,
        starting_step: 5,
        termination: TerminationRule::Trials(100),
    };
    let mut s = Session::new(AlgorithmConfig::SimpleStaircase(cfg), controls);
    s.initialize(0.0).unwrap();

    s.submit_trial_result(true).unwrap(); // 5 -> 6
    s.submit_trial_result(false).unwrap();
    assert_eq!(staircase(&s).step(), 6);
    s.submit_trial_result(false).unwrap(); // reversal at 6, 6 -> 4

    let st = staircase(&s);
    assert_eq!(st.step(), 4);
    assert_eq!(st.reversal_steps(), &[6.0]);
    assert_eq!(*slot.borrow(), ParamValue::Float(4.0));
}

#[test]
fn bound_rejection_keeps_value_and_counts_reversal() {
    let (slot, controls) = bound(linear(10.0));
    let cfg = Config {
        correct_to_step_down: 1,
        wrong_to_step_up: 1,
        steps_up: 1,
        steps_down: 1,
        starting_step: 0,
        termination: TerminationRule::Reversals(10),
    };
    let mut s = Session::new(AlgorithmConfig::SimpleStaircase(cfg), controls);
    s.initialize(0.0).unwrap();

    s.submit_trial_result(TrialOutcome::Incorrect).unwrap();
    let st = staircase(&s);
    assert_eq!(st.step(), 0);
    assert_eq!(st.reversal_count(), 1);
    assert_eq!(st.moves()[0].status, StepStatus::OutOfBounds);
    assert_eq!(*slot.borrow(), ParamValue::Float(0.0));

    s.submit_trial_result(TrialOutcome::Incorrect).unwrap();
    assert_eq!(staircase(&s).reversal_count(), 2);
    assert_eq!(*slot.borrow(), ParamValue::Float(0.0));
}

#[test]
fn direction_flip_into_a_wall_records_two_reversals() {
    // Single admissible step: every move hits a bound.
    let (_slot, controls) = bound(linear(0.0));
    let cfg = Config {
        correct_to_step_down: 1,
        wrong_to_step_up: 1,
        steps_up: 1,
        steps_down: 1,
        starting_step: 0,
        termination: TerminationRule::Trials(10),
    };
    let mut s = Session::new(AlgorithmConfig::SimpleStaircase(cfg), controls);
    s.initialize(0.0).unwrap();

    s.submit_trial_result(TrialOutcome::Correct).unwrap();
    assert_eq!(staircase(&s).reversal_count(), 1);

    s.submit_trial_result(TrialOutcome::Incorrect).unwrap();
    assert_eq!(staircase(&s).reversal_count(), 3);
}

#[test]
fn threshold_is_mean_of_reversals() {
    let (slot, controls) = bound(linear(20.0));
    let cfg = Config {
        correct_to_step_down: 1,
        wrong_to_step_up: 1,
        steps_up: 1,
        steps_down: 1,
        starting_step: 3,
        termination: TerminationRule::Reversals(3),
    };
    let mut s = Session::new(AlgorithmConfig::SimpleStaircase(cfg), controls);
    s.initialize(0.0).unwrap();

    // 3 -> 4 -> 5, turn at 5 -> 4, turn at 4 -> 5 -> 6, turn at 6.
    for correct in [true, true, false, true, true, false] {
        s.submit_trial_result(correct).unwrap();
    }
    assert!(s.is_done());
    assert_eq!(staircase(&s).reversal_steps(), &[5.0, 4.0, 6.0]);

    let mut out: std::collections::BTreeMap<String, f64> = std::collections::BTreeMap::new();
    s.populate_outputs(&mut out).unwrap();
    assert_eq!(out["level"], 5.0);
    assert_eq!(*slot.borrow(), ParamValue::Float(5.0));
}

#[test]
fn no_reversals_falls_back_to_current_step() {
    let (_slot, controls) = bound(linear(20.0));
    let cfg = Config {
        correct_to_step_down: 1,
        termination: TerminationRule::Trials(4),
        ..Config::default()
    };
    let mut s = Session::new(AlgorithmConfig::SimpleStaircase(cfg), controls);
    s.initialize(0.0).unwrap();
    for _ in 0..4 {
        s.submit_trial_result(true).unwrap();
    }
    assert!(s.is_done());
    let mut out: std::collections::BTreeMap<String, f64> = std::collections::BTreeMap::new();
    s.populate_outputs(&mut out).unwrap();
    assert_eq!(out["level"], 4.0);
    assert!(out["level"].is_finite());
}

#[test]
fn duration_rule_follows_the_clock() {
    let (_slot, controls) = bound(linear(20.0));
    let clock = ManualClock::new();
    let cfg = Config {
        termination: TerminationRule::Duration(Duration::from_secs(60)),
        ..Config::default()
    };
    let mut s = Session::with_clock(AlgorithmConfig::SimpleStaircase(cfg), controls, clock.clone());
    s.initialize(0.5).unwrap();

    for _ in 0..10 {
        s.submit_trial_result(true).unwrap();
    }
    assert!(!s.is_done());

    clock.advance(Duration::from_secs(50));
    s.begin_task().unwrap();
    clock.advance(Duration::from_secs(20));
    assert!(!s.is_done(), "deadline re-armed at the new task phase");

    clock.advance(Duration::from_secs(40));
    assert!(s.is_done());
    assert_eq!(s.submit_trial_result(true), Err(Error::RunComplete));
}

#[test]
fn metadata_reports_trial_and_reversals() {
    let (_slot, controls) = bound(linear(20.0));
    let cfg = Config { correct_to_step_down: 1, starting_step: 2, ..Config::default() };
    let mut s = Session::new(AlgorithmConfig::SimpleStaircase(cfg), controls);
    assert!(s.trial_metadata().entries.is_empty());
    s.initialize(0.5).unwrap();

    s.submit_trial_result(true).unwrap();
    s.submit_trial_result(false).unwrap();
    let meta = s.trial_metadata();
    assert_eq!(meta.get_int("trial"), Some(2));
    assert_eq!(meta.get_int("reversals"), Some(1));
    assert_eq!(meta.get_int("step"), Some(2));
}
