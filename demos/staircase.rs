// demos/staircase.rs
// Run with:
//   RUST_LOG=adaptive_psych=debug cargo run --example staircase

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use adaptive_psych::algorithms::simple_staircase::Config;
use adaptive_psych::mechanics::{psychometric, stoch};
use adaptive_psych::{
    AlgorithmConfig, ControlSource, ParamValue, Session, StepTemplate, TerminationRule,
    TrialOutcome, run_to_completion,
};
use tracing_subscriber::EnvFilter;

fn main() -> adaptive_psych::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Tone level in dB: 60 dB down to 0 dB in 2 dB steps.
    let level = Rc::new(RefCell::new(ParamValue::Float(60.0)));
    let controls = ControlSource::builder()
        .bind_slot(
            "level_db",
            0,
            StepTemplate::Linear { base: 60.0, minimum: 0.0, maximum: 60.0, step_size: -2.0 },
            Rc::clone(&level),
        )?
        .build();

    let cfg = Config {
        correct_to_step_down: 2,
        wrong_to_step_up: 1,
        termination: TerminationRule::Reversals(12),
        ..Config::default()
    };
    let mut session = Session::new(AlgorithmConfig::SimpleStaircase(cfg), controls);
    session.initialize(0.5)?;

    // Simulated 2AFC listener with a 20 dB threshold.
    let mut rng = stoch::seeded(2024);
    let trials = run_to_completion(
        &mut session,
        |_| {
            let p = psychometric::logistic(level.borrow().as_f64(), 20.0, 0.4, 0.5, 0.02);
            TrialOutcome::from(stoch::bernoulli(&mut rng, p))
        },
        1_000,
    )?;

    let mut out: BTreeMap<String, f64> = BTreeMap::new();
    session.populate_outputs(&mut out)?;

    println!("== Staircase ==");
    println!("trials   -> {trials}");
    println!("metadata -> {:?}", session.trial_metadata().entries);
    for (k, v) in &out {
        println!("{k:<10} -> {v:.2}");
    }
    Ok(())
}
