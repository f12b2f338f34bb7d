// demos/constant_stimulus.rs
// Run with:
//   cargo run --example constant_stimulus

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use adaptive_psych::algorithms::constant_stimulus::Config;
use adaptive_psych::mechanics::{psychometric, stoch};
use adaptive_psych::{
    AlgorithmConfig, ControlSource, ParamValue, Session, StepTemplate, TrialOutcome,
    run_to_completion,
};
use tracing_subscriber::EnvFilter;

fn main() -> adaptive_psych::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Gap duration in ms, 8 steps from 32 ms halving every 2 steps.
    let gap = Rc::new(RefCell::new(ParamValue::Float(32.0)));
    let controls = ControlSource::builder()
        .bind_slot(
            "gap_ms",
            0,
            StepTemplate::Exponential {
                base: 32.0,
                minimum: 1.0,
                maximum: 32.0,
                factor: 0.5,
                steps_per_factor: 2.0,
            },
            Rc::clone(&gap),
        )?
        .build();

    let cfg = Config { steps: vec![8], tracks: 2, repetitions: 5, seed: 0xC0FFEE };
    let mut session = Session::new(AlgorithmConfig::ConstantStimulus(cfg), controls);
    session.initialize(0.5)?;

    // Listener detects gaps above ~4 ms.
    let mut rng = stoch::seeded(7);
    let trials = run_to_completion(
        &mut session,
        |_| {
            let p = psychometric::logistic(gap.borrow().as_f64().log2(), 2.0, 3.0, 0.5, 0.0);
            TrialOutcome::from(stoch::bernoulli(&mut rng, p))
        },
        1_000,
    )?;

    let mut out: BTreeMap<String, f64> = BTreeMap::new();
    session.populate_outputs(&mut out)?;

    println!("== Constant stimuli ({trials} trials) ==");
    for (k, v) in &out {
        println!("{k:<12} -> {v:.3}");
    }
    Ok(())
}
