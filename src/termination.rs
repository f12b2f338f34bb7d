//! Termination rules: when is a run complete?
//!
//! Rules are orthogonal to stepping. Only [`TerminationRule::Duration`] looks
//! at the wall clock, via a deadline armed once at the start of the task phase.

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// A source of "now". Tests use [`ManualClock`].
pub trait Clock {
    fn now(&self) -> Instant;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to. Clones share the same time.
#[derive(Clone, Debug)]
pub struct ManualClock {
    now: Rc<Cell<Instant>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self { now: Rc::new(Cell::new(Instant::now())) }
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.now.get()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", content = "limit", rename_all = "snake_case")]
pub enum TerminationRule {
    /// Done once this many reversals have been recorded.
    Reversals(u32),
    /// Done once this many trials have been submitted.
    Trials(u32),
    /// Done once this much time has passed since the task phase began.
    Duration(Duration),
}

impl Default for TerminationRule {
    fn default() -> Self {
        TerminationRule::Reversals(8)
    }
}

impl TerminationRule {
    pub fn validate(&self) -> Result<(), &'static str> {
        match *self {
            TerminationRule::Reversals(0) => Err("reversal limit must be positive"),
            TerminationRule::Trials(0) => Err("trial limit must be positive"),
            TerminationRule::Duration(d) if d.is_zero() => Err("duration must be positive"),
            _ => Ok(()),
        }
    }
}

/// A rule plus the one piece of state it may need: the deadline.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Termination {
    rule: TerminationRule,
    deadline: Option<Instant>,
}

impl Termination {
    pub fn new(rule: TerminationRule) -> Self {
        Self { rule, deadline: None }
    }

    pub fn rule(&self) -> TerminationRule {
        self.rule
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Captures the deadline for a duration rule. Called once per phase.
    pub fn arm(&mut self, now: Instant) {
        if let TerminationRule::Duration(d) = self.rule {
            self.deadline = Some(now + d);
        }
    }

    /// An unarmed duration rule never reports done.
    pub fn is_done(&self, trials: u32, reversals: u32, now: Instant) -> bool {
        match self.rule {
            TerminationRule::Reversals(n) => reversals >= n,
            TerminationRule::Trials(n) => trials >= n,
            TerminationRule::Duration(_) => self.deadline.is_some_and(|d| now >= d),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_rules() {
        let now = Instant::now();
        let r = Termination::new(TerminationRule::Reversals(4));
        assert!(!r.is_done(100, 3, now));
        assert!(r.is_done(0, 4, now));

        let t = Termination::new(TerminationRule::Trials(10));
        assert!(!t.is_done(9, 50, now));
        assert!(t.is_done(10, 0, now));
    }

    #[test]
    fn duration_waits_for_arming_and_deadline() {
        let clock = ManualClock::new();
        let mut d = Termination::new(TerminationRule::Duration(Duration::from_secs(60)));
        clock.advance(Duration::from_secs(600));
        assert!(!d.is_done(0, 0, clock.now()));

        d.arm(clock.now());
        clock.advance(Duration::from_secs(59));
        assert!(!d.is_done(0, 0, clock.now()));
        clock.advance(Duration::from_secs(1));
        assert!(d.is_done(0, 0, clock.now()));
    }

    #[test]
    fn zero_limits_are_rejected() {
        assert!(TerminationRule::Trials(0).validate().is_err());
        assert!(TerminationRule::Duration(Duration::ZERO).validate().is_err());
        assert!(TerminationRule::Reversals(6).validate().is_ok());
    }
}
