//! # Controlled parameters and the control source
//!
//! A [`ControlledParameter`] is an externally owned value slot plus the
//! [`StepTemplate`] that says which value each step maps to. Procedures never
//! touch parameters directly: they issue step requests per *source* (a logical
//! difficulty dimension), and the [`ControlSource`] fans each request out to
//! every parameter bound to that source.
//!
//! ## Atomic multi-parameter steps
//! Several parameters can share a source (e.g. a level and a matching
//! duration). A step request is applied as a batch:
//! 1. every bound parameter is asked [`ControlledParameter::could_step_to`];
//! 2. statuses combine by worst case;
//! 3. only if the combined status is [`StepStatus::Success`] is any value
//!    committed.
//! A rejected request leaves every parameter exactly as it was.
//!
//! ## Sealed bindings
//! The binding table is built once with [`ControlSourceBuilder`] and cannot be
//! extended afterwards, so nothing can be rebound mid-run.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::error::{Error, Result};
use crate::mechanics::template::{StepTemplate, ValueKind};

/// Concrete value held by a parameter slot.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum ParamValue {
    Float(f64),
    Int(i64),
}

impl ParamValue {
    pub fn as_f64(&self) -> f64 {
        match *self {
            ParamValue::Float(v) => v,
            ParamValue::Int(v) => v as f64,
        }
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            ParamValue::Float(_) => ValueKind::Continuous,
            ParamValue::Int(_) => ValueKind::Discrete,
        }
    }
}

/// Shared slot the presentation layer reads the current stimulus value from.
pub type Slot = Rc<RefCell<ParamValue>>;

/// Outcome of a step attempt, ordered from best to worst.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StepStatus {
    Success,
    OutOfBounds,
    TypeError,
}

impl StepStatus {
    /// Worst-case combination.
    #[inline]
    pub fn combine(self, other: StepStatus) -> StepStatus {
        self.max(other)
    }

    #[inline]
    pub fn is_success(self) -> bool {
        self == StepStatus::Success
    }
}

/// What a finished procedure reports for one source.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum FinalOutput {
    /// A (possibly fractional) step, mapped through each parameter's template.
    Step(f64),
    /// A score written to the parameter as-is.
    Value(f64),
}

/// A place to publish finalized values. The sink's storage format is the
/// caller's business.
pub trait OutputSink {
    fn publish(&mut self, key: &str, value: f64);
}

impl OutputSink for BTreeMap<String, f64> {
    fn publish(&mut self, key: &str, value: f64) {
        self.insert(key.to_owned(), value);
    }
}

impl OutputSink for Vec<(String, f64)> {
    fn publish(&mut self, key: &str, value: f64) {
        self.push((key.to_owned(), value));
    }
}

#[derive(Debug)]
pub struct ControlledParameter {
    name: String,
    source: usize,
    template: StepTemplate,
    expects: ValueKind,
    slot: Slot,
    step: Option<i32>,
    finalized: Option<FinalOutput>,
}

impl ControlledParameter {
    /// Binds `template` to `slot`. The slot's current value fixes the kind
    /// of value this parameter accepts.
    pub fn new(name: impl Into<String>, source: usize, template: StepTemplate, slot: Slot) -> Self {
        let expects = slot.borrow().kind();
        Self {
            name: name.into(),
            source,
            template,
            expects,
            slot,
            step: None,
            finalized: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> usize {
        self.source
    }

    pub fn template(&self) -> &StepTemplate {
        &self.template
    }

    /// Last committed step, if any.
    pub fn step(&self) -> Option<i32> {
        self.step
    }

    pub fn value(&self) -> ParamValue {
        *self.slot.borrow()
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized.is_some()
    }

    /// Lookup without committing.
    pub fn could_step_to(&self, step: i32) -> StepStatus {
        if self.template.kind() != self.expects {
            return StepStatus::TypeError;
        }
        if self.finalized.is_some() || step < 0 {
            return StepStatus::OutOfBounds;
        }
        let v = self.template.value(step);
        if v.is_finite() && self.template.contains(v) {
            StepStatus::Success
        } else {
            StepStatus::OutOfBounds
        }
    }

    pub fn step_to(&mut self, step: i32) -> StepStatus {
        let status = self.could_step_to(step);
        if status.is_success() {
            self.commit(step);
        }
        status
    }

    fn commit(&mut self, step: i32) {
        *self.slot.borrow_mut() = self.to_param(self.template.value(step));
        self.step = Some(step);
    }

    /// Writes the converged value. Re-finalizing with the same output
    /// rewrites the same value.
    pub fn finalize(&mut self, output: FinalOutput) -> ParamValue {
        let raw = match output {
            FinalOutput::Step(s) => self.template.value_at(s),
            FinalOutput::Value(v) => v,
        };
        let value = match output {
            // Scores are not stimulus values; keep them continuous.
            FinalOutput::Value(_) => ParamValue::Float(raw),
            FinalOutput::Step(_) => self.to_param(raw),
        };
        *self.slot.borrow_mut() = value;
        self.finalized = Some(output);
        value
    }

    fn to_param(&self, v: f64) -> ParamValue {
        match self.expects {
            ValueKind::Continuous => ParamValue::Float(v),
            ValueKind::Discrete => ParamValue::Int(v.round() as i64),
        }
    }
}

/// Immutable table of parameters keyed by source index.
#[derive(Debug, Default)]
pub struct ControlSource {
    params: Vec<ControlledParameter>,
}

#[derive(Debug, Default)]
pub struct ControlSourceBuilder {
    params: Vec<ControlledParameter>,
}

impl ControlSourceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a parameter after validating its template.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTemplate`] if the template is malformed.
    pub fn bind(mut self, param: ControlledParameter) -> Result<Self> {
        param.template.validate().map_err(|reason| Error::InvalidTemplate {
            name: param.name.clone(),
            reason,
        })?;
        self.params.push(param);
        Ok(self)
    }

    /// Convenience for [`ControlledParameter::new`] + [`bind`](Self::bind).
    pub fn bind_slot(
        self,
        name: impl Into<String>,
        source: usize,
        template: StepTemplate,
        slot: Slot,
    ) -> Result<Self> {
        self.bind(ControlledParameter::new(name, source, template, slot))
    }

    pub fn build(self) -> ControlSource {
        ControlSource { params: self.params }
    }
}

impl ControlSource {
    pub fn builder() -> ControlSourceBuilder {
        ControlSourceBuilder::new()
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn params(&self) -> &[ControlledParameter] {
        &self.params
    }

    pub fn bound_to(&self, source: usize) -> impl Iterator<Item = &ControlledParameter> {
        self.params.iter().filter(move |p| p.source == source)
    }

    /// Clears finalization and the committed step on every parameter, ahead
    /// of a fresh run. Slot values are left as they are.
    pub(crate) fn reset(&mut self) {
        for p in self.params.iter_mut() {
            p.step = None;
            p.finalized = None;
        }
    }

    /// Checks every binding targets a source the procedure drives.
    pub(crate) fn check_sources(&self, sources: usize) -> Result<()> {
        if sources == 0 {
            // Nothing is stepped; any binding is only finalized.
            return Ok(());
        }
        match self.params.iter().find(|p| p.source >= sources) {
            Some(p) => Err(Error::UnknownSource {
                name: p.name.clone(),
                source_index: p.source,
                sources,
            }),
            None => Ok(()),
        }
    }

    /// Combined status of stepping every parameter on `source` to `step`.
    pub fn could_step_to(&self, source: usize, step: i32) -> StepStatus {
        if step < 0 {
            return StepStatus::OutOfBounds;
        }
        self.bound_to(source)
            .map(|p| p.could_step_to(step))
            .fold(StepStatus::Success, StepStatus::combine)
    }

    /// Validate-all, then commit-all. A source with nothing bound accepts
    /// any non-negative step.
    pub fn step_to(&mut self, source: usize, step: i32) -> StepStatus {
        let status = self.could_step_to(source, step);
        match status {
            StepStatus::Success => {
                for p in self.params.iter_mut().filter(|p| p.source == source) {
                    p.commit(step);
                }
                debug!(source, step, "stepped source");
            }
            StepStatus::TypeError => {
                let names: Vec<&str> = self
                    .bound_to(source)
                    .filter(|p| p.could_step_to(step) == StepStatus::TypeError)
                    .map(|p| p.name())
                    .collect();
                error!(source, step, params = ?names, "template value type does not match parameter");
            }
            StepStatus::OutOfBounds => {}
        }
        status
    }

    pub fn finalize(&mut self, source: usize, output: FinalOutput) {
        for p in self.params.iter_mut().filter(|p| p.source == source) {
            p.finalize(output);
        }
    }

    pub fn finalize_all(&mut self, output: FinalOutput) {
        for p in self.params.iter_mut() {
            p.finalize(output);
        }
    }
}
