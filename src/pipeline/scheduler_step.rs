// src/pipeline/scheduler_step.rs

//! Result type for scheduler transitions.

use crate::pipeline::step::{ScheduledStep, StepId};

/// Structured result of a single scheduler transition.
///
/// Tests step the scheduler manually and assert on these fields; the runtime
/// mostly cares about `newly_scheduled`.
#[derive(Debug, Clone, Default)]
pub struct SchedulerStep {
    /// Steps that became ready to run as a result of this transition.
    pub newly_scheduled: Vec<ScheduledStep>,
    /// Steps newly marked failed in this transition (the failing step and
    /// any dependents blocked by it).
    pub newly_failed: Vec<StepId>,
    /// Whether this transition finished the current run (the scheduler is
    /// now idle).
    pub run_just_finished: bool,
}
