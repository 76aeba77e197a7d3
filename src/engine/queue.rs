// src/engine/queue.rs

//! Triggers that arrive while a run is active.
//!
//! A step that is already participating in the current run cannot simply be
//! restarted, so its trigger is remembered here and seeds the next run once
//! the scheduler goes idle. Triggers are deduplicated: a burst of saves to
//! the same tree coalesces into one follow-up run.

use crate::pipeline::StepId;

/// Ordered, deduplicated set of pending step triggers.
#[derive(Debug, Default)]
pub struct PendingTriggers {
    pending: Vec<StepId>,
}

impl PendingTriggers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a trigger for a future run. Repeat triggers for the same step
    /// are dropped.
    pub fn record(&mut self, step: StepId) {
        if !self.pending.contains(&step) {
            self.pending.push(step);
        }
    }

    /// Take all pending triggers, leaving the queue empty.
    pub fn drain_pending(&mut self) -> Vec<StepId> {
        std::mem::take(&mut self.pending)
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }
}
