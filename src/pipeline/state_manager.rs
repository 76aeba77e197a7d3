// src/pipeline/state_manager.rs

//! Per-run state transitions for steps in the scheduler.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info, warn};

use crate::pipeline::graph::StepGraph;
use crate::pipeline::step::{RunState, ScheduledStep, StepId, StepInfo};

/// Manages per-run state transitions.
pub struct StateManager<'a> {
    graph: &'a StepGraph,
    steps: &'a mut BTreeMap<StepId, StepInfo>,
    current_run_id: Option<u64>,
}

impl<'a> StateManager<'a> {
    pub fn new(
        graph: &'a StepGraph,
        steps: &'a mut BTreeMap<StepId, StepInfo>,
        current_run_id: Option<u64>,
    ) -> Self {
        Self {
            graph,
            steps,
            current_run_id,
        }
    }

    /// Include a triggered step and all its downstream dependents in this run.
    ///
    /// - Steps not yet part of the run (`run_state == None`) are marked
    ///   `Pending`.
    /// - Steps already participating keep their current state.
    pub fn mark_step_and_dependents_pending(&mut self, root: StepId) {
        let mut stack: Vec<StepId> = vec![root];
        let mut visited: BTreeSet<StepId> = BTreeSet::new();

        while let Some(id) = stack.pop() {
            if !visited.insert(id) {
                continue;
            }

            if let Some(info) = self.steps.get_mut(&id) {
                if info.run_state.is_none() {
                    info.run_state = Some(RunState::Pending);
                    debug!(step = %info.id, "marked Pending for this run");
                }

                // Always traverse dependents so downstream steps are also
                // included in the run.
                stack.extend(self.graph.dependents_of(id).iter().copied());
            } else {
                warn!(step = %id, "step in graph not present in step map");
            }
        }
    }

    /// Mark all triggered dependents (and their transitively triggered
    /// dependents) of a failed step as `DoneFailed` for this run.
    ///
    /// Returns the steps newly marked failed (excluding the root; the caller
    /// adds that separately).
    pub fn mark_dependents_failed(&mut self, failed: StepId) -> Vec<StepId> {
        let mut stack: Vec<StepId> = self.graph.dependents_of(failed).to_vec();
        let mut newly_failed = Vec::new();

        while let Some(id) = stack.pop() {
            if let Some(info) = self.steps.get_mut(&id) {
                match info.run_state {
                    Some(RunState::Pending) | Some(RunState::Running) => {
                        info.run_state = Some(RunState::DoneFailed);
                        debug!(
                            step = %info.id,
                            "marking dependent as DoneFailed due to upstream failure"
                        );
                        newly_failed.push(info.id);
                        stack.extend(self.graph.dependents_of(id).iter().copied());
                    }
                    Some(RunState::DoneSuccess) | Some(RunState::DoneFailed) | None => {
                        // Already terminal or not participating in this run.
                    }
                }
            }
        }

        newly_failed
    }

    /// Collect steps that are `Pending` with satisfied dependencies, mark
    /// them `Running`, and return them as `ScheduledStep`s.
    ///
    /// Iteration is over a `BTreeMap`, so dispatch order is deterministic.
    pub fn collect_new_ready_steps(&mut self) -> Vec<ScheduledStep> {
        let mut ready = Vec::new();

        // Decide first, then mutate, to avoid borrowing issues.
        let candidates: Vec<StepId> = self
            .steps
            .values()
            .filter_map(|info| {
                if matches!(info.run_state, Some(RunState::Pending))
                    && self.deps_satisfied_for_info(info)
                {
                    Some(info.id)
                } else {
                    None
                }
            })
            .collect();

        for id in candidates {
            if let Some(info) = self.steps.get_mut(&id) {
                info!(
                    step = %info.id,
                    run_id = self.current_run_id,
                    "dependencies satisfied; dispatching step"
                );

                info.run_state = Some(RunState::Running);
                ready.push(ScheduledStep::from_info(
                    info,
                    self.current_run_id.unwrap_or(0),
                ));
            }
        }

        ready
    }

    /// Whether all dependencies of the given step are satisfied for the
    /// current run.
    pub fn deps_satisfied_for_info(&self, info: &StepInfo) -> bool {
        let ro = ReadOnlyStateManager::new(self.steps);
        ro.deps_satisfied_for_info(info)
    }

    /// Check if no step is still pending or running.
    pub fn all_steps_terminal(&self) -> bool {
        !self.steps.values().any(|info| {
            matches!(
                info.run_state,
                Some(RunState::Pending) | Some(RunState::Running)
            )
        })
    }
}

/// Read-only view for checking dependency satisfaction with shared access.
pub struct ReadOnlyStateManager<'a> {
    steps: &'a BTreeMap<StepId, StepInfo>,
}

impl<'a> ReadOnlyStateManager<'a> {
    pub fn new(steps: &'a BTreeMap<StepId, StepInfo>) -> Self {
        Self { steps }
    }

    /// Whether all dependencies of the given step are satisfied for the
    /// current run.
    ///
    /// Dependencies participating in this run must have reached
    /// `DoneSuccess`; dependencies outside the run count as satisfied only
    /// if they have ever succeeded (historical success).
    pub fn deps_satisfied_for_info(&self, info: &StepInfo) -> bool {
        for dep_id in &info.deps {
            let dep = match self.steps.get(dep_id) {
                Some(d) => d,
                None => {
                    warn!(step = %info.id, dep = %dep_id, "dependency missing from step map");
                    return false;
                }
            };

            match dep.run_state {
                Some(RunState::DoneSuccess) => {
                    // Satisfied in this run.
                }
                Some(RunState::DoneFailed) => {
                    return false;
                }
                Some(RunState::Pending) | Some(RunState::Running) => {
                    // Dependency hasn't finished yet.
                    return false;
                }
                None => {
                    // Not part of this run; rely on history.
                    if dep.last_successful_run.is_none() {
                        return false;
                    }
                }
            }
        }

        true
    }
}
