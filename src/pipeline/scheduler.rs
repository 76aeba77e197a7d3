// src/pipeline/scheduler.rs

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use crate::engine::StepOutcome;
use crate::errors::Result;
use crate::pipeline::graph::StepGraph;
use crate::pipeline::plan::Plan;
use crate::pipeline::scheduler_step::SchedulerStep;
use crate::pipeline::state_manager::{ReadOnlyStateManager, StateManager};
use crate::pipeline::step::{RunState, StepId, StepInfo, StepRunState};

/// Scheduler holds the immutable step DAG plus mutable per-run state.
///
/// It is responsible for:
/// - remembering which steps are part of the current run
/// - deciding when a triggered step is "ready" to run (deps satisfied)
/// - marking steps as succeeded/failed
/// - scheduling dependents when appropriate
/// - failing dependents when a step fails
#[derive(Debug)]
pub struct Scheduler {
    graph: StepGraph,
    steps: BTreeMap<StepId, StepInfo>,
    /// Monotonically increasing run ID.
    run_counter: u64,
    /// Currently active run ID, or `None` if there is no active run.
    current_run_id: Option<u64>,
}

impl Scheduler {
    /// Construct a scheduler for the given plan.
    pub fn from_plan(plan: &Plan) -> Result<Self> {
        let graph = StepGraph::from_plan(plan)?;

        let mut steps = BTreeMap::new();
        for id in graph.steps() {
            let deps = graph.dependencies_of(id).to_vec();
            steps.insert(id, StepInfo::new(id, deps));
        }

        Ok(Self {
            graph,
            steps,
            run_counter: 0,
            current_run_id: None,
        })
    }

    /// Returns `true` if there is currently no active run.
    pub fn is_idle(&self) -> bool {
        self.current_run_id.is_none()
    }

    /// Current run ID, if any.
    pub fn current_run_id(&self) -> Option<u64> {
        self.current_run_id
    }

    /// Read-only view of the given step's run state.
    pub fn run_state_of(&self, step: StepId) -> Option<StepRunState> {
        let info = self.steps.get(&step)?;
        Some(info.run_state.into())
    }

    /// Whether the dependencies of `step` are satisfied for the current run.
    ///
    /// Returns `None` if the step is not part of the plan.
    pub fn deps_satisfied(&self, step: StepId) -> Option<bool> {
        let info = self.steps.get(&step)?;
        let mgr = ReadOnlyStateManager::new(&self.steps);
        Some(mgr.deps_satisfied_for_info(info))
    }

    /// The underlying graph (roots, topological order).
    pub fn graph(&self) -> &StepGraph {
        &self.graph
    }

    /// Start a new run, resetting per-run state but keeping historical
    /// success information for dependency satisfaction on later runs.
    pub fn start_new_run(&mut self) {
        self.run_counter += 1;
        self.current_run_id = Some(self.run_counter);

        for info in self.steps.values_mut() {
            info.run_state = None;
        }

        debug!(run_id = self.run_counter, "scheduler: starting new run");
    }

    /// Handle a trigger for a step.
    ///
    /// The step and all its downstream dependents join the current run; any
    /// steps whose dependencies are already satisfied are returned for
    /// dispatch.
    pub fn handle_trigger(&mut self, step: StepId) -> SchedulerStep {
        if self.current_run_id.is_none() {
            warn!(
                step = %step,
                "handle_trigger called with no active run; implicitly starting a new run"
            );
            self.start_new_run();
        }

        if self.graph.contains(step) {
            let mut manager = StateManager::new(&self.graph, &mut self.steps, self.current_run_id);
            manager.mark_step_and_dependents_pending(step);
        } else {
            warn!(step = %step, "trigger for step outside the plan; ignoring");
        }

        let mut manager = StateManager::new(&self.graph, &mut self.steps, self.current_run_id);
        let newly_scheduled = manager.collect_new_ready_steps();
        let run_just_finished = self.maybe_finish_run();

        SchedulerStep {
            newly_scheduled,
            newly_failed: Vec::new(),
            run_just_finished,
        }
    }

    /// Handle completion of a step with a concrete outcome.
    pub fn handle_completion(&mut self, step: StepId, outcome: StepOutcome) -> SchedulerStep {
        let run_id = match self.current_run_id {
            Some(id) => id,
            None => {
                warn!(
                    step = %step,
                    "handle_completion called with no active run; ignoring"
                );
                return SchedulerStep::default();
            }
        };

        let mut newly_scheduled = Vec::new();
        let mut newly_failed = Vec::new();

        match self.steps.get_mut(&step) {
            Some(info) => match outcome {
                StepOutcome::Success => {
                    info.run_state = Some(RunState::DoneSuccess);
                    info.last_successful_run = Some(run_id);
                    debug!(step = %info.id, run_id, "step completed successfully");
                    let mut manager =
                        StateManager::new(&self.graph, &mut self.steps, self.current_run_id);
                    newly_scheduled.extend(manager.collect_new_ready_steps());
                }
                StepOutcome::Failed(code) => {
                    info.run_state = Some(RunState::DoneFailed);
                    info.last_failed_run = Some(run_id);
                    warn!(
                        step = %info.id,
                        run_id,
                        exit_code = code,
                        "step failed; failing dependents in this run"
                    );
                    newly_failed.push(info.id);
                    let mut manager =
                        StateManager::new(&self.graph, &mut self.steps, self.current_run_id);
                    let mut dep_failures = manager.mark_dependents_failed(step);
                    newly_failed.append(&mut dep_failures);
                }
            },
            None => {
                warn!(step = %step, "completion for step outside the plan; ignoring");
            }
        }

        let run_just_finished = self.maybe_finish_run();

        SchedulerStep {
            newly_scheduled,
            newly_failed,
            run_just_finished,
        }
    }

    /// Determine whether all steps are terminal and clear `current_run_id`
    /// if so.
    ///
    /// Returns `true` if this call transitioned the scheduler from running
    /// to idle.
    fn maybe_finish_run(&mut self) -> bool {
        if self.current_run_id.is_none() {
            return false;
        }

        let manager = StateManager::new(&self.graph, &mut self.steps, self.current_run_id);

        if manager.all_steps_terminal() {
            info!(
                run_id = self.current_run_id,
                "scheduler: all steps terminal; run finished"
            );
            self.current_run_id = None;
            true
        } else {
            false
        }
    }
}
