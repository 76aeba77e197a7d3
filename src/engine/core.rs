// src/engine/core.rs

//! Pure core runtime state machine.
//!
//! This module contains a synchronous, deterministic "core runtime" that
//! consumes [`PipelineEvent`]s and produces:
//! - an updated core state
//! - a list of "commands" describing what the IO shell should do next
//!
//! The async/IO-heavy shell (`engine::runtime::Runtime`) is responsible for:
//! - reading events from channels
//! - sending `ScheduledStep`s to the executor
//! - serve-session side effects (reload fan-out, browser open, teardown)
//!
//! The core is intended to be extensively unit tested without any Tokio,
//! channels, filesystem, or processes.

use std::collections::BTreeSet;

use crate::engine::queue::PendingTriggers;
use crate::engine::{PipelineEvent, RuntimeOptions, StepOutcome, TriggerReason};
use crate::pipeline::{ScheduledStep, Scheduler, StepId, StepRunState};

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone)]
pub enum CoreCommand {
    /// Send these steps to the executor.
    DispatchSteps(Vec<ScheduledStep>),
    /// Request that the process exits (one-shot commands when idle).
    RequestExit,
}

/// Decision returned by the core after handling a single event.
#[derive(Debug, Clone)]
pub struct CoreStep {
    /// Commands the IO shell should execute.
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

impl CoreStep {
    fn keep_running() -> Self {
        Self {
            commands: Vec::new(),
            keep_running: true,
        }
    }

    fn stop() -> Self {
        Self {
            commands: Vec::new(),
            keep_running: false,
        }
    }
}

/// Pure core runtime state.
///
/// This owns:
/// - the step scheduler
/// - the trigger queue
/// - runtime options (e.g. `exit_when_idle`)
///
/// It has **no** channels, no Tokio types, and performs no IO.
#[derive(Debug)]
pub struct PipelineCore {
    scheduler: Scheduler,
    queue: PendingTriggers,
    options: RuntimeOptions,
}

impl PipelineCore {
    pub fn new(scheduler: Scheduler, options: RuntimeOptions) -> Self {
        Self {
            scheduler,
            queue: PendingTriggers::new(),
            options,
        }
    }

    /// Expose whether the scheduler is idle (for tests).
    pub fn is_idle(&self) -> bool {
        self.scheduler.is_idle()
    }

    /// Expose queue emptiness (for tests).
    pub fn queue_is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Handle a single event, updating core state and returning the
    /// resulting commands for the IO shell.
    pub fn step(&mut self, event: PipelineEvent) -> CoreStep {
        match event {
            PipelineEvent::StepTriggered { step, reason } => self.handle_step_trigger(step, reason),
            PipelineEvent::StepCompleted { step, outcome } => {
                self.handle_step_completion(step, outcome)
            }
            // Session events carry no scheduling semantics; the IO shell
            // performs their side effects before feeding the core.
            PipelineEvent::ReloadRequested { .. } | PipelineEvent::GeneratorReady => {
                CoreStep::keep_running()
            }
            PipelineEvent::GeneratorExited { .. } => CoreStep::stop(),
            PipelineEvent::ShutdownRequested => CoreStep::stop(),
        }
    }

    /// Handle a step trigger.
    ///
    /// - If the scheduler is idle, start a new run seeded with this trigger
    ///   plus anything already queued.
    /// - If a run is active:
    ///   - a step already participating in this run is queued for a future
    ///     run;
    ///   - a step *not* in the current run is merged into it immediately, so
    ///     unrelated roots share a run and proceed in parallel.
    fn handle_step_trigger(&mut self, step: StepId, _reason: TriggerReason) -> CoreStep {
        let mut commands = Vec::new();

        if self.scheduler.is_idle() {
            let mut triggers: BTreeSet<StepId> = self.queue.drain_pending().into_iter().collect();
            triggers.insert(step);

            let mut seeded = self.start_new_run_from_triggers(triggers.into_iter().collect());
            commands.append(&mut seeded.commands);

            return CoreStep {
                commands,
                keep_running: true,
            };
        }

        match self.scheduler.run_state_of(step) {
            None => {
                // Step outside the plan; ignore the trigger.
            }
            Some(StepRunState::NotInRun) => {
                let result = self.scheduler.handle_trigger(step);
                if !result.newly_scheduled.is_empty() {
                    commands.push(CoreCommand::DispatchSteps(result.newly_scheduled));
                }
            }
            Some(_already_in_run) => {
                self.queue.record(step);
            }
        }

        CoreStep {
            commands,
            keep_running: true,
        }
    }

    /// Handle a step completion.
    fn handle_step_completion(&mut self, step: StepId, outcome: StepOutcome) -> CoreStep {
        let mut commands = Vec::new();

        let result = self.scheduler.handle_completion(step, outcome);
        if !result.newly_scheduled.is_empty() {
            commands.push(CoreCommand::DispatchSteps(result.newly_scheduled));
        }

        let mut queued_cmds = self.maybe_start_queued_run();
        commands.append(&mut queued_cmds);

        // One-shot commands exit once the scheduler is idle and nothing is
        // queued.
        let mut keep_running = true;
        if self.options.exit_when_idle && self.scheduler.is_idle() && self.queue.is_empty() {
            keep_running = false;
            commands.push(CoreCommand::RequestExit);
        }

        CoreStep {
            commands,
            keep_running,
        }
    }

    /// Seed a new run from initial root triggers.
    fn start_new_run_from_triggers(&mut self, triggers: Vec<StepId>) -> CoreStep {
        let mut commands = Vec::new();

        if triggers.is_empty() {
            return CoreStep::keep_running();
        }

        self.scheduler.start_new_run();

        let mut all_ready = Vec::new();
        for step in triggers {
            let result = self.scheduler.handle_trigger(step);
            all_ready.extend(result.newly_scheduled);
        }

        if !all_ready.is_empty() {
            commands.push(CoreCommand::DispatchSteps(all_ready));
        }

        CoreStep {
            commands,
            keep_running: true,
        }
    }

    /// If the scheduler is idle and there are queued triggers, start a new
    /// run from them.
    fn maybe_start_queued_run(&mut self) -> Vec<CoreCommand> {
        if !self.scheduler.is_idle() {
            return Vec::new();
        }

        let triggers = self.queue.drain_pending();
        if triggers.is_empty() {
            return Vec::new();
        }

        self.start_new_run_from_triggers(triggers).commands
    }
}
