// src/pipeline/mod.rs

//! Step DAG representation and scheduling.
//!
//! - [`step`] defines the closed set of pipeline steps and per-run state.
//! - [`plan`] holds the fixed step DAG for each CLI command.
//! - [`graph`] validates a plan (cycles, dangling edges) and exposes
//!   adjacency plus topological order.
//! - [`scheduler`] contains the per-run state machine that decides which
//!   steps are ready to run, and when dependents can be scheduled.
//! - [`state_manager`] manages per-run state transitions.
//! - [`scheduler_step`] defines the result type for scheduler transitions.

pub mod graph;
pub mod plan;
pub mod scheduler;
pub mod scheduler_step;
pub mod state_manager;
pub mod step;

pub use graph::StepGraph;
pub use plan::Plan;
pub use scheduler::Scheduler;
pub use scheduler_step::SchedulerStep;
pub use step::{ScheduledStep, StepId, StepRunState};
