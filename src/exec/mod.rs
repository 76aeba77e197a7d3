// src/exec/mod.rs

//! Step execution layer.
//!
//! This module runs the task bodies for scheduled steps and reports back to
//! the orchestration runtime via `PipelineEvent`s.
//!
//! - [`dispatch`] owns the executor loop that fans steps out onto tokio
//!   tasks.
//! - [`backend`] provides the `StepExecutor` trait and the concrete
//!   `TaskExecutor` the runtime uses in production, which tests can replace
//!   with a fake implementation.

pub mod backend;
pub mod dispatch;

pub use backend::{StepExecutor, TaskExecutor};
pub use dispatch::spawn_executor;
