// src/exec/backend.rs

//! Pluggable executor abstraction.
//!
//! The runtime talks to a `StepExecutor` instead of a raw mpsc sender. This
//! makes it easy to swap in a fake executor in tests while keeping the
//! production implementation in [`dispatch`].
//!
//! - `TaskExecutor` is the default implementation. It wraps the dispatch
//!   loop and forwards scheduled steps over an mpsc channel.
//! - Tests can provide their own `StepExecutor` that records which steps
//!   were scheduled and directly emits `StepCompleted` events.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::engine::PipelineEvent;
use crate::errors::Result;
use crate::pipeline::ScheduledStep;
use crate::tasks::TaskContext;

use super::dispatch::spawn_executor;

/// Trait abstracting how scheduled steps are executed.
///
/// Production code uses [`TaskExecutor`]; tests can provide their own
/// implementation that doesn't touch the filesystem or spawn processes.
pub trait StepExecutor: Send {
    /// Dispatch the given steps for execution.
    ///
    /// The implementation is free to:
    /// - run the real task bodies (production)
    /// - simulate completion and emit `PipelineEvent`s (tests)
    fn spawn_ready_steps(
        &mut self,
        steps: Vec<ScheduledStep>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Real executor used in production.
///
/// Internally this wraps the dispatch loop in [`spawn_executor`]. The
/// runtime calls `spawn_ready_steps`, which forwards the steps to the
/// background loop via an mpsc channel.
pub struct TaskExecutor {
    tx: mpsc::Sender<ScheduledStep>,
}

impl TaskExecutor {
    /// Create a new executor, wiring it to the given runtime event sender.
    ///
    /// This spawns the background dispatch loop immediately.
    pub fn new(ctx: Arc<TaskContext>, events_tx: mpsc::Sender<PipelineEvent>) -> Self {
        let tx = spawn_executor(ctx, events_tx);
        Self { tx }
    }
}

impl StepExecutor for TaskExecutor {
    fn spawn_ready_steps(
        &mut self,
        steps: Vec<ScheduledStep>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        // Clone the sender so the future doesn't borrow `self` across `await`.
        let tx = self.tx.clone();

        Box::pin(async move {
            for step in steps {
                tx.send(step).await.map_err(anyhow::Error::from)?;
            }
            Ok(())
        })
    }
}
