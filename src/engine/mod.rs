// src/engine/mod.rs

//! Orchestration engine for sitepipe.
//!
//! This module ties together:
//! - the step scheduler
//! - the trigger queue (what happens when triggers arrive while a run is
//!   active)
//! - the main runtime event loop that reacts to:
//!   - file-watch triggers
//!   - step completion events
//!   - serve-session events (reload requests, generator lifecycle)
//!   - shutdown signals
//!
//! The pure core state machine lives in [`self::core`]; the async/IO shell
//! is implemented in [`runtime`].

use crate::pipeline::StepId;

/// Outcome of a step for the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Success,
    Failed(i32),
}

/// Why a step was triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerReason {
    /// Seeded at startup (plan roots).
    Startup,
    /// Triggered by a filesystem event.
    FileChange,
}

/// What asked for a browser reload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadCause {
    /// The stylesheet step rebuilt successfully.
    Stylesheets,
    /// The generator rewrote HTML in the site output tree.
    SiteOutput,
}

/// Runtime options used by both the core and the async shell.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeOptions {
    /// If true, exit the runtime once the scheduler is idle and no triggers
    /// are queued (one-shot commands).
    pub exit_when_idle: bool,
}

/// Events flowing into the runtime from watchers, executors and the
/// generator session.
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    /// A step should be (logically) triggered.
    StepTriggered {
        step: StepId,
        reason: TriggerReason,
    },
    /// A step finished with a concrete outcome.
    StepCompleted {
        step: StepId,
        outcome: StepOutcome,
    },
    /// A watch route asked for a browser reload.
    ReloadRequested { cause: ReloadCause },
    /// The watch-mode generator finished its first full build.
    GeneratorReady,
    /// The watch-mode generator process exited.
    GeneratorExited { code: i32 },
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

pub mod core;
pub mod queue;
pub mod runtime;

pub use self::core::{CoreCommand, CoreStep, PipelineCore};
pub use queue::PendingTriggers;
pub use runtime::{RunReport, Runtime, SessionHooks};
