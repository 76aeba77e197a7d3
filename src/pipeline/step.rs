// src/pipeline/step.rs

//! Step identities and per-run state.

use std::fmt;

/// A pipeline step: one node in a command's plan.
///
/// Steps are a closed set because the pipeline's shape is fixed; which
/// steps participate, and in which order, is decided per command by
/// [`crate::pipeline::Plan`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StepId {
    /// Remove vendor artifacts.
    Clean,
    /// Run the package-manager install command.
    InstallPackages,
    /// Copy vendor stylesheet files into the style source tree.
    RelocateVendorStyles,
    /// Rename the normalization stylesheet into an importable partial.
    NormalizeVendorStylesheet,
    /// Compile and minify the entry stylesheet.
    Styles,
    /// Recompress changed images in place.
    Images,
    /// One-shot site generation.
    GenerateSite,
}

impl StepId {
    pub fn as_str(self) -> &'static str {
        match self {
            StepId::Clean => "clean",
            StepId::InstallPackages => "install-packages",
            StepId::RelocateVendorStyles => "relocate-vendor-styles",
            StepId::NormalizeVendorStylesheet => "normalize-vendor-stylesheet",
            StepId::Styles => "styles",
            StepId::Images => "images",
            StepId::GenerateSite => "generate-site",
        }
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-run state of a step (internal).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Step was triggered for this run but is waiting on dependencies.
    Pending,
    /// Step has been dispatched to the executor and is currently running.
    Running,
    /// Step completed successfully for this run.
    DoneSuccess,
    /// Step failed in this run (or was blocked by a failed dependency).
    DoneFailed,
}

/// Public, read-only view of a step's per-run state.
///
/// This is exposed for tests and diagnostics without leaking the internal
/// `RunState` type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepRunState {
    /// The step is not currently participating in this run.
    NotInRun,
    Pending,
    Running,
    DoneSuccess,
    DoneFailed,
}

impl From<Option<RunState>> for StepRunState {
    fn from(state: Option<RunState>) -> Self {
        match state {
            None => StepRunState::NotInRun,
            Some(RunState::Pending) => StepRunState::Pending,
            Some(RunState::Running) => StepRunState::Running,
            Some(RunState::DoneSuccess) => StepRunState::DoneSuccess,
            Some(RunState::DoneFailed) => StepRunState::DoneFailed,
        }
    }
}

/// Static step information derived from the plan, plus per-run state.
#[derive(Debug, Clone)]
pub struct StepInfo {
    pub id: StepId,
    /// Direct dependencies of this step within the plan.
    pub deps: Vec<StepId>,

    /// Per-run state (None if not participating in the current run).
    pub run_state: Option<RunState>,

    /// Last run ID in which this step succeeded.
    pub last_successful_run: Option<u64>,

    /// Last run ID in which this step failed.
    pub last_failed_run: Option<u64>,
}

impl StepInfo {
    pub fn new(id: StepId, deps: Vec<StepId>) -> Self {
        Self {
            id,
            deps,
            run_state: None,
            last_successful_run: None,
            last_failed_run: None,
        }
    }
}

/// A step the scheduler wants the executor to run now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledStep {
    pub id: StepId,
    /// Monotonically increasing run identifier.
    ///
    /// All steps that belong to the same run share the same `run_id`.
    pub run_id: u64,
}

impl ScheduledStep {
    pub fn from_info(info: &StepInfo, run_id: u64) -> Self {
        Self { id: info.id, run_id }
    }
}
