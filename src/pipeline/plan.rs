// src/pipeline/plan.rs

//! Fixed step plans, one per CLI command.
//!
//! Each plan lists its member steps and the "must complete before" edges
//! between them. The asset steps are deliberately edge-free so they run
//! concurrently; the generator step depends on both, which makes the
//! assets-before-generation ordering structural rather than temporal.

use crate::pipeline::step::StepId;

/// A named DAG of steps.
#[derive(Debug, Clone)]
pub struct Plan {
    pub(crate) name: &'static str,
    pub(crate) steps: Vec<StepId>,
    /// Edge `(a, b)` means `a` must complete before `b` may start.
    pub(crate) edges: Vec<(StepId, StepId)>,
}

impl Plan {
    /// `clean`: a single step.
    pub fn clean() -> Self {
        Self {
            name: "clean",
            steps: vec![StepId::Clean],
            edges: Vec::new(),
        }
    }

    /// `install-dependencies`: clean, fetch, relocate, normalize — a chain.
    pub fn install_dependencies() -> Self {
        Self {
            name: "install-dependencies",
            steps: vec![
                StepId::Clean,
                StepId::InstallPackages,
                StepId::RelocateVendorStyles,
                StepId::NormalizeVendorStylesheet,
            ],
            edges: vec![
                (StepId::Clean, StepId::InstallPackages),
                (StepId::InstallPackages, StepId::RelocateVendorStyles),
                (StepId::RelocateVendorStyles, StepId::NormalizeVendorStylesheet),
            ],
        }
    }

    /// `build`: styles and images in parallel, then one-shot generation.
    pub fn build() -> Self {
        Self {
            name: "build",
            steps: vec![StepId::Styles, StepId::Images, StepId::GenerateSite],
            edges: vec![
                (StepId::Styles, StepId::GenerateSite),
                (StepId::Images, StepId::GenerateSite),
            ],
        }
    }

    /// The asset half of `serve`: styles and images, no generator step.
    ///
    /// In serve mode the generator runs as a long-lived watch process
    /// outside the DAG, spawned only after this plan's run has finished.
    pub fn assets() -> Self {
        Self {
            name: "assets",
            steps: vec![StepId::Styles, StepId::Images],
            edges: Vec::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn steps(&self) -> &[StepId] {
        &self.steps
    }

    pub fn edges(&self) -> &[(StepId, StepId)] {
        &self.edges
    }
}
