// src/exec/dispatch.rs

//! The executor loop: scheduled steps in, completion events out.
//!
//! Each step received over the channel is run on its own tokio task, so
//! ready siblings (styles, images) proceed concurrently. Every step reports
//! a `StepCompleted` event back to the runtime regardless of outcome; error
//! classification (fatal vs logged-and-swallowed) is the caller's business,
//! which is how one-shot builds abort on a compile error that a serve
//! session merely logs.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::engine::{PipelineEvent, StepOutcome};
use crate::errors::Result;
use crate::pipeline::{ScheduledStep, StepId};
use crate::tasks::{self, TaskContext};

/// Spawn the background dispatch loop.
///
/// Returns the sender half of the step channel; the loop ends when every
/// sender is dropped.
pub fn spawn_executor(
    ctx: Arc<TaskContext>,
    events_tx: mpsc::Sender<PipelineEvent>,
) -> mpsc::Sender<ScheduledStep> {
    let (tx, mut rx) = mpsc::channel::<ScheduledStep>(32);

    tokio::spawn(async move {
        while let Some(step) = rx.recv().await {
            let ctx = Arc::clone(&ctx);
            let events_tx = events_tx.clone();

            tokio::spawn(async move {
                run_step(ctx, step, events_tx).await;
            });
        }
        debug!("executor loop finished");
    });

    tx
}

async fn run_step(ctx: Arc<TaskContext>, step: ScheduledStep, events_tx: mpsc::Sender<PipelineEvent>) {
    info!(step = %step.id, run_id = step.run_id, "step started");

    let outcome = match execute(&ctx, step.id).await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(step = %step.id, error = %e, "step failed");
            StepOutcome::Failed(1)
        }
    };

    match outcome {
        StepOutcome::Success => {
            info!(step = %step.id, run_id = step.run_id, "step finished");
        }
        StepOutcome::Failed(code) => {
            warn!(step = %step.id, run_id = step.run_id, exit_code = code, "step unsuccessful");
        }
    }

    let _ = events_tx
        .send(PipelineEvent::StepCompleted {
            step: step.id,
            outcome,
        })
        .await;
}

/// Run the task body for a step.
///
/// A non-zero generator exit is an outcome, not an error: the exit code has
/// to survive up to the CLI so `build` can mirror it.
async fn execute(ctx: &TaskContext, id: StepId) -> Result<StepOutcome> {
    match id {
        StepId::Clean => {
            tasks::clean::remove_vendor_artifacts(&ctx.config)?;
            Ok(StepOutcome::Success)
        }
        StepId::InstallPackages => {
            tasks::install::install_packages(&ctx.config).await?;
            Ok(StepOutcome::Success)
        }
        StepId::RelocateVendorStyles => {
            tasks::install::relocate_vendor_styles(&ctx.config)?;
            Ok(StepOutcome::Success)
        }
        StepId::NormalizeVendorStylesheet => {
            tasks::install::normalize_vendor_stylesheet(&ctx.config)?;
            Ok(StepOutcome::Success)
        }
        StepId::Styles => {
            tasks::styles::build_styles(&ctx.config, ctx.minify).await?;
            Ok(StepOutcome::Success)
        }
        StepId::Images => {
            tasks::images::optimize_images(&ctx.config).await?;
            Ok(StepOutcome::Success)
        }
        StepId::GenerateSite => {
            let code = tasks::generator::run_one_shot(&ctx.config).await?;
            if code == 0 {
                Ok(StepOutcome::Success)
            } else {
                Ok(StepOutcome::Failed(code))
            }
        }
    }
}
