// src/lib.rs

//! Asset pipeline and development server for a statically generated site.
//!
//! Each CLI command maps to a fixed [`pipeline::Plan`] of steps; the
//! [`engine`] runtime drives the plan through the [`exec`] executor, which
//! runs the task bodies in [`tasks`]. `serve` additionally wires up the
//! [`watch`] filesystem watcher and the [`serve`] HTTP/live-reload session
//! around a long-lived watch-mode generator process.

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod pipeline;
pub mod serve;
pub mod tasks;
pub mod watch;

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::cli::{CliArgs, Command};
use crate::config::{ConfigFile, load_and_validate};
use crate::engine::{
    PipelineCore, PipelineEvent, RunReport, Runtime, RuntimeOptions, TriggerReason,
};
use crate::errors::Result;
use crate::exec::TaskExecutor;
use crate::pipeline::{Plan, Scheduler, StepGraph};
use crate::serve::SessionOptions;
use crate::tasks::TaskContext;

/// Exit code for a one-shot command stopped by Ctrl-C (128 + SIGINT).
const INTERRUPTED_EXIT: i32 = 130;

/// High-level entry point used by `main.rs`. Returns the process exit code.
///
/// This wires together:
/// - config loading and validation
/// - the step plan for the chosen command
/// - executor and runtime loop
/// - the serve session (HTTP server, watcher, watch-mode generator)
pub async fn run(args: CliArgs) -> Result<i32> {
    let config = Arc::new(load_and_validate(&args.config)?);

    let plan = match &args.command {
        Command::Clean => Plan::clean(),
        Command::InstallDependencies => Plan::install_dependencies(),
        Command::Build { .. } => Plan::build(),
        // serve runs the asset plan first, then a session around the
        // watch-mode generator.
        Command::Serve { .. } => Plan::assets(),
    };

    if args.dry_run {
        print_plan(&plan)?;
        if matches!(args.command, Command::Serve { .. }) {
            println!();
            println!("then: watch-mode site generation, development server, file watcher");
        }
        return Ok(0);
    }

    match args.command {
        Command::Clean | Command::InstallDependencies => {
            let report = run_plan(&config, plan, config.build.minify).await?;
            Ok(one_shot_exit(&report))
        }
        Command::Build { no_minify } => {
            let minify = config.build.minify && !no_minify;
            let report = run_plan(&config, plan, minify).await?;
            Ok(build_exit(&report))
        }
        Command::Serve { port, no_open } => serve_command(config, plan, port, no_open).await,
    }
}

/// Run a one-shot plan to completion.
///
/// Seeds the plan's root steps, then drives the runtime until every step
/// is terminal. Ctrl-C stops the run after in-flight steps report back.
async fn run_plan(config: &Arc<ConfigFile>, plan: Plan, minify: bool) -> Result<RunReport> {
    let (events_tx, events_rx) = mpsc::channel::<PipelineEvent>(64);

    let ctx = Arc::new(TaskContext::new(Arc::clone(config), minify));
    let executor = TaskExecutor::new(ctx, events_tx.clone());

    let scheduler = Scheduler::from_plan(&plan)?;
    let roots = scheduler.graph().roots();

    // Ctrl-C → graceful shutdown.
    {
        let tx = events_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(PipelineEvent::ShutdownRequested).await;
        });
    }

    info!(plan = plan.name(), ?roots, "starting plan");
    for step in roots {
        events_tx
            .send(PipelineEvent::StepTriggered {
                step,
                reason: TriggerReason::Startup,
            })
            .await
            .map_err(anyhow::Error::from)?;
    }

    let core = PipelineCore::new(
        scheduler,
        RuntimeOptions {
            exit_when_idle: true,
        },
    );

    Runtime::new(core, events_rx, executor).run().await
}

/// `serve`: one-shot asset build, then the live session.
///
/// An asset failure here is survivable. The session's watcher gives the
/// author a rebuild loop to fix the source in, so we log and serve anyway.
async fn serve_command(
    config: Arc<ConfigFile>,
    assets: Plan,
    port: Option<u16>,
    no_open: bool,
) -> Result<i32> {
    let report = run_plan(&config, assets, config.build.minify).await?;
    if report.interrupted {
        return Ok(INTERRUPTED_EXIT);
    }
    for step in &report.failed {
        warn!(step = %step, "initial asset build failed; serving anyway");
    }

    let options = SessionOptions {
        port: port.unwrap_or(config.serve.port),
        open_browser: config.serve.open_browser && !no_open,
    };

    let report = serve::run_session(config, options).await?;
    Ok(session_exit(&report))
}

/// Exit code for `clean` and `install-dependencies`.
fn one_shot_exit(report: &RunReport) -> i32 {
    if report.interrupted {
        INTERRUPTED_EXIT
    } else if report.all_succeeded() {
        0
    } else {
        1
    }
}

/// Exit code for `build`.
///
/// Mirrors the generator's exit code when it ran. A failed asset step
/// blocks generation, so `generator_exit` stays empty and the failure
/// itself reports nonzero.
fn build_exit(report: &RunReport) -> i32 {
    if report.interrupted {
        return INTERRUPTED_EXIT;
    }
    match report.generator_exit {
        Some(code) => code,
        None if report.all_succeeded() => 0,
        None => 1,
    }
}

/// Exit code for a serve session: Ctrl-C is a clean stop; a generator
/// death propagates its exit code.
fn session_exit(report: &RunReport) -> i32 {
    if report.interrupted {
        0
    } else {
        report.generator_exit.unwrap_or(0)
    }
}

/// Dry-run output: the plan's steps in dependency order.
fn print_plan(plan: &Plan) -> Result<()> {
    let graph = StepGraph::from_plan(plan)?;

    println!("plan '{}' ({} steps):", plan.name(), plan.steps().len());
    for &step in graph.topo_order() {
        let deps = graph.dependencies_of(step);
        if deps.is_empty() {
            println!("  - {step}");
        } else {
            let after = deps
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            println!("  - {step} (after {after})");
        }
    }
    Ok(())
}
