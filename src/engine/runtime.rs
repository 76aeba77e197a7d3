// src/engine/runtime.rs

use std::fmt;

use tokio::sync::broadcast;
use tokio::sync::mpsc;
use tokio::sync::watch;
use tracing::{debug, error, info};

use crate::engine::{CoreCommand, PipelineCore, PipelineEvent, ReloadCause, StepOutcome};
use crate::errors::Result;
use crate::exec::StepExecutor;
use crate::pipeline::{ScheduledStep, StepId};

/// What happened over the lifetime of one runtime loop.
///
/// Callers map this onto an exit code: `build` mirrors the generator's exit
/// code, `serve` distinguishes a Ctrl-C stop from a generator crash.
#[derive(Debug, Default)]
pub struct RunReport {
    /// Steps that reported failure.
    pub failed: Vec<StepId>,
    /// Exit code of the site generator, if it ran (0 on success).
    pub generator_exit: Option<i32>,
    /// The loop ended because shutdown was requested.
    pub interrupted: bool,
}

impl RunReport {
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Serve-session wiring handed to the runtime.
///
/// Present only for `serve`; one-shot commands run without it.
pub struct SessionHooks {
    /// Fan-out to connected live-reload clients.
    pub reload_tx: broadcast::Sender<ReloadCause>,
    /// Signals the HTTP server to drain when the loop ends.
    pub shutdown_tx: watch::Sender<bool>,
    /// Invoked once when the generator reports its first completed build
    /// (used to open the browser).
    pub on_ready: Option<Box<dyn FnOnce() + Send>>,
}

/// Drives the step scheduler in response to `PipelineEvent`s and delegates
/// execution to a [`StepExecutor`].
///
/// This is an IO shell around [`PipelineCore`], which owns the scheduling
/// semantics. The shell reads events from the channel, dispatches ready
/// steps, records the run report and performs serve-session side effects.
pub struct Runtime<E: StepExecutor> {
    core: PipelineCore,
    event_rx: mpsc::Receiver<PipelineEvent>,
    executor: E,
    session: Option<SessionHooks>,
    report: RunReport,
}

impl<E: StepExecutor> fmt::Debug for Runtime<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

impl<E: StepExecutor> Runtime<E> {
    pub fn new(core: PipelineCore, event_rx: mpsc::Receiver<PipelineEvent>, executor: E) -> Self {
        Self {
            core,
            event_rx,
            executor,
            session: None,
            report: RunReport::default(),
        }
    }

    /// Attach serve-session hooks.
    pub fn with_session(mut self, hooks: SessionHooks) -> Self {
        self.session = Some(hooks);
        self
    }

    /// Main event loop.
    ///
    /// - Consumes `PipelineEvent`s from `event_rx`.
    /// - Records completions into the run report and performs session side
    ///   effects.
    /// - Feeds scheduling events into the core and executes the commands it
    ///   returns.
    pub async fn run(mut self) -> Result<RunReport> {
        info!("pipeline runtime started");

        loop {
            let event = match self.event_rx.recv().await {
                Some(e) => e,
                None => {
                    info!("runtime event channel closed; exiting");
                    break;
                }
            };

            debug!(?event, "runtime received event");

            self.observe(&event);

            let step = self.core.step(event);

            for command in step.commands {
                self.execute_command(command).await?;
            }

            if !step.keep_running {
                info!("core requested exit; stopping runtime");
                break;
            }
        }

        // Drain the HTTP server (if any) before handing the report back.
        if let Some(hooks) = &self.session {
            let _ = hooks.shutdown_tx.send(true);
        }

        info!("runtime exiting");
        Ok(self.report)
    }

    /// Record an event into the run report and perform session side effects.
    ///
    /// Scheduling decisions stay in the core; everything here is
    /// reporting or session IO.
    fn observe(&mut self, event: &PipelineEvent) {
        match event {
            PipelineEvent::StepCompleted { step, outcome } => match outcome {
                StepOutcome::Success => {
                    if *step == StepId::GenerateSite {
                        self.report.generator_exit = Some(0);
                    }
                    if *step == StepId::Styles {
                        if let Some(hooks) = &self.session {
                            info!("stylesheets rebuilt; notifying connected clients");
                            let _ = hooks.reload_tx.send(ReloadCause::Stylesheets);
                        }
                    }
                }
                StepOutcome::Failed(code) => {
                    self.report.failed.push(*step);
                    if *step == StepId::GenerateSite {
                        self.report.generator_exit = Some(*code);
                    }
                }
            },
            PipelineEvent::ReloadRequested { cause } => {
                if let Some(hooks) = &self.session {
                    debug!(?cause, "reload requested");
                    let _ = hooks.reload_tx.send(*cause);
                }
            }
            PipelineEvent::GeneratorReady => {
                info!("site generator finished its first build");
                if let Some(hooks) = &mut self.session {
                    if let Some(on_ready) = hooks.on_ready.take() {
                        on_ready();
                    }
                }
            }
            PipelineEvent::GeneratorExited { code } => {
                error!(
                    exit_code = code,
                    "site generator exited; tearing down the session"
                );
                self.report.generator_exit = Some(*code);
            }
            PipelineEvent::ShutdownRequested => {
                info!("shutdown requested");
                self.report.interrupted = true;
            }
            PipelineEvent::StepTriggered { .. } => {}
        }
    }

    /// Execute a single command from the core.
    async fn execute_command(&mut self, command: CoreCommand) -> Result<()> {
        match command {
            CoreCommand::DispatchSteps(steps) => {
                self.spawn_ready(steps).await?;
            }
            CoreCommand::RequestExit => {
                // The core also returns keep_running=false in this case; the
                // command only exists so the decision is visible in tests.
                debug!("core issued RequestExit command");
            }
        }
        Ok(())
    }

    async fn spawn_ready(&mut self, steps: Vec<ScheduledStep>) -> Result<()> {
        if steps.is_empty() {
            return Ok(());
        }

        let ids: Vec<_> = steps.iter().map(|s| s.id).collect();
        let run_ids: Vec<_> = steps.iter().map(|s| s.run_id).collect();
        debug!(?ids, ?run_ids, "spawning ready steps");

        self.executor.spawn_ready_steps(steps).await
    }
}
