// src/serve/mod.rs

//! The serve session.
//!
//! Wires together everything `serve` runs after the initial asset build:
//! the development HTTP server over the generator output, the watch-mode
//! generator process, the filesystem watcher, and the runtime loop that
//! reacts to their events. The session ends on Ctrl-C or when the
//! generator process dies.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tracing::{info, warn};

use crate::config::ConfigFile;
use crate::engine::{PipelineCore, PipelineEvent, Runtime, RuntimeOptions, RunReport, SessionHooks};
use crate::errors::Result;
use crate::exec::TaskExecutor;
use crate::pipeline::{Plan, Scheduler};
use crate::tasks::{TaskContext, generator};

pub mod reload;
pub mod server;

pub use reload::{LIVERELOAD_SCRIPT, ReloadHub, ReloadMessage};

/// Per-invocation overrides for a serve session.
#[derive(Debug, Clone, Copy)]
pub struct SessionOptions {
    pub port: u16,
    pub open_browser: bool,
}

/// Run a serve session until interrupted or the generator dies.
///
/// Assumes the initial asset build already ran; the session only rebuilds
/// on watch triggers. The returned report carries how the session ended.
pub async fn run_session(config: Arc<ConfigFile>, options: SessionOptions) -> Result<RunReport> {
    let (events_tx, events_rx) = mpsc::channel::<PipelineEvent>(64);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let hub = ReloadHub::new();

    // HTTP server over the generator output.
    let listener = server::bind_with_retry(&config.serve.interface, options.port).await?;
    let addr = listener.local_addr()?;
    let url = format!("http://{addr}");
    info!(url = %url, site = %config.paths.site_output, "development server listening");

    let router = server::router(Path::new(&config.paths.site_output), hub.clone());
    let server_task = tokio::spawn(server::serve_until(listener, router, shutdown_rx));

    // Long-lived generator; its first watch-mode build produces the site.
    let generator_handle = generator::spawn_watch(&config, events_tx.clone())?;

    // Watcher over the project root.
    let routes = crate::watch::build_routes(&config)?;
    let watcher_handle = crate::watch::spawn_watcher(
        ".",
        routes,
        events_tx.clone(),
        Duration::from_millis(config.serve.debounce_ms),
    )?;

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

    // Runtime over the asset plan; stays alive between runs.
    let ctx = Arc::new(TaskContext::new(Arc::clone(&config), config.build.minify));
    let executor = TaskExecutor::new(ctx, events_tx.clone());
    let scheduler = Scheduler::from_plan(&Plan::assets())?;
    let core = PipelineCore::new(
        scheduler,
        RuntimeOptions {
            exit_when_idle: false,
        },
    );

    let on_ready: Option<Box<dyn FnOnce() + Send>> = if options.open_browser {
        let url = url.clone();
        Some(Box::new(move || {
            info!(url = %url, "opening browser");
            if let Err(e) = open::that(&url) {
                warn!(error = %e, "failed to open browser");
            }
        }))
    } else {
        None
    };

    let hooks = SessionHooks {
        reload_tx: hub.sender(),
        shutdown_tx,
        on_ready,
    };

    let report = Runtime::new(core, events_rx, executor)
        .with_session(hooks)
        .run()
        .await?;

    // Loop is done: reap the children and wait for the server to drain.
    drop(watcher_handle);
    drop(generator_handle);
    match server_task.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!(error = %e, "development server ended with an error"),
        Err(e) => warn!(error = %e, "development server task failed"),
    }

    info!("serve session ended");
    Ok(report)
}
