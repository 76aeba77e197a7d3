// src/tasks/generator.rs

//! Site generator invocation.
//!
//! Two modes of the same external binary: a one-shot `build --trace` whose
//! exit code the caller mirrors, and a long-lived
//! `build --watch --incremental --drafts` used by serve sessions. Both
//! stream their output through the bounded line channel into the log,
//! tagged with the generator command; watch mode additionally matches
//! stdout against the configured ready pattern to announce the first
//! completed build.

use std::process::Stdio;

use regex::Regex;
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::config::ConfigFile;
use crate::engine::PipelineEvent;
use crate::errors::{Result, SitepipeError};
use crate::tasks::output::{self, LogLine, StdStream};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorMode {
    OneShot,
    Watch,
}

impl GeneratorMode {
    fn args(self) -> &'static [&'static str] {
        match self {
            GeneratorMode::OneShot => &["build", "--trace"],
            GeneratorMode::Watch => &["build", "--watch", "--incremental", "--drafts"],
        }
    }
}

/// Run the generator once and return its exit code.
///
/// A non-zero code is a result, not an error; `build` mirrors it as the
/// process exit code.
pub async fn run_one_shot(config: &ConfigFile) -> Result<i32> {
    let command = config.generator.command.clone();
    info!(cmd = %command, args = ?GeneratorMode::OneShot.args(), "generating site");

    let mut child = spawn_generator(config, GeneratorMode::OneShot)?;
    let mut lines = output::pump_lines(&mut child);
    while let Some(line) = lines.recv().await {
        log_line(&command, &line);
    }

    let status = child
        .wait()
        .await
        .map_err(|e| SitepipeError::Generator(format!("waiting for '{command}': {e}")))?;
    let code = status.code().unwrap_or(-1);
    if status.success() {
        info!(cmd = %command, "site generated");
    } else {
        error!(cmd = %command, exit_code = code, "site generator failed");
    }
    Ok(code)
}

/// A running watch-mode generator. Dropping the handle aborts the log
/// consumer, which drops the kill-on-drop child.
#[derive(Debug)]
pub struct GeneratorHandle {
    task: JoinHandle<()>,
}

impl Drop for GeneratorHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Start the generator in watch mode.
///
/// The consumer task logs every line, emits [`PipelineEvent::GeneratorReady`]
/// on the first stdout line matching `generator.ready_pattern`, and emits
/// [`PipelineEvent::GeneratorExited`] if the child terminates on its own.
pub fn spawn_watch(
    config: &ConfigFile,
    events_tx: mpsc::Sender<PipelineEvent>,
) -> Result<GeneratorHandle> {
    let command = config.generator.command.clone();
    let ready = Regex::new(&config.generator.ready_pattern)
        .map_err(|e| SitepipeError::Config(format!("invalid generator ready pattern: {e}")))?;

    let mut child = spawn_generator(config, GeneratorMode::Watch)?;
    let mut lines = output::pump_lines(&mut child);
    info!(cmd = %command, args = ?GeneratorMode::Watch.args(), "site generator watching");

    let task = tokio::spawn(async move {
        let mut ready_seen = false;
        while let Some(line) = lines.recv().await {
            log_line(&command, &line);
            if !ready_seen && line.stream == StdStream::Stdout && ready.is_match(&line.text) {
                ready_seen = true;
                let _ = events_tx.send(PipelineEvent::GeneratorReady).await;
            }
        }

        // Line channel closed: both pipes hit EOF, the child is done.
        let code = match child.wait().await {
            Ok(status) => status.code().unwrap_or(-1),
            Err(e) => {
                warn!(cmd = %command, error = %e, "failed to reap site generator");
                -1
            }
        };
        let _ = events_tx.send(PipelineEvent::GeneratorExited { code }).await;
    });

    Ok(GeneratorHandle { task })
}

fn spawn_generator(config: &ConfigFile, mode: GeneratorMode) -> Result<Child> {
    let command = config.generator.command.as_str();
    let mut cmd = Command::new(command);
    cmd.args(mode.args())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    cmd.spawn()
        .map_err(|e| SitepipeError::Generator(format!("spawning '{command}': {e}")))
}

fn log_line(command: &str, line: &LogLine) {
    match line.stream {
        StdStream::Stdout => info!(cmd = %command, "{}", line.text),
        StdStream::Stderr => warn!(cmd = %command, "{}", line.text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_flag_sets() {
        assert_eq!(GeneratorMode::OneShot.args(), ["build", "--trace"]);
        assert_eq!(
            GeneratorMode::Watch.args(),
            ["build", "--watch", "--incremental", "--drafts"]
        );
    }

    #[test]
    fn default_ready_pattern_matches_generator_output() {
        let cfg = ConfigFile::default();
        let re = Regex::new(&cfg.generator.ready_pattern).unwrap();
        assert!(re.is_match("                    done in 2.85 seconds."));
        assert!(!re.is_match("Regenerating: 1 file(s) changed"));
    }
}
