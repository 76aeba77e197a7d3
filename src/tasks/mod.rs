// src/tasks/mod.rs

//! Implementations of the individual pipeline steps.
//!
//! Each submodule owns one concern: cleaning vendor artifacts, installing
//! and relocating third-party packages, compiling stylesheets, optimizing
//! images, and driving the site generator. All functions take the loaded
//! [`ConfigFile`](crate::config::ConfigFile) rather than reaching into
//! process-global state.

use std::sync::Arc;

use crate::config::ConfigFile;

pub mod clean;
pub mod generator;
pub mod images;
pub mod install;
pub mod output;
pub mod stamps;
pub mod styles;

/// Shared inputs handed to every step execution.
///
/// Built once per pipeline invocation and cloned behind an `Arc` into the
/// executor, so concurrently running steps read the same immutable config.
#[derive(Debug)]
pub struct TaskContext {
    pub config: Arc<ConfigFile>,
    /// Whether stylesheet output should be minified (`build --no-minify`
    /// turns this off; `serve` leaves it on to mirror a production build).
    pub minify: bool,
}

impl TaskContext {
    pub fn new(config: Arc<ConfigFile>, minify: bool) -> Self {
        Self { config, minify }
    }
}
