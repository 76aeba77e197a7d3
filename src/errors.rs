// src/errors.rs

//! Crate-wide error type and `Result` alias.
//!
//! Task-level failures get their own variants so composite commands can
//! classify them (a stylesheet compile error is survivable in a serve
//! session, fatal in a one-shot build); everything else flows through the
//! `Io`/`Toml`/`Other` conversions.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SitepipeError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configured path does not exist: {}", .0.display())]
    MissingPath(PathBuf),

    #[error("Package install failed: {0}")]
    Install(String),

    #[error("Stylesheet compilation failed: {0}")]
    StyleCompile(String),

    #[error("Site generator failure: {0}")]
    Generator(String),

    #[error("Cycle detected in step plan: {0}")]
    PlanCycle(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, SitepipeError>;
