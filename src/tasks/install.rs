// src/tasks/install.rs

//! Vendor package installation and stylesheet relocation.
//!
//! Three steps, run in order by the `install-dependencies` plan after
//! `clean`: shell out to the package manager, copy vendor stylesheets into
//! the style source tree, and rename the normalization stylesheet into an
//! import-eligible partial.

use std::fs;
use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::ConfigFile;
use crate::errors::{Result, SitepipeError};
use crate::tasks::output::{self, StdStream};

/// Run the configured package-manager install command through the platform
/// shell, streaming every output line into the log.
///
/// The manifest is the command's business (it reads it itself); a non-zero
/// exit is a fatal install error.
pub async fn install_packages(config: &ConfigFile) -> Result<()> {
    let command = config.vendor.install_command.as_str();
    info!(cmd = %command, "installing vendor packages");

    let mut cmd = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(command);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(command);
        c
    };
    cmd.stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd
        .spawn()
        .map_err(|e| SitepipeError::Install(format!("spawning '{command}': {e}")))?;

    let mut lines = output::pump_lines(&mut child);
    while let Some(line) = lines.recv().await {
        match line.stream {
            StdStream::Stdout => info!(cmd = %command, "{}", line.text),
            StdStream::Stderr => warn!(cmd = %command, "{}", line.text),
        }
    }

    let status = child.wait().await?;
    if !status.success() {
        return Err(SitepipeError::Install(format!(
            "'{}' exited with code {}",
            command,
            status.code().unwrap_or(-1)
        )));
    }
    info!(cmd = %command, "vendor packages installed");
    Ok(())
}

/// Copy every `.css`/`.scss` file out of the vendor package tree into
/// `vendor.style_dest`, preserving the package-relative path.
///
/// Re-running overwrites existing copies, so the step is idempotent.
pub fn relocate_vendor_styles(config: &ConfigFile) -> Result<()> {
    let package_dir = Path::new(&config.vendor.package_dir);
    let dest_root = Path::new(&config.vendor.style_dest);

    if !package_dir.is_dir() {
        return Err(SitepipeError::MissingPath(package_dir.to_path_buf()));
    }

    let mut copied = 0usize;
    for entry in WalkDir::new(package_dir).into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() || !is_stylesheet(entry.path()) {
            continue;
        }
        let Ok(rel) = entry.path().strip_prefix(package_dir) else {
            continue;
        };
        let dest = dest_root.join(rel);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(entry.path(), &dest)?;
        debug!(to = %dest.display(), "relocated vendor stylesheet");
        copied += 1;
    }

    info!(copied, dest = %dest_root.display(), "vendor stylesheets relocated");
    Ok(())
}

fn is_stylesheet(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("css" | "scss")
    )
}

/// Turn the relocated normalization stylesheet into an import-eligible
/// partial: `<style_dest>/<normalize_package>/normalize.css` becomes
/// `_normalize.scss` in the same directory, and the original goes away.
///
/// Behavior by (source, target) presence: only the source — rename it; both
/// — the rename refreshes the target and drops the source; only the target
/// — an earlier run already did the work, log and no-op; neither — the
/// package was never relocated, which is an error.
pub fn normalize_vendor_stylesheet(config: &ConfigFile) -> Result<()> {
    let package_root =
        Path::new(&config.vendor.style_dest).join(&config.vendor.normalize_package);
    let source = package_root.join("normalize.css");
    let target = package_root.join("_normalize.scss");

    match (source.is_file(), target.is_file()) {
        (true, _) => {
            fs::rename(&source, &target)?;
            info!(target = %target.display(), "vendor stylesheet normalized");
            Ok(())
        }
        (false, true) => {
            debug!(target = %target.display(), "vendor stylesheet already normalized");
            Ok(())
        }
        (false, false) => Err(SitepipeError::MissingPath(source)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stylesheet_extensions() {
        assert!(is_stylesheet(Path::new("pkg/normalize.css")));
        assert!(is_stylesheet(Path::new("pkg/lib/_mixins.scss")));
        assert!(!is_stylesheet(Path::new("pkg/index.js")));
        assert!(!is_stylesheet(Path::new("pkg/README")));
    }
}
