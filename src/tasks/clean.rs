// src/tasks/clean.rs

//! Removal of installed vendor artifacts.
//!
//! Sweeps the configured clean globs (relocated vendor stylesheets inside
//! the source tree) and deletes the package manager's install directory.
//! Running it twice is the same as running it once: paths that are already
//! gone are not an error.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::config::ConfigFile;
use crate::errors::{Result, SitepipeError};

/// Delete everything matching `vendor.clean_globs`, then the vendor package
/// directory itself.
pub fn remove_vendor_artifacts(config: &ConfigFile) -> Result<()> {
    let globs = &config.vendor.clean_globs;
    let set = build_glob_set(globs)?;

    let mut removed = 0usize;
    for root in walk_roots(globs) {
        removed += sweep_tree(&root, &set)?;
    }

    let package_dir = Path::new(&config.vendor.package_dir);
    let package_removed = remove_dir_all_quiet(package_dir)?;
    if package_removed {
        debug!(dir = %package_dir.display(), "removed vendor package directory");
    }

    info!(
        swept = removed,
        package_dir_removed = package_removed,
        "vendor artifacts cleaned"
    );
    Ok(())
}

fn build_glob_set(globs: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in globs {
        let glob = GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()
            .map_err(|e| {
                SitepipeError::Config(format!("invalid clean glob '{pattern}': {e}"))
            })?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| SitepipeError::Config(format!("building clean glob set: {e}")))
}

/// Literal directory prefixes of the globs, so the sweep never walks
/// unrelated trees (the module directory in particular can be enormous).
fn walk_roots(globs: &[String]) -> Vec<PathBuf> {
    let mut roots: Vec<PathBuf> = Vec::new();
    for pattern in globs {
        let literal_end = pattern
            .find(['*', '?', '[', '{'])
            .unwrap_or(pattern.len());
        let root = match pattern[..literal_end].rfind('/') {
            Some(slash) => PathBuf::from(&pattern[..slash]),
            None => PathBuf::from("."),
        };
        if !roots.contains(&root) {
            roots.push(root);
        }
    }
    roots
}

/// Walk `root` contents-first and remove every match. Children come before
/// their parents, so a matched directory is empty (or already gone) by the
/// time it is removed.
fn sweep_tree(root: &Path, set: &GlobSet) -> Result<usize> {
    if !root.exists() {
        return Ok(0);
    }

    let mut removed = 0usize;
    for entry in WalkDir::new(root)
        .contents_first(true)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !set.is_match(path) {
            continue;
        }
        let gone = if entry.file_type().is_dir() {
            remove_dir_all_quiet(path)?
        } else {
            remove_file_quiet(path)?
        };
        if gone {
            debug!(path = %path.display(), "removed");
            removed += 1;
        }
    }
    Ok(removed)
}

fn remove_file_quiet(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

fn remove_dir_all_quiet(path: &Path) -> Result<bool> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walk_roots_stop_at_first_metacharacter() {
        let globs = vec![
            "_dev/**/vendors/**/*".to_string(),
            "_dev/scss/vendors/*.css".to_string(),
            "*.tmp".to_string(),
        ];
        let roots = walk_roots(&globs);
        assert_eq!(
            roots,
            vec![
                PathBuf::from("_dev"),
                PathBuf::from("_dev/scss/vendors"),
                PathBuf::from("."),
            ]
        );
    }

    #[test]
    fn sweep_matches_nested_files_and_directories() {
        let tmp = tempfile::tempdir().unwrap();
        let vendors = tmp.path().join("scss/vendors/pkg");
        fs::create_dir_all(&vendors).unwrap();
        fs::write(vendors.join("a.css"), "a").unwrap();
        fs::write(tmp.path().join("scss/keep.scss"), "keep").unwrap();

        let pattern = format!("{}/**/vendors/**/*", tmp.path().display());
        let set = build_glob_set(&[pattern]).unwrap();
        let removed = sweep_tree(tmp.path(), &set).unwrap();

        // a.css and the pkg directory match; keep.scss and vendors/ do not.
        assert_eq!(removed, 2);
        assert!(tmp.path().join("scss/keep.scss").exists());
        assert!(tmp.path().join("scss/vendors").exists());
        assert!(!vendors.exists());
    }
}
