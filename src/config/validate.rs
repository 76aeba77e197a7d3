// src/config/validate.rs

//! Semantic validation of a deserialized [`ConfigFile`].
//!
//! The checks here enforce the invariants the rest of the pipeline assumes:
//! a single output root shared by generator and server, disjoint output
//! subpaths for concurrent writers, and a stylesheet source tree the watcher
//! can actually observe.

use std::path::Path;

use globset::Glob;
use regex::Regex;

use crate::config::model::ConfigFile;
use crate::errors::{Result, SitepipeError};

pub fn validate_config(cfg: &ConfigFile) -> Result<()> {
    validate_commands(cfg)?;
    validate_output_roots(cfg)?;
    validate_output_disjointness(cfg)?;
    validate_style_tree(cfg)?;
    validate_site_output(cfg)?;
    validate_globs(cfg)?;
    validate_patterns(cfg)?;
    validate_numbers(cfg)?;
    Ok(())
}

fn validate_commands(cfg: &ConfigFile) -> Result<()> {
    for (field, value) in [
        ("[styles].compiler", &cfg.styles.compiler),
        ("[vendor].install_command", &cfg.vendor.install_command),
        ("[generator].command", &cfg.generator.command),
    ] {
        if value.trim().is_empty() {
            return Err(SitepipeError::Config(format!(
                "{field} must not be empty"
            )));
        }
    }
    Ok(())
}

/// Every asset category writes under the single output root, so the site
/// generator and the dev server agree on one served directory.
fn validate_output_roots(cfg: &ConfigFile) -> Result<()> {
    let root = Path::new(&cfg.paths.output_root);

    for (field, dir) in [
        ("[styles].output_dir", &cfg.styles.output_dir),
        ("[images].output_dir", &cfg.images.output_dir),
        ("[fonts].output_dir", &cfg.fonts.output_dir),
    ] {
        if !Path::new(dir).starts_with(root) {
            return Err(SitepipeError::Config(format!(
                "{field} ('{dir}') must resolve under [paths].output_root ('{}')",
                cfg.paths.output_root
            )));
        }
    }
    Ok(())
}

/// The stylesheet, image and font outputs are written concurrently with no
/// locking; that is only sound because the subpaths are disjoint.
fn validate_output_disjointness(cfg: &ConfigFile) -> Result<()> {
    let outputs = [
        ("[styles].output_dir", &cfg.styles.output_dir),
        ("[images].output_dir", &cfg.images.output_dir),
        ("[fonts].output_dir", &cfg.fonts.output_dir),
    ];

    for (i, (field_a, a)) in outputs.iter().enumerate() {
        for (field_b, b) in outputs.iter().skip(i + 1) {
            let pa = Path::new(a.as_str());
            let pb = Path::new(b.as_str());
            if pa.starts_with(pb) || pb.starts_with(pa) {
                return Err(SitepipeError::Config(format!(
                    "{field_a} ('{a}') and {field_b} ('{b}') must be disjoint"
                )));
            }
        }
    }
    Ok(())
}

fn validate_style_tree(cfg: &ConfigFile) -> Result<()> {
    let entry = Path::new(&cfg.styles.entry);
    let source_dir = Path::new(&cfg.styles.source_dir);

    // The watcher observes `source_dir`; an entry outside it would compile
    // but never trigger a rebuild.
    if !entry.starts_with(source_dir) {
        return Err(SitepipeError::Config(format!(
            "[styles].entry ('{}') must live under [styles].source_dir ('{}')",
            cfg.styles.entry, cfg.styles.source_dir
        )));
    }

    // Compiled output landing inside the watched source tree would retrigger
    // the compile forever.
    if source_dir.starts_with(Path::new(&cfg.paths.output_root)) {
        return Err(SitepipeError::Config(format!(
            "[styles].source_dir ('{}') must not be under [paths].output_root ('{}')",
            cfg.styles.source_dir, cfg.paths.output_root
        )));
    }

    Ok(())
}

fn validate_site_output(cfg: &ConfigFile) -> Result<()> {
    let site = Path::new(&cfg.paths.site_output);
    let out = Path::new(&cfg.paths.output_root);

    if site.starts_with(out) || out.starts_with(site) {
        return Err(SitepipeError::Config(format!(
            "[paths].site_output ('{}') and [paths].output_root ('{}') must be disjoint",
            cfg.paths.site_output, cfg.paths.output_root
        )));
    }
    Ok(())
}

fn validate_globs(cfg: &ConfigFile) -> Result<()> {
    for (field, globs) in [
        ("[vendor].clean_globs", &cfg.vendor.clean_globs),
        ("[paths].markup_globs", &cfg.paths.markup_globs),
    ] {
        for pattern in globs {
            Glob::new(pattern).map_err(|e| {
                SitepipeError::Config(format!("invalid glob in {field}: '{pattern}': {e}"))
            })?;
        }
    }
    Ok(())
}

fn validate_patterns(cfg: &ConfigFile) -> Result<()> {
    Regex::new(&cfg.generator.ready_pattern).map_err(|e| {
        SitepipeError::Config(format!(
            "invalid regex in [generator].ready_pattern: '{}': {e}",
            cfg.generator.ready_pattern
        ))
    })?;
    Ok(())
}

fn validate_numbers(cfg: &ConfigFile) -> Result<()> {
    if cfg.images.jpeg_quality == 0 || cfg.images.jpeg_quality > 100 {
        return Err(SitepipeError::Config(format!(
            "[images].jpeg_quality must be in 1..=100 (got {})",
            cfg.images.jpeg_quality
        )));
    }
    if cfg.serve.debounce_ms == 0 {
        return Err(SitepipeError::Config(
            "[serve].debounce_ms must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}
