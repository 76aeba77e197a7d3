// tests/config_validation.rs

mod common;
use crate::common::init_tracing;

use std::error::Error;
use std::fs;

use tempfile::TempDir;

use sitepipe::config::{ConfigFile, load_and_validate};
use sitepipe::config::validate::validate_config;
use sitepipe::errors::SitepipeError;

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn builtin_defaults_pass_validation() {
    init_tracing();
    validate_config(&ConfigFile::default()).unwrap();
}

#[test]
fn explicitly_named_missing_file_is_an_error() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nope.toml");

    let err = load_and_validate(&path).unwrap_err();
    assert!(matches!(err, SitepipeError::Config(_)));
}

#[test]
fn overrides_merge_with_defaults() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;
    let path = dir.path().join("Sitepipe.toml");
    fs::write(
        &path,
        r#"
[serve]
port = 4000

[images]
jpeg_quality = 60
"#,
    )?;

    let cfg = load_and_validate(&path)?;
    assert_eq!(cfg.serve.port, 4000);
    assert_eq!(cfg.images.jpeg_quality, 60);
    // Untouched sections keep their defaults.
    assert_eq!(cfg.styles.entry, "_dev/scss/main.scss");
    assert_eq!(cfg.vendor.package_dir, "bower_components");
    Ok(())
}

#[test]
fn malformed_toml_is_reported_as_such() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;
    let path = dir.path().join("Sitepipe.toml");
    fs::write(&path, "[serve\nport = oops")?;

    let err = load_and_validate(&path).unwrap_err();
    assert!(matches!(err, SitepipeError::Toml(_)));
    Ok(())
}

#[test]
fn style_entry_outside_source_tree_is_rejected() {
    init_tracing();
    let mut cfg = ConfigFile::default();
    cfg.styles.entry = "other/main.scss".to_string();

    let err = validate_config(&cfg).unwrap_err();
    assert!(err.to_string().contains("[styles].entry"));
}

#[test]
fn style_sources_under_the_output_root_are_rejected() {
    // Compiled CSS landing in the watched tree would retrigger forever.
    init_tracing();
    let mut cfg = ConfigFile::default();
    cfg.styles.source_dir = "assets/scss".to_string();
    cfg.styles.entry = "assets/scss/main.scss".to_string();

    let err = validate_config(&cfg).unwrap_err();
    assert!(err.to_string().contains("[styles].source_dir"));
}

#[test]
fn overlapping_asset_outputs_are_rejected() {
    init_tracing();
    let mut cfg = ConfigFile::default();
    cfg.images.output_dir = "assets/css/images".to_string();

    let err = validate_config(&cfg).unwrap_err();
    assert!(err.to_string().contains("must be disjoint"));
}

#[test]
fn site_output_nested_in_asset_output_is_rejected() {
    init_tracing();
    let mut cfg = ConfigFile::default();
    cfg.paths.site_output = "assets/_site".to_string();

    let err = validate_config(&cfg).unwrap_err();
    assert!(err.to_string().contains("[paths].site_output"));
}

#[test]
fn asset_output_outside_the_output_root_is_rejected() {
    init_tracing();
    let mut cfg = ConfigFile::default();
    cfg.fonts.output_dir = "static/fonts".to_string();

    let err = validate_config(&cfg).unwrap_err();
    assert!(err.to_string().contains("[fonts].output_dir"));
}

#[test]
fn degenerate_numbers_are_rejected() {
    init_tracing();

    let mut cfg = ConfigFile::default();
    cfg.images.jpeg_quality = 0;
    assert!(validate_config(&cfg).is_err());

    let mut cfg = ConfigFile::default();
    cfg.images.jpeg_quality = 101;
    assert!(validate_config(&cfg).is_err());

    let mut cfg = ConfigFile::default();
    cfg.serve.debounce_ms = 0;
    assert!(validate_config(&cfg).is_err());
}

#[test]
fn empty_commands_are_rejected() {
    init_tracing();
    let mut cfg = ConfigFile::default();
    cfg.generator.command = "  ".to_string();

    let err = validate_config(&cfg).unwrap_err();
    assert!(err.to_string().contains("[generator].command"));
}

#[test]
fn broken_ready_pattern_is_rejected() {
    init_tracing();
    let mut cfg = ConfigFile::default();
    cfg.generator.ready_pattern = "done in [".to_string();

    let err = validate_config(&cfg).unwrap_err();
    assert!(err.to_string().contains("ready_pattern"));
}

#[test]
fn broken_clean_glob_is_rejected() {
    init_tracing();
    let mut cfg = ConfigFile::default();
    cfg.vendor.clean_globs = vec!["_dev/[".to_string()];

    let err = validate_config(&cfg).unwrap_err();
    assert!(err.to_string().contains("clean_globs"));
}
