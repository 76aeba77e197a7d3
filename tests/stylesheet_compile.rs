// tests/stylesheet_compile.rs

//! Runs the style task against a stand-in compiler script, so the tests
//! exercise the spawn/capture/minify/write path without a sass toolchain.

#![cfg(unix)]

mod common;
use crate::common::{config_under, init_tracing};

use std::error::Error;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use tempfile::TempDir;

use sitepipe::errors::SitepipeError;
use sitepipe::tasks::styles::build_styles;

type TestResult = Result<(), Box<dyn Error>>;

fn write_script(path: &Path, body: &str) -> TestResult {
    fs::write(path, body)?;
    let mut perms = fs::metadata(path)?.permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms)?;
    Ok(())
}

fn touch(path: &Path, contents: &str) -> TestResult {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents)?;
    Ok(())
}

#[tokio::test]
async fn compiles_and_minifies_into_the_output_dir() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;
    let root = dir.path();
    let mut cfg = config_under(root);

    touch(&root.join("_dev/scss/main.scss"), "// handled by the script")?;
    let compiler = root.join("fake-sass");
    write_script(&compiler, "#!/bin/sh\nprintf 'body { color: #ffffff; }\\n'\n")?;
    cfg.styles.compiler = compiler.to_string_lossy().into_owned();

    build_styles(&cfg, true).await?;

    let css = fs::read_to_string(root.join("assets/css/main.css"))?;
    assert_eq!(css, "body{color:#fff}");
    Ok(())
}

#[tokio::test]
async fn skipping_minification_keeps_the_compiler_output() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;
    let root = dir.path();
    let mut cfg = config_under(root);

    touch(&root.join("_dev/scss/main.scss"), "")?;
    let compiler = root.join("fake-sass");
    write_script(&compiler, "#!/bin/sh\nprintf 'body { color: #ffffff; }\\n'\n")?;
    cfg.styles.compiler = compiler.to_string_lossy().into_owned();

    build_styles(&cfg, false).await?;

    let css = fs::read_to_string(root.join("assets/css/main.css"))?;
    assert!(css.contains("#ffffff"));
    Ok(())
}

#[tokio::test]
async fn compiler_failure_surfaces_its_stderr() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;
    let root = dir.path();
    let mut cfg = config_under(root);

    touch(&root.join("_dev/scss/main.scss"), "")?;
    let compiler = root.join("fake-sass");
    write_script(
        &compiler,
        "#!/bin/sh\necho 'Error: Undefined variable $accent' >&2\nexit 65\n",
    )?;
    cfg.styles.compiler = compiler.to_string_lossy().into_owned();

    let err = build_styles(&cfg, true).await.unwrap_err();
    match err {
        SitepipeError::StyleCompile(msg) => assert!(msg.contains("Undefined variable")),
        other => panic!("expected StyleCompile, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn missing_entry_is_an_error() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let cfg = config_under(dir.path());

    let err = build_styles(&cfg, true).await.unwrap_err();
    assert!(matches!(err, SitepipeError::MissingPath(_)));
}
