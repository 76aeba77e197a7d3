// tests/clean_idempotence.rs

mod common;
use crate::common::{config_under, init_tracing};

use std::error::Error;
use std::fs;

use tempfile::TempDir;

use sitepipe::tasks::clean::remove_vendor_artifacts;

type TestResult = Result<(), Box<dyn Error>>;

fn touch(path: &std::path::Path, contents: &str) -> TestResult {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents)?;
    Ok(())
}

#[test]
fn clean_removes_vendor_artifacts_and_spares_sources() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;
    let root = dir.path();
    let cfg = config_under(root);

    touch(&root.join("_dev/scss/main.scss"), "@import 'x';")?;
    touch(&root.join("_dev/scss/vendors/_normalize.scss"), "html{}")?;
    touch(&root.join("_dev/scss/vendors/bootstrap/grid.css"), ".row{}")?;
    touch(&root.join("bower_components/bootstrap/bower.json"), "{}")?;

    remove_vendor_artifacts(&cfg)?;

    // Hand-written sources survive; relocated vendor trees and the package
    // directory do not.
    assert!(root.join("_dev/scss/main.scss").is_file());
    assert!(!root.join("_dev/scss/vendors/_normalize.scss").exists());
    assert!(!root.join("_dev/scss/vendors/bootstrap").exists());
    assert!(!root.join("bower_components").exists());
    Ok(())
}

#[test]
fn clean_twice_is_a_no_op() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;
    let root = dir.path();
    let cfg = config_under(root);

    touch(&root.join("_dev/scss/main.scss"), "body{}")?;
    touch(&root.join("_dev/scss/vendors/pkg/a.css"), "a{}")?;
    touch(&root.join("bower_components/pkg/a.css"), "a{}")?;

    remove_vendor_artifacts(&cfg)?;
    // Nothing left to sweep; the second pass must still succeed.
    remove_vendor_artifacts(&cfg)?;

    assert!(root.join("_dev/scss/main.scss").is_file());
    assert!(!root.join("bower_components").exists());
    Ok(())
}

#[test]
fn clean_on_a_bare_tree_succeeds() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;
    let cfg = config_under(dir.path());

    // No sources, no vendors, no package dir: still fine.
    remove_vendor_artifacts(&cfg)?;
    Ok(())
}
