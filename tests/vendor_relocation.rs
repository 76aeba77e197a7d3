// tests/vendor_relocation.rs

mod common;
use crate::common::{config_under, init_tracing};

use std::error::Error;
use std::fs;
use std::path::Path;

use tempfile::TempDir;

use sitepipe::errors::SitepipeError;
use sitepipe::tasks::install::{normalize_vendor_stylesheet, relocate_vendor_styles};

type TestResult = Result<(), Box<dyn Error>>;

fn touch(path: &Path, contents: &str) -> TestResult {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents)?;
    Ok(())
}

#[test]
fn relocation_copies_stylesheets_and_keeps_structure() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;
    let root = dir.path();
    let cfg = config_under(root);

    touch(&root.join("bower_components/normalize.css/normalize.css"), "html{}")?;
    touch(&root.join("bower_components/bootstrap/scss/_grid.scss"), ".row{}")?;
    touch(&root.join("bower_components/bootstrap/js/bootstrap.js"), "var x;")?;
    touch(&root.join("bower_components/compass/lib/_mixins.sass"), ".a\n")?;

    relocate_vendor_styles(&cfg)?;

    let dest = root.join("_dev/scss/vendors");
    assert!(dest.join("normalize.css/normalize.css").is_file());
    assert!(dest.join("bootstrap/scss/_grid.scss").is_file());
    // Scripts and indented-syntax files stay behind.
    assert!(!dest.join("bootstrap/js/bootstrap.js").exists());
    assert!(!dest.join("compass/lib/_mixins.sass").exists());
    Ok(())
}

#[test]
fn relocation_overwrites_stale_copies() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;
    let root = dir.path();
    let cfg = config_under(root);

    touch(&root.join("bower_components/pkg/a.css"), "a{color:red}")?;
    touch(&root.join("_dev/scss/vendors/pkg/a.css"), "a{color:blue}")?;

    relocate_vendor_styles(&cfg)?;

    let copied = fs::read_to_string(root.join("_dev/scss/vendors/pkg/a.css"))?;
    assert_eq!(copied, "a{color:red}");
    Ok(())
}

#[test]
fn relocation_without_a_package_dir_is_an_error() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let cfg = config_under(dir.path());

    let err = relocate_vendor_styles(&cfg).unwrap_err();
    assert!(matches!(err, SitepipeError::MissingPath(_)));
}

#[test]
fn normalization_renames_into_a_partial() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;
    let root = dir.path();
    let cfg = config_under(root);

    let package = root.join("_dev/scss/vendors/normalize.css");
    touch(&package.join("normalize.css"), "html{line-height:1.15}")?;

    normalize_vendor_stylesheet(&cfg)?;

    assert!(!package.join("normalize.css").exists());
    let partial = fs::read_to_string(package.join("_normalize.scss"))?;
    assert_eq!(partial, "html{line-height:1.15}");
    Ok(())
}

#[test]
fn normalization_twice_is_a_no_op() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;
    let root = dir.path();
    let cfg = config_under(root);

    let package = root.join("_dev/scss/vendors/normalize.css");
    touch(&package.join("normalize.css"), "html{}")?;

    normalize_vendor_stylesheet(&cfg)?;
    normalize_vendor_stylesheet(&cfg)?;

    assert!(package.join("_normalize.scss").is_file());
    Ok(())
}

#[test]
fn normalization_refreshes_when_both_files_exist() -> TestResult {
    // A reinstall resurrects the source next to an old partial; the fresh
    // copy wins.
    init_tracing();
    let dir = TempDir::new()?;
    let root = dir.path();
    let cfg = config_under(root);

    let package = root.join("_dev/scss/vendors/normalize.css");
    touch(&package.join("normalize.css"), "new{}")?;
    touch(&package.join("_normalize.scss"), "old{}")?;

    normalize_vendor_stylesheet(&cfg)?;

    assert!(!package.join("normalize.css").exists());
    assert_eq!(fs::read_to_string(package.join("_normalize.scss"))?, "new{}");
    Ok(())
}

#[test]
fn normalization_without_any_stylesheet_is_an_error() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let cfg = config_under(dir.path());

    let err = normalize_vendor_stylesheet(&cfg).unwrap_err();
    assert!(matches!(err, SitepipeError::MissingPath(_)));
}
