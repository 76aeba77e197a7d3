// tests/common/mod.rs

use std::path::Path;
use std::sync::Once;

use tracing_subscriber::{EnvFilter, fmt};

use sitepipe::config::ConfigFile;

static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// - Uses `with_test_writer()`, so logs are captured per-test.
/// - The Rust test harness only prints captured output for **failing** tests
///   (unless you run with `-- --nocapture`).
///
/// Enable levels with e.g.:
/// `RUST_LOG=debug cargo test`
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer() // print only for failing tests unless --nocapture
            .with_target(true)
            .init();
    });
}

/// Default configuration with every path rebased under `root`, so tests run
/// against a tempdir instead of the checkout.
#[allow(dead_code)]
pub fn config_under(root: &Path) -> ConfigFile {
    let rebase = |p: &str| root.join(p).to_string_lossy().into_owned();

    let mut cfg = ConfigFile::default();
    cfg.paths.source_root = rebase("_dev");
    cfg.paths.output_root = rebase("assets");
    cfg.paths.site_output = rebase("_site");
    cfg.paths.state_dir = rebase(".sitepipe");
    cfg.styles.entry = rebase("_dev/scss/main.scss");
    cfg.styles.source_dir = rebase("_dev/scss");
    cfg.styles.output_dir = rebase("assets/css");
    cfg.images.source_dir = rebase("_dev/images");
    cfg.images.output_dir = rebase("assets/images");
    cfg.fonts.output_dir = rebase("assets/fonts");
    cfg.vendor.package_dir = rebase("bower_components");
    cfg.vendor.style_dest = rebase("_dev/scss/vendors");
    cfg.vendor.clean_globs = vec![format!("{}/**/vendors/**/*", rebase("_dev"))];
    cfg
}
