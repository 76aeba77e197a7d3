// src/config/model.rs

//! Configuration model for `sitepipe`.
//!
//! A `Sitepipe.toml` file maps logical asset categories to paths and globs.
//! Every field has a default mirroring a conventional Jekyll-style layout
//! (`_dev` sources, `assets` output, `_site` generated site), so an empty or
//! absent config file yields a working pipeline.
//!
//! The tree is deserialized once at startup, validated (see
//! [`crate::config::validate`]) and then shared read-only by every task.

use serde::Deserialize;

/// Top-level configuration tree.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ConfigFile {
    pub paths: PathsSection,
    pub styles: StylesSection,
    pub images: ImagesSection,
    pub fonts: FontsSection,
    pub vendor: VendorSection,
    pub generator: GeneratorSection,
    pub serve: ServeSection,
    pub build: BuildSection,
}

/// Project-level roots and leaf glob categories.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathsSection {
    /// Root of the hand-written asset sources.
    pub source_root: String,
    /// Single root every asset task writes under.
    pub output_root: String,
    /// Directory the site generator writes, served by the dev server.
    pub site_output: String,
    /// Directory for pipeline bookkeeping (completion stamps).
    pub state_dir: String,
    /// Markup sources (layouts, includes, pages, posts). Leaf data: the
    /// generator watches these itself; sitepipe only validates the globs.
    pub markup_globs: Vec<String>,
}

impl Default for PathsSection {
    fn default() -> Self {
        Self {
            source_root: "_dev".to_string(),
            output_root: "assets".to_string(),
            site_output: "_site".to_string(),
            state_dir: ".sitepipe".to_string(),
            markup_globs: vec![
                "_includes/*.html".to_string(),
                "_layouts/*.html".to_string(),
                "*.html".to_string(),
                "_drafts/*.md".to_string(),
                "_posts/*.md".to_string(),
            ],
        }
    }
}

/// Stylesheet pipeline: external compiler in, minified CSS out.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StylesSection {
    /// Entry stylesheet handed to the compiler.
    pub entry: String,
    /// Source tree watched for recompilation triggers.
    pub source_dir: String,
    /// Output directory for the compiled stylesheet.
    pub output_dir: String,
    /// Stylesheet compiler executable.
    pub compiler: String,
    /// Extra arguments passed before the entry file.
    pub compiler_args: Vec<String>,
}

impl Default for StylesSection {
    fn default() -> Self {
        Self {
            entry: "_dev/scss/main.scss".to_string(),
            source_dir: "_dev/scss".to_string(),
            output_dir: "assets/css".to_string(),
            compiler: "sass".to_string(),
            compiler_args: Vec::new(),
        }
    }
}

/// Image recompression settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ImagesSection {
    /// Where image sources live (leaf data; the task works in place on
    /// `output_dir`).
    pub source_dir: String,
    /// Directory whose images are recompressed in place.
    pub output_dir: String,
    /// Extensions considered images.
    pub extensions: Vec<String>,
    /// JPEG re-encode quality (1-100).
    pub jpeg_quality: u8,
}

impl Default for ImagesSection {
    fn default() -> Self {
        Self {
            source_dir: "_dev/images".to_string(),
            output_dir: "assets/images".to_string(),
            extensions: vec![
                "jpg".to_string(),
                "jpeg".to_string(),
                "png".to_string(),
                "gif".to_string(),
            ],
            jpeg_quality: 80,
        }
    }
}

/// Font output location. Leaf data: participates in output-root validation
/// only.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FontsSection {
    pub output_dir: String,
}

impl Default for FontsSection {
    fn default() -> Self {
        Self {
            output_dir: "assets/fonts".to_string(),
        }
    }
}

/// Third-party front-end packages and where their stylesheets end up.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VendorSection {
    /// Directory the package manager installs into.
    pub package_dir: String,
    /// Directory the module manager installs into (never touched by
    /// sitepipe; kept out of the pipeline by construction).
    pub module_dir: String,
    /// Package manifest consumed by the install command.
    pub manifest: String,
    /// Install command, run through the platform shell.
    pub install_command: String,
    /// Where relocated vendor stylesheets land inside the style source tree.
    pub style_dest: String,
    /// Vendor package whose stylesheet is renamed into a partial so the
    /// entry stylesheet can import it.
    pub normalize_package: String,
    /// Globs swept by `clean`, relative to the project root.
    pub clean_globs: Vec<String>,
}

impl Default for VendorSection {
    fn default() -> Self {
        Self {
            package_dir: "bower_components".to_string(),
            module_dir: "node_modules".to_string(),
            manifest: "bower.json".to_string(),
            install_command: "bower install".to_string(),
            style_dest: "_dev/scss/vendors".to_string(),
            normalize_package: "normalize.css".to_string(),
            clean_globs: vec!["_dev/**/vendors/**/*".to_string()],
        }
    }
}

/// External site generator invocation.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeneratorSection {
    /// Generator executable (`build` subcommand is appended per mode).
    pub command: String,
    /// Stdout line marking a completed build in watch mode.
    pub ready_pattern: String,
}

impl Default for GeneratorSection {
    fn default() -> Self {
        Self {
            command: "jekyll".to_string(),
            ready_pattern: r"done in [0-9.]+ seconds".to_string(),
        }
    }
}

/// Development server and watcher settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServeSection {
    pub port: u16,
    pub interface: String,
    /// Open the browser after the first watch-mode build completes.
    pub open_browser: bool,
    /// Watch event coalescing window in milliseconds.
    pub debounce_ms: u64,
}

impl Default for ServeSection {
    fn default() -> Self {
        Self {
            port: 8080,
            interface: "127.0.0.1".to_string(),
            open_browser: true,
            debounce_ms: 200,
        }
    }
}

/// One-shot build settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BuildSection {
    pub minify: bool,
}

impl Default for BuildSection {
    fn default() -> Self {
        Self { minify: true }
    }
}
