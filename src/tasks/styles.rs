// src/tasks/styles.rs

//! Stylesheet compilation and minification.
//!
//! Shells out to the configured compiler (`sass` by default; a single file
//! argument makes it print compiled CSS on stdout), minifies the result
//! in-process, and writes `<entry-stem>.css` into the style output
//! directory.

use std::path::Path;
use std::process::Stdio;

use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};
use tokio::fs;
use tokio::process::Command;
use tracing::{debug, info};

use crate::config::ConfigFile;
use crate::errors::{Result, SitepipeError};

/// Compile the entry stylesheet and write the (optionally minified) CSS.
pub async fn build_styles(config: &ConfigFile, minify: bool) -> Result<()> {
    let entry = Path::new(&config.styles.entry);
    if !entry.is_file() {
        return Err(SitepipeError::MissingPath(entry.to_path_buf()));
    }

    let compiled = compile(config, entry).await?;
    let css = if minify {
        minify_css(&compiled)?
    } else {
        compiled
    };

    let output_dir = Path::new(&config.styles.output_dir);
    fs::create_dir_all(output_dir).await?;
    let stem = entry.file_stem().and_then(|s| s.to_str()).ok_or_else(|| {
        SitepipeError::Config(format!(
            "style entry has no usable file name: {}",
            entry.display()
        ))
    })?;
    let out_path = output_dir.join(format!("{stem}.css"));
    fs::write(&out_path, css.as_bytes()).await?;

    info!(
        out = %out_path.display(),
        bytes = css.len(),
        minified = minify,
        "stylesheet built"
    );
    Ok(())
}

/// Run the external compiler, capturing compiled CSS from stdout. Compiler
/// stderr becomes the error message on a non-zero exit.
async fn compile(config: &ConfigFile, entry: &Path) -> Result<String> {
    let compiler = config.styles.compiler.as_str();
    debug!(compiler = %compiler, entry = %entry.display(), "compiling stylesheet");

    let output = Command::new(compiler)
        .args(&config.styles.compiler_args)
        .arg(entry)
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|e| SitepipeError::StyleCompile(format!("spawning '{compiler}': {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(SitepipeError::StyleCompile(stderr.trim().to_string()));
    }

    String::from_utf8(output.stdout).map_err(|e| {
        SitepipeError::StyleCompile(format!("compiler produced non-UTF-8 output: {e}"))
    })
}

fn minify_css(css: &str) -> Result<String> {
    let stylesheet = StyleSheet::parse(css, ParserOptions::default())
        .map_err(|e| SitepipeError::StyleCompile(format!("CSS parse error: {e}")))?;
    let printed = stylesheet
        .to_css(PrinterOptions {
            minify: true,
            ..Default::default()
        })
        .map_err(|e| SitepipeError::StyleCompile(format!("CSS minify error: {e}")))?;
    Ok(printed.code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minify_shrinks_and_normalizes() {
        let css = "body {\n  color: #ffffff;\n}\n";
        let min = minify_css(css).unwrap();
        assert_eq!(min, "body{color:#fff}");
    }

    #[test]
    fn minify_rejects_garbage() {
        let err = minify_css("not a stylesheet {{{").unwrap_err();
        assert!(matches!(err, SitepipeError::StyleCompile(_)));
    }
}
