// src/tasks/images.rs

//! Incremental in-place image recompression.
//!
//! Works on the deployed image directory: files with a configured image
//! extension whose mtime is newer than the step's last successful run are
//! re-encoded (JPEG at the configured quality, PNG at maximum compression)
//! and written back only when the result is smaller. Other configured
//! extensions pass through untouched. A missing directory is a skip, not a
//! failure, so fresh checkouts build before any image exists.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::ConfigFile;
use crate::errors::Result;
use crate::tasks::stamps;

/// Stamp key for this step.
const STAMP_KEY: &str = "images";

#[derive(Debug, Default)]
struct BatchReport {
    rewritten: usize,
    kept: usize,
    failed: usize,
}

/// Recompress images changed since the last successful run.
pub async fn optimize_images(config: &ConfigFile) -> Result<()> {
    let output_dir = Path::new(&config.images.output_dir);
    if !output_dir.is_dir() {
        info!(
            dir = %output_dir.display(),
            "image directory missing; skipping image optimization"
        );
        return Ok(());
    }

    let started = SystemTime::now();
    let stamp_path = stamps::stamp_file(config);
    let since = stamps::load_stamp(&stamp_path, STAMP_KEY)?;

    let candidates = collect_candidates(output_dir, &config.images.extensions, since);
    if candidates.is_empty() {
        debug!(dir = %output_dir.display(), "no images changed since last run");
        stamps::save_stamp(&stamp_path, STAMP_KEY, started)?;
        return Ok(());
    }

    let quality = config.images.jpeg_quality;
    let report = tokio::task::spawn_blocking(move || recompress_batch(&candidates, quality))
        .await
        .map_err(anyhow::Error::from)?;

    info!(
        rewritten = report.rewritten,
        kept = report.kept,
        failed = report.failed,
        "images optimized"
    );
    stamps::save_stamp(&stamp_path, STAMP_KEY, started)?;
    Ok(())
}

/// Files under `dir` with a configured extension, modified after `since`.
/// With no stamp every image is a candidate.
fn collect_candidates(
    dir: &Path,
    extensions: &[String],
    since: Option<SystemTime>,
) -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    for entry in WalkDir::new(dir).into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            continue;
        };
        let ext = ext.to_ascii_lowercase();
        if !extensions.iter().any(|e| e.eq_ignore_ascii_case(&ext)) {
            continue;
        }
        if let Some(stamp) = since {
            // Unreadable mtime counts as changed.
            let newer = entry
                .metadata()
                .ok()
                .and_then(|m| m.modified().ok())
                .map(|mtime| mtime > stamp)
                .unwrap_or(true);
            if !newer {
                continue;
            }
        }
        candidates.push(path.to_path_buf());
    }
    candidates
}

fn recompress_batch(paths: &[PathBuf], jpeg_quality: u8) -> BatchReport {
    let mut report = BatchReport::default();
    for path in paths {
        match recompress_file(path, jpeg_quality) {
            Ok(Some((before, after))) => {
                debug!(path = %path.display(), before, after, "image rewritten");
                report.rewritten += 1;
            }
            Ok(None) => {
                debug!(path = %path.display(), "image left untouched");
                report.kept += 1;
            }
            Err(e) => {
                // A single bad file degrades the batch, not the build.
                warn!(path = %path.display(), error = %e, "image recompression failed");
                report.failed += 1;
            }
        }
    }
    report
}

/// Re-encode one file. Returns `Some((before, after))` when the smaller
/// re-encoding was written back, `None` for pass-through or not-smaller.
fn recompress_file(path: &Path, jpeg_quality: u8) -> Result<Option<(u64, u64)>> {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return Ok(None);
    };

    let encoded = match ext.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => {
            let img = image::open(path).map_err(anyhow::Error::from)?;
            let mut buf = Vec::new();
            let encoder = JpegEncoder::new_with_quality(&mut buf, jpeg_quality);
            img.write_with_encoder(encoder)
                .map_err(anyhow::Error::from)?;
            buf
        }
        "png" => {
            let img = image::open(path).map_err(anyhow::Error::from)?;
            let mut buf = Vec::new();
            let encoder = PngEncoder::new_with_quality(
                &mut buf,
                CompressionType::Best,
                FilterType::Adaptive,
            );
            img.write_with_encoder(encoder)
                .map_err(anyhow::Error::from)?;
            buf
        }
        // gif and anything else the config lists: no codec, pass through.
        _ => return Ok(None),
    };

    let before = fs::metadata(path)?.len();
    let after = encoded.len() as u64;
    if after >= before {
        return Ok(None);
    }

    fs::write(path, &encoded)?;
    Ok(Some((before, after)))
}
