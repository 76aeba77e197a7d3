// src/tasks/stamps.rs

//! Last-successful-run bookkeeping.
//!
//! A small line-based file (`<state_dir>/stamps`) maps step names to the
//! wall-clock time of their last successful completion, in milliseconds
//! since the epoch:
//!
//! ```text
//! images 1755555555555
//! ```
//!
//! Malformed lines are skipped on load, so a damaged file degrades to "no
//! stamp" instead of an error.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::Context;
use tracing::debug;

use crate::config::ConfigFile;
use crate::errors::Result;

/// Stamp file location for a loaded config.
pub fn stamp_file(config: &ConfigFile) -> PathBuf {
    Path::new(&config.paths.state_dir).join("stamps")
}

/// Load the stored completion time for `step`, if any.
pub fn load_stamp(path: &Path, step: &str) -> Result<Option<SystemTime>> {
    let map = load_all(path)?;
    Ok(map
        .get(step)
        .map(|millis| UNIX_EPOCH + Duration::from_millis(*millis)))
}

/// Record `when` as the completion time for `step`, merging with any other
/// stored entries.
pub fn save_stamp(path: &Path, step: &str, when: SystemTime) -> Result<()> {
    let millis = when
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64;
    let mut map = load_all(path)?;
    map.insert(step.to_string(), millis);
    save_all(path, &map)?;
    debug!(step = %step, millis, "stored completion stamp");
    Ok(())
}

fn load_all(path: &Path) -> Result<HashMap<String, u64>> {
    if !path.exists() {
        return Ok(HashMap::new());
    }

    let reader = BufReader::new(File::open(path)?);
    let mut map = HashMap::new();
    for line in reader.lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let Some((step, value)) = trimmed.split_once(char::is_whitespace) else {
            continue;
        };
        if let Ok(millis) = value.trim().parse::<u64>() {
            map.insert(step.to_string(), millis);
        }
    }
    Ok(map)
}

fn save_all(path: &Path, map: &HashMap<String, u64>) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating stamp directory {}", parent.display()))?;
    }

    let mut writer = BufWriter::new(
        File::create(path).with_context(|| format!("creating stamp file {}", path.display()))?,
    );
    for (step, millis) in map {
        writeln!(writer, "{step} {millis}")?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stamps_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("state/stamps");

        assert_eq!(load_stamp(&path, "images").unwrap(), None);

        let when = UNIX_EPOCH + Duration::from_millis(1_700_000_000_123);
        save_stamp(&path, "images", when).unwrap();
        save_stamp(&path, "styles", when + Duration::from_millis(5)).unwrap();

        assert_eq!(load_stamp(&path, "images").unwrap(), Some(when));
        assert_eq!(
            load_stamp(&path, "styles").unwrap(),
            Some(when + Duration::from_millis(5))
        );
        assert_eq!(load_stamp(&path, "clean").unwrap(), None);
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("stamps");
        fs::write(
            &path,
            "images 1700000000123\nbroken-line\nstyles not-a-number\n\n",
        )
        .unwrap();

        let when = load_stamp(&path, "images").unwrap();
        assert_eq!(
            when,
            Some(UNIX_EPOCH + Duration::from_millis(1_700_000_000_123))
        );
        assert_eq!(load_stamp(&path, "styles").unwrap(), None);
        assert_eq!(load_stamp(&path, "broken-line").unwrap(), None);
    }
}
