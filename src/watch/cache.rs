// src/watch/cache.rs

//! Content-hash suppression of no-op watch events.
//!
//! Editors love rewriting files without changing them (metadata saves,
//! atomic-rename dances), and the generator touches output files it did not
//! alter. The cache remembers the last observed blake3 hash per path; a
//! matching hash means the event carried no new content.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use blake3::Hasher;
use tracing::trace;

#[derive(Debug, Default)]
pub struct FileCache {
    hashes: HashMap<PathBuf, String>,
}

impl FileCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when `path`'s content differs from what was last observed.
    ///
    /// Unreadable or deleted paths count as changed (and forget their
    /// cached hash), so removals still propagate.
    pub fn has_changed(&mut self, path: &Path) -> bool {
        match hash_file(path) {
            Some(hash) => {
                let changed = self.hashes.get(path) != Some(&hash);
                if changed {
                    self.hashes.insert(path.to_path_buf(), hash);
                } else {
                    trace!(path = %path.display(), "content unchanged; event suppressed");
                }
                changed
            }
            None => {
                self.hashes.remove(path);
                true
            }
        }
    }
}

fn hash_file(path: &Path) -> Option<String> {
    let mut file = File::open(path).ok()?;
    let mut hasher = Hasher::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf).ok()?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Some(hasher.finalize().to_hex().to_string())
}
