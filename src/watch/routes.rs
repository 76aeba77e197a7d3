// src/watch/routes.rs

//! Glob routes mapping changed paths to pipeline actions.
//!
//! A serve session watches the project root with exactly two routes:
//! stylesheet sources trigger a recompile, regenerated HTML in the site
//! output requests a browser reload. Everything else the generator watches
//! itself.

use std::fmt;

use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::debug;

use crate::config::ConfigFile;
use crate::errors::{Result, SitepipeError};
use crate::pipeline::StepId;

/// What a matched route does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchAction {
    /// Trigger a pipeline step.
    Trigger(StepId),
    /// Ask connected browsers to reload.
    Reload,
}

/// One compiled route: a glob set over project-root-relative paths plus the
/// action taken when its debounce window closes.
#[derive(Clone)]
pub struct WatchRoute {
    name: &'static str,
    set: GlobSet,
    pub action: WatchAction,
}

impl fmt::Debug for WatchRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchRoute")
            .field("name", &self.name)
            .field("action", &self.action)
            .finish_non_exhaustive()
    }
}

impl WatchRoute {
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Whether `rel_path` (relative to the project root, forward slashes)
    /// belongs to this route.
    pub fn matches(&self, rel_path: &str) -> bool {
        self.set.is_match(rel_path)
    }
}

/// Compile the serve-session routes for a loaded config.
pub fn build_routes(config: &ConfigFile) -> Result<Vec<WatchRoute>> {
    let style_patterns = vec![
        format!("{}/**/*.scss", config.styles.source_dir),
        format!("{}/**/*.sass", config.styles.source_dir),
    ];
    let reload_patterns = vec![format!("{}/**/*.html", config.paths.site_output)];

    let routes = vec![
        WatchRoute {
            name: "styles",
            set: build_globset(&style_patterns)?,
            action: WatchAction::Trigger(StepId::Styles),
        },
        WatchRoute {
            name: "site-output",
            set: build_globset(&reload_patterns)?,
            action: WatchAction::Reload,
        },
    ];

    debug!(
        styles = ?style_patterns,
        reload = ?reload_patterns,
        "watch routes compiled"
    );
    Ok(routes)
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern)
            .map_err(|e| SitepipeError::Config(format!("invalid watch glob '{pattern}': {e}")))?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| SitepipeError::Config(format!("building watch glob set: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_routes_cover_both_feedback_paths() {
        let routes = build_routes(&ConfigFile::default()).unwrap();
        assert_eq!(routes.len(), 2);

        let styles = &routes[0];
        assert_eq!(styles.action, WatchAction::Trigger(StepId::Styles));
        assert!(styles.matches("_dev/scss/main.scss"));
        assert!(styles.matches("_dev/scss/vendors/_normalize.scss"));
        assert!(styles.matches("_dev/scss/partials/_grid.sass"));
        assert!(!styles.matches("_dev/scss/readme.md"));
        assert!(!styles.matches("_site/style.scss"));

        let reload = &routes[1];
        assert_eq!(reload.action, WatchAction::Reload);
        assert!(reload.matches("_site/index.html"));
        assert!(reload.matches("_site/posts/2024/entry.html"));
        assert!(!reload.matches("_site/assets/css/main.css"));
        assert!(!reload.matches("index.html"));
    }
}
