// src/watch/watcher.rs

//! The filesystem watcher feeding the serve session.
//!
//! notify's callback runs on its own thread, so events are bridged over an
//! unbounded channel into an async loop that filters, routes, deduplicates
//! and debounces them before anything reaches the runtime.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::engine::{PipelineEvent, ReloadCause, TriggerReason};
use crate::errors::Result;
use crate::watch::cache::FileCache;
use crate::watch::debounce::Debouncer;
use crate::watch::routes::{WatchAction, WatchRoute};

/// Handle for the filesystem watcher.
///
/// Exists mainly so the underlying `RecommendedWatcher` stays alive for as
/// long as needed. Dropping it stops file watching; the routing loop then
/// drains and ends on its own.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").finish()
    }
}

/// Watch `root` recursively and translate matching file changes into
/// pipeline events.
///
/// Each event path is relativized against `root`, matched against the
/// routes, dropped if its content hash is unchanged, and then debounced per
/// route over `window`. When a route's window closes, its action is sent:
/// a step trigger for stylesheet sources, a reload request for regenerated
/// site output.
pub fn spawn_watcher(
    root: impl Into<PathBuf>,
    routes: Vec<WatchRoute>,
    events_tx: mpsc::Sender<PipelineEvent>,
    window: Duration,
) -> Result<WatcherHandle> {
    let root = root.into();
    let root = root.canonicalize().unwrap_or(root);

    // Bridge from notify's callback thread into the async loop.
    let (raw_tx, raw_rx) = mpsc::unbounded_channel::<Event>();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                // A closed routing loop means the session is over.
                let _ = raw_tx.send(event);
            }
            Err(err) => {
                eprintln!("sitepipe: file watch error: {err}");
            }
        },
        Config::default(),
    )
    .map_err(anyhow::Error::from)?;

    watcher
        .watch(&root, RecursiveMode::Recursive)
        .map_err(anyhow::Error::from)?;

    info!(root = %root.display(), routes = routes.len(), "file watcher started");

    tokio::spawn(route_loop(root, routes, raw_rx, events_tx, window));

    Ok(WatcherHandle { _inner: watcher })
}

async fn route_loop(
    root: PathBuf,
    routes: Vec<WatchRoute>,
    mut raw_rx: mpsc::UnboundedReceiver<Event>,
    events_tx: mpsc::Sender<PipelineEvent>,
    window: Duration,
) {
    let mut cache = FileCache::new();
    let mut debouncer = Debouncer::new(window);

    loop {
        let deadline = debouncer.next_deadline();
        tokio::select! {
            maybe_event = raw_rx.recv() => {
                match maybe_event {
                    Some(event) => {
                        observe_event(&root, &routes, &mut cache, &mut debouncer, &event);
                    }
                    None => break,
                }
            }
            _ = sleep_until_opt(deadline) => {
                for route_idx in debouncer.take_expired(Instant::now()) {
                    if dispatch_route(&routes[route_idx], &events_tx).await.is_err() {
                        // Runtime channel closed; the session is over.
                        return;
                    }
                }
            }
        }
    }

    debug!("watch routing loop ended");
}

async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(tokio::time::Instant::from_std(at)).await,
        None => std::future::pending().await,
    }
}

fn observe_event(
    root: &Path,
    routes: &[WatchRoute],
    cache: &mut FileCache,
    debouncer: &mut Debouncer,
    event: &Event,
) {
    // Reads and metadata-only notifications never change content.
    if matches!(event.kind, EventKind::Access(_)) {
        return;
    }

    let now = Instant::now();
    for path in &event.paths {
        let Some(rel) = relative_str(root, path) else {
            debug!(path = %path.display(), "event outside project root");
            continue;
        };

        let matched: Vec<usize> = routes
            .iter()
            .enumerate()
            .filter(|(_, route)| route.matches(&rel))
            .map(|(idx, _)| idx)
            .collect();
        if matched.is_empty() {
            continue;
        }
        if !cache.has_changed(path) {
            continue;
        }

        for idx in matched {
            if debouncer.observe(idx, now) {
                debug!(route = routes[idx].name(), path = %rel, "debounce window opened");
            }
        }
    }
}

async fn dispatch_route(
    route: &WatchRoute,
    events_tx: &mpsc::Sender<PipelineEvent>,
) -> std::result::Result<(), ()> {
    let event = match route.action {
        WatchAction::Trigger(step) => {
            info!(step = %step, route = route.name(), "source change; triggering step");
            PipelineEvent::StepTriggered {
                step,
                reason: TriggerReason::FileChange,
            }
        }
        WatchAction::Reload => {
            debug!(route = route.name(), "site output changed; requesting reload");
            PipelineEvent::ReloadRequested {
                cause: ReloadCause::SiteOutput,
            }
        }
    };

    events_tx.send(event).await.map_err(|e| {
        warn!(error = %e, "runtime channel closed; stopping watch routing");
    })
}

/// Path relative to `root`, with forward slashes, or `None` when the path
/// is not under the root.
fn relative_str(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    Some(rel.to_string_lossy().replace('\\', "/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_str_normalizes_under_root() {
        let root = Path::new("/project");
        assert_eq!(
            relative_str(root, Path::new("/project/_dev/scss/main.scss")),
            Some("_dev/scss/main.scss".to_string())
        );
        assert_eq!(relative_str(root, Path::new("/elsewhere/x.scss")), None);
    }
}
