// src/watch/mod.rs

//! File watching and change detection.
//!
//! This module is responsible for:
//! - compiling the serve-session glob routes,
//! - wiring up a cross-platform filesystem watcher (`notify`),
//! - suppressing content-unchanged events via blake3 hashing and
//!   coalescing bursts per route.
//!
//! It does not know about step dependencies; it only turns filesystem
//! changes into pipeline events.

pub mod cache;
pub mod debounce;
pub mod routes;
pub mod watcher;

pub use cache::FileCache;
pub use debounce::Debouncer;
pub use routes::{WatchAction, WatchRoute, build_routes};
pub use watcher::{WatcherHandle, spawn_watcher};
