// src/serve/reload.rs

//! Live-reload signalling between the pipeline and connected browsers.
//!
//! The hub is a broadcast channel of [`ReloadCause`]s; every WebSocket
//! connection holds its own subscription and translates causes into the
//! wire protocol, a small JSON enum tagged with `type`.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::engine::ReloadCause;

/// Messages sent to connected live-reload clients.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReloadMessage {
    /// Connection established.
    Connected,
    /// Full page reload.
    Reload,
}

/// Fan-out hub for reload signals.
#[derive(Debug, Clone)]
pub struct ReloadHub {
    sender: broadcast::Sender<ReloadCause>,
}

impl ReloadHub {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(100);
        Self { sender }
    }

    /// Sender half for the runtime's session hooks.
    pub fn sender(&self) -> broadcast::Sender<ReloadCause> {
        self.sender.clone()
    }

    /// Signal every connected client. Errors (no receivers) are ignored.
    pub fn send(&self, cause: ReloadCause) {
        let _ = self.sender.send(cause);
    }

    /// Subscribe a new client.
    pub fn subscribe(&self) -> broadcast::Receiver<ReloadCause> {
        self.sender.subscribe()
    }

    /// Number of connected subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for ReloadHub {
    fn default() -> Self {
        Self::new()
    }
}

/// Client-side script served at `/__livereload.js` and injected into HTML
/// responses. Reloads the page on a `reload` message and reconnects with
/// backoff when the server goes away (which also picks up a server restart).
pub const LIVERELOAD_SCRIPT: &str = r#"
(function() {
  'use strict';

  var attempts = 0;
  var maxAttempts = 10;

  function connect() {
    var proto = location.protocol === 'https:' ? 'wss://' : 'ws://';
    var ws = new WebSocket(proto + location.host + '/__livereload');

    ws.onopen = function() {
      console.log('[livereload] connected');
      attempts = 0;
    };

    ws.onmessage = function(event) {
      var msg = JSON.parse(event.data);
      if (msg.type === 'reload') {
        location.reload();
      }
    };

    ws.onclose = function() {
      if (attempts < maxAttempts) {
        attempts++;
        setTimeout(connect, 500 * attempts);
      }
    };

    ws.onerror = function() {
      ws.close();
    };
  }

  connect();
})();
"#;
