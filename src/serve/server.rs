// src/serve/server.rs

//! The development HTTP server.
//!
//! An axum router over the generator's output directory: static files with
//! directory index resolution, a WebSocket endpoint feeding reload signals
//! to the page, the client script, and a response middleware that injects
//! the script tag into every served HTML document.

use std::io;
use std::path::Path;

use axum::Router;
use axum::body::Body;
use axum::extract::Request;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::http::{StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, watch};
use tower_http::services::ServeDir;
use tracing::{debug, warn};

use crate::errors::Result;
use crate::serve::reload::{LIVERELOAD_SCRIPT, ReloadHub, ReloadMessage};

/// Ports probed after the preferred one before giving up.
const BIND_ATTEMPTS: u16 = 10;

const SCRIPT_TAG: &str = r#"<script src="/__livereload.js"></script>"#;

/// Bind the preferred port, falling back to the next few when it is taken
/// (a second session, a stale process).
pub async fn bind_with_retry(interface: &str, preferred: u16) -> Result<TcpListener> {
    for offset in 0..BIND_ATTEMPTS {
        let Some(port) = preferred.checked_add(offset) else {
            break;
        };
        match TcpListener::bind((interface, port)).await {
            Ok(listener) => {
                if offset > 0 {
                    warn!(preferred, port, "preferred port busy; bound fallback");
                }
                return Ok(listener);
            }
            Err(e) if e.kind() == io::ErrorKind::AddrInUse => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Err(anyhow::anyhow!(
        "no free port on {interface} in {preferred}..{}",
        preferred.saturating_add(BIND_ATTEMPTS)
    )
    .into())
}

/// Build the dev-server router over `site_root`.
pub fn router(site_root: &Path, hub: ReloadHub) -> Router {
    let static_files = ServeDir::new(site_root).append_index_html_on_directories(true);

    Router::new()
        .route("/__livereload", get(ws_handler))
        .route("/__livereload.js", get(script_handler))
        .fallback_service(static_files)
        .layer(middleware::from_fn(inject_livereload))
        .with_state(hub)
}

/// Serve until the shutdown flag flips (or its sender is dropped).
pub async fn serve_until(
    listener: TcpListener,
    router: Router,
    mut shutdown: watch::Receiver<bool>,
) -> Result<()> {
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            let _ = shutdown.wait_for(|stop| *stop).await;
        })
        .await
        .map_err(anyhow::Error::from)?;
    Ok(())
}

async fn ws_handler(ws: WebSocketUpgrade, State(hub): State<ReloadHub>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, hub))
}

async fn handle_socket(mut socket: WebSocket, hub: ReloadHub) {
    let mut causes = hub.subscribe();

    let Ok(hello) = serde_json::to_string(&ReloadMessage::Connected) else {
        return;
    };
    if socket.send(Message::Text(hello.into())).await.is_err() {
        return;
    }

    loop {
        let cause = match causes.recv().await {
            Ok(cause) => Some(cause),
            // Falling behind is fine: one reload covers every missed signal.
            Err(broadcast::error::RecvError::Lagged(_)) => None,
            Err(broadcast::error::RecvError::Closed) => break,
        };

        debug!(?cause, "forwarding reload to client");
        let Ok(json) = serde_json::to_string(&ReloadMessage::Reload) else {
            break;
        };
        if socket.send(Message::Text(json.into())).await.is_err() {
            break;
        }
    }
}

async fn script_handler() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/javascript")],
        LIVERELOAD_SCRIPT,
    )
}

/// Buffer HTML responses and splice the live-reload script tag in before
/// `</body>`. Everything else passes through untouched.
async fn inject_livereload(request: Request, next: Next) -> Response {
    let response = next.run(request).await;

    let is_html = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.starts_with("text/html"))
        .unwrap_or(false);
    if !is_html {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(error = %e, "failed to buffer HTML response for script injection");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let html = inject_script(&String::from_utf8_lossy(&bytes));
    // Length changed; let the server recompute it.
    parts.headers.remove(header::CONTENT_LENGTH);
    Response::from_parts(parts, Body::from(html))
}

fn inject_script(html: &str) -> String {
    match html.rfind("</body>") {
        Some(idx) => format!("{}{}\n{}", &html[..idx], SCRIPT_TAG, &html[idx..]),
        None => format!("{html}\n{SCRIPT_TAG}"),
    }
}
