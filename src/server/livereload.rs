// src/server/livereload.rs

//! HTTP surface of the dev server: the target document with an injected
//! reload client, and the WebSocket that pushes `reload` to it.

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path as AxumPath, State};
use axum::response::{Html, Response};
use axum::routing::get;
use axum::Router;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::fs::FileSystem;

pub const LIVERELOAD_PATH: &str = "/__bunny/livereload";
pub const RELOAD_MESSAGE: &str = "reload";

/// Broadcast to every connected client after a successful rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReloadSignal;

#[derive(Debug, Clone)]
pub struct ServerState {
    pub target: PathBuf,
    pub port: u16,
    pub fs: Arc<dyn FileSystem>,
    pub reload_tx: broadcast::Sender<ReloadSignal>,
}

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route(LIVERELOAD_PATH, get(livereload))
        .route("/", get(serve_index))
        .route("/{*path}", get(serve_any))
        .with_state(state)
}

/// Script appended to every served page.
pub fn client_fragment(port: u16) -> String {
    format!(
        r#"<script>
(function () {{
  var socket = new WebSocket("ws://localhost:{port}{LIVERELOAD_PATH}");
  socket.onmessage = function (event) {{
    if (event.data === "{RELOAD_MESSAGE}") {{
      location.reload();
    }}
  }};
}})();
</script>"#
    )
}

async fn serve_index(State(state): State<ServerState>) -> Html<String> {
    serve_target(&state).await
}

async fn serve_any(AxumPath(path): AxumPath<String>, State(state): State<ServerState>) -> Html<String> {
    debug!(path = %path, "serving target for nested path");
    serve_target(&state).await
}

/// Current target contents plus the reload client. A read failure is shown
/// in the page, which still reloads once a later build succeeds.
async fn serve_target(state: &ServerState) -> Html<String> {
    let body = match state.fs.read_to_string(&state.target).await {
        Ok(body) => body,
        Err(err) => {
            warn!(target = ?state.target, "could not read target: {err:#}");
            format!("{err:#}")
        }
    };
    Html(format!("{body}{}", client_fragment(state.port)))
}

async fn livereload(ws: WebSocketUpgrade, State(state): State<ServerState>) -> Response {
    // Subscribe before the upgrade completes so no signal sent in between
    // is missed.
    let rx = state.reload_tx.subscribe();
    ws.on_upgrade(move |socket| forward_reloads(socket, rx))
}

async fn forward_reloads(mut socket: WebSocket, mut rx: broadcast::Receiver<ReloadSignal>) {
    debug!("livereload client connected");
    loop {
        tokio::select! {
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                    _ => {}
                }
            }
            next = rx.recv() => {
                match next {
                    Ok(ReloadSignal) => {
                        if socket
                            .send(Message::Text(RELOAD_MESSAGE.to_string().into()))
                            .await
                            .is_err()
                        {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }
    debug!("livereload client disconnected");
}
