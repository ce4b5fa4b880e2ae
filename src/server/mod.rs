// src/server/mod.rs

//! Dev server: watch mode plus an HTTP listener serving the target file with
//! live reload.

use std::cell::Cell;
use std::future::Future;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::config::{BuildConfig, DevServerConfig};
use crate::engine::Builder;
use crate::errors::{BunnyError, Result};
use crate::fs::FileSystem;
use crate::observer::{BuildObserver, CompositeObserver, LogObserver};
use crate::watch::{Debouncer, WatchBackend, WatchRuntime};

pub mod livereload;

pub use livereload::{
    client_fragment, router, ReloadSignal, ServerState, LIVERELOAD_PATH, RELOAD_MESSAGE,
};

const RELOAD_CHANNEL_CAPACITY: usize = 16;

/// Observer that drives the browser side of the dev server.
///
/// The first successful build opens the browser; every later one broadcasts
/// a reload signal.
#[derive(Debug)]
pub struct ReloadNotifier {
    url: String,
    open_browser: bool,
    first_done_seen: Cell<bool>,
    reload_tx: broadcast::Sender<ReloadSignal>,
}

impl ReloadNotifier {
    pub fn new(dev: &DevServerConfig, reload_tx: broadcast::Sender<ReloadSignal>) -> Self {
        Self {
            url: dev.url(),
            open_browser: dev.open_browser,
            first_done_seen: Cell::new(false),
            reload_tx,
        }
    }
}

impl BuildObserver for ReloadNotifier {
    fn on_done(&self, _dependencies: &[std::path::PathBuf], _elapsed: Duration) {
        if !self.first_done_seen.replace(true) {
            if self.open_browser {
                open_browser(self.url.clone());
            }
            return;
        }
        match self.reload_tx.send(ReloadSignal) {
            Ok(clients) => debug!(clients, "reload signal sent"),
            Err(_) => debug!("no livereload clients connected"),
        }
    }
}

/// Run the dev server until `shutdown` resolves.
///
/// The listener is bound before the first build; failing to bind is fatal.
pub async fn run_server<W: WatchBackend>(
    config: &BuildConfig,
    dev: DevServerConfig,
    fs: Arc<dyn FileSystem>,
    backend: W,
    shutdown: impl Future<Output = ()>,
) -> Result<()> {
    let listener = TcpListener::bind(("0.0.0.0", dev.port))
        .await
        .map_err(|source| BunnyError::BindFailed {
            port: dev.port,
            source,
        })?;

    let (reload_tx, _) = broadcast::channel(RELOAD_CHANNEL_CAPACITY);
    let app = router(ServerState {
        target: dev.target.clone(),
        port: dev.port,
        fs: Arc::clone(&fs),
        reload_tx: reload_tx.clone(),
    });

    let server = tokio::spawn(async move { axum::serve(listener, app).await });
    info!("Dev server listening on {}", dev.url());

    let observers: Vec<Rc<dyn BuildObserver>> = vec![
        Rc::new(LogObserver::new()),
        Rc::new(ReloadNotifier::new(&dev, reload_tx)),
    ];
    let observer = CompositeObserver::new(observers);
    let runtime = WatchRuntime::new(
        Debouncer::new(config.source(), config.debounce()),
        Builder::new(config, fs),
        Rc::new(observer),
        backend,
    );
    let result = runtime.run(shutdown).await;

    server.abort();
    result
}

/// Best-effort: failures are logged and never affect the build.
fn open_browser(url: String) {
    tokio::spawn(async move {
        let mut command = browser_command(&url);
        match command.status().await {
            Ok(status) if status.success() => debug!(url = %url, "browser opened"),
            Ok(status) => warn!(url = %url, %status, "browser command failed"),
            Err(err) => warn!(url = %url, "could not open browser: {err}"),
        }
    });
}

fn browser_command(url: &str) -> tokio::process::Command {
    let mut command = if cfg!(target_os = "windows") {
        let mut c = tokio::process::Command::new("cmd");
        c.args(["/C", "start", ""]);
        c
    } else if cfg!(target_os = "macos") {
        tokio::process::Command::new("open")
    } else {
        tokio::process::Command::new("xdg-open")
    };
    command.arg(url);
    command
}
