// tests/dev_server.rs

mod common;
use crate::common::{init_tracing, mock_project, with_timeout, DocumentBuilder, RecordingWatchBackend, SOURCE, TARGET};

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, oneshot};

use bunny::config::{BuildConfig, DevServerConfig};
use bunny::errors::BunnyError;
use bunny::fs::MockFileSystem;
use bunny::observer::BuildObserver;
use bunny::server::{
    client_fragment, router, run_server, ReloadNotifier, ReloadSignal, ServerState, LIVERELOAD_PATH,
};

async fn http_get(addr: SocketAddr, path: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.expect("connect");
    let request = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await.expect("write request");
    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.expect("read response");
    String::from_utf8_lossy(&response).into_owned()
}

fn free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    listener.local_addr().expect("local addr").port()
}

#[test]
fn client_fragment_points_at_livereload_endpoint() {
    let fragment = client_fragment(4321);

    assert!(fragment.starts_with("<script>"));
    assert!(fragment.contains(&format!("ws://localhost:4321{LIVERELOAD_PATH}")));
    assert!(fragment.contains("location.reload()"));
}

#[tokio::test]
async fn router_serves_target_with_reload_client_on_any_path() {
    init_tracing();
    let fs = MockFileSystem::new();
    fs.add_file(TARGET, "<h1>hi</h1>");
    let (reload_tx, _) = broadcast::channel(4);
    let app = router(ServerState {
        target: PathBuf::from(TARGET),
        port: 4321,
        fs: Arc::new(fs),
        reload_tx,
    });
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let server = tokio::spawn(async move { axum::serve(listener, app).await });

    for path in ["/", "/nested/page.html"] {
        let response = with_timeout(http_get(addr, path)).await;
        assert!(response.starts_with("HTTP/1.1 200"), "got: {response}");
        assert!(response.contains("text/html"), "got: {response}");
        assert!(response.contains("<h1>hi</h1>"), "got: {response}");
        assert!(response.contains(&client_fragment(4321)), "got: {response}");
    }

    server.abort();
}

#[tokio::test]
async fn unreadable_target_is_reported_in_the_page() {
    init_tracing();
    let (reload_tx, _) = broadcast::channel(4);
    let app = router(ServerState {
        target: PathBuf::from(TARGET),
        port: 4321,
        fs: Arc::new(MockFileSystem::new()),
        reload_tx,
    });
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let server = tokio::spawn(async move { axum::serve(listener, app).await });

    let response = with_timeout(http_get(addr, "/")).await;

    assert!(response.contains("File not found"), "got: {response}");
    assert!(response.contains(LIVERELOAD_PATH), "got: {response}");
    server.abort();
}

#[test]
fn reload_is_broadcast_on_every_done_after_the_first() {
    let (reload_tx, mut rx) = broadcast::channel(4);
    let dev = DevServerConfig::new(8080, Some(Path::new(TARGET)), false).expect("valid config");
    let notifier = ReloadNotifier::new(&dev, reload_tx);

    notifier.on_done(&[], Duration::ZERO);
    assert!(rx.try_recv().is_err(), "first build must not broadcast");

    notifier.on_fail("broken", Duration::ZERO);
    assert!(rx.try_recv().is_err(), "failed builds must not broadcast");

    notifier.on_done(&[], Duration::ZERO);
    notifier.on_done(&[], Duration::ZERO);
    assert_eq!(rx.try_recv().ok(), Some(ReloadSignal));
    assert_eq!(rx.try_recv().ok(), Some(ReloadSignal));
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn port_already_in_use_is_fatal() {
    init_tracing();
    let blocker = std::net::TcpListener::bind("0.0.0.0:0").expect("bind blocker");
    let port = blocker.local_addr().expect("addr").port();
    let fs = mock_project(&DocumentBuilder::new("save('x')").build());
    let config = BuildConfig::new_unchecked(PathBuf::from(SOURCE), Some(PathBuf::from(TARGET)));
    let dev = DevServerConfig {
        port,
        target: PathBuf::from(TARGET),
        open_browser: false,
    };

    let err = with_timeout(run_server(
        &config,
        dev,
        Arc::new(fs.clone()),
        RecordingWatchBackend::new(),
        std::future::pending(),
    ))
    .await
    .expect_err("bind must fail");

    assert!(matches!(err, BunnyError::BindFailed { .. }), "got: {err:?}");
    assert!(fs.writes().is_empty(), "no build should have run");
    drop(blocker);
}

#[tokio::test]
async fn dev_server_builds_then_serves_the_result() {
    init_tracing();
    let fs = mock_project(&DocumentBuilder::new("save('<p>built</p>')").build());
    let config = BuildConfig::new_unchecked(PathBuf::from(SOURCE), Some(PathBuf::from(TARGET)));
    let port = free_port();
    let dev = DevServerConfig {
        port,
        target: PathBuf::from(TARGET),
        open_browser: false,
    };
    let (stop_tx, stop_rx) = oneshot::channel::<()>();

    let server = run_server(
        &config,
        dev,
        Arc::new(fs.clone()),
        RecordingWatchBackend::new(),
        async move {
            let _ = stop_rx.await;
        },
    );
    let client = async {
        while fs.contents(TARGET).is_none() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        let response = http_get(SocketAddr::from(([127, 0, 0, 1], port)), "/").await;
        let _ = stop_tx.send(());
        response
    };

    let (result, response) = with_timeout(async { tokio::join!(server, client) }).await;

    result.expect("dev server failed");
    assert!(response.contains("<p>built</p>"), "got: {response}");
    assert!(response.contains(&client_fragment(port)), "got: {response}");
}
