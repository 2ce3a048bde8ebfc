//! Client against a real server (or a misbehaving fake) on loopback

use std::fs;
use std::net::{IpAddr, Ipv4Addr};
use std::path::Path;
use std::time::Duration;

use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use lanshare_client::discovery::probe;
use lanshare_client::{App, ClientConfig, DiscoveryConfig};
use lanshare_common::FileEntry;
use lanshare_server::ServerConfig;

struct Fixture {
    shared: TempDir,
    local: TempDir,
    app: App,
}

impl Fixture {
    fn new() -> Self {
        let shared = TempDir::new().unwrap();
        fs::write(shared.path().join("a.txt"), b"hello").unwrap();
        fs::create_dir(shared.path().join("sub")).unwrap();

        let local = TempDir::new().unwrap();
        let config = ClientConfig {
            receive_dir: local.path().join("received_files"),
            ..ClientConfig::default()
        };
        let app = App::new(config, ServerConfig::local(shared.path()));
        Self { shared, local, app }
    }

    /// Start the embedded server and connect the app to it
    async fn connected() -> Self {
        let mut fixture = Self::new();
        assert!(fixture.app.start_server().await);
        let addr = fixture.app.server().unwrap().control_addr().to_string();
        assert!(fixture.app.connect(&addr).await);
        fixture
    }

    fn received(&self) -> Vec<String> {
        names_in(&self.local.path().join("received_files"))
    }
}

fn names_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_browse_and_download() {
    let mut f = Fixture::connected().await;

    let dir = f.app.server_dir().await.unwrap();
    assert_eq!(dir, f.shared.path().display().to_string());

    assert_eq!(
        f.app.remote_files().await,
        vec![FileEntry::file("a.txt"), FileEntry::folder("sub")]
    );

    assert_eq!(f.app.request_file("a.txt").await, "File downloaded successfully.");
    let saved = f.local.path().join("received_files").join("a.txt");
    assert_eq!(fs::read(saved).unwrap(), b"hello");
    assert_eq!(f.app.local_files().await, vec![FileEntry::file("a.txt")]);

    f.app.stop_all().await;
}

#[tokio::test]
async fn test_error_prefixed_name_does_not_hide_listing() {
    let mut f = Fixture::connected().await;
    fs::write(f.shared.path().join("ERROR:log.txt"), b"log").unwrap();

    assert_eq!(
        f.app.remote_files().await,
        vec![FileEntry::file("a.txt"), FileEntry::folder("sub")]
    );
    assert!(f.app.is_connected());

    f.app.stop_all().await;
}

#[tokio::test]
async fn test_repeated_download_never_overwrites() {
    let mut f = Fixture::connected().await;

    assert_eq!(f.app.request_file("a.txt").await, "File downloaded successfully.");
    fs::write(f.shared.path().join("a.txt"), b"changed").unwrap();
    assert_eq!(f.app.request_file("a.txt").await, "File downloaded successfully.");

    assert_eq!(f.received(), vec!["a.txt", "a.txt(1)"]);
    let dir = f.local.path().join("received_files");
    assert_eq!(fs::read(dir.join("a.txt")).unwrap(), b"hello");
    assert_eq!(fs::read(dir.join("a.txt(1)")).unwrap(), b"changed");

    f.app.stop_all().await;
}

#[tokio::test]
async fn test_server_error_keeps_connection() {
    let mut f = Fixture::connected().await;

    assert_eq!(
        f.app.request_file("missing.txt").await,
        "Error requesting the file, File not found"
    );
    assert!(f.app.is_connected());
    assert!(f.received().is_empty());

    // The unterminated error did not desynchronize the stream
    assert!(f.app.server_dir().await.is_some());
    assert_eq!(f.app.request_file("a.txt").await, "File downloaded successfully.");

    f.app.stop_all().await;
}

#[tokio::test]
async fn test_invalid_name_refused_locally() {
    let mut f = Fixture::connected().await;

    let message = f.app.request_file("../a.txt").await;
    assert!(message.starts_with("Error requesting the file, invalid file name"));
    assert!(f.app.is_connected());

    f.app.stop_all().await;
}

#[tokio::test]
async fn test_operations_without_connection() {
    let mut f = Fixture::new();

    assert_eq!(
        f.app.request_file("a.txt").await,
        "Error requesting the file, connection is not open"
    );
    assert_eq!(f.app.server_dir().await, None);
    assert!(f.app.remote_files().await.is_empty());
}

#[tokio::test]
async fn test_connect_failure() {
    let mut f = Fixture::new();
    // Grab a free port and release it so nothing listens there
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    };
    assert!(!f.app.connect(&format!("127.0.0.1:{port}")).await);
    assert!(!f.app.is_connected());
}

#[tokio::test]
async fn test_truncated_stream_leaves_no_file() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 64];
        let _ = socket.read(&mut buf).await.unwrap();
        socket.write_all(b"SIZE:10\nabc").await.unwrap();
        // Closing early leaves the client 7 bytes short
    });

    let mut f = Fixture::new();
    assert!(f.app.connect(&addr.to_string()).await);

    assert_eq!(
        f.app.request_file("a.txt").await,
        "Error requesting the file, expected to copy 10 bytes, but copied 3"
    );
    assert!(f.received().is_empty());
    assert!(!f.app.is_connected());
}

#[tokio::test]
async fn test_shared_dir_change_reaches_running_server() {
    let mut f = Fixture::connected().await;
    let other = TempDir::new().unwrap();
    fs::write(other.path().join("b.txt"), b"bee").unwrap();

    f.app.set_shared_dir(other.path());
    assert_eq!(f.app.remote_files().await, vec![FileEntry::file("b.txt")]);

    f.app.stop_all().await;
}

#[tokio::test]
async fn test_start_and_stop_are_idempotent() {
    let mut f = Fixture::new();
    f.app.stop_all().await;

    assert!(f.app.start_server().await);
    let addr = f.app.server().unwrap().control_addr();
    assert!(f.app.start_server().await);
    assert_eq!(f.app.server().unwrap().control_addr(), addr);

    f.app.stop_all().await;
    f.app.stop_all().await;
    assert!(f.app.server().is_none());
}

#[tokio::test]
async fn test_probe_finds_embedded_server() {
    let mut f = Fixture::new();
    assert!(f.app.start_server().await);
    let server = f.app.server().unwrap();

    let config = DiscoveryConfig {
        port: server.discovery_addr().port(),
        write_timeout: Duration::from_secs(1),
        read_timeout: Duration::from_secs(2),
    };
    let found = probe(
        IpAddr::V4(Ipv4Addr::LOCALHOST),
        server.discovery_addr(),
        &config,
    )
    .await
    .unwrap();
    assert_eq!(found, server.control_addr());

    f.app.stop_all().await;
}

#[tokio::test]
async fn test_receive_dir_created_on_demand() {
    let mut f = Fixture::connected().await;
    let dir = f.local.path().join("received_files");
    assert!(!dir.exists());

    f.app.request_file("a.txt").await;
    assert!(dir.is_dir());

    f.app.stop_all().await;
}
