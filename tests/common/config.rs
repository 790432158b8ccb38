//! Test configuration helpers for creating downloaders and running the server

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use image_zip_dl::{Config, ImageDownloader};

/// Configuration rooted in `dir` with cleanup off and a short poll interval
pub fn test_config(dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.download.temp_dir = dir.path().join("archives");
    config.download.timeout = Duration::from_secs(5);
    config.cleanup.enabled = false;
    config.api.poll_interval = Duration::from_millis(10);
    config
}

/// Create a downloader in a fresh temp directory (which must be kept alive)
pub async fn create_test_downloader() -> (Arc<ImageDownloader>, TempDir) {
    let temp_dir = tempfile::tempdir().unwrap();
    let downloader = ImageDownloader::new(test_config(&temp_dir)).await.unwrap();
    (Arc::new(downloader), temp_dir)
}

/// Reserve a free local port by binding and releasing it
pub fn free_local_addr() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap()
}

/// A running API server on a free local port
pub struct TestServer {
    /// Base URL, e.g. `http://127.0.0.1:PORT`
    pub base_url: String,
    /// The downloader behind the server
    pub downloader: Arc<ImageDownloader>,
    /// Server task
    pub handle: tokio::task::JoinHandle<image_zip_dl::Result<()>>,
    _temp_dir: TempDir,
}

/// Start the API server with `configure` applied to the test configuration
pub async fn start_server(configure: impl FnOnce(&mut Config)) -> TestServer {
    let temp_dir = tempfile::tempdir().unwrap();
    let mut config = test_config(&temp_dir);
    let addr = free_local_addr();
    config.api.bind_address = addr;
    configure(&mut config);

    let downloader = Arc::new(ImageDownloader::new(config).await.unwrap());
    let handle = downloader.spawn_api_server();
    let base_url = format!("http://{addr}");

    // Wait until the listener accepts connections
    let client = reqwest::Client::new();
    for _ in 0..50 {
        if client
            .get(format!("{base_url}/health"))
            .send()
            .await
            .is_ok()
        {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    TestServer {
        base_url,
        downloader,
        handle,
        _temp_dir: temp_dir,
    }
}
