//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

use scrape_admin::config::ServiceConfig;
use scrape_admin::reload::{DryRunReloader, ReloadController};
use scrape_admin::{HttpServer, JobService, Shutdown};

/// A document with only the protected self-monitoring job.
pub const DEFAULT_DOCUMENT: &str = r#"global:
  scrape_interval: 15s
scrape_configs:
  - job_name: prometheus
    static_configs:
      - targets: ["localhost:9090"]
"#;

/// A running server plus the scratch directory holding its document.
pub struct TestServer {
    pub addr: SocketAddr,
    pub document: PathBuf,
    pub client: reqwest::Client,
    shutdown: Shutdown,
    _dir: tempfile::TempDir,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    #[allow(dead_code)]
    pub fn document_text(&self) -> String {
        std::fs::read_to_string(&self.document).unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start a dry-run server over `document`.
pub async fn start_server(document: &str) -> TestServer {
    start_server_with(document, Arc::new(DryRunReloader)).await
}

/// Start a server over `document` using `reloader`.
#[allow(dead_code)]
pub async fn start_server_with(document: &str, reloader: Arc<dyn ReloadController>) -> TestServer {
    start_server_configured(document, reloader, |_| {}).await
}

/// Start a server over `document` using `reloader`, letting `adjust` tweak
/// the configuration first.
#[allow(dead_code)]
pub async fn start_server_configured(
    document: &str,
    reloader: Arc<dyn ReloadController>,
    adjust: impl FnOnce(&mut ServiceConfig),
) -> TestServer {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("prometheus.yml");
    std::fs::write(&path, document).unwrap();

    let mut config = ServiceConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.document.path = path.to_string_lossy().into_owned();
    config.reload.dry_run = true;
    config.reload.timeout_secs = 2;
    config.reload.poll_interval_ms = 50;
    adjust(&mut config);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let service = Arc::new(JobService::with_reloader(&config, reloader));
    let server = HttpServer::with_service(config, service);
    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.clone();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    let client = reqwest::Client::builder()
        .no_proxy()
        .timeout(Duration::from_secs(10))
        .build()
        .unwrap();

    TestServer {
        addr,
        document: path,
        client,
        shutdown,
        _dir: dir,
    }
}
