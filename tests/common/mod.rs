//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use blog_api::config::ApiConfig;
use blog_api::repository::MemoryRepository;
use blog_api::{HttpServer, Shutdown};
use tokio::net::TcpListener;

/// A server running on an ephemeral local port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub repository: Arc<MemoryRepository>,
    pub shutdown: Shutdown,
    pub client: reqwest::Client,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start the API over an in-memory repository with the given unique fields.
pub async fn start_server(unique_fields: Vec<String>) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let mut config = ApiConfig::default();
    config.listener.bind_address = addr.to_string();
    config.storage.unique_fields = unique_fields.clone();

    let repository = Arc::new(MemoryRepository::new(unique_fields));
    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, repository.clone());
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    let client = reqwest::Client::builder()
        .no_proxy()
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap();

    TestServer {
        addr,
        repository,
        shutdown,
        client,
    }
}
