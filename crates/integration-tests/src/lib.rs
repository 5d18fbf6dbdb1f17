//! Test harness for apitrack integration tests.
//!
//! Boots the real server on an ephemeral port and drives it over HTTP.

use std::{net::SocketAddr, time::Duration};

use config::Config;
use server::ServeConfig;
use tokio::net::TcpListener;

/// Test client for making HTTP requests to the test server
pub struct TestClient {
    base_url: String,
    client: reqwest::Client,
}

impl TestClient {
    fn new(base_url: String) -> Self {
        Self {
            base_url,
            client: reqwest::Client::new(),
        }
    }

    /// Send a GET request to the given path
    pub async fn get(&self, path: &str) -> anyhow::Result<reqwest::Response> {
        let response = self.client.get(format!("{}{path}", self.base_url)).send().await?;
        Ok(response)
    }

    /// Send a POST request with an empty body to the given path
    pub async fn post(&self, path: &str) -> anyhow::Result<reqwest::Response> {
        let response = self.client.post(format!("{}{path}", self.base_url)).send().await?;
        Ok(response)
    }
}

/// Test server that manages the lifecycle of a server instance
pub struct TestServer {
    /// Client configured against the server's base URL.
    pub client: TestClient,
    /// The address the server listens on.
    pub address: SocketAddr,
    _handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    /// Start a new test server with the given TOML configuration
    pub async fn start(config_toml: &str) -> Self {
        let config: Config = toml::from_str(config_toml).expect("invalid test configuration");

        // Bind to port zero to find a free port, then hand the address over.
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("failed to bind to a port");
        let address = listener.local_addr().expect("failed to read the local address");

        let serve_config = ServeConfig {
            listen_address: address,
            config,
        };

        let (error_tx, mut error_rx) = tokio::sync::oneshot::channel();

        let handle = tokio::spawn(async move {
            drop(listener);

            if let Err(e) = server::serve(serve_config).await {
                let _ = error_tx.send(e);
            }
        });

        tokio::time::sleep(Duration::from_millis(50)).await;

        if let Ok(e) = error_rx.try_recv() {
            eprintln!("Server failed to start: {e}");
            std::process::exit(1);
        }

        let client = TestClient::new(format!("http://{address}"));

        // Wait until the server accepts connections.
        let mut retries = 20;
        while retries > 0 {
            if client.get("/").await.is_ok() {
                break;
            }

            retries -= 1;
            tokio::time::sleep(Duration::from_millis(25)).await;
        }

        Self {
            client,
            address,
            _handle: handle,
        }
    }
}
