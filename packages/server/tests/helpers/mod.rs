use std::time::Duration;

use promptlift_server::{ServerConfig, run_server_with_handle};

pub struct TestServer {
    url: String,
    handle: actix_web::dev::ServerHandle,
}

impl TestServer {
    /// Start with fast retries and no gateway rate limit.
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to start or no ports are available
    pub async fn start(config: ServerConfig) -> anyhow::Result<Self> {
        Self::start_raw(
            config
                .with_retry_delays(Duration::from_millis(50), Duration::from_millis(50))
                .with_rate_limit(0, Duration::from_secs(60)),
        )
        .await
    }

    /// Start with `config` exactly as given, apart from host and port.
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to start or no ports are available
    pub async fn start_raw(config: ServerConfig) -> anyhow::Result<Self> {
        let config = config.with_host("127.0.0.1".to_string()).with_port(0);

        let response = run_server_with_handle(&config)?;
        let port = response
            .addrs
            .first()
            .ok_or_else(|| anyhow::anyhow!("Expected at least one address"))?
            .port();
        let url = format!("http://127.0.0.1:{port}");

        wait_for_server_ready(&url).await?;

        Ok(Self {
            url,
            handle: response.handle,
        })
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.url)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let handle = self.handle.clone();
        tokio::spawn(async move {
            handle.stop(true).await;
        });
    }
}

async fn wait_for_server_ready(url: &str) -> anyhow::Result<()> {
    let client = reqwest::Client::new();
    let health_url = format!("{url}/health");

    for _ in 0..30 {
        if let Ok(response) = client.get(&health_url).send().await
            && response.status().is_success()
        {
            return Ok(());
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    anyhow::bail!("Server failed to start within timeout")
}
