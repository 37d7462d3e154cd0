//! HTTP transport implementation backed by a pooled `reqwest` client

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use std::time::Instant;
use tracing::{debug, warn};
use url::Url;

use crate::config::ClientConfig;
use crate::error::{ConfigError, TransportError};
use crate::transport::{BatchTransport, TransportResponse};

/// HTTP transport for batch exchanges.
///
/// Wraps one `reqwest::Client`, whose keep-alive pool is shared by all workers and
/// all dispatch cycles of the owning client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    /// HTTP client
    client: Client,
}

impl HttpTransport {
    /// Create a new HTTP transport from client configuration
    pub fn new(config: &ClientConfig) -> Result<Self, ConfigError> {
        let mut builder = Client::builder()
            .connect_timeout(config.timeouts.connect)
            .timeout(config.timeouts.request)
            .pool_max_idle_per_host(config.connection.max_idle_per_host)
            .pool_idle_timeout(config.connection.idle_timeout)
            .gzip(config.connection.gzip);

        if let Some(user_agent) = &config.connection.user_agent {
            builder = builder.user_agent(user_agent.as_str());
        }

        let client = builder
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self { client })
    }

    /// Create HTTP transport with custom client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl BatchTransport for HttpTransport {
    async fn exchange(
        &self,
        endpoint: &Url,
        body: Vec<u8>,
    ) -> Result<TransportResponse, TransportError> {
        let start_time = Instant::now();
        let body_len = body.len();

        let response = self
            .client
            .post(endpoint.clone())
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!(endpoint = %endpoint, status = %status, "Batch exchange returned non-success status");
        }

        // With gzip enabled reqwest sends `Accept-Encoding: gzip` and decodes the body.
        let body = response.bytes().await?;

        debug!(
            status = status.as_u16(),
            request_bytes = body_len,
            response_bytes = body.len(),
            elapsed_ms = start_time.elapsed().as_millis(),
            "HTTP batch exchange completed"
        );

        Ok(TransportResponse::new(status.as_u16(), body))
    }
}
