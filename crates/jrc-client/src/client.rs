//! Main batching client implementation

use jrc_json_rpc::{JsonRpcRequest, JsonRpcResponse};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use url::Url;

use crate::config::{ClientConfig, parse_endpoint, require_positive};
use crate::decode::decode_payloads;
use crate::dispatch::{CycleLimits, RawPayload, run_cycle};
use crate::error::{BatchClientError, BatchClientResult};
use crate::transport::{HttpTransport, SharedTransport};

/// A configuration change applied through [`BatchClient::set_options`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientOption {
    /// Endpoint URL
    Address(String),
    /// Maximum simultaneous connections per dispatch cycle
    MaxConnections(usize),
    /// Maximum requests per batch
    MaxBatchSize(usize),
}

/// Batching JSON-RPC client bound to a single endpoint.
///
/// Each `execute*` call runs its own dispatch cycle with its own channels, tracker
/// and workers; only the transport's connection pool is shared. Calls may run
/// concurrently on a shared reference. Configuration setters take `&mut self`, so
/// the configuration cannot change under an in-flight call.
///
/// Responses come back grouped by batch in arrival order. Correlate them with
/// requests by `id`, never by position.
#[derive(Debug, Clone)]
pub struct BatchClient {
    /// Configuration
    config: ClientConfig,
    /// Parsed endpoint, kept in sync with `config.endpoint`
    endpoint: Arc<Url>,
    /// Transport layer
    transport: SharedTransport,
}

impl BatchClient {
    /// Create a client for `endpoint` with default limits and the HTTP transport
    pub fn new(endpoint: &str) -> BatchClientResult<Self> {
        BatchClientBuilder::new().with_endpoint(endpoint).build()
    }

    /// Create a client from a full configuration
    pub fn with_config(config: ClientConfig) -> BatchClientResult<Self> {
        BatchClientBuilder::new().with_config(config).build()
    }

    /// Create a client that sends its batches through `transport`
    pub fn with_transport(config: ClientConfig, transport: SharedTransport) -> BatchClientResult<Self> {
        let endpoint = config.validate()?;

        info!(
            endpoint = %endpoint,
            max_connections = config.max_connections,
            max_batch_size = config.max_batch_size,
            "Batch client created"
        );

        Ok(Self {
            config,
            endpoint: Arc::new(endpoint),
            transport,
        })
    }

    /// Current configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Endpoint every batch is posted to
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn max_connections(&self) -> usize {
        self.config.max_connections
    }

    pub fn max_batch_size(&self) -> usize {
        self.config.max_batch_size
    }

    /// Point the client at a new endpoint. The URL must parse and use http or https.
    ///
    /// The transport and its connection pool are kept; later calls post to the new URL.
    pub fn set_address(&mut self, endpoint: &str) -> BatchClientResult<()> {
        let url = parse_endpoint(endpoint)?;
        info!(endpoint = %url, "Endpoint changed");
        self.config.endpoint = endpoint.to_string();
        self.endpoint = Arc::new(url);
        Ok(())
    }

    /// Set the maximum number of simultaneous connections (must be positive)
    pub fn set_max_connections(&mut self, max_connections: usize) -> BatchClientResult<()> {
        self.config.max_connections = require_positive("max_connections", max_connections)?;
        debug!(max_connections, "Max connections changed");
        Ok(())
    }

    /// Set the maximum number of requests per batch (must be positive)
    pub fn set_max_batch_size(&mut self, max_batch_size: usize) -> BatchClientResult<()> {
        self.config.max_batch_size = require_positive("max_batch_size", max_batch_size)?;
        debug!(max_batch_size, "Max batch size changed");
        Ok(())
    }

    /// Apply options in order, stopping at the first invalid one
    pub fn set_options(
        &mut self,
        options: impl IntoIterator<Item = ClientOption>,
    ) -> BatchClientResult<()> {
        for option in options {
            match option {
                ClientOption::Address(endpoint) => self.set_address(&endpoint)?,
                ClientOption::MaxConnections(n) => self.set_max_connections(n)?,
                ClientOption::MaxBatchSize(n) => self.set_max_batch_size(n)?,
            }
        }
        Ok(())
    }

    /// Run one dispatch cycle and return the raw payloads, one per batch, in arrival order.
    ///
    /// A batch whose exchange failed yields [`RawPayload::TransportFailed`] rather
    /// than failing the call. No JSON decoding of responses is done.
    pub async fn execute_raw(
        &self,
        requests: impl Into<Arc<[JsonRpcRequest]>>,
    ) -> BatchClientResult<Vec<RawPayload>> {
        self.execute_raw_with_cancel(requests, CancellationToken::new())
            .await
    }

    /// [`execute_raw`](Self::execute_raw) that aborts when `cancel` fires.
    ///
    /// On cancellation in-flight exchanges are dropped, every worker is joined and
    /// the call returns [`BatchClientError::Cancelled`].
    pub async fn execute_raw_with_cancel(
        &self,
        requests: impl Into<Arc<[JsonRpcRequest]>>,
        cancel: CancellationToken,
    ) -> BatchClientResult<Vec<RawPayload>> {
        let requests = requests.into();
        if requests.is_empty() {
            return Ok(Vec::new());
        }

        let limits = CycleLimits {
            max_connections: self.config.max_connections,
            max_batch_size: self.config.max_batch_size,
        };
        let outcome = run_cycle(
            Arc::clone(&self.transport),
            Arc::clone(&self.endpoint),
            requests,
            limits,
            cancel,
        )
        .await?;

        Ok(outcome.payloads)
    }

    /// Run one dispatch cycle and decode every payload into responses.
    ///
    /// All or nothing: the first payload that is not a JSON array of responses
    /// (including a failed exchange) fails the whole call with a decode error.
    pub async fn execute(
        &self,
        requests: impl Into<Arc<[JsonRpcRequest]>>,
    ) -> BatchClientResult<Vec<JsonRpcResponse>> {
        self.execute_with_cancel(requests, CancellationToken::new())
            .await
    }

    /// [`execute`](Self::execute) that aborts when `cancel` fires
    pub async fn execute_with_cancel(
        &self,
        requests: impl Into<Arc<[JsonRpcRequest]>>,
        cancel: CancellationToken,
    ) -> BatchClientResult<Vec<JsonRpcResponse>> {
        let payloads = self.execute_raw_with_cancel(requests, cancel).await?;
        Ok(decode_payloads(&payloads)?)
    }

    /// Execute a single request
    pub async fn execute_one(&self, request: JsonRpcRequest) -> BatchClientResult<JsonRpcResponse> {
        self.execute(vec![request])
            .await?
            .into_iter()
            .next()
            .ok_or(BatchClientError::EmptyResult)
    }
}

/// Builder for [`BatchClient`]
pub struct BatchClientBuilder {
    config: ClientConfig,
    transport: Option<SharedTransport>,
}

impl BatchClientBuilder {
    /// Create a new client builder
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
            transport: None,
        }
    }

    /// Set configuration
    pub fn with_config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the endpoint URL
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.endpoint = endpoint.into();
        self
    }

    pub fn with_max_connections(mut self, max_connections: usize) -> Self {
        self.config.max_connections = max_connections;
        self
    }

    pub fn with_max_batch_size(mut self, max_batch_size: usize) -> Self {
        self.config.max_batch_size = max_batch_size;
        self
    }

    /// Set transport (defaults to [`HttpTransport`] built from the configuration)
    pub fn with_transport(mut self, transport: SharedTransport) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Build the client, validating the configuration
    pub fn build(self) -> BatchClientResult<BatchClient> {
        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HttpTransport::new(&self.config)?),
        };
        BatchClient::with_transport(self.config, transport)
    }
}

impl Default for BatchClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
