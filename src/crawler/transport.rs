//! HTTP transport for the platform data API
//!
//! The collection loop only sees [`PlatformTransport`]: one GET against a named
//! endpoint returning the decoded JSON body. [`HttpTransport`] is the `reqwest`
//! implementation; it attaches the API key itself so that callers, retries and
//! logs never handle the credential.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

use crate::config::ApiConfig;
use crate::utils::error::TransportError;

/// Query parameters for one request, credential excluded
pub type QueryParams = Vec<(&'static str, String)>;

/// Remote endpoints used by the collector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// Keyword search returning candidate ids
    Search,
    /// Batched video detail lookup
    Videos,
}

impl Endpoint {
    /// Path segment below the API base URL
    pub fn path(&self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::Videos => "videos",
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path())
    }
}

/// One request/response exchange with the platform
#[async_trait]
pub trait PlatformTransport: Send + Sync {
    /// Issue a GET and return the JSON body of a 2xx response
    async fn get(&self, endpoint: Endpoint, params: &QueryParams) -> Result<Value, TransportError>;
}

/// `reqwest`-backed transport
pub struct HttpTransport {
    /// HTTP client with configured timeout and compression
    client: Client,

    /// API base URL without trailing slash
    base_url: String,

    /// Credential appended to every request
    api_key: String,
}

impl HttpTransport {
    /// Create a transport from API configuration
    ///
    /// # Errors
    ///
    /// Returns `TransportError::Http` if the HTTP client cannot be created
    pub fn new(config: &ApiConfig) -> Result<Self, TransportError> {
        Self::with_base_url(
            &config.base_url,
            &config.api_key,
            config.request_timeout(),
        )
    }

    /// Create a transport against an explicit base URL (mock servers in tests)
    ///
    /// # Errors
    ///
    /// Returns `TransportError::Http` if the HTTP client cannot be created
    pub fn with_base_url(
        base_url: &str,
        api_key: &str,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .gzip(true)
            .default_headers(Self::default_headers())
            .user_agent(format!("strata/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn default_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers
    }

    fn url_for(&self, endpoint: Endpoint) -> String {
        format!("{}/{}", self.base_url, endpoint.path())
    }
}

#[async_trait]
impl PlatformTransport for HttpTransport {
    async fn get(&self, endpoint: Endpoint, params: &QueryParams) -> Result<Value, TransportError> {
        let response = self
            .client
            .get(self.url_for(endpoint))
            .query(params)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| TransportError::Decode(e.to_string()))
    }
}
