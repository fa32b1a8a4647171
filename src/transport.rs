// Wire transport for REST calls

use crate::types::*;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::{Client as HttpClient, Method};
use std::time::Duration;
use url::Url;

/// A fully resolved request, ready for the wire
#[derive(Debug, Clone)]
pub struct RestRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<serde_json::Value>,
}

impl RestRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
        }
    }
}

/// Raw response as returned by a transport, before status mapping
#[derive(Debug, Clone)]
pub struct RestResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl RestResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    /// Build a response whose body is the JSON encoding of `value`
    pub fn json<T: serde::Serialize>(status: u16, value: &T) -> NexusResult<Self> {
        Ok(Self::new(status, serde_json::to_vec(value)?))
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// The seam between request building and the network.
///
/// `HttpTransport` is the production implementation; tests plug in their own.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: RestRequest) -> NexusResult<RestResponse>;
}

/// Configuration for TLS
#[derive(Clone, Debug)]
pub struct TlsConfig {
    pub min_tls_version: Option<reqwest::tls::Version>,
    pub cert_verification: bool,
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            min_tls_version: Some(reqwest::tls::Version::TLS_1_2),
            cert_verification: true,
        }
    }
}

/// Settings for the reqwest-backed transport
#[derive(Clone, Debug)]
pub struct TransportConfig {
    pub timeout: Duration,
    pub tls: TlsConfig,
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(100),
            tls: TlsConfig::default(),
            user_agent: concat!("nexus-link-sdk/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Transport that sends requests with reqwest
#[derive(Clone, Debug)]
pub struct HttpTransport {
    http_client: HttpClient,
}

impl HttpTransport {
    pub fn new(config: &TransportConfig) -> NexusResult<Self> {
        let mut builder = HttpClient::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .danger_accept_invalid_certs(!config.tls.cert_verification);

        if let Some(version) = config.tls.min_tls_version {
            builder = builder.min_tls_version(version);
        }

        let http_client = builder.build().map_err(|e| {
            NexusError::Configuration(format!("failed to create HTTP client: {}", e))
        })?;

        Ok(Self { http_client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: RestRequest) -> NexusResult<RestResponse> {
        let mut builder = self
            .http_client
            .request(request.method, request.url)
            .headers(request.headers);

        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        Ok(RestResponse { status, headers, body })
    }
}
