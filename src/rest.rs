//! REST base client.
//!
//! A [`RestClient`] is an immutable handle rooted at `{base}/api/v1`, or at
//! `{base}/api/v1/{organization}/{environment}` when it is tenant-scoped.
//! Sub-service clients hold one and address resources with path segments
//! relative to that root.

use crate::builder::RequestBuilder;
use crate::middleware::{RequestMiddleware, ResponseMiddleware};
use crate::transport::{HttpTransport, RestResponse, Transport, TransportConfig};
use crate::types::*;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// API version segment prepended to every resource path
pub const API_VERSION_PATH: [&str; 2] = ["api", "v1"];

#[derive(Clone)]
pub struct RestClient {
    root: Url,
    tenant: Option<Tenant>,
    pub(crate) credentials: Option<SecureCredentials>,
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) request_middleware: Vec<Arc<dyn RequestMiddleware>>,
    pub(crate) response_middleware: Vec<Arc<dyn ResponseMiddleware>>,
}

impl RestClient {
    /// Anonymous client rooted at `{base_url}/api/v1`
    pub fn new(base_url: &str) -> NexusResult<Self> {
        Self::build(base_url, None, None)
    }

    /// Client rooted at `{base_url}/api/v1/{organization}/{environment}`.
    ///
    /// Without credentials the handle is still valid, just anonymous.
    pub fn for_tenant(
        base_url: &str,
        tenant: Tenant,
        credentials: Option<SecureCredentials>,
    ) -> NexusResult<Self> {
        Self::build(base_url, Some(tenant), credentials)
    }

    fn build(
        base_url: &str,
        tenant: Option<Tenant>,
        credentials: Option<SecureCredentials>,
    ) -> NexusResult<Self> {
        let transport = HttpTransport::new(&TransportConfig::default())?;
        Self::from_parts(base_url, tenant, credentials, Arc::new(transport))
    }

    /// Client over an explicit transport
    pub fn from_parts(
        base_url: &str,
        tenant: Option<Tenant>,
        credentials: Option<SecureCredentials>,
        transport: Arc<dyn Transport>,
    ) -> NexusResult<Self> {
        let root = endpoint_root(base_url, tenant.as_ref())?;
        Ok(Self {
            root,
            tenant,
            credentials,
            transport,
            request_middleware: Vec::new(),
            response_middleware: Vec::new(),
        })
    }

    /// Replace the transport, e.g. with a tuned `HttpTransport` or a test double
    pub fn with_transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Arc::new(transport);
        self
    }

    pub fn with_shared_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = transport;
        self
    }

    pub fn with_credentials(mut self, credentials: SecureCredentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Add middleware that processes requests before they're sent
    pub fn add_request_middleware(mut self, middleware: impl RequestMiddleware + 'static) -> Self {
        self.request_middleware.push(Arc::new(middleware));
        self
    }

    /// Add middleware that processes responses after they're received
    pub fn add_response_middleware(mut self, middleware: impl ResponseMiddleware + 'static) -> Self {
        self.response_middleware.push(Arc::new(middleware));
        self
    }

    /// Effective endpoint root, without a trailing slash
    pub fn endpoint_root(&self) -> &str {
        self.root.as_str()
    }

    pub fn tenant(&self) -> Option<&Tenant> {
        self.tenant.as_ref()
    }

    pub fn has_credentials(&self) -> bool {
        self.credentials.is_some()
    }

    /// Resolve path segments against the endpoint root. Each segment is
    /// percent-encoded, so identifiers cannot escape their position.
    pub fn url_for(&self, segments: &[&str]) -> Url {
        let mut url = self.root.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments.iter().copied());
        }
        url
    }

    /// Start building a request for `segments` relative to the root
    pub fn request(&self, method: Method, segments: &[&str]) -> RequestBuilder<'_> {
        RequestBuilder::new(self, method, self.url_for(segments))
    }

    pub async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> NexusResult<T> {
        self.request(Method::GET, segments).send_json().await
    }

    pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> NexusResult<T> {
        self.request(Method::POST, segments).json(body)?.send_json().await
    }

    pub async fn post<B: Serialize + ?Sized>(&self, segments: &[&str], body: &B) -> NexusResult<()> {
        self.request(Method::POST, segments).json(body)?.send_empty().await
    }

    pub async fn put<B: Serialize + ?Sized>(&self, segments: &[&str], body: &B) -> NexusResult<()> {
        self.request(Method::PUT, segments).json(body)?.send_empty().await
    }

    pub async fn put_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> NexusResult<T> {
        self.request(Method::PUT, segments).json(body)?.send_json().await
    }

    pub async fn delete(&self, segments: &[&str]) -> NexusResult<()> {
        self.request(Method::DELETE, segments).send_empty().await
    }

    /// Map a non-success status to the matching error
    pub(crate) fn check_status(&self, response: RestResponse) -> NexusResult<RestResponse> {
        if response.is_success() {
            return Ok(response);
        }

        let body = sanitize_error_message(&response.text());
        match response.status {
            401 => Err(NexusError::Unauthenticated),
            404 => Err(NexusError::NotFound(body)),
            409 => Err(NexusError::Conflict(body)),
            429 => {
                let retry_after = response
                    .headers
                    .get("retry-after")
                    .and_then(|h| h.to_str().ok())
                    .and_then(|s| s.trim().parse::<u64>().ok())
                    .map(Duration::from_secs);
                Err(NexusError::RateLimited { retry_after })
            }
            status => Err(NexusError::api_error(
                body,
                status,
                Some(concat!(file!(), ":", line!())),
            )),
        }
    }
}

impl std::fmt::Debug for RestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestClient")
            .field("root", &self.root.as_str())
            .field("tenant", &self.tenant)
            .field("credentials", &self.credentials)
            .finish()
    }
}

/// Compute `{base}/api/v1[/{organization}/{environment}]`
fn endpoint_root(base_url: &str, tenant: Option<&Tenant>) -> NexusResult<Url> {
    let mut root = Url::parse(base_url.trim())
        .map_err(|e| NexusError::Configuration(format!("invalid base URL '{}': {}", base_url, e)))?;
    root.set_query(None);
    root.set_fragment(None);

    {
        let mut path = root.path_segments_mut().map_err(|_| {
            NexusError::Configuration(format!("base URL '{}' cannot have a path", base_url))
        })?;
        // Drops a trailing slash so "https://host/" and "https://host" agree
        path.pop_if_empty().extend(API_VERSION_PATH);
        if let Some(tenant) = tenant {
            path.push(&tenant.organization).push(&tenant.environment);
        }
    }

    Ok(root)
}
