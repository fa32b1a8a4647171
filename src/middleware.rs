// Middleware and Extension Traits

use crate::transport::{RestRequest, RestResponse};
use crate::types::*;
use async_trait::async_trait;
use reqwest::header::{HeaderName, HeaderValue};

#[async_trait]
pub trait RequestMiddleware: Send + Sync {
    /// Process and possibly modify the request before sending
    async fn process_request(&self, request: RestRequest) -> NexusResult<RestRequest>;
}

#[async_trait]
pub trait ResponseMiddleware: Send + Sync {
    /// Process and possibly modify the response after receiving
    async fn process_response(&self, response: RestResponse) -> NexusResult<RestResponse>;
}

/// Header used by the platform to correlate calls across services
pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";

/// Adds a fixed header to every request unless the request already carries it
pub struct HeaderMiddleware {
    name: HeaderName,
    value: HeaderValue,
}

impl HeaderMiddleware {
    pub fn new(name: &str, value: &str) -> NexusResult<Self> {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| NexusError::Validation(format!("invalid header name '{}': {}", name, e)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| NexusError::Validation(format!("invalid header value: {}", e)))?;
        Ok(Self { name, value })
    }

    /// Tag every request with a correlation id
    pub fn correlation_id(id: &str) -> NexusResult<Self> {
        Self::new(CORRELATION_ID_HEADER, id)
    }
}

#[async_trait]
impl RequestMiddleware for HeaderMiddleware {
    async fn process_request(&self, mut request: RestRequest) -> NexusResult<RestRequest> {
        if !request.headers.contains_key(&self.name) {
            request.headers.insert(self.name.clone(), self.value.clone());
        }
        Ok(request)
    }
}
