// Request Builder

use crate::rest::RestClient;
use crate::transport::{RestRequest, RestResponse};
use crate::types::*;
use reqwest::header::{self, HeaderName, HeaderValue};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

/// Builds one call against a [`RestClient`] with a fluent interface.
pub struct RequestBuilder<'a> {
    client: &'a RestClient,
    request: RestRequest,
}

impl<'a> RequestBuilder<'a> {
    pub(crate) fn new(client: &'a RestClient, method: Method, url: Url) -> Self {
        Self {
            client,
            request: RestRequest::new(method, url),
        }
    }

    /// Append a query parameter
    pub fn query(mut self, key: &str, value: &str) -> Self {
        self.request.url.query_pairs_mut().append_pair(key, value);
        self
    }

    /// Set a request header
    pub fn header(mut self, name: &str, value: &str) -> NexusResult<Self> {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| NexusError::Validation(format!("invalid header name '{}': {}", name, e)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| NexusError::Validation(format!("invalid header value: {}", e)))?;
        self.request.headers.insert(name, value);
        Ok(self)
    }

    /// Set a JSON body
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> NexusResult<Self> {
        self.request.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Attach credentials and run request middleware in registration order
    fn prepare_request(&self) -> NexusResult<RestRequest> {
        let mut request = self.request.clone();

        if !request.headers.contains_key(header::ACCEPT) {
            request
                .headers
                .insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        }

        if let Some(credentials) = &self.client.credentials {
            let value = HeaderValue::from_str(&credentials.authorization_header())
                .map_err(|_| NexusError::Configuration("credentials contain invalid header characters".into()))?;
            request.headers.insert(header::AUTHORIZATION, value);
        }

        Ok(request)
    }

    /// Send the request and map the status to an error when it is not 2xx
    pub async fn send(self) -> NexusResult<RestResponse> {
        let mut request = self.prepare_request()?;
        for middleware in &self.client.request_middleware {
            request = middleware.process_request(request).await?;
        }

        let method = request.method.clone();
        let url = request.url.clone();
        tracing::debug!(%method, %url, "sending request");

        let mut response = self.client.transport.execute(request).await?;

        for middleware in &self.client.response_middleware {
            response = middleware.process_response(response).await?;
        }

        tracing::debug!(%method, %url, status = response.status, "received response");
        self.client.check_status(response)
    }

    /// Send and deserialize a JSON body
    pub async fn send_json<T: DeserializeOwned>(self) -> NexusResult<T> {
        let response = self.send().await?;
        serde_json::from_slice(&response.body).map_err(|e| {
            NexusError::parse_error(
                format!("Failed to parse response body: {}", e),
                Some(sanitize_error_message(&response.text())),
                Some(e),
                Some(concat!(file!(), ":", line!())),
            )
        })
    }

    /// Send and discard any body
    pub async fn send_empty(self) -> NexusResult<()> {
        self.send().await.map(|_| ())
    }
}
