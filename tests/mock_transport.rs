use async_trait::async_trait;
use nexus_link_sdk::types::*;
use nexus_link_sdk::{RestClient, RestRequest, RestResponse, Transport};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const BASE_URL: &str = "https://link.example.com";

/// Transport that replays queued responses and records every request
#[allow(dead_code)]
pub struct MockTransport {
    responses: Mutex<VecDeque<NexusResult<RestResponse>>>,
    requests: Mutex<Vec<RestRequest>>,
    delay: Mutex<Option<Duration>>,
}

#[allow(dead_code)]
impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            delay: Mutex::new(None),
        })
    }

    pub fn push_response(&self, response: RestResponse) {
        self.responses.lock().unwrap().push_back(Ok(response));
    }

    pub fn push_json<T: Serialize>(&self, status: u16, body: &T) {
        self.push_response(RestResponse::json(status, body).unwrap());
    }

    pub fn push_status(&self, status: u16, body: &str) {
        self.push_response(RestResponse::new(status, body.to_string()));
    }

    pub fn push_error(&self, error: NexusError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn requests(&self) -> Vec<RestRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> RestRequest {
        self.requests().pop().expect("no request was sent")
    }

    /// "METHOD url" for each request, in order
    pub fn request_lines(&self) -> Vec<String> {
        self.requests()
            .iter()
            .map(|r| format!("{} {}", r.method, r.url))
            .collect()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn execute(&self, request: RestRequest) -> NexusResult<RestResponse> {
        self.requests.lock().unwrap().push(request);

        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let next = self.responses.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(RestResponse::new(204, Vec::new())))
    }
}

/// Tenant-scoped client for acme/prod over `transport`
#[allow(dead_code)]
pub fn tenant_client(transport: Arc<MockTransport>, token: Option<&str>) -> Arc<RestClient> {
    let tenant = Tenant::new("acme", "prod").unwrap();
    let client = RestClient::from_parts(
        BASE_URL,
        Some(tenant),
        token.map(SecureCredentials::new),
        transport,
    )
    .unwrap();
    Arc::new(client)
}

#[allow(dead_code)]
pub fn tenant_url(path: &str) -> String {
    format!("{}/api/v1/acme/prod/{}", BASE_URL, path)
}
