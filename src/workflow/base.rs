//! Base implementation for REST sub-service clients.
//!
//! Every REST sub-service holds a `BaseServiceClient` and delegates the
//! `ServiceClient` trait to it.

use crate::rest::RestClient;
use crate::workflow::ServiceClient;
use std::sync::Arc;

pub struct BaseServiceClient {
    /// Tenant-scoped REST client shared by all sub-services
    client: Arc<RestClient>,
    service_name: &'static str,
}

impl BaseServiceClient {
    pub fn new(client: Arc<RestClient>, service_name: &'static str) -> Self {
        Self { client, service_name }
    }

    pub fn client(&self) -> &RestClient {
        &self.client
    }
}

impl ServiceClient for BaseServiceClient {
    fn service_name(&self) -> &str {
        self.service_name
    }
}
