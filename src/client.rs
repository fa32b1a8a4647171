// Root context for SDK consumers

use crate::events::RestEventPublisher;
use crate::middleware::{RequestMiddleware, ResponseMiddleware};
use crate::rest::RestClient;
use crate::singleton::LazySingleton;
use crate::transport::{HttpTransport, Transport, TransportConfig};
use crate::types::*;
use crate::workflow::{RestSummaryStore, WorkflowCapability};
use std::sync::Arc;
use std::time::Duration;

pub const ENV_BASE_URL: &str = "NEXUS_LINK_BASE_URL";
pub const ENV_ORGANIZATION: &str = "NEXUS_LINK_ORGANIZATION";
pub const ENV_ENVIRONMENT: &str = "NEXUS_LINK_ENVIRONMENT";
pub const ENV_TOKEN: &str = "NEXUS_LINK_TOKEN";
pub const ENV_TIMEOUT_SECS: &str = "NEXUS_LINK_TIMEOUT_SECS";

struct NexusLinkConfig {
    base_url: String,
    tenant: Option<Tenant>,
    credentials: Option<SecureCredentials>,
    transport_config: TransportConfig,
    transport: Option<Arc<dyn Transport>>,
    request_middleware: Vec<Arc<dyn RequestMiddleware>>,
    response_middleware: Vec<Arc<dyn ResponseMiddleware>>,
}

impl NexusLinkConfig {
    fn rest_client(&self) -> NexusResult<RestClient> {
        let transport: Arc<dyn Transport> = match &self.transport {
            Some(transport) => transport.clone(),
            None => Arc::new(HttpTransport::new(&self.transport_config)?),
        };

        let mut client = RestClient::from_parts(
            &self.base_url,
            self.tenant.clone(),
            self.credentials.clone(),
            transport,
        )?;
        client.request_middleware = self.request_middleware.clone();
        client.response_middleware = self.response_middleware.clone();

        log::debug!("created REST client rooted at {}", client.endpoint_root());
        Ok(client)
    }
}

/// Entry point to the platform for one tenant.
///
/// Sub-clients are built on first use and shared by every clone of the
/// `NexusLink`. A failed construction (e.g. a bad base URL) is reported to
/// the caller and retried on the next access.
#[derive(Clone)]
pub struct NexusLink {
    rest: Arc<LazySingleton<RestClient, NexusError>>,
    workflow: Arc<LazySingleton<WorkflowCapability, NexusError>>,
    events: Arc<LazySingleton<RestEventPublisher, NexusError>>,
    summaries: Arc<LazySingleton<RestSummaryStore, NexusError>>,
    tenant: Option<Tenant>,
}

impl NexusLink {
    pub fn builder(base_url: impl Into<String>) -> NexusLinkBuilder {
        NexusLinkBuilder::new(base_url)
    }

    fn from_config(config: NexusLinkConfig) -> Self {
        let tenant = config.tenant.clone();
        let config = Arc::new(config);

        let rest: Arc<LazySingleton<RestClient, NexusError>> =
            Arc::new(LazySingleton::new(move || config.rest_client()));

        let rest_for_workflow = rest.clone();
        let workflow: Arc<LazySingleton<WorkflowCapability, NexusError>> = Arc::new(LazySingleton::new(move || {
            Ok(WorkflowCapability::rest(rest_for_workflow.get()?))
        }));

        let rest_for_events = rest.clone();
        let events: Arc<LazySingleton<RestEventPublisher, NexusError>> = Arc::new(LazySingleton::new(move || {
            Ok(RestEventPublisher::new(rest_for_events.get()?))
        }));

        let rest_for_summaries = rest.clone();
        let summaries: Arc<LazySingleton<RestSummaryStore, NexusError>> = Arc::new(LazySingleton::new(move || {
            Ok(RestSummaryStore::new(rest_for_summaries.get()?))
        }));

        Self {
            rest,
            workflow,
            events,
            summaries,
            tenant,
        }
    }

    pub fn tenant(&self) -> Option<&Tenant> {
        self.tenant.as_ref()
    }

    /// The shared REST client
    pub fn rest(&self) -> NexusResult<Arc<RestClient>> {
        self.rest.get()
    }

    /// The workflow engine capability over REST
    pub fn workflow(&self) -> NexusResult<Arc<WorkflowCapability>> {
        self.workflow.get()
    }

    pub fn events(&self) -> NexusResult<Arc<RestEventPublisher>> {
        self.events.get()
    }

    pub fn summaries(&self) -> NexusResult<Arc<RestSummaryStore>> {
        self.summaries.get()
    }

    /// True once the REST client has been built
    pub fn is_connected(&self) -> bool {
        self.rest.is_initialized()
    }
}

impl std::fmt::Debug for NexusLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NexusLink")
            .field("tenant", &self.tenant)
            .field("rest", &self.rest)
            .finish()
    }
}

/// Configures a [`NexusLink`]
pub struct NexusLinkBuilder {
    config: NexusLinkConfig,
}

impl NexusLinkBuilder {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            config: NexusLinkConfig {
                base_url: base_url.into(),
                tenant: None,
                credentials: None,
                transport_config: TransportConfig::default(),
                transport: None,
                request_middleware: Vec::new(),
                response_middleware: Vec::new(),
            },
        }
    }

    /// Read settings through `lookup`, which maps a variable name to its value.
    ///
    /// The base URL is required. Organization and environment must be set
    /// together or not at all.
    pub fn from_lookup<F>(lookup: F) -> NexusResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup(ENV_BASE_URL)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| NexusError::Configuration(format!("{} is not set", ENV_BASE_URL)))?;
        let mut builder = Self::new(base_url);

        match (lookup(ENV_ORGANIZATION), lookup(ENV_ENVIRONMENT)) {
            (Some(organization), Some(environment)) => {
                builder = builder.tenant(Tenant::new(organization, environment)?);
            }
            (None, None) => {}
            _ => {
                return Err(NexusError::Configuration(format!(
                    "{} and {} must be set together",
                    ENV_ORGANIZATION, ENV_ENVIRONMENT
                )))
            }
        }

        if let Some(token) = lookup(ENV_TOKEN).filter(|t| !t.is_empty()) {
            builder = builder.credentials(SecureCredentials::new(token));
        }

        if let Some(timeout) = lookup(ENV_TIMEOUT_SECS) {
            let secs = timeout.trim().parse::<u64>().map_err(|_| {
                NexusError::Configuration(format!("{} must be a whole number of seconds", ENV_TIMEOUT_SECS))
            })?;
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(builder)
    }

    pub fn tenant(mut self, tenant: Tenant) -> Self {
        self.config.tenant = Some(tenant);
        self
    }

    pub fn credentials(mut self, credentials: SecureCredentials) -> Self {
        self.config.credentials = Some(credentials);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.transport_config.timeout = timeout;
        self
    }

    pub fn transport_config(mut self, transport_config: TransportConfig) -> Self {
        self.config.transport_config = transport_config;
        self
    }

    /// Use `transport` instead of building an `HttpTransport`
    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.config.transport = Some(Arc::new(transport));
        self
    }

    pub fn shared_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.config.transport = Some(transport);
        self
    }

    pub fn add_request_middleware(mut self, middleware: impl RequestMiddleware + 'static) -> Self {
        self.config.request_middleware.push(Arc::new(middleware));
        self
    }

    pub fn add_response_middleware(mut self, middleware: impl ResponseMiddleware + 'static) -> Self {
        self.config.response_middleware.push(Arc::new(middleware));
        self
    }

    pub fn build(self) -> NexusLink {
        NexusLink::from_config(self.config)
    }
}
