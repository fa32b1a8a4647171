//! Workflow engine capability.
//!
//! The workflow engine is exposed as a capability: an aggregate of named
//! sub-services, one trait per sub-service. [`WorkflowCapability`] holds one
//! implementation of each and hands them out by name. The REST
//! implementations in [`rest`] talk to a tenant-scoped [`RestClient`];
//! callers may swap any of them for their own.
//!
//! ```no_run
//! use nexus_link_sdk::{RestClient, SecureCredentials, Tenant};
//! use nexus_link_sdk::workflow::{FormCreate, FormService, WorkflowCapability};
//! use std::sync::Arc;
//!
//! # async fn run() -> nexus_link_sdk::NexusResult<()> {
//! let client = RestClient::for_tenant(
//!     "https://workflow.example.com",
//!     Tenant::new("acme", "prod")?,
//!     Some(SecureCredentials::new("token")),
//! )?;
//! let workflow = WorkflowCapability::rest(Arc::new(client));
//! let form_id = workflow
//!     .form()
//!     .create(&FormCreate { capability_name: "orders".into(), title: "Ship order".into() })
//!     .await?;
//! println!("created form {}", form_id);
//! # Ok(())
//! # }
//! ```

pub mod base;
pub mod models;
pub mod rest;
pub mod summary;

pub use models::*;
pub use summary::{MemorySummaryStore, RestSummaryStore, SummaryStore};

use crate::rest::RestClient;
use crate::types::*;
use async_trait::async_trait;
use std::sync::Arc;

/// Common trait for all workflow sub-service clients
pub trait ServiceClient: Send + Sync {
    /// The sub-service name, used in errors and logs
    fn service_name(&self) -> &str;

    /// Validate an identifier that will become a path segment
    fn validate_id(&self, id: &str, param_name: &str) -> NexusResult<()> {
        if id.trim().is_empty() {
            return Err(NexusError::Validation(format!(
                "{}: {} cannot be empty",
                self.service_name(),
                param_name
            )));
        }
        Ok(())
    }
}

#[async_trait]
pub trait ActivityService: Send + Sync {
    async fn read(&self, activity_id: &str) -> NexusResult<Activity>;

    /// Mark the activity as successfully completed with `result`
    async fn success(&self, activity_id: &str, result: &serde_json::Value) -> NexusResult<()>;

    async fn failed(&self, activity_id: &str, failure: &ActivityFailure) -> NexusResult<()>;
}

#[async_trait]
pub trait WorkflowService: Send + Sync {
    /// Read the form, version and instance for an executing instance
    async fn read(&self, instance_id: &str) -> NexusResult<Workflow>;
}

#[async_trait]
pub trait InstanceService: Send + Sync {
    async fn create(&self, create: &InstanceCreate) -> NexusResult<Instance>;

    async fn read(&self, instance_id: &str) -> NexusResult<Instance>;

    async fn update(&self, instance: &Instance) -> NexusResult<Instance>;
}

#[async_trait]
pub trait FormService: Send + Sync {
    /// Returns the id of the new form
    async fn create(&self, create: &FormCreate) -> NexusResult<String>;

    async fn read(&self, form_id: &str) -> NexusResult<Form>;

    async fn update(&self, form: &Form) -> NexusResult<Form>;
}

#[async_trait]
pub trait VersionService: Send + Sync {
    async fn create(&self, form_id: &str, create: &VersionCreate) -> NexusResult<Version>;

    async fn read(&self, form_id: &str, major_version: u32) -> NexusResult<Version>;
}

#[async_trait]
pub trait LogService: Send + Sync {
    /// Returns the id of the new entry
    async fn create(&self, create: &LogCreate) -> NexusResult<String>;

    async fn read_by_parent(&self, parent_id: &str) -> NexusResult<Vec<LogEntry>>;
}

#[async_trait]
pub trait SemaphoreService: Send + Sync {
    /// Take a place in the semaphore. `Conflict` when the limit is reached.
    async fn raise(&self, create: &SemaphoreCreate) -> NexusResult<SemaphoreHolder>;

    async fn extend(&self, holder_id: &str, expiration_seconds: u64) -> NexusResult<SemaphoreHolder>;

    async fn lower(&self, holder_id: &str) -> NexusResult<()>;
}

#[async_trait]
pub trait SummaryService: Send + Sync {
    async fn read(&self, key: &SummaryKey) -> NexusResult<WorkflowSummary>;
}

/// The workflow engine's sub-services, aggregated
#[derive(Clone)]
pub struct WorkflowCapability {
    activity: Arc<dyn ActivityService>,
    workflow: Arc<dyn WorkflowService>,
    instance: Arc<dyn InstanceService>,
    form: Arc<dyn FormService>,
    version: Arc<dyn VersionService>,
    log: Arc<dyn LogService>,
    semaphore: Arc<dyn SemaphoreService>,
    summary: Arc<dyn SummaryService>,
}

impl WorkflowCapability {
    pub fn builder() -> WorkflowCapabilityBuilder {
        WorkflowCapabilityBuilder::default()
    }

    /// Every sub-service backed by REST calls through `client`
    pub fn rest(client: Arc<RestClient>) -> Self {
        Self {
            activity: Arc::new(rest::RestActivityService::new(client.clone())),
            workflow: Arc::new(rest::RestWorkflowService::new(client.clone())),
            instance: Arc::new(rest::RestInstanceService::new(client.clone())),
            form: Arc::new(rest::RestFormService::new(client.clone())),
            version: Arc::new(rest::RestVersionService::new(client.clone())),
            log: Arc::new(rest::RestLogService::new(client.clone())),
            semaphore: Arc::new(rest::RestSemaphoreService::new(client.clone())),
            summary: Arc::new(summary::RestSummaryStore::new(client)),
        }
    }

    pub fn activity(&self) -> &Arc<dyn ActivityService> {
        &self.activity
    }

    pub fn workflow(&self) -> &Arc<dyn WorkflowService> {
        &self.workflow
    }

    pub fn instance(&self) -> &Arc<dyn InstanceService> {
        &self.instance
    }

    pub fn form(&self) -> &Arc<dyn FormService> {
        &self.form
    }

    pub fn version(&self) -> &Arc<dyn VersionService> {
        &self.version
    }

    pub fn log(&self) -> &Arc<dyn LogService> {
        &self.log
    }

    pub fn semaphore(&self) -> &Arc<dyn SemaphoreService> {
        &self.semaphore
    }

    pub fn summary(&self) -> &Arc<dyn SummaryService> {
        &self.summary
    }
}

/// Assembles a [`WorkflowCapability`] from individual sub-services.
///
/// Start from `rest_defaults` to override only some of them.
#[derive(Default)]
pub struct WorkflowCapabilityBuilder {
    activity: Option<Arc<dyn ActivityService>>,
    workflow: Option<Arc<dyn WorkflowService>>,
    instance: Option<Arc<dyn InstanceService>>,
    form: Option<Arc<dyn FormService>>,
    version: Option<Arc<dyn VersionService>>,
    log: Option<Arc<dyn LogService>>,
    semaphore: Option<Arc<dyn SemaphoreService>>,
    summary: Option<Arc<dyn SummaryService>>,
}

impl WorkflowCapabilityBuilder {
    /// Fill every sub-service with its REST implementation
    pub fn rest_defaults(self, client: Arc<RestClient>) -> Self {
        let rest = WorkflowCapability::rest(client);
        Self {
            activity: Some(rest.activity),
            workflow: Some(rest.workflow),
            instance: Some(rest.instance),
            form: Some(rest.form),
            version: Some(rest.version),
            log: Some(rest.log),
            semaphore: Some(rest.semaphore),
            summary: Some(rest.summary),
        }
    }

    pub fn activity(mut self, service: impl ActivityService + 'static) -> Self {
        self.activity = Some(Arc::new(service));
        self
    }

    pub fn workflow(mut self, service: impl WorkflowService + 'static) -> Self {
        self.workflow = Some(Arc::new(service));
        self
    }

    pub fn instance(mut self, service: impl InstanceService + 'static) -> Self {
        self.instance = Some(Arc::new(service));
        self
    }

    pub fn form(mut self, service: impl FormService + 'static) -> Self {
        self.form = Some(Arc::new(service));
        self
    }

    pub fn version(mut self, service: impl VersionService + 'static) -> Self {
        self.version = Some(Arc::new(service));
        self
    }

    pub fn log(mut self, service: impl LogService + 'static) -> Self {
        self.log = Some(Arc::new(service));
        self
    }

    pub fn semaphore(mut self, service: impl SemaphoreService + 'static) -> Self {
        self.semaphore = Some(Arc::new(service));
        self
    }

    pub fn summary(mut self, service: impl SummaryService + 'static) -> Self {
        self.summary = Some(Arc::new(service));
        self
    }

    /// Fails with `Configuration` naming the first missing sub-service
    pub fn build(self) -> NexusResult<WorkflowCapability> {
        fn require<T: ?Sized>(service: Option<Arc<T>>, name: &str) -> NexusResult<Arc<T>> {
            service.ok_or_else(|| {
                NexusError::Configuration(format!("workflow capability is missing the {} service", name))
            })
        }

        Ok(WorkflowCapability {
            activity: require(self.activity, "activity")?,
            workflow: require(self.workflow, "workflow")?,
            instance: require(self.instance, "instance")?,
            form: require(self.form, "form")?,
            version: require(self.version, "version")?,
            log: require(self.log, "log")?,
            semaphore: require(self.semaphore, "semaphore")?,
            summary: require(self.summary, "summary")?,
        })
    }
}
