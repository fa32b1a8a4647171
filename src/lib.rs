//! # nexus-link-sdk: contracts and REST clients for the Nexus Link platform
//!
//! Nexus Link is a multi-tenant integration platform. Every call is scoped to
//! a tenant (an organization running in an environment) and addressed under
//! `{base}/api/v1/{organization}/{environment}`.
//!
//! ## Key Features
//!
//! - Thread-safe lazy singletons for expensive shared resources
//! - Tenant-scoped REST base client with bearer credentials and middleware
//! - Workflow engine capability: forms, versions, instances, activities,
//!   logs, semaphores and persisted workflow summaries
//! - Queue and file storage contracts with in-memory implementations
//! - Event publication with cancellation
//! - Role-based authorization guard
//!
//! ## Basic Usage
//!
//! ```no_run
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let link = nexus_link_sdk::from_env()?;
//!
//!     let workflow = link.workflow()?;
//!     let form = workflow.form().read("onboarding").await?;
//!     println!("{:?}", form);
//!
//!     Ok(())
//! }
//! ```

pub mod types;
pub mod singleton;
pub mod client;
pub mod rest;
pub mod builder;
pub mod transport;
pub mod middleware;
pub mod storage;
pub mod health;
pub mod workflow;
pub mod events;
pub mod auth;
pub mod diagnostics;
pub mod utils;

// Re-export core components
pub use client::{NexusLink, NexusLinkBuilder};
pub use types::{NexusError, NexusResult, SecureCredentials, Tenant, sanitize_error_message};
pub use singleton::{AsyncLazySingleton, LazySingleton};
pub use rest::RestClient;
pub use builder::RequestBuilder;
pub use transport::{HttpTransport, RestRequest, RestResponse, TlsConfig, Transport, TransportConfig};
pub use middleware::{HeaderMiddleware, RequestMiddleware, ResponseMiddleware};
pub use health::{HealthCheck, HealthStatus};
pub use events::{EventMetadata, EventPublisher, PublishableEvent, publish_event};
pub use auth::{CallerClaims, RoleGuard};

pub mod prelude {
    //! Convenient imports for commonly used types and functions
    pub use crate::{NexusLink, NexusError, NexusResult, SecureCredentials, Tenant, RestClient, from_env};
    pub use crate::{LazySingleton, AsyncLazySingleton};
    pub use crate::storage::{Directory, File, Queue, StorageEntity, TypedQueue};
    pub use crate::workflow::{
        ActivityService, FormService, InstanceService, LogService, SemaphoreService,
        SummaryService, SummaryStore, VersionService, WorkflowCapability, WorkflowService,
    };
    pub use crate::events::{EventPublisher, PublishableEvent, publish_event};
    pub use crate::auth::{CallerClaims, RoleGuard};
}

/// Context for `base_url`, anonymous and not tenant-scoped
pub fn new_client(base_url: impl Into<String>) -> NexusLink {
    NexusLink::builder(base_url).build()
}

/// Context configured from the `NEXUS_LINK_*` environment variables
pub fn from_env() -> NexusResult<NexusLink> {
    Ok(NexusLinkBuilder::from_lookup(|name| std::env::var(name).ok())?.build())
}
