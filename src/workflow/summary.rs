// Workflow summary storage

use crate::rest::RestClient;
use crate::types::*;
use crate::workflow::base::BaseServiceClient;
use crate::workflow::{ServiceClient, SummaryKey, SummaryService, WorkflowSummary};
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

/// Persistent store of workflow summaries, addressed by [`SummaryKey`]
#[async_trait]
pub trait SummaryStore: Send + Sync {
    /// Store a new summary. `Conflict` if one already exists at `key`.
    async fn create(&self, key: &SummaryKey, summary: &WorkflowSummary) -> NexusResult<()>;

    /// Replace an existing summary. `NotFound` if there is none at `key`.
    async fn update(&self, key: &SummaryKey, summary: &WorkflowSummary) -> NexusResult<()>;

    async fn read(&self, key: &SummaryKey) -> NexusResult<Option<WorkflowSummary>>;

    /// Create the summary, or update it if it already exists.
    ///
    /// Only `Conflict` from `create` is recovered; every other error is returned as is.
    async fn create_or_update(&self, key: &SummaryKey, summary: &WorkflowSummary) -> NexusResult<()> {
        match self.create(key, summary).await {
            Err(NexusError::Conflict(_)) => {
                log::debug!("summary {} already exists; updating instead", key);
                self.update(key, summary).await
            }
            other => other,
        }
    }
}

/// In-process [`SummaryStore`]
#[derive(Default)]
pub struct MemorySummaryStore {
    summaries: DashMap<SummaryKey, WorkflowSummary>,
}

impl MemorySummaryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.summaries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.summaries.is_empty()
    }
}

#[async_trait]
impl SummaryStore for MemorySummaryStore {
    async fn create(&self, key: &SummaryKey, summary: &WorkflowSummary) -> NexusResult<()> {
        match self.summaries.entry(key.clone()) {
            Entry::Occupied(_) => Err(NexusError::Conflict(format!("summary {} already exists", key))),
            Entry::Vacant(slot) => {
                slot.insert(summary.clone());
                Ok(())
            }
        }
    }

    async fn update(&self, key: &SummaryKey, summary: &WorkflowSummary) -> NexusResult<()> {
        match self.summaries.get_mut(key) {
            Some(mut existing) => {
                *existing = summary.clone();
                Ok(())
            }
            None => Err(NexusError::NotFound(format!("summary {} does not exist", key))),
        }
    }

    async fn read(&self, key: &SummaryKey) -> NexusResult<Option<WorkflowSummary>> {
        Ok(self.summaries.get(key).map(|entry| entry.value().clone()))
    }
}

/// [`SummaryStore`] and [`SummaryService`] over REST.
///
/// `POST` creates (the service answers 409 when the summary exists), `PUT`
/// updates and `GET` reads `Summaries/{formId}/{major}/{instanceId}`.
pub struct RestSummaryStore {
    base: BaseServiceClient,
}

impl RestSummaryStore {
    pub fn new(client: Arc<RestClient>) -> Self {
        Self {
            base: BaseServiceClient::new(client, "summary"),
        }
    }

    fn validate_key(&self, key: &SummaryKey) -> NexusResult<()> {
        self.validate_id(&key.form_id, "form id")?;
        self.validate_id(&key.instance_id, "instance id")
    }
}

impl ServiceClient for RestSummaryStore {
    fn service_name(&self) -> &str {
        self.base.service_name()
    }
}

#[async_trait]
impl SummaryStore for RestSummaryStore {
    async fn create(&self, key: &SummaryKey, summary: &WorkflowSummary) -> NexusResult<()> {
        self.validate_key(key)?;
        let major = key.major_version.to_string();
        self.base
            .client()
            .post(&["Summaries", key.form_id.as_str(), major.as_str(), key.instance_id.as_str()], summary)
            .await
    }

    async fn update(&self, key: &SummaryKey, summary: &WorkflowSummary) -> NexusResult<()> {
        self.validate_key(key)?;
        let major = key.major_version.to_string();
        self.base
            .client()
            .put(&["Summaries", key.form_id.as_str(), major.as_str(), key.instance_id.as_str()], summary)
            .await
    }

    async fn read(&self, key: &SummaryKey) -> NexusResult<Option<WorkflowSummary>> {
        match SummaryService::read(self, key).await {
            Ok(summary) => Ok(Some(summary)),
            Err(NexusError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl SummaryService for RestSummaryStore {
    async fn read(&self, key: &SummaryKey) -> NexusResult<WorkflowSummary> {
        self.validate_key(key)?;
        let major = key.major_version.to_string();
        self.base
            .client()
            .get_json(&["Summaries", key.form_id.as_str(), major.as_str(), key.instance_id.as_str()])
            .await
    }
}
