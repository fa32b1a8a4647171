// REST implementations of the workflow sub-services

use crate::rest::RestClient;
use crate::types::*;
use crate::workflow::base::BaseServiceClient;
use crate::workflow::*;
use async_trait::async_trait;
use reqwest::Method;
use serde::Serialize;
use std::sync::Arc;

pub struct RestActivityService {
    base: BaseServiceClient,
}

impl RestActivityService {
    pub fn new(client: Arc<RestClient>) -> Self {
        Self {
            base: BaseServiceClient::new(client, "activity"),
        }
    }
}

impl ServiceClient for RestActivityService {
    fn service_name(&self) -> &str {
        self.base.service_name()
    }
}

#[async_trait]
impl ActivityService for RestActivityService {
    async fn read(&self, activity_id: &str) -> NexusResult<Activity> {
        self.validate_id(activity_id, "activity id")?;
        self.base.client().get_json(&["Activities", activity_id]).await
    }

    async fn success(&self, activity_id: &str, result: &serde_json::Value) -> NexusResult<()> {
        self.validate_id(activity_id, "activity id")?;
        self.base
            .client()
            .post(&["Activities", activity_id, "Success"], result)
            .await
    }

    async fn failed(&self, activity_id: &str, failure: &ActivityFailure) -> NexusResult<()> {
        self.validate_id(activity_id, "activity id")?;
        self.base
            .client()
            .post(&["Activities", activity_id, "Failed"], failure)
            .await
    }
}

pub struct RestWorkflowService {
    base: BaseServiceClient,
}

impl RestWorkflowService {
    pub fn new(client: Arc<RestClient>) -> Self {
        Self {
            base: BaseServiceClient::new(client, "workflow"),
        }
    }
}

impl ServiceClient for RestWorkflowService {
    fn service_name(&self) -> &str {
        self.base.service_name()
    }
}

#[async_trait]
impl WorkflowService for RestWorkflowService {
    async fn read(&self, instance_id: &str) -> NexusResult<Workflow> {
        self.validate_id(instance_id, "instance id")?;
        self.base.client().get_json(&["Workflows", instance_id]).await
    }
}

pub struct RestInstanceService {
    base: BaseServiceClient,
}

impl RestInstanceService {
    pub fn new(client: Arc<RestClient>) -> Self {
        Self {
            base: BaseServiceClient::new(client, "instance"),
        }
    }
}

impl ServiceClient for RestInstanceService {
    fn service_name(&self) -> &str {
        self.base.service_name()
    }
}

#[async_trait]
impl InstanceService for RestInstanceService {
    async fn create(&self, create: &InstanceCreate) -> NexusResult<Instance> {
        self.validate_id(&create.version_id, "version id")?;
        self.base.client().post_json(&["Instances"], create).await
    }

    async fn read(&self, instance_id: &str) -> NexusResult<Instance> {
        self.validate_id(instance_id, "instance id")?;
        self.base.client().get_json(&["Instances", instance_id]).await
    }

    async fn update(&self, instance: &Instance) -> NexusResult<Instance> {
        self.validate_id(&instance.id, "instance id")?;
        self.base
            .client()
            .put_json(&["Instances", instance.id.as_str()], instance)
            .await
    }
}

pub struct RestFormService {
    base: BaseServiceClient,
}

impl RestFormService {
    pub fn new(client: Arc<RestClient>) -> Self {
        Self {
            base: BaseServiceClient::new(client, "form"),
        }
    }
}

impl ServiceClient for RestFormService {
    fn service_name(&self) -> &str {
        self.base.service_name()
    }
}

#[async_trait]
impl FormService for RestFormService {
    async fn create(&self, create: &FormCreate) -> NexusResult<String> {
        self.validate_id(&create.capability_name, "capability name")?;
        self.base.client().post_json(&["Forms"], create).await
    }

    async fn read(&self, form_id: &str) -> NexusResult<Form> {
        self.validate_id(form_id, "form id")?;
        self.base.client().get_json(&["Forms", form_id]).await
    }

    async fn update(&self, form: &Form) -> NexusResult<Form> {
        self.validate_id(&form.id, "form id")?;
        self.base.client().put_json(&["Forms", form.id.as_str()], form).await
    }
}

pub struct RestVersionService {
    base: BaseServiceClient,
}

impl RestVersionService {
    pub fn new(client: Arc<RestClient>) -> Self {
        Self {
            base: BaseServiceClient::new(client, "version"),
        }
    }
}

impl ServiceClient for RestVersionService {
    fn service_name(&self) -> &str {
        self.base.service_name()
    }
}

#[async_trait]
impl VersionService for RestVersionService {
    async fn create(&self, form_id: &str, create: &VersionCreate) -> NexusResult<Version> {
        self.validate_id(form_id, "form id")?;
        self.base
            .client()
            .post_json(&["Forms", form_id, "Versions"], create)
            .await
    }

    async fn read(&self, form_id: &str, major_version: u32) -> NexusResult<Version> {
        self.validate_id(form_id, "form id")?;
        let major = major_version.to_string();
        self.base
            .client()
            .get_json(&["Forms", form_id, "Versions", major.as_str()])
            .await
    }
}

pub struct RestLogService {
    base: BaseServiceClient,
}

impl RestLogService {
    pub fn new(client: Arc<RestClient>) -> Self {
        Self {
            base: BaseServiceClient::new(client, "log"),
        }
    }
}

impl ServiceClient for RestLogService {
    fn service_name(&self) -> &str {
        self.base.service_name()
    }
}

#[async_trait]
impl LogService for RestLogService {
    async fn create(&self, create: &LogCreate) -> NexusResult<String> {
        self.validate_id(&create.parent_id, "parent id")?;
        self.base.client().post_json(&["Logs"], create).await
    }

    async fn read_by_parent(&self, parent_id: &str) -> NexusResult<Vec<LogEntry>> {
        self.validate_id(parent_id, "parent id")?;
        self.base
            .client()
            .request(Method::GET, &["Logs"])
            .query("parentId", parent_id)
            .send_json()
            .await
    }
}

pub struct RestSemaphoreService {
    base: BaseServiceClient,
}

impl RestSemaphoreService {
    pub fn new(client: Arc<RestClient>) -> Self {
        Self {
            base: BaseServiceClient::new(client, "semaphore"),
        }
    }
}

impl ServiceClient for RestSemaphoreService {
    fn service_name(&self) -> &str {
        self.base.service_name()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SemaphoreExtend {
    expiration_seconds: u64,
}

#[async_trait]
impl SemaphoreService for RestSemaphoreService {
    async fn raise(&self, create: &SemaphoreCreate) -> NexusResult<SemaphoreHolder> {
        self.validate_id(&create.resource_identifier, "resource identifier")?;
        if create.limit == 0 {
            return Err(NexusError::Validation("semaphore: limit must be greater than 0".into()));
        }
        self.base.client().post_json(&["Semaphores"], create).await
    }

    async fn extend(&self, holder_id: &str, expiration_seconds: u64) -> NexusResult<SemaphoreHolder> {
        self.validate_id(holder_id, "holder id")?;
        self.base
            .client()
            .post_json(
                &["Semaphores", holder_id, "Extend"],
                &SemaphoreExtend { expiration_seconds },
            )
            .await
    }

    async fn lower(&self, holder_id: &str) -> NexusResult<()> {
        self.validate_id(holder_id, "holder id")?;
        self.base
            .client()
            .request(Method::POST, &["Semaphores", holder_id, "Lower"])
            .send_empty()
            .await
    }
}
