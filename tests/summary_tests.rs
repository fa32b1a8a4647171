use async_trait::async_trait;
use nexus_link_sdk::types::*;
use nexus_link_sdk::workflow::*;
use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicUsize, Ordering};

mod mock_transport;
use mock_transport::{tenant_client, tenant_url, MockTransport};

fn summary(instance_id: &str, title: &str) -> WorkflowSummary {
    WorkflowSummary {
        form: Form {
            id: "f1".into(),
            capability_name: "orders".into(),
            title: "Orders".into(),
            etag: None,
        },
        version: Version {
            id: "v3".into(),
            form_id: "f1".into(),
            major_version: 3,
            minor_version: 1,
        },
        instance: Instance {
            id: instance_id.into(),
            version_id: "v3".into(),
            title: title.into(),
            state: InstanceState::Executing,
            result: None,
        },
        activities: Vec::new(),
    }
}

#[test]
fn test_summary_key_from_summary() {
    let key = summary("i1", "first").key();
    assert_eq!(key, SummaryKey::new("f1", 3, "i1"));
    assert_eq!(key.to_string(), "f1/3/i1");
}

#[tokio::test]
async fn test_memory_create_then_conflict() {
    let store = MemorySummaryStore::new();
    let first = summary("i1", "first");
    let key = first.key();

    store.create(&key, &first).await.unwrap();
    let again = store.create(&key, &summary("i1", "second")).await;
    assert!(matches!(again, Err(NexusError::Conflict(_))));

    let stored = store.read(&key).await.unwrap().unwrap();
    assert_eq!(stored.instance.title, "first");
}

#[tokio::test]
async fn test_memory_update_requires_existing() {
    let store = MemorySummaryStore::new();
    let value = summary("i1", "first");
    let result = store.update(&value.key(), &value).await;
    assert!(matches!(result, Err(NexusError::NotFound(_))));
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_memory_create_or_update() {
    let store = MemorySummaryStore::new();
    let key = SummaryKey::new("f1", 3, "i1");

    store.create_or_update(&key, &summary("i1", "first")).await.unwrap();
    store.create_or_update(&key, &summary("i1", "second")).await.unwrap();

    assert_eq!(store.len(), 1);
    let stored = store.read(&key).await.unwrap().unwrap();
    assert_eq!(stored.instance.title, "second");
    assert!(store.read(&SummaryKey::new("f1", 3, "other")).await.unwrap().is_none());
}

/// Store whose `create` always fails with a fixed error
struct FailingCreate {
    error: NexusError,
    updates: AtomicUsize,
}

#[async_trait]
impl SummaryStore for FailingCreate {
    async fn create(&self, _key: &SummaryKey, _summary: &WorkflowSummary) -> NexusResult<()> {
        Err(self.error.clone())
    }

    async fn update(&self, _key: &SummaryKey, _summary: &WorkflowSummary) -> NexusResult<()> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn read(&self, _key: &SummaryKey) -> NexusResult<Option<WorkflowSummary>> {
        Ok(None)
    }
}

#[tokio::test]
async fn test_create_or_update_only_recovers_from_conflict() {
    let value = summary("i1", "first");

    let conflicting = FailingCreate {
        error: NexusError::Conflict("exists".into()),
        updates: AtomicUsize::new(0),
    };
    conflicting.create_or_update(&value.key(), &value).await.unwrap();
    assert_eq!(conflicting.updates.load(Ordering::SeqCst), 1);

    let unavailable = FailingCreate {
        error: NexusError::RateLimited { retry_after: None },
        updates: AtomicUsize::new(0),
    };
    let result = unavailable.create_or_update(&value.key(), &value).await;
    assert!(matches!(result, Err(NexusError::RateLimited { .. })));
    assert_eq!(unavailable.updates.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_rest_store_conflict_then_put() {
    let transport = MockTransport::new();
    transport.push_status(409, "exists");
    transport.push_status(204, "");

    let store = RestSummaryStore::new(tenant_client(transport.clone(), Some("tok")));
    let value = summary("i1", "first");
    store.create_or_update(&value.key(), &value).await.unwrap();

    assert_eq!(
        transport.request_lines(),
        vec![
            format!("POST {}", tenant_url("Summaries/f1/3/i1")),
            format!("PUT {}", tenant_url("Summaries/f1/3/i1")),
        ]
    );
    assert_eq!(
        transport.requests()[1].body,
        Some(serde_json::to_value(&value).unwrap())
    );
}

#[tokio::test]
async fn test_rest_store_read_not_found_is_none() {
    let transport = MockTransport::new();
    transport.push_status(404, "");
    transport.push_json(200, &summary("i1", "first"));

    let store = RestSummaryStore::new(tenant_client(transport.clone(), None));
    let key = SummaryKey::new("f1", 3, "i1");

    assert!(SummaryStore::read(&store, &key).await.unwrap().is_none());
    let found = SummaryService::read(&store, &key).await.unwrap();
    assert_eq!(found, summary("i1", "first"));
}
