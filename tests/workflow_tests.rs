use async_trait::async_trait;
use nexus_link_sdk::diagnostics::LogSeverity;
use nexus_link_sdk::types::*;
use nexus_link_sdk::workflow::*;
use pretty_assertions::assert_eq;
use reqwest::Method;
use serde_json::json;

mod mock_transport;
use mock_transport::{tenant_client, tenant_url, MockTransport};

fn sample_instance() -> Instance {
    Instance {
        id: "i1".into(),
        version_id: "v1".into(),
        title: "Order 42".into(),
        state: InstanceState::Executing,
        result: None,
    }
}

#[tokio::test]
async fn test_activity_paths() {
    let transport = MockTransport::new();
    let capability = WorkflowCapability::rest(tenant_client(transport.clone(), Some("tok")));

    capability.activity().success("a1", &json!({ "approved": true })).await.unwrap();
    capability
        .activity()
        .failed(
            "a1",
            &ActivityFailure {
                reason: "timeout".into(),
                technical_details: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(
        transport.request_lines(),
        vec![
            format!("POST {}", tenant_url("Activities/a1/Success")),
            format!("POST {}", tenant_url("Activities/a1/Failed")),
        ]
    );
    assert_eq!(transport.requests()[0].body, Some(json!({ "approved": true })));
    assert_eq!(transport.requests()[1].body, Some(json!({ "reason": "timeout" })));
}

#[tokio::test]
async fn test_instance_create_read_update() {
    let transport = MockTransport::new();
    transport.push_json(201, &sample_instance());
    transport.push_json(200, &sample_instance());
    let mut halted = sample_instance();
    halted.state = InstanceState::Halted;
    transport.push_json(200, &halted);

    let capability = WorkflowCapability::rest(tenant_client(transport.clone(), None));
    let instances = capability.instance();

    let created = instances
        .create(&InstanceCreate {
            version_id: "v1".into(),
            title: "Order 42".into(),
        })
        .await
        .unwrap();
    assert_eq!(created, sample_instance());

    instances.read("i1").await.unwrap();
    let updated = instances.update(&halted).await.unwrap();
    assert_eq!(updated.state, InstanceState::Halted);

    assert_eq!(
        transport.request_lines(),
        vec![
            format!("POST {}", tenant_url("Instances")),
            format!("GET {}", tenant_url("Instances/i1")),
            format!("PUT {}", tenant_url("Instances/i1")),
        ]
    );
    assert_eq!(
        transport.requests()[0].body,
        Some(json!({ "versionId": "v1", "title": "Order 42" }))
    );
}

#[tokio::test]
async fn test_workflow_read_combines_form_version_instance() {
    let transport = MockTransport::new();
    transport.push_json(
        200,
        &json!({
            "form": { "id": "f1", "capabilityName": "orders", "title": "Orders" },
            "version": { "id": "v1", "formId": "f1", "majorVersion": 1, "minorVersion": 3 },
            "instance": { "id": "i1", "versionId": "v1", "title": "Order 42", "state": "Executing" }
        }),
    );

    let capability = WorkflowCapability::rest(tenant_client(transport.clone(), None));
    let workflow = capability.workflow().read("i1").await.unwrap();

    assert_eq!(workflow.form.capability_name, "orders");
    assert_eq!(workflow.version.minor_version, 3);
    assert_eq!(workflow.instance, sample_instance());
    assert_eq!(transport.last_request().url.as_str(), tenant_url("Workflows/i1"));
}

#[tokio::test]
async fn test_version_paths() {
    let transport = MockTransport::new();
    let version = Version {
        id: "v2".into(),
        form_id: "f1".into(),
        major_version: 2,
        minor_version: 0,
    };
    transport.push_json(201, &version);
    transport.push_json(200, &version);

    let capability = WorkflowCapability::rest(tenant_client(transport.clone(), None));
    capability
        .version()
        .create(
            "f1",
            &VersionCreate {
                major_version: 2,
                minor_version: 0,
            },
        )
        .await
        .unwrap();
    let read = capability.version().read("f1", 2).await.unwrap();

    assert_eq!(read, version);
    assert_eq!(
        transport.request_lines(),
        vec![
            format!("POST {}", tenant_url("Forms/f1/Versions")),
            format!("GET {}", tenant_url("Forms/f1/Versions/2")),
        ]
    );
}

#[tokio::test]
async fn test_logs_by_parent_uses_query() {
    let transport = MockTransport::new();
    transport.push_json(200, &json!("log-1"));
    transport.push_json(
        200,
        &json!([{ "id": "log-1", "parentId": "i1", "severity": "Warning", "message": "slow step" }]),
    );

    let capability = WorkflowCapability::rest(tenant_client(transport.clone(), None));
    let id = capability
        .log()
        .create(&LogCreate {
            parent_id: "i1".into(),
            severity: LogSeverity::Warning,
            message: "slow step".into(),
            data: None,
        })
        .await
        .unwrap();
    assert_eq!(id, "log-1");

    let entries = capability.log().read_by_parent("i1").await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].severity, LogSeverity::Warning);

    let request = transport.last_request();
    assert_eq!(request.method, Method::GET);
    assert_eq!(request.url.as_str(), tenant_url("Logs?parentId=i1"));
}

#[tokio::test]
async fn test_semaphore_raise_extend_lower() {
    let transport = MockTransport::new();
    let holder = SemaphoreHolder {
        holder_id: "h1".into(),
        resource_identifier: "printer".into(),
        expiration_seconds: 30,
    };
    transport.push_json(200, &holder);
    transport.push_json(200, &SemaphoreHolder { expiration_seconds: 60, ..holder.clone() });

    let capability = WorkflowCapability::rest(tenant_client(transport.clone(), None));
    let semaphores = capability.semaphore();

    let raised = semaphores
        .raise(&SemaphoreCreate {
            resource_identifier: "printer".into(),
            limit: 2,
            expiration_seconds: 30,
        })
        .await
        .unwrap();
    assert_eq!(raised, holder);

    let extended = semaphores.extend("h1", 60).await.unwrap();
    assert_eq!(extended.expiration_seconds, 60);
    semaphores.lower("h1").await.unwrap();

    let requests = transport.requests();
    assert_eq!(
        transport.request_lines(),
        vec![
            format!("POST {}", tenant_url("Semaphores")),
            format!("POST {}", tenant_url("Semaphores/h1/Extend")),
            format!("POST {}", tenant_url("Semaphores/h1/Lower")),
        ]
    );
    assert_eq!(requests[1].body, Some(json!({ "expirationSeconds": 60 })));
    assert_eq!(requests[2].body, None);
}

#[tokio::test]
async fn test_semaphore_limit_reached_is_conflict() {
    let transport = MockTransport::new();
    transport.push_status(409, "limit reached");
    let capability = WorkflowCapability::rest(tenant_client(transport.clone(), None));

    let result = capability
        .semaphore()
        .raise(&SemaphoreCreate {
            resource_identifier: "printer".into(),
            limit: 1,
            expiration_seconds: 30,
        })
        .await;
    assert!(matches!(result, Err(NexusError::Conflict(_))));
}

#[tokio::test]
async fn test_invalid_arguments_fail_before_any_request() {
    let transport = MockTransport::new();
    let capability = WorkflowCapability::rest(tenant_client(transport.clone(), None));

    assert!(matches!(capability.form().read(" ").await, Err(NexusError::Validation(_))));
    assert!(matches!(capability.activity().read("").await, Err(NexusError::Validation(_))));
    let zero_limit = capability
        .semaphore()
        .raise(&SemaphoreCreate {
            resource_identifier: "printer".into(),
            limit: 0,
            expiration_seconds: 30,
        })
        .await;
    assert!(matches!(zero_limit, Err(NexusError::Validation(_))));

    assert!(transport.requests().is_empty());
}

struct FixedForms;

#[async_trait]
impl FormService for FixedForms {
    async fn create(&self, _create: &FormCreate) -> NexusResult<String> {
        Ok("fixed".into())
    }

    async fn read(&self, form_id: &str) -> NexusResult<Form> {
        Ok(Form {
            id: form_id.to_string(),
            capability_name: "fixed".into(),
            title: "Fixed".into(),
            etag: None,
        })
    }

    async fn update(&self, form: &Form) -> NexusResult<Form> {
        Ok(form.clone())
    }
}

#[tokio::test]
async fn test_builder_overrides_one_service() {
    let transport = MockTransport::new();
    let capability = WorkflowCapability::builder()
        .rest_defaults(tenant_client(transport.clone(), None))
        .form(FixedForms)
        .build()
        .unwrap();

    let form = capability.form().read("f7").await.unwrap();
    assert_eq!(form.capability_name, "fixed");
    assert!(transport.requests().is_empty());

    capability.workflow().read("i1").await.unwrap_err();
    assert_eq!(transport.requests().len(), 1);
}

#[test]
fn test_builder_reports_missing_service() {
    let result = WorkflowCapability::builder().form(FixedForms).build();
    match result {
        Err(NexusError::Configuration(message)) => assert!(message.contains("activity")),
        Err(other) => panic!("expected Configuration, got {:?}", other),
        Ok(_) => panic!("build should fail without every service"),
    }
}
