use mockito::Matcher;
use nexus_link_sdk::types::*;
use nexus_link_sdk::workflow::{Form, FormCreate, SummaryKey, SummaryStore};
use nexus_link_sdk::NexusLink;
use pretty_assertions::assert_eq;
use serde_json::json;

fn link_for(server: &mockito::ServerGuard) -> NexusLink {
    NexusLink::builder(server.url())
        .tenant(Tenant::new("acme", "prod").unwrap())
        .credentials(SecureCredentials::new("tok-http"))
        .build()
}

#[tokio::test]
async fn test_form_read_over_http() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/api/v1/acme/prod/Forms/f1")
        .match_header("authorization", "Bearer tok-http")
        .match_header("accept", "application/json")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id":"f1","capabilityName":"onboarding","title":"Onboarding"}"#)
        .create_async()
        .await;

    let link = link_for(&server);
    let form = link.workflow().unwrap().form().read("f1").await.unwrap();

    assert_eq!(
        form,
        Form {
            id: "f1".into(),
            capability_name: "onboarding".into(),
            title: "Onboarding".into(),
            etag: None,
        }
    );
    mock.assert_async().await;
}

#[tokio::test]
async fn test_form_create_posts_camel_case_body() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/v1/acme/prod/Forms")
        .match_body(Matcher::Json(json!({ "capabilityName": "billing", "title": "Invoices" })))
        .with_status(201)
        .with_body(r#""f-new""#)
        .create_async()
        .await;

    let link = link_for(&server);
    let id = link
        .workflow()
        .unwrap()
        .form()
        .create(&FormCreate {
            capability_name: "billing".into(),
            title: "Invoices".into(),
        })
        .await
        .unwrap();

    assert_eq!(id, "f-new");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_summary_conflict_falls_back_to_put() {
    let mut server = mockito::Server::new_async().await;
    let post = server
        .mock("POST", "/api/v1/acme/prod/Summaries/f1/2/i1")
        .with_status(409)
        .with_body("summary exists")
        .create_async()
        .await;
    let put = server
        .mock("PUT", "/api/v1/acme/prod/Summaries/f1/2/i1")
        .with_status(204)
        .create_async()
        .await;

    let link = link_for(&server);
    let summary = serde_json::from_value(json!({
        "form": { "id": "f1", "capabilityName": "c", "title": "t" },
        "version": { "id": "v2", "formId": "f1", "majorVersion": 2, "minorVersion": 0 },
        "instance": { "id": "i1", "versionId": "v2", "title": "run", "state": "Executing" }
    }))
    .unwrap();

    let store = link.summaries().unwrap();
    store
        .create_or_update(&SummaryKey::new("f1", 2, "i1"), &summary)
        .await
        .unwrap();

    post.assert_async().await;
    put.assert_async().await;
}

#[tokio::test]
async fn test_server_error_maps_to_api_error() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/api/v1/acme/prod/Instances/i9")
        .with_status(503)
        .with_body("maintenance")
        .create_async()
        .await;

    let link = link_for(&server);
    let result = link.workflow().unwrap().instance().read("i9").await;
    match result {
        Err(NexusError::Api { status, message, .. }) => {
            assert_eq!(status, 503);
            assert_eq!(message, "maintenance");
        }
        other => panic!("expected Api error, got {:?}", other),
    }
}
