use std::sync::Arc;

use aadprobe_client::{ClientError, GraphClient};
use aadprobe_config::ProbeConfig;
use aadprobe_domain::{LifecyclePhase, ObjectId, StateSnapshot};
use aadprobe_verifier::{check_destroy, Outcome, StateError, VerificationError, Verifier};
use serde_json::json;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

const TENANT: &str = "tenant-under-test";

fn verifier(server: &MockServer) -> Verifier {
    let config = ProbeConfig {
        tenant_id: Some(TENANT.into()),
        graph_base_url: server.uri(),
        ..ProbeConfig::default()
    };
    Verifier::new(Arc::new(
        GraphClient::with_static_token(&config, "token").expect("client"),
    ))
}

async fn respond(server: &MockServer, object_id: &str, status: u16, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(format!("/{}/applications/{}", TENANT, object_id).as_str()))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(server)
        .await;
}

fn not_found_body() -> serde_json::Value {
    json!({
        "odata.error": {
            "code": "Request_ResourceNotFound",
            "message": { "lang": "en", "value": "Resource does not exist or one of its queried reference-property objects are not present." }
        }
    })
}

fn state_with(ids: &[&str]) -> StateSnapshot {
    let resources: Vec<serde_json::Value> = ids
        .iter()
        .enumerate()
        .map(|(i, id)| {
            json!({
                "address": format!("azuread_application.test{}", i),
                "type": "azuread_application",
                "name": format!("test{}", i),
                "values": { "id": id }
            })
        })
        .collect();
    let doc = json!({ "values": { "root_module": { "resources": resources } } });
    StateSnapshot::from_show_json(&doc.to_string()).unwrap()
}

#[tokio::test]
async fn found_object_verifies_as_created() {
    let server = MockServer::start().await;
    respond(&server, "live", 200, json!({
        "objectId": "live",
        "appId": "app-live",
        "displayName": "acctestlive",
    }))
    .await;

    let v = verifier(&server);
    let id = ObjectId::new("live").unwrap();
    v.verify(&id, LifecyclePhase::Created).await.unwrap();
    assert!(matches!(v.classify(&id).await, Outcome::Found(app) if app.app_id == "app-live"));
}

#[tokio::test]
async fn not_found_verifies_as_destroyed() {
    let server = MockServer::start().await;
    respond(&server, "gone", 404, not_found_body()).await;

    let v = verifier(&server);
    let id = ObjectId::new("gone").unwrap();
    v.verify(&id, LifecyclePhase::Destroyed).await.unwrap();
    assert!(matches!(
        v.verify(&id, LifecyclePhase::Created).await,
        Err(VerificationError::ResourceMissing { .. })
    ));
}

#[tokio::test]
async fn http_500_is_unexpected_not_absent() {
    let server = MockServer::start().await;
    respond(&server, "broken", 500, json!({
        "odata.error": { "code": "Service_InternalServerError", "message": { "value": "boom" } }
    }))
    .await;

    let v = verifier(&server);
    let id = ObjectId::new("broken").unwrap();
    assert!(matches!(v.classify(&id).await, Outcome::UnexpectedError(_)));
    match v.verify(&id, LifecyclePhase::Destroyed).await {
        Err(VerificationError::Unexpected { source: ClientError::Other(msg), .. }) => {
            assert!(msg.contains("Service_InternalServerError"), "got: {}", msg);
        }
        other => panic!("expected Unexpected, got {:?}", other),
    }
}

#[tokio::test]
async fn check_destroy_over_state_file() {
    let server = MockServer::start().await;
    respond(&server, "gone-1", 404, not_found_body()).await;
    respond(&server, "gone-2", 404, not_found_body()).await;
    respond(&server, "lingering", 200, json!({
        "objectId": "lingering",
        "displayName": "acctestlingering",
    }))
    .await;

    let v = verifier(&server);
    check_destroy(&v, &state_with(&["gone-1", "gone-2"])).await.unwrap();

    let err = check_destroy(&v, &state_with(&["gone-1", "lingering"])).await.unwrap_err();
    assert!(matches!(
        err,
        StateError::Verification(VerificationError::ResourceStillExists { .. })
    ));
}
