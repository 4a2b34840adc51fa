use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::{routing::get, Extension, Router};
use axum_prometheus::PrometheusMetricLayer;
use serde_json::{json, Value};
use terraform_provider_azureadb2c::graph::testing::InMemoryGraph;
use terraform_provider_azureadb2c::model::PatchTemplates;
use terraform_provider_azureadb2c::provider::{ProviderRegistry, ProviderServer};
use terraform_provider_azureadb2c::routes::{provider_routes, root};
use tower::ServiceExt; // for `oneshot`

fn templates() -> Arc<PatchTemplates> {
    Arc::new(PatchTemplates::embedded().unwrap())
}

fn app(server: ProviderServer) -> Router {
    Router::new()
        .route("/", get(root))
        .merge(provider_routes())
        .layer(Extension(Arc::new(server)))
}

fn configured_app() -> (Arc<InMemoryGraph>, Router) {
    let graph = Arc::new(InMemoryGraph::default());
    let registry = ProviderRegistry::new(graph.clone(), templates());
    (graph, app(ProviderServer::with_registry(templates(), registry)))
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let body = hyper::body::to_bytes(response.into_body()).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn root_responds_ok() {
    let response = app(ProviderServer::new(templates()))
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = hyper::body::to_bytes(response.into_body()).await.unwrap();
    assert_eq!(body, "Azure AD B2C provider".as_bytes());
}

#[tokio::test]
async fn metadata_and_schema_are_served_before_configure() {
    let app = app(ProviderServer::new(templates()));

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/v1/metadata").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let metadata = json_body(response).await;
    assert_eq!(metadata["type_name"], "azureadb2c");
    assert_eq!(metadata["version"], env!("CARGO_PKG_VERSION"));

    let response = app
        .oneshot(Request::builder().uri("/v1/schema").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let schema = json_body(response).await;
    assert!(schema["resource_schemas"]
        .get("azureadb2c_organizational_branding_localization")
        .is_some());
    assert!(schema["data_source_schemas"]
        .get("azureadb2c_trustframework_keyset_certificate")
        .is_some());
    let provider_attributes = schema["provider"]["attributes"].as_array().unwrap();
    assert_eq!(provider_attributes.len(), 3);
}

#[tokio::test]
async fn operations_require_configuration() {
    let app = app(ProviderServer::new(templates()));

    let response = app
        .clone()
        .oneshot(post(
            "/v1/resources/azureadb2c_trustframework_keyset/create",
            json!({ "config": { "name": "TestContainer" } }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PRECONDITION_FAILED);
    let body = json_body(response).await;
    assert!(body["state"].is_null());
    assert_eq!(body["diagnostics"][0]["summary"], "provider is not configured");

    let response = app
        .oneshot(post(
            "/v1/resources/azureadb2c_trustframework_keyset/validate",
            json!({ "config": { "name": "Not_Valid" } }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["diagnostics"][0]["severity"], "error");
    assert_eq!(body["diagnostics"][0]["attribute"], "name");
}

#[tokio::test]
async fn configure_rejects_bad_tenant_and_runs_once() {
    let app = app(ProviderServer::new(templates()));

    let response = app
        .clone()
        .oneshot(post(
            "/v1/configure",
            json!({ "config": {
                "tenant_id": "contoso/../other",
                "client_id": "client",
                "client_secret": "secret"
            }}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(
        body["diagnostics"][0]["summary"],
        "invalid azure ad b2c client credentials"
    );

    let valid = json!({ "config": {
        "tenant_id": "contoso.onmicrosoft.com",
        "client_id": "client",
        "client_secret": "secret"
    }});
    let response = app
        .clone()
        .oneshot(post("/v1/configure", valid.clone()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(post("/v1/configure", valid)).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn resource_lifecycle_over_http() {
    let (graph, app) = configured_app();

    let response = app
        .clone()
        .oneshot(post(
            "/v1/resources/azureadb2c_trustframework_keyset/create",
            json!({ "config": { "name": "TestContainer" } }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let created = json_body(response).await;
    assert_eq!(created["state"]["id"], "B2C_1A_TestContainer");
    assert_eq!(created["diagnostics"], json!([]));

    let response = app
        .clone()
        .oneshot(post(
            "/v1/resources/azureadb2c_trustframework_keyset/plan",
            json!({
                "prior_state": created["state"],
                "proposed_state": { "name": "Renamed", "id": null, "metadata": null }
            }),
        ))
        .await
        .unwrap();
    let plan = json_body(response).await;
    assert_eq!(plan["requires_replace"], json!(["name"]));
    assert_eq!(plan["planned_state"]["id"], "B2C_1A_TestContainer");

    let response = app
        .oneshot(post(
            "/v1/resources/azureadb2c_trustframework_keyset/delete",
            json!({ "state": created["state"] }),
        ))
        .await
        .unwrap();
    let deleted = json_body(response).await;
    assert!(deleted["state"].is_null());
    assert!(graph.key_set("B2C_1A_TestContainer").await.is_none());
}

#[tokio::test]
async fn data_source_read_over_http() {
    let (_, app) = configured_app();

    let response = app
        .oneshot(post(
            "/v1/data-sources/azureadb2c_trustframework_keyset/read",
            json!({ "config": { "name": "Missing" } }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert!(body["state"].is_null());
    assert_eq!(body["diagnostics"][0]["summary"], "keyset not found");
}

#[tokio::test]
async fn unknown_types_and_bad_bodies_are_rejected() {
    let (_, app) = configured_app();

    let response = app
        .clone()
        .oneshot(post(
            "/v1/resources/azureadb2c_unknown/read",
            json!({ "state": {} }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .oneshot(post(
            "/v1/resources/azureadb2c_trustframework_keyset/import",
            json!({ "identifier": "B2C_1A_Foo" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn metrics_returns_ok() {
    let (layer, handle) = PrometheusMetricLayer::pair();
    let app = Router::new()
        .route("/metrics", get(move || async move { handle.render() }))
        .merge(provider_routes())
        .layer(layer)
        .layer(Extension(Arc::new(ProviderServer::new(templates()))));
    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
