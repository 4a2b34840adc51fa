use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::Value;

use crate::config::ProviderConfig;
use crate::error::{ProviderError, ProviderResult};
use crate::provider::{metadata, ProviderMetadata, ProviderSchemas, ProviderServer};
use crate::resources::{OperationResponse, PlanResponse};

pub async fn root() -> &'static str {
    "Azure AD B2C provider"
}

pub fn provider_routes() -> Router {
    Router::new()
        .route("/v1/metadata", get(get_metadata))
        .route("/v1/schema", get(get_schema))
        .route("/v1/configure", post(configure))
        .route(
            "/v1/resources/:type_name/validate",
            post(validate_resource),
        )
        .route("/v1/resources/:type_name/plan", post(plan_resource))
        .route("/v1/resources/:type_name/create", post(create_resource))
        .route("/v1/resources/:type_name/read", post(read_resource))
        .route("/v1/resources/:type_name/update", post(update_resource))
        .route("/v1/resources/:type_name/delete", post(delete_resource))
        .route("/v1/resources/:type_name/import", post(import_resource))
        .route(
            "/v1/data-sources/:type_name/validate",
            post(validate_data_source),
        )
        .route("/v1/data-sources/:type_name/read", post(read_data_source))
}

#[derive(Debug, Deserialize)]
pub struct ConfigRequest<T = Value> {
    #[serde(default)]
    pub config: T,
}

#[derive(Debug, Deserialize)]
pub struct PlanRequest {
    #[serde(default)]
    pub prior_state: Value,
    #[serde(default)]
    pub proposed_state: Value,
}

#[derive(Debug, Deserialize)]
pub struct StateRequest {
    pub state: Value,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRequest {
    pub prior_state: Value,
    pub planned_state: Value,
}

#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    pub id: String,
}

fn body<T: DeserializeOwned>(payload: Result<Json<T>, JsonRejection>) -> ProviderResult<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ProviderError::BadRequest(rejection.body_text()))
}

async fn get_metadata() -> Json<ProviderMetadata> {
    Json(metadata())
}

async fn get_schema(Extension(server): Extension<Arc<ProviderServer>>) -> Json<ProviderSchemas> {
    Json(server.schemas().clone())
}

async fn configure(
    Extension(server): Extension<Arc<ProviderServer>>,
    payload: Result<Json<ConfigRequest<ProviderConfig>>, JsonRejection>,
) -> ProviderResult<Json<OperationResponse>> {
    let request = body(payload)?;
    server.configure(&request.config)?;
    Ok(Json(OperationResponse::default()))
}

async fn validate_resource(
    Extension(server): Extension<Arc<ProviderServer>>,
    Path(type_name): Path<String>,
    payload: Result<Json<ConfigRequest>, JsonRejection>,
) -> ProviderResult<Json<OperationResponse>> {
    let request = body(payload)?;
    let schema = server.schemas().resource(&type_name)?;
    Ok(Json(OperationResponse::stateless(
        schema.validate(&request.config),
    )))
}

async fn plan_resource(
    Extension(server): Extension<Arc<ProviderServer>>,
    Path(type_name): Path<String>,
    payload: Result<Json<PlanRequest>, JsonRejection>,
) -> ProviderResult<Json<PlanResponse>> {
    let request = body(payload)?;
    let handler = server.registry()?.resource(&type_name)?;
    Ok(Json(handler.plan(&request.prior_state, &request.proposed_state)))
}

async fn create_resource(
    Extension(server): Extension<Arc<ProviderServer>>,
    Path(type_name): Path<String>,
    payload: Result<Json<ConfigRequest>, JsonRejection>,
) -> ProviderResult<Json<OperationResponse>> {
    let request = body(payload)?;
    let handler = server.registry()?.resource(&type_name)?;
    Ok(Json(handler.create(request.config).await))
}

async fn read_resource(
    Extension(server): Extension<Arc<ProviderServer>>,
    Path(type_name): Path<String>,
    payload: Result<Json<StateRequest>, JsonRejection>,
) -> ProviderResult<Json<OperationResponse>> {
    let request = body(payload)?;
    let handler = server.registry()?.resource(&type_name)?;
    Ok(Json(handler.read(request.state).await))
}

async fn update_resource(
    Extension(server): Extension<Arc<ProviderServer>>,
    Path(type_name): Path<String>,
    payload: Result<Json<UpdateRequest>, JsonRejection>,
) -> ProviderResult<Json<OperationResponse>> {
    let request = body(payload)?;
    let handler = server.registry()?.resource(&type_name)?;
    Ok(Json(
        handler
            .update(request.prior_state, request.planned_state)
            .await,
    ))
}

async fn delete_resource(
    Extension(server): Extension<Arc<ProviderServer>>,
    Path(type_name): Path<String>,
    payload: Result<Json<StateRequest>, JsonRejection>,
) -> ProviderResult<Json<OperationResponse>> {
    let request = body(payload)?;
    let handler = server.registry()?.resource(&type_name)?;
    Ok(Json(handler.delete(request.state).await))
}

async fn import_resource(
    Extension(server): Extension<Arc<ProviderServer>>,
    Path(type_name): Path<String>,
    payload: Result<Json<ImportRequest>, JsonRejection>,
) -> ProviderResult<Json<OperationResponse>> {
    let request = body(payload)?;
    let handler = server.registry()?.resource(&type_name)?;
    Ok(Json(handler.import(&request.id).await))
}

async fn validate_data_source(
    Extension(server): Extension<Arc<ProviderServer>>,
    Path(type_name): Path<String>,
    payload: Result<Json<ConfigRequest>, JsonRejection>,
) -> ProviderResult<Json<OperationResponse>> {
    let request = body(payload)?;
    let schema = server.schemas().data_source(&type_name)?;
    Ok(Json(OperationResponse::stateless(
        schema.validate(&request.config),
    )))
}

async fn read_data_source(
    Extension(server): Extension<Arc<ProviderServer>>,
    Path(type_name): Path<String>,
    payload: Result<Json<ConfigRequest>, JsonRejection>,
) -> ProviderResult<Json<OperationResponse>> {
    let request = body(payload)?;
    let handler = server.registry()?.data_source(&type_name)?;
    Ok(Json(handler.read(request.config).await))
}
