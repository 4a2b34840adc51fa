use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::diagnostics::Diagnostics;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("unknown resource type: {0}")]
    UnknownResource(String),
    #[error("unknown data source type: {0}")]
    UnknownDataSource(String),
    #[error("provider is not configured")]
    NotConfigured,
    #[error("provider is already configured")]
    AlreadyConfigured,
    #[error("provider configuration failed")]
    Configuration(Diagnostics),
    #[error("bad request: {0}")]
    BadRequest(String),
}

impl IntoResponse for ProviderError {
    fn into_response(self) -> Response {
        let status = match self {
            ProviderError::UnknownResource(_) | ProviderError::UnknownDataSource(_) => {
                StatusCode::NOT_FOUND
            }
            ProviderError::NotConfigured => StatusCode::PRECONDITION_FAILED,
            ProviderError::AlreadyConfigured => StatusCode::CONFLICT,
            ProviderError::Configuration(_) | ProviderError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
        };
        tracing::error!(?self);
        let diagnostics = match &self {
            ProviderError::Configuration(diagnostics) => diagnostics.clone(),
            other => {
                let mut diagnostics = Diagnostics::new();
                diagnostics.add_error(other.to_string(), "");
                diagnostics
            }
        };
        (
            status,
            Json(json!({ "state": null, "diagnostics": diagnostics })),
        )
            .into_response()
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;
