pub mod client;
pub mod models;
pub mod testing;

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::credentials::CredentialError;

pub use client::HttpGraphClient;
pub use models::{
    Application, BrandingLocalization, GenerateKeyRequest, ImageType, TrustFrameworkKey,
    TrustFrameworkKeySet, UploadPkcs12Request, UploadSecretRequest,
};

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("{resource} not found")]
    NotFound { resource: String },
    #[error("graph api returned {status} {code}: {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },
    #[error("failed to contact graph api: {0}")]
    Transport(#[from] reqwest::Error),
    #[error(transparent)]
    Credential(#[from] CredentialError),
    #[error("invalid graph endpoint: {0}")]
    InvalidEndpoint(String),
}

impl GraphError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, GraphError::NotFound { .. })
    }
}

pub type GraphResult<T> = Result<T, GraphError>;

/// Operations the provider needs from Microsoft Graph (beta).
#[async_trait]
pub trait GraphApi: Send + Sync {
    async fn get_key_set(&self, id: &str) -> GraphResult<TrustFrameworkKeySet>;
    async fn create_key_set(&self, id: &str) -> GraphResult<TrustFrameworkKeySet>;
    async fn delete_key_set(&self, id: &str) -> GraphResult<()>;
    async fn generate_key(
        &self,
        key_set_id: &str,
        request: &GenerateKeyRequest,
    ) -> GraphResult<TrustFrameworkKey>;
    async fn upload_secret(
        &self,
        key_set_id: &str,
        request: &UploadSecretRequest,
    ) -> GraphResult<TrustFrameworkKey>;
    async fn upload_pkcs12(
        &self,
        key_set_id: &str,
        request: &UploadPkcs12Request,
    ) -> GraphResult<TrustFrameworkKey>;

    async fn get_application(&self, object_id: &str) -> GraphResult<Application>;
    async fn patch_application(&self, object_id: &str, patch: &Map<String, Value>)
        -> GraphResult<()>;

    async fn get_branding_localization(&self, id: &str) -> GraphResult<BrandingLocalization>;
    async fn create_branding_localization(
        &self,
        localization: &BrandingLocalization,
    ) -> GraphResult<BrandingLocalization>;
    async fn update_branding_localization(
        &self,
        id: &str,
        changes: &Map<String, Value>,
    ) -> GraphResult<()>;
    async fn delete_branding_localization(&self, id: &str) -> GraphResult<()>;
    async fn upload_branding_image(
        &self,
        id: &str,
        image: ImageType,
        content: Bytes,
    ) -> GraphResult<()>;
}
