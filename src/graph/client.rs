use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{header::CONTENT_TYPE, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use url::Url;
use uuid::Uuid;

use super::models::{sniff_image_content_type, ODataErrorResponse};
use super::{
    Application, BrandingLocalization, GenerateKeyRequest, GraphApi, GraphError, GraphResult,
    ImageType, TrustFrameworkKey, TrustFrameworkKeySet, UploadPkcs12Request, UploadSecretRequest,
};
use crate::credentials::TokenCredential;

/// reqwest-backed client for the Graph beta endpoint.
pub struct HttpGraphClient {
    client: reqwest::Client,
    base_url: Url,
    tenant_id: String,
    credential: Arc<dyn TokenCredential>,
}

impl HttpGraphClient {
    pub fn new(
        graph_endpoint: &str,
        tenant_id: impl Into<String>,
        credential: Arc<dyn TokenCredential>,
    ) -> GraphResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        let base = format!("{}/beta", graph_endpoint.trim_end_matches('/'));
        let base_url =
            Url::parse(&base).map_err(|err| GraphError::InvalidEndpoint(err.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(GraphError::InvalidEndpoint(base));
        }
        Ok(Self {
            client,
            base_url,
            tenant_id: tenant_id.into(),
            credential,
        })
    }

    // Ids are appended as encoded path segments, so `B2C_1A_Foo.bak` and
    // locale ids never alter the route.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn branding_endpoint(&self, rest: &[&str]) -> Url {
        let mut segments = vec![
            "organization",
            self.tenant_id.as_str(),
            "branding",
            "localizations",
        ];
        segments.extend_from_slice(rest);
        self.endpoint(&segments)
    }

    async fn send(&self, request: RequestBuilder, resource: &str) -> GraphResult<Response> {
        let token = self.credential.token().await?;
        let response = request
            .bearer_auth(token)
            .header("client-request-id", Uuid::new_v4().to_string())
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::NOT_FOUND {
            return Err(GraphError::NotFound {
                resource: resource.to_string(),
            });
        }

        let body = response.text().await.unwrap_or_default();
        let (code, message) = match serde_json::from_str::<ODataErrorResponse>(&body) {
            Ok(parsed) => (parsed.error.code, parsed.error.message),
            Err(_) => (String::new(), body),
        };
        tracing::debug!(status = status.as_u16(), %code, %resource, "graph request rejected");
        Err(GraphError::Api {
            status: status.as_u16(),
            code,
            message,
        })
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        resource: &str,
    ) -> GraphResult<T> {
        let response = self.send(request, resource).await?;
        Ok(response.json().await?)
    }
}

#[async_trait]
impl GraphApi for HttpGraphClient {
    async fn get_key_set(&self, id: &str) -> GraphResult<TrustFrameworkKeySet> {
        let url = self.endpoint(&["trustFramework", "keySets", id]);
        self.send_json(self.client.get(url), &format!("key set {id}"))
            .await
    }

    async fn create_key_set(&self, id: &str) -> GraphResult<TrustFrameworkKeySet> {
        let url = self.endpoint(&["trustFramework", "keySets"]);
        self.send_json(
            self.client.post(url).json(&json!({ "id": id })),
            &format!("key set {id}"),
        )
        .await
    }

    async fn delete_key_set(&self, id: &str) -> GraphResult<()> {
        let url = self.endpoint(&["trustFramework", "keySets", id]);
        self.send(self.client.delete(url), &format!("key set {id}"))
            .await?;
        Ok(())
    }

    async fn generate_key(
        &self,
        key_set_id: &str,
        request: &GenerateKeyRequest,
    ) -> GraphResult<TrustFrameworkKey> {
        let url = self.endpoint(&["trustFramework", "keySets", key_set_id, "generateKey"]);
        self.send_json(
            self.client.post(url).json(request),
            &format!("key set {key_set_id}"),
        )
        .await
    }

    async fn upload_secret(
        &self,
        key_set_id: &str,
        request: &UploadSecretRequest,
    ) -> GraphResult<TrustFrameworkKey> {
        let url = self.endpoint(&["trustFramework", "keySets", key_set_id, "uploadSecret"]);
        self.send_json(
            self.client.post(url).json(request),
            &format!("key set {key_set_id}"),
        )
        .await
    }

    async fn upload_pkcs12(
        &self,
        key_set_id: &str,
        request: &UploadPkcs12Request,
    ) -> GraphResult<TrustFrameworkKey> {
        let url = self.endpoint(&["trustFramework", "keySets", key_set_id, "uploadPkcs12"]);
        self.send_json(
            self.client.post(url).json(request),
            &format!("key set {key_set_id}"),
        )
        .await
    }

    async fn get_application(&self, object_id: &str) -> GraphResult<Application> {
        let url = self.endpoint(&["applications", object_id]);
        self.send_json(self.client.get(url), &format!("application {object_id}"))
            .await
    }

    async fn patch_application(
        &self,
        object_id: &str,
        patch: &Map<String, Value>,
    ) -> GraphResult<()> {
        let url = self.endpoint(&["applications", object_id]);
        self.send(
            self.client.patch(url).json(patch),
            &format!("application {object_id}"),
        )
        .await?;
        Ok(())
    }

    async fn get_branding_localization(&self, id: &str) -> GraphResult<BrandingLocalization> {
        let url = self.branding_endpoint(&[id]);
        self.send_json(
            self.client.get(url),
            &format!("branding localization {id}"),
        )
        .await
    }

    async fn create_branding_localization(
        &self,
        localization: &BrandingLocalization,
    ) -> GraphResult<BrandingLocalization> {
        let url = self.branding_endpoint(&[]);
        let id = localization.id.as_deref().unwrap_or_default();
        self.send_json(
            self.client.post(url).json(localization),
            &format!("branding localization {id}"),
        )
        .await
    }

    async fn update_branding_localization(
        &self,
        id: &str,
        changes: &Map<String, Value>,
    ) -> GraphResult<()> {
        let url = self.branding_endpoint(&[id]);
        self.send(
            self.client.patch(url).json(changes),
            &format!("branding localization {id}"),
        )
        .await?;
        Ok(())
    }

    async fn delete_branding_localization(&self, id: &str) -> GraphResult<()> {
        let url = self.branding_endpoint(&[id]);
        self.send(
            self.client.delete(url),
            &format!("branding localization {id}"),
        )
        .await?;
        Ok(())
    }

    async fn upload_branding_image(
        &self,
        id: &str,
        image: ImageType,
        content: Bytes,
    ) -> GraphResult<()> {
        let url = self.branding_endpoint(&[id, image.as_str()]);
        let content_type = sniff_image_content_type(&content);
        self.send(
            self.client
                .put(url)
                .header(CONTENT_TYPE, content_type)
                .body(content),
            &format!("branding localization {id}"),
        )
        .await?;
        Ok(())
    }
}
