//! In-memory Graph used by the resource tests.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::{Map, Value};
use tokio::sync::Mutex;

use super::{
    Application, BrandingLocalization, GenerateKeyRequest, GraphApi, GraphError, GraphResult,
    ImageType, TrustFrameworkKey, TrustFrameworkKeySet, UploadPkcs12Request, UploadSecretRequest,
};

pub const CDN_HOST: &str = "cdn.b2c.test";

#[derive(Default)]
struct State {
    key_sets: HashMap<String, TrustFrameworkKeySet>,
    applications: HashMap<String, Map<String, Value>>,
    localizations: HashMap<String, BrandingLocalization>,
    images: HashMap<(String, ImageType), Bytes>,
    failing_images: HashSet<ImageType>,
    failing_deletes: HashSet<String>,
    calls: Vec<String>,
}

#[derive(Default)]
pub struct InMemoryGraph {
    state: Mutex<State>,
}

fn not_found(resource: impl Into<String>) -> GraphError {
    GraphError::NotFound {
        resource: resource.into(),
    }
}

fn conflict(message: impl Into<String>) -> GraphError {
    GraphError::Api {
        status: 409,
        code: "Conflict".into(),
        message: message.into(),
    }
}

fn fake_key(kid: &str, key_use: &str, kty: &str) -> TrustFrameworkKey {
    TrustFrameworkKey {
        kid: Some(kid.to_string()),
        kty: Some(kty.to_string()),
        key_use: Some(key_use.to_string()),
        n: Some("sXchDaQebHnPiGvyDOAT4saGEUetSyo9MKLOoWFsueri23bOdgWp4Dy1Wl".into()),
        e: Some("AQAB".into()),
        exp: Some(1_900_000_000),
        nbf: Some(1_700_000_000),
        x5c: Vec::new(),
        x5t: None,
    }
}

impl InMemoryGraph {
    pub async fn insert_key_set(&self, key_set: TrustFrameworkKeySet) {
        let mut state = self.state.lock().await;
        state.key_sets.insert(key_set.id.clone(), key_set);
    }

    pub async fn key_set(&self, id: &str) -> Option<TrustFrameworkKeySet> {
        self.state.lock().await.key_sets.get(id).cloned()
    }

    pub async fn insert_application(&self, object_id: &str, application: Value) {
        let mut state = self.state.lock().await;
        let fields = match application {
            Value::Object(fields) => fields,
            _ => Map::new(),
        };
        state.applications.insert(object_id.to_string(), fields);
    }

    /// Raw application document, including fields `Application` does not model.
    pub async fn application_document(&self, object_id: &str) -> Option<Map<String, Value>> {
        self.state.lock().await.applications.get(object_id).cloned()
    }

    pub async fn insert_localization(&self, localization: BrandingLocalization) {
        let mut state = self.state.lock().await;
        let id = localization.id.clone().unwrap_or_default();
        state.localizations.insert(id, localization);
    }

    pub async fn localization(&self, id: &str) -> Option<BrandingLocalization> {
        self.state.lock().await.localizations.get(id).cloned()
    }

    pub async fn image(&self, id: &str, image: ImageType) -> Option<Bytes> {
        self.state
            .lock()
            .await
            .images
            .get(&(id.to_string(), image))
            .cloned()
    }

    pub async fn fail_image_upload(&self, image: ImageType) {
        self.state.lock().await.failing_images.insert(image);
    }

    /// Makes every delete of `id` fail with a server error.
    pub async fn fail_delete(&self, id: &str) {
        self.state.lock().await.failing_deletes.insert(id.to_string());
    }

    pub async fn calls(&self) -> Vec<String> {
        self.state.lock().await.calls.clone()
    }
}

#[async_trait]
impl GraphApi for InMemoryGraph {
    async fn get_key_set(&self, id: &str) -> GraphResult<TrustFrameworkKeySet> {
        let mut state = self.state.lock().await;
        state.calls.push(format!("get_key_set {id}"));
        state
            .key_sets
            .get(id)
            .cloned()
            .ok_or_else(|| not_found(format!("key set {id}")))
    }

    async fn create_key_set(&self, id: &str) -> GraphResult<TrustFrameworkKeySet> {
        let mut state = self.state.lock().await;
        state.calls.push(format!("create_key_set {id}"));
        if state.key_sets.contains_key(id) {
            return Err(conflict(format!("key set {id} already exists")));
        }
        let key_set = TrustFrameworkKeySet {
            id: id.to_string(),
            keys: Vec::new(),
            odata_context: Some(
                "https://graph.microsoft.com/beta/$metadata#trustFramework/keySets/$entity".into(),
            ),
        };
        state.key_sets.insert(id.to_string(), key_set.clone());
        Ok(key_set)
    }

    async fn delete_key_set(&self, id: &str) -> GraphResult<()> {
        let mut state = self.state.lock().await;
        state.calls.push(format!("delete_key_set {id}"));
        if state.failing_deletes.contains(id) {
            return Err(GraphError::Api {
                status: 500,
                code: "InternalServerError".into(),
                message: format!("cannot delete {id}"),
            });
        }
        state
            .key_sets
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| not_found(format!("key set {id}")))
    }

    async fn generate_key(
        &self,
        key_set_id: &str,
        request: &GenerateKeyRequest,
    ) -> GraphResult<TrustFrameworkKey> {
        let mut state = self.state.lock().await;
        state.calls.push(format!("generate_key {key_set_id}"));
        let key_set = state
            .key_sets
            .get_mut(key_set_id)
            .ok_or_else(|| not_found(format!("key set {key_set_id}")))?;
        let kid = format!("{key_set_id}-{}", key_set.keys.len() + 1);
        // Graph reports symmetric keys as lowercase `oct`.
        let kty = if request.kty.eq_ignore_ascii_case("oct") {
            "oct"
        } else {
            request.kty.as_str()
        };
        let key = fake_key(&kid, &request.key_use, kty);
        key_set.keys.push(key.clone());
        Ok(key)
    }

    async fn upload_secret(
        &self,
        key_set_id: &str,
        request: &UploadSecretRequest,
    ) -> GraphResult<TrustFrameworkKey> {
        let mut state = self.state.lock().await;
        state.calls.push(format!("upload_secret {key_set_id}"));
        let key_set = state
            .key_sets
            .get_mut(key_set_id)
            .ok_or_else(|| not_found(format!("key set {key_set_id}")))?;
        let kid = format!("{key_set_id}-{}", key_set.keys.len() + 1);
        let mut key = fake_key(&kid, &request.key_use, "oct");
        key.n = None;
        key.e = None;
        key_set.keys.push(key.clone());
        Ok(key)
    }

    async fn upload_pkcs12(
        &self,
        key_set_id: &str,
        request: &UploadPkcs12Request,
    ) -> GraphResult<TrustFrameworkKey> {
        let mut state = self.state.lock().await;
        state.calls.push(format!("upload_pkcs12 {key_set_id}"));
        if request.password.is_empty() {
            return Err(GraphError::Api {
                status: 400,
                code: "AADB2C".into(),
                message: "The password for the PKCS12 file is incorrect.".into(),
            });
        }
        let key_set = state
            .key_sets
            .get_mut(key_set_id)
            .ok_or_else(|| not_found(format!("key set {key_set_id}")))?;
        let kid = format!("{key_set_id}-{}", key_set.keys.len() + 1);
        let mut key = fake_key(&kid, "sig", "RSA");
        key.x5c = vec![request.key.chars().take(16).collect()];
        key.x5t = Some("thumbprint".into());
        key_set.keys.push(key.clone());
        Ok(key)
    }

    async fn get_application(&self, object_id: &str) -> GraphResult<Application> {
        let mut state = self.state.lock().await;
        state.calls.push(format!("get_application {object_id}"));
        let document = state
            .applications
            .get(object_id)
            .cloned()
            .ok_or_else(|| not_found(format!("application {object_id}")))?;
        serde_json::from_value(Value::Object(document)).map_err(|err| GraphError::Api {
            status: 500,
            code: "InvalidDocument".into(),
            message: err.to_string(),
        })
    }

    async fn patch_application(
        &self,
        object_id: &str,
        patch: &Map<String, Value>,
    ) -> GraphResult<()> {
        let mut state = self.state.lock().await;
        state.calls.push(format!("patch_application {object_id}"));
        let document = state
            .applications
            .get_mut(object_id)
            .ok_or_else(|| not_found(format!("application {object_id}")))?;
        for (field, value) in patch {
            document.insert(field.clone(), value.clone());
        }
        Ok(())
    }

    async fn get_branding_localization(&self, id: &str) -> GraphResult<BrandingLocalization> {
        let mut state = self.state.lock().await;
        state.calls.push(format!("get_branding_localization {id}"));
        state
            .localizations
            .get(id)
            .cloned()
            .ok_or_else(|| not_found(format!("branding localization {id}")))
    }

    async fn create_branding_localization(
        &self,
        localization: &BrandingLocalization,
    ) -> GraphResult<BrandingLocalization> {
        let mut state = self.state.lock().await;
        let id = localization.id.clone().unwrap_or_default();
        state.calls.push(format!("create_branding_localization {id}"));
        if state.localizations.contains_key(&id) {
            return Err(conflict(format!("localization {id} already exists")));
        }
        let mut stored = localization.clone();
        stored.cdn_list = vec![CDN_HOST.to_string()];
        state.localizations.insert(id, stored.clone());
        Ok(stored)
    }

    async fn update_branding_localization(
        &self,
        id: &str,
        changes: &Map<String, Value>,
    ) -> GraphResult<()> {
        let mut state = self.state.lock().await;
        state.calls.push(format!("update_branding_localization {id}"));
        let stored = state
            .localizations
            .get_mut(id)
            .ok_or_else(|| not_found(format!("branding localization {id}")))?;
        let text = |value: &Value| value.as_str().map(str::to_string);
        for (field, value) in changes {
            match field.as_str() {
                "backgroundColor" => stored.background_color = text(value),
                "signInPageText" => stored.sign_in_page_text = text(value),
                "usernameHintText" => stored.username_hint_text = text(value),
                _ => {}
            }
        }
        Ok(())
    }

    async fn delete_branding_localization(&self, id: &str) -> GraphResult<()> {
        let mut state = self.state.lock().await;
        state.calls.push(format!("delete_branding_localization {id}"));
        if state.failing_deletes.contains(id) {
            return Err(GraphError::Api {
                status: 400,
                code: "Request_BadRequest".into(),
                message: format!("localization {id} cannot be deleted"),
            });
        }
        state.images.retain(|(owner, _), _| owner != id);
        state
            .localizations
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| not_found(format!("branding localization {id}")))
    }

    async fn upload_branding_image(
        &self,
        id: &str,
        image: ImageType,
        content: Bytes,
    ) -> GraphResult<()> {
        let mut state = self.state.lock().await;
        state
            .calls
            .push(format!("upload_branding_image {id} {}", image.as_str()));
        if state.failing_images.contains(&image) {
            return Err(GraphError::Api {
                status: 400,
                code: "Request_BadRequest".into(),
                message: format!("{} rejected", image.as_str()),
            });
        }
        let relative = format!("{id}/{}.png", image.as_str());
        let stored = state
            .localizations
            .get_mut(id)
            .ok_or_else(|| not_found(format!("branding localization {id}")))?;
        match image {
            ImageType::BannerLogo => stored.banner_logo_relative_url = Some(relative),
            ImageType::BackgroundImage => stored.background_image_relative_url = Some(relative),
            ImageType::SquareLogo => stored.square_logo_relative_url = Some(relative),
            ImageType::SquareLogoDark => stored.square_logo_dark_relative_url = Some(relative),
        }
        state.images.insert((id.to_string(), image), content);
        Ok(())
    }
}
