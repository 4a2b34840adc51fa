use std::sync::Arc;

use async_trait::async_trait;

use super::keyset::{
    delete_with_backup, find_key_set, key_set_id_or_name, missing_key_set_id,
    nested_key_set_attribute,
};
use super::{api_error, Outcome, Resource};
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::graph::GraphApi;
use crate::model::{KeyRequest, KeySetKeyState, KeySetState};
use crate::schema::{Attribute, Schema, Validator};

/// Key set holding a single generated or uploaded key.
pub struct TrustframeworkKeySetKeyResource {
    graph: Arc<dyn GraphApi>,
}

impl TrustframeworkKeySetKeyResource {
    pub fn new(graph: Arc<dyn GraphApi>) -> Self {
        Self { graph }
    }

    async fn load(
        &self,
        mut state: KeySetKeyState,
        id: &str,
        summary: &str,
    ) -> Outcome<KeySetKeyState> {
        match find_key_set(self.graph.as_ref(), id, summary).await {
            Ok(Some(key_set)) => {
                let diagnostics = state.consume(&key_set);
                if diagnostics.has_error() {
                    return Outcome::failed(diagnostics);
                }
                Outcome::new(Some(state), diagnostics)
            }
            Ok(None) => {
                tracing::warn!(key_set_id = %id, "key set no longer exists, removing from state");
                Outcome::removed()
            }
            Err(diagnostic) => Outcome::failed(diagnostic),
        }
    }
}

#[async_trait]
impl Resource for TrustframeworkKeySetKeyResource {
    type State = KeySetKeyState;

    const TYPE_SUFFIX: &'static str = "trustframework_keyset_key";

    fn schema() -> Schema {
        Schema::new(vec![
            nested_key_set_attribute(),
            Attribute::string("use")
                .describe("Key usage: sig or enc.")
                .required()
                .validate_with(Validator::OneOf(&["sig", "enc"]))
                .requires_replace(),
            Attribute::string("type")
                .describe("Key type: RSA or OCT.")
                .required()
                .validate_with(Validator::OneOf(&["RSA", "OCT"]))
                .requires_replace(),
            Attribute::string("secret")
                .describe("Uploaded instead of generating a key when set.")
                .optional()
                .sensitive()
                .requires_replace(),
        ])
        .with_config_validator(key_set_id_or_name())
    }

    async fn create(&self, plan: KeySetKeyState) -> Outcome<KeySetKeyState> {
        let Some(id) = plan.key_set_id() else {
            return Outcome::failed(missing_key_set_id());
        };

        if let Err(err) = self.graph.create_key_set(&id).await {
            return Outcome::failed(api_error("create keyset failed", &err));
        }

        let created = match plan.key_request() {
            KeyRequest::Generate(request) => self.graph.generate_key(&id, &request).await,
            KeyRequest::UploadSecret(request) => self.graph.upload_secret(&id, &request).await,
        };
        if let Err(err) = created {
            return Outcome::failed(api_error("create keyset failed", &err));
        }
        tracing::info!(key_set_id = %id, "key set key created");

        match self.load(plan, &id, "create keyset failed").await {
            Outcome { state: None, diagnostics } if !diagnostics.has_error() => {
                Outcome::failed(Diagnostic::error(
                    "create keyset failed",
                    format!("key set {id} disappeared after creation"),
                ))
            }
            outcome => outcome,
        }
    }

    async fn read(&self, state: KeySetKeyState) -> Outcome<KeySetKeyState> {
        let Some(id) = state.key_set_id() else {
            return Outcome::failed(missing_key_set_id());
        };
        self.load(state, &id, "read keyset failed").await
    }

    async fn delete(&self, state: KeySetKeyState) -> Diagnostics {
        match state.key_set_id() {
            Some(id) => delete_with_backup(self.graph.as_ref(), &id).await,
            None => missing_key_set_id().into(),
        }
    }

    async fn import(&self, id: &str) -> Outcome<KeySetKeyState> {
        let state = KeySetKeyState {
            key_set: Some(KeySetState::with_id(id)),
            ..Default::default()
        };
        match self.load(state, id, "import keyset failed").await {
            Outcome { state: None, diagnostics } if !diagnostics.has_error() => {
                Outcome::failed(Diagnostic::error(
                    "cannot import non-existent remote object",
                    format!("key set {id} does not exist"),
                ))
            }
            outcome => outcome,
        }
    }
}
