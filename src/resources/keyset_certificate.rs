use std::sync::Arc;

use async_trait::async_trait;

use super::keyset::{
    delete_with_backup, find_key_set, key_set_id_or_name, missing_key_set_id,
    nested_key_set_attribute,
};
use super::{api_error, Outcome, Resource};
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::graph::GraphApi;
use crate::model::{KeySetCertificateState, KeySetState};
use crate::schema::{Attribute, Schema};

/// Key set holding a single key uploaded from a PKCS12 archive.
pub struct TrustframeworkKeySetCertificateResource {
    graph: Arc<dyn GraphApi>,
}

impl TrustframeworkKeySetCertificateResource {
    pub fn new(graph: Arc<dyn GraphApi>) -> Self {
        Self { graph }
    }

    async fn load(
        &self,
        mut state: KeySetCertificateState,
        id: &str,
        summary: &str,
    ) -> Outcome<KeySetCertificateState> {
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
impl Resource for TrustframeworkKeySetCertificateResource {
    type State = KeySetCertificateState;

    const TYPE_SUFFIX: &'static str = "trustframework_keyset_certificate";

    fn schema() -> Schema {
        Schema::new(vec![
            nested_key_set_attribute(),
            Attribute::string("certificate")
                .describe("Base64 encoded PKCS12 archive.")
                .required()
                .requires_replace(),
            Attribute::string("password")
                .describe("Password protecting the PKCS12 archive.")
                .required()
                .requires_replace(),
        ])
        .with_config_validator(key_set_id_or_name())
    }

    async fn create(&self, plan: KeySetCertificateState) -> Outcome<KeySetCertificateState> {
        let Some(id) = plan.key_set_id() else {
            return Outcome::failed(missing_key_set_id());
        };

        if let Err(err) = self.graph.create_key_set(&id).await {
            return Outcome::failed(api_error("create keyset failed", &err));
        }
        if let Err(err) = self.graph.upload_pkcs12(&id, &plan.upload_request()).await {
            return Outcome::failed(api_error("create keyset failed", &err));
        }
        tracing::info!(key_set_id = %id, "key set certificate uploaded");

        match self.load(plan, &id, "create keyset failed").await {
            Outcome {
                state: None,
                diagnostics,
            } if !diagnostics.has_error() => Outcome::failed(Diagnostic::error(
                "create keyset failed",
                format!("key set {id} disappeared after creation"),
            )),
            outcome => outcome,
        }
    }

    async fn read(&self, state: KeySetCertificateState) -> Outcome<KeySetCertificateState> {
        let Some(id) = state.key_set_id() else {
            return Outcome::failed(missing_key_set_id());
        };
        self.load(state, &id, "read keyset failed").await
    }

    async fn delete(&self, state: KeySetCertificateState) -> Diagnostics {
        match state.key_set_id() {
            Some(id) => delete_with_backup(self.graph.as_ref(), &id).await,
            None => missing_key_set_id().into(),
        }
    }

    async fn import(&self, id: &str) -> Outcome<KeySetCertificateState> {
        let state = KeySetCertificateState {
            key_set: Some(KeySetState::with_id(id)),
            ..Default::default()
        };
        match self.load(state, id, "import keyset failed").await {
            Outcome {
                state: None,
                diagnostics,
            } if !diagnostics.has_error() => Outcome::failed(Diagnostic::error(
                "cannot import non-existent remote object",
                format!("key set {id} does not exist"),
            )),
            outcome => outcome,
        }
    }
}
