use std::sync::Arc;

use async_trait::async_trait;

use super::{api_error, Outcome, Resource};
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::graph::{GraphApi, TrustFrameworkKeySet};
use crate::model::KeySetResourceState;
use crate::schema::{Attribute, ConfigValidator, Schema, Validator};

/// Computed mirror of the keys held by a key set.
pub(crate) fn key_attributes() -> Vec<Attribute> {
    vec![
        Attribute::string("kid").computed(),
        Attribute::string("kty").computed(),
        Attribute::string("use").computed(),
        Attribute::string("n").computed(),
        Attribute::string("e").computed().sensitive(),
        Attribute::int64("exp").computed(),
        Attribute::int64("nbf").computed(),
        Attribute::string_list("x5c").computed(),
        Attribute::string("x5t").computed(),
    ]
}

/// `key_set` block shared by the key and certificate resources.
pub(crate) fn nested_key_set_attribute() -> Attribute {
    Attribute::object(
        "key_set",
        vec![
            Attribute::string("id")
                .describe("Key set id including the B2C_1A_ prefix.")
                .optional()
                .computed()
                .validate_with(Validator::key_set_id())
                .requires_replace(),
            Attribute::string("name")
                .describe("Key set name without the B2C_1A_ prefix.")
                .optional()
                .computed()
                .validate_with(Validator::key_set_name())
                .requires_replace(),
            Attribute::object_list("keys", key_attributes()).computed(),
        ],
    )
    .optional()
    .computed()
}

pub(crate) fn key_set_id_or_name() -> ConfigValidator {
    ConfigValidator::ExactlyOneOf(vec!["key_set.id", "key_set.name"])
}

/// Reads a key set, mapping a missing one to `None`.
pub(crate) async fn find_key_set(
    graph: &dyn GraphApi,
    id: &str,
    summary: &str,
) -> Result<Option<TrustFrameworkKeySet>, Diagnostic> {
    match graph.get_key_set(id).await {
        Ok(key_set) => Ok(Some(key_set)),
        Err(err) if err.is_not_found() => Ok(None),
        Err(err) => Err(api_error(summary, &err)),
    }
}

/// Deletes a key set and its `.bak` sibling. Only the primary deletion can fail.
pub(crate) async fn delete_with_backup(graph: &dyn GraphApi, id: &str) -> Diagnostics {
    let mut diagnostics = Diagnostics::new();
    match graph.delete_key_set(id).await {
        Ok(()) => tracing::info!(key_set_id = %id, "key set deleted"),
        Err(err) if err.is_not_found() => {
            tracing::warn!(key_set_id = %id, "key set already deleted")
        }
        Err(err) => {
            diagnostics.push(api_error("delete keyset failed", &err));
            return diagnostics;
        }
    }

    let backup = format!("{id}.bak");
    if let Err(error) = graph.delete_key_set(&backup).await {
        tracing::debug!(key_set_id = %backup, %error, "ignoring backup deletion failure");
    }
    diagnostics
}

pub(crate) fn missing_key_set_id() -> Diagnostic {
    Diagnostic::error(
        "missing key set identifier",
        "either key_set.id or key_set.name must be set",
    )
    .at("key_set")
}

pub struct TrustframeworkKeySetResource {
    graph: Arc<dyn GraphApi>,
}

impl TrustframeworkKeySetResource {
    pub fn new(graph: Arc<dyn GraphApi>) -> Self {
        Self { graph }
    }
}

#[async_trait]
impl Resource for TrustframeworkKeySetResource {
    type State = KeySetResourceState;

    const TYPE_SUFFIX: &'static str = "trustframework_keyset";

    fn schema() -> Schema {
        Schema::new(vec![
            Attribute::string("name")
                .describe("Key set name; the id is derived by prefixing B2C_1A_.")
                .required()
                .validate_with(Validator::key_set_name())
                .requires_replace(),
            Attribute::string("id").computed(),
            Attribute::object(
                "metadata",
                vec![Attribute::string("odata_context").computed()],
            )
            .computed(),
        ])
        .describe("Trust framework key set without keys.")
    }

    async fn create(&self, mut plan: KeySetResourceState) -> Outcome<KeySetResourceState> {
        let Some(id) = plan.resolved_id() else {
            return Outcome::failed(Diagnostic::error(
                "missing key set name",
                "name must be configured",
            ));
        };
        match self.graph.create_key_set(&id).await {
            Ok(created) => {
                tracing::info!(key_set_id = %id, "key set created");
                plan.consume(&created);
                Outcome::ok(plan)
            }
            Err(err) => Outcome::failed(api_error("create keyset failed", &err)),
        }
    }

    async fn read(&self, mut state: KeySetResourceState) -> Outcome<KeySetResourceState> {
        let Some(id) = state.resolved_id() else {
            return Outcome::failed(Diagnostic::error("read keyset failed", "state has no id"));
        };
        match find_key_set(self.graph.as_ref(), &id, "read keyset failed").await {
            Ok(Some(key_set)) => {
                state.consume(&key_set);
                Outcome::ok(state)
            }
            Ok(None) => {
                tracing::warn!(key_set_id = %id, "key set no longer exists, removing from state");
                Outcome::removed()
            }
            Err(diagnostic) => Outcome::failed(diagnostic),
        }
    }

    async fn delete(&self, state: KeySetResourceState) -> Diagnostics {
        match state.resolved_id() {
            Some(id) => delete_with_backup(self.graph.as_ref(), &id).await,
            None => Diagnostic::error("delete keyset failed", "state has no id").into(),
        }
    }

    async fn import(&self, id: &str) -> Outcome<KeySetResourceState> {
        match find_key_set(self.graph.as_ref(), id, "import keyset failed").await {
            Ok(Some(key_set)) => {
                let mut state = KeySetResourceState::default();
                state.consume(&key_set);
                Outcome::ok(state)
            }
            Ok(None) => Outcome::failed(Diagnostic::error(
                "cannot import non-existent remote object",
                format!("key set {id} does not exist"),
            )),
            Err(diagnostic) => Outcome::failed(diagnostic),
        }
    }
}
