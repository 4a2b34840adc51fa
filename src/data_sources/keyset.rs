use std::sync::Arc;

use async_trait::async_trait;

use super::{fetch_key_set, DataSource};
use crate::diagnostics::Diagnostic;
use crate::graph::GraphApi;
use crate::model::KeySetState;
use crate::resources::keyset::key_attributes;
use crate::resources::Outcome;
use crate::schema::{Attribute, ConfigValidator, Schema, Validator};

/// Looks up a key set by id or name and lists all of its keys.
pub struct TrustframeworkKeySetDataSource {
    graph: Arc<dyn GraphApi>,
}

impl TrustframeworkKeySetDataSource {
    pub fn new(graph: Arc<dyn GraphApi>) -> Self {
        Self { graph }
    }
}

#[async_trait]
impl DataSource for TrustframeworkKeySetDataSource {
    type State = KeySetState;

    const TYPE_SUFFIX: &'static str = "trustframework_keyset";

    fn schema() -> Schema {
        Schema::new(vec![
            Attribute::string("id")
                .describe("Key set id including the B2C_1A_ prefix.")
                .optional()
                .computed()
                .validate_with(Validator::key_set_id()),
            Attribute::string("name")
                .describe("Key set name without the B2C_1A_ prefix.")
                .optional()
                .computed()
                .validate_with(Validator::key_set_name()),
            Attribute::object_list("keys", key_attributes())
                .computed()
                .sensitive(),
        ])
        .with_config_validator(ConfigValidator::ExactlyOneOf(vec!["id", "name"]))
        .describe("Represents a trust framework keyset/policy key.")
    }

    async fn read(&self, config: KeySetState) -> Outcome<KeySetState> {
        let Some(id) = config.resolved_id() else {
            return Outcome::failed(Diagnostic::error(
                "missing key set identifier",
                "either id or name must be set",
            ));
        };
        match fetch_key_set(self.graph.as_ref(), &id).await {
            Ok(key_set) => Outcome::ok(KeySetState::from_remote(&key_set)),
            Err(diagnostic) => Outcome::failed(diagnostic),
        }
    }
}
