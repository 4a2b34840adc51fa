use std::sync::Arc;

use async_trait::async_trait;

use super::{fetch_key_set, DataSource};
use crate::diagnostics::Diagnostic;
use crate::graph::GraphApi;
use crate::model::KeySetKeyDataState;
use crate::resources::Outcome;
use crate::schema::{Attribute, Schema, Validator};

/// Reads the public part of the single key held by a key set.
pub struct TrustframeworkKeySetKeyDataSource {
    graph: Arc<dyn GraphApi>,
}

impl TrustframeworkKeySetKeyDataSource {
    pub fn new(graph: Arc<dyn GraphApi>) -> Self {
        Self { graph }
    }
}

#[async_trait]
impl DataSource for TrustframeworkKeySetKeyDataSource {
    type State = KeySetKeyDataState;

    const TYPE_SUFFIX: &'static str = "trustframework_keyset_key";

    fn schema() -> Schema {
        Schema::new(vec![
            Attribute::string("keyset_id")
                .describe("The id of the keyset")
                .required()
                .validate_with(Validator::key_set_id()),
            Attribute::object(
                "data",
                vec![
                    Attribute::string("kid").computed(),
                    Attribute::string("use").computed(),
                    Attribute::string("kty").computed(),
                    Attribute::string("n").computed(),
                    Attribute::string("e").computed(),
                ],
            )
            .describe("JSON web key as defined in RFC 7517 section 4.")
            .computed()
            .sensitive(),
        ])
    }

    async fn read(&self, mut config: KeySetKeyDataState) -> Outcome<KeySetKeyDataState> {
        let Some(id) = config.keyset_id.clone() else {
            return Outcome::failed(
                Diagnostic::error("missing keyset id", "keyset_id must be configured")
                    .at("keyset_id"),
            );
        };
        let key_set = match fetch_key_set(self.graph.as_ref(), &id).await {
            Ok(key_set) => key_set,
            Err(diagnostic) => return Outcome::failed(diagnostic),
        };
        let diagnostics = config.consume(&key_set);
        if diagnostics.has_error() {
            return Outcome::failed(diagnostics);
        }
        Outcome::ok(config)
    }
}
