use std::sync::Arc;

use async_trait::async_trait;

use super::{fetch_key_set, DataSource};
use crate::diagnostics::Diagnostic;
use crate::graph::GraphApi;
use crate::model::KeySetCertificateDataState;
use crate::resources::Outcome;
use crate::schema::{Attribute, Schema, Validator};

pub struct TrustframeworkKeySetCertificateDataSource {
    graph: Arc<dyn GraphApi>,
}

impl TrustframeworkKeySetCertificateDataSource {
    pub fn new(graph: Arc<dyn GraphApi>) -> Self {
        Self { graph }
    }
}

#[async_trait]
impl DataSource for TrustframeworkKeySetCertificateDataSource {
    type State = KeySetCertificateDataState;

    const TYPE_SUFFIX: &'static str = "trustframework_keyset_certificate";

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
                    Attribute::int64("exp").computed(),
                    Attribute::string("e").computed(),
                    Attribute::string_list("x5c").computed(),
                    Attribute::string("kty").computed(),
                    Attribute::string("n").computed(),
                    Attribute::string("x5t").computed(),
                    Attribute::int64("nbf").computed(),
                ],
            )
            .computed()
            .sensitive(),
        ])
    }

    async fn read(
        &self,
        mut config: KeySetCertificateDataState,
    ) -> Outcome<KeySetCertificateDataState> {
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
        tracing::debug!(key_set_id = %id, "certificate data source read");
        Outcome::ok(config)
    }
}
