//! Read-only lookups of trust framework key sets.

pub mod keyset;
pub mod keyset_certificate;
pub mod keyset_key;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::graph::{GraphApi, TrustFrameworkKeySet};
use crate::provider::type_name;
use crate::resources::{api_error, decode, encode, OperationResponse, Outcome};
use crate::schema::Schema;

pub use keyset::TrustframeworkKeySetDataSource;
pub use keyset_certificate::TrustframeworkKeySetCertificateDataSource;
pub use keyset_key::TrustframeworkKeySetKeyDataSource;

#[async_trait]
pub trait DataSource: Send + Sync + 'static {
    type State: Serialize + DeserializeOwned + Send + Sync + 'static;

    const TYPE_SUFFIX: &'static str;

    fn schema() -> Schema;

    async fn read(&self, config: Self::State) -> Outcome<Self::State>;
}

#[async_trait]
pub trait DataSourceHandler: Send + Sync {
    fn type_name(&self) -> String;
    fn schema(&self) -> Schema;
    fn validate(&self, config: &Value) -> Diagnostics;
    async fn read(&self, config: Value) -> OperationResponse;
}

pub struct TypedDataSource<D> {
    data_source: D,
}

impl<D: DataSource> TypedDataSource<D> {
    pub fn new(data_source: D) -> Self {
        Self { data_source }
    }
}

#[async_trait]
impl<D: DataSource> DataSourceHandler for TypedDataSource<D> {
    fn type_name(&self) -> String {
        type_name(D::TYPE_SUFFIX)
    }

    fn schema(&self) -> Schema {
        D::schema()
    }

    fn validate(&self, config: &Value) -> Diagnostics {
        D::schema().validate(config)
    }

    async fn read(&self, config: Value) -> OperationResponse {
        let diagnostics = self.validate(&config);
        if diagnostics.has_error() {
            return OperationResponse::stateless(diagnostics);
        }
        let config = match decode::<D::State>(config) {
            Ok(config) => config,
            Err(diagnostics) => return OperationResponse::stateless(diagnostics),
        };
        tracing::debug!(data_source = %self.type_name(), "read");
        encode(self.data_source.read(config).await)
    }
}

/// Unlike resource reads, a missing key set is an error here.
pub(crate) async fn fetch_key_set(
    graph: &dyn GraphApi,
    id: &str,
) -> Result<TrustFrameworkKeySet, Diagnostic> {
    graph.get_key_set(id).await.map_err(|err| {
        if err.is_not_found() {
            Diagnostic::error("keyset not found", format!("key set {id} does not exist"))
        } else {
            api_error("read keyset failed", &err)
        }
    })
}
