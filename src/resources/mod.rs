//! Managed resources and the generic handler that drives them.
//!
//! Each resource implements [`Resource`] over its typed state record. The
//! provider root wraps it in [`TypedResource`], which speaks plain JSON state
//! to the host through [`ResourceHandler`].

pub mod application_patch;
pub mod branding;
pub mod keyset;
pub mod keyset_certificate;
pub mod keyset_key;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::graph::GraphError;
use crate::provider::type_name;
use crate::schema::Schema;

pub use application_patch::{
    ApplicationPatchResource, SamlApplicationPatchResource, TrustframeworkApplicationPatchResource,
};
pub use branding::OrganizationalBrandingLocalizationResource;
pub use keyset::TrustframeworkKeySetResource;
pub use keyset_certificate::TrustframeworkKeySetCertificateResource;
pub use keyset_key::TrustframeworkKeySetKeyResource;

/// Typed result of a single operation: the new state, if any, plus diagnostics.
#[derive(Debug)]
pub struct Outcome<S> {
    pub state: Option<S>,
    pub diagnostics: Diagnostics,
}

impl<S> Outcome<S> {
    pub fn ok(state: S) -> Self {
        Self {
            state: Some(state),
            diagnostics: Diagnostics::new(),
        }
    }

    /// The remote object is gone; the host drops it from state.
    pub fn removed() -> Self {
        Self {
            state: None,
            diagnostics: Diagnostics::new(),
        }
    }

    pub fn failed(diagnostics: impl Into<Diagnostics>) -> Self {
        Self {
            state: None,
            diagnostics: diagnostics.into(),
        }
    }

    pub fn new(state: Option<S>, diagnostics: Diagnostics) -> Self {
        Self { state, diagnostics }
    }
}

/// Wraps a Graph failure in a short operation label.
pub(crate) fn api_error(summary: &str, error: &GraphError) -> Diagnostic {
    Diagnostic::error(summary, error.to_string())
}

#[async_trait]
pub trait Resource: Send + Sync + 'static {
    type State: Serialize + DeserializeOwned + Send + Sync + 'static;

    /// Type name without the provider prefix, e.g. `trustframework_keyset`.
    const TYPE_SUFFIX: &'static str;

    fn schema() -> Schema;

    async fn create(&self, plan: Self::State) -> Outcome<Self::State>;

    async fn read(&self, state: Self::State) -> Outcome<Self::State>;

    async fn update(&self, _prior: Self::State, _plan: Self::State) -> Outcome<Self::State> {
        Outcome::failed(Diagnostic::error(
            "cannot update",
            format!(
                "{} cannot be updated. please delete and create new.",
                type_name(Self::TYPE_SUFFIX)
            ),
        ))
    }

    async fn delete(&self, state: Self::State) -> Diagnostics;

    async fn import(&self, _id: &str) -> Outcome<Self::State> {
        Outcome::failed(Diagnostic::error(
            "import not supported",
            format!("{} cannot be imported", type_name(Self::TYPE_SUFFIX)),
        ))
    }
}

#[derive(Debug, Default, Serialize)]
pub struct OperationResponse {
    pub state: Option<Value>,
    pub diagnostics: Diagnostics,
}

impl OperationResponse {
    /// Diagnostics only, e.g. a validation result or an aborted operation.
    pub fn stateless(diagnostics: Diagnostics) -> Self {
        Self {
            state: None,
            diagnostics,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PlanResponse {
    pub planned_state: Value,
    pub requires_replace: Vec<String>,
    pub diagnostics: Diagnostics,
}

/// JSON-facing view of a resource used by the provider registry.
#[async_trait]
pub trait ResourceHandler: Send + Sync {
    fn type_name(&self) -> String;
    fn schema(&self) -> Schema;
    fn validate(&self, config: &Value) -> Diagnostics;
    fn plan(&self, prior: &Value, proposed: &Value) -> PlanResponse;
    async fn create(&self, config: Value) -> OperationResponse;
    async fn read(&self, state: Value) -> OperationResponse;
    async fn update(&self, prior: Value, planned: Value) -> OperationResponse;
    async fn delete(&self, state: Value) -> OperationResponse;
    async fn import(&self, id: &str) -> OperationResponse;
}

pub(crate) fn decode<S: DeserializeOwned>(value: Value) -> Result<S, Diagnostics> {
    serde_json::from_value(value)
        .map_err(|err| Diagnostic::error("invalid state", err.to_string()).into())
}

pub(crate) fn encode<S: Serialize>(outcome: Outcome<S>) -> OperationResponse {
    let Outcome {
        state,
        mut diagnostics,
    } = outcome;
    let state = match state.map(serde_json::to_value).transpose() {
        Ok(state) => state,
        Err(err) => {
            diagnostics.add_error("failed to encode state", err.to_string());
            None
        }
    };
    OperationResponse { state, diagnostics }
}

pub struct TypedResource<R> {
    resource: R,
}

impl<R: Resource> TypedResource<R> {
    pub fn new(resource: R) -> Self {
        Self { resource }
    }

    pub fn inner(&self) -> &R {
        &self.resource
    }
}

#[async_trait]
impl<R: Resource> ResourceHandler for TypedResource<R> {
    fn type_name(&self) -> String {
        type_name(R::TYPE_SUFFIX)
    }

    fn schema(&self) -> Schema {
        R::schema()
    }

    fn validate(&self, config: &Value) -> Diagnostics {
        R::schema().validate(config)
    }

    fn plan(&self, prior: &Value, proposed: &Value) -> PlanResponse {
        let schema = R::schema();
        let diagnostics = if proposed.is_null() {
            Diagnostics::new()
        } else {
            schema.validate(proposed)
        };
        PlanResponse {
            planned_state: schema.plan(prior, proposed),
            requires_replace: schema.requires_replace(prior, proposed),
            diagnostics,
        }
    }

    async fn create(&self, config: Value) -> OperationResponse {
        let diagnostics = self.validate(&config);
        if diagnostics.has_error() {
            return OperationResponse::stateless(diagnostics);
        }
        let plan = match decode::<R::State>(config) {
            Ok(plan) => plan,
            Err(diagnostics) => return OperationResponse::stateless(diagnostics),
        };
        tracing::debug!(resource = %self.type_name(), "create");
        encode(self.resource.create(plan).await)
    }

    async fn read(&self, state: Value) -> OperationResponse {
        let current = match decode::<R::State>(state) {
            Ok(current) => current,
            Err(diagnostics) => return OperationResponse::stateless(diagnostics),
        };
        tracing::debug!(resource = %self.type_name(), "read");
        encode(self.resource.read(current).await)
    }

    async fn update(&self, prior: Value, planned: Value) -> OperationResponse {
        let diagnostics = R::schema().validate_planned(&planned);
        if diagnostics.has_error() {
            return OperationResponse::stateless(diagnostics);
        }
        let (prior, planned) = match (decode::<R::State>(prior), decode::<R::State>(planned)) {
            (Ok(prior), Ok(planned)) => (prior, planned),
            (Err(diagnostics), _) | (_, Err(diagnostics)) => {
                return OperationResponse::stateless(diagnostics)
            }
        };
        tracing::debug!(resource = %self.type_name(), "update");
        encode(self.resource.update(prior, planned).await)
    }

    async fn delete(&self, state: Value) -> OperationResponse {
        let current = match decode::<R::State>(state) {
            Ok(current) => current,
            Err(diagnostics) => return OperationResponse::stateless(diagnostics),
        };
        tracing::debug!(resource = %self.type_name(), "delete");
        OperationResponse {
            state: None,
            diagnostics: self.resource.delete(current).await,
        }
    }

    async fn import(&self, id: &str) -> OperationResponse {
        tracing::debug!(resource = %self.type_name(), %id, "import");
        encode(self.resource.import(id).await)
    }
}
