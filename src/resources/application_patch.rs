//! Partial updates applied to existing application registrations.
//!
//! Patches are one-way: deleting the resource leaves the application as patched.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::{api_error, Outcome, Resource};
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::graph::{Application, GraphApi};
use crate::model::{
    ApplicationPatchState, PatchTemplates, SamlApplicationPatchState,
    TrustframeworkApplicationPatchState,
};
use crate::schema::{Attribute, Schema};

fn object_id_attribute() -> Attribute {
    Attribute::string("object_id")
        .describe("Object id of the application to patch.")
        .required()
        .requires_replace()
}

fn data_attribute() -> Attribute {
    Attribute::object(
        "data",
        vec![
            Attribute::string("id").computed(),
            Attribute::string("app_id").computed(),
            Attribute::string("display_name").computed(),
            Attribute::string("saml_metadata_url").computed(),
            Attribute::string_list("identifier_uris").computed(),
        ],
    )
    .computed()
}

fn missing_object_id() -> Diagnostic {
    Diagnostic::error("missing object id", "object_id must be configured").at("object_id")
}

/// Sends the patch and reads the application back.
async fn apply_patch(
    graph: &dyn GraphApi,
    object_id: &str,
    patch: &Map<String, Value>,
) -> Result<Application, Diagnostic> {
    graph
        .patch_application(object_id, patch)
        .await
        .map_err(|err| api_error("patch application failed", &err))?;
    tracing::info!(%object_id, fields = patch.len(), "application patched");
    graph
        .get_application(object_id)
        .await
        .map_err(|err| api_error("patch application failed", &err))
}

async fn find_application(
    graph: &dyn GraphApi,
    object_id: &str,
) -> Result<Option<Application>, Diagnostic> {
    match graph.get_application(object_id).await {
        Ok(application) => Ok(Some(application)),
        Err(err) if err.is_not_found() => {
            tracing::warn!(%object_id, "application no longer exists, removing from state");
            Ok(None)
        }
        Err(err) => Err(api_error("get application failed", &err)),
    }
}

/// Delete is a no-op: the application keeps the patched values.
fn not_reverted(object_id: Option<&str>) -> Diagnostics {
    tracing::debug!(
        object_id = object_id.unwrap_or_default(),
        "application patch is not reverted"
    );
    Diagnostics::new()
}

pub struct ApplicationPatchResource {
    graph: Arc<dyn GraphApi>,
}

impl ApplicationPatchResource {
    pub fn new(graph: Arc<dyn GraphApi>) -> Self {
        Self { graph }
    }
}

#[async_trait]
impl Resource for ApplicationPatchResource {
    type State = ApplicationPatchState;

    const TYPE_SUFFIX: &'static str = "application_patch";

    fn schema() -> Schema {
        Schema::new(vec![
            object_id_attribute(),
            Attribute::string("patch_file")
                .describe("Absolute path of a JSON document merged into the application.")
                .required()
                .requires_replace_if_configured(),
            Attribute::string("saml_metadata_url")
                .describe("Overrides samlMetadataUrl of the patch document.")
                .optional()
                .requires_replace_if_configured(),
            data_attribute(),
        ])
        .describe("Patch an application registration from a JSON file.")
    }

    async fn create(&self, mut plan: ApplicationPatchState) -> Outcome<ApplicationPatchState> {
        let Some(object_id) = plan.object_id.clone() else {
            return Outcome::failed(missing_object_id());
        };
        let patch = match plan.get_patch() {
            Ok(patch) => patch,
            Err(err) => return Outcome::failed(err.to_diagnostic("patch_file")),
        };
        match apply_patch(self.graph.as_ref(), &object_id, &patch).await {
            Ok(application) => {
                plan.consume(&application);
                Outcome::ok(plan)
            }
            Err(diagnostic) => Outcome::failed(diagnostic),
        }
    }

    async fn read(&self, mut state: ApplicationPatchState) -> Outcome<ApplicationPatchState> {
        let Some(object_id) = state.object_id.clone() else {
            return Outcome::failed(missing_object_id());
        };
        match find_application(self.graph.as_ref(), &object_id).await {
            Ok(Some(application)) => {
                state.consume(&application);
                Outcome::ok(state)
            }
            Ok(None) => Outcome::removed(),
            Err(diagnostic) => Outcome::failed(diagnostic),
        }
    }

    async fn delete(&self, state: ApplicationPatchState) -> Diagnostics {
        not_reverted(state.object_id.as_deref())
    }
}

/// Applies the embedded trust framework template.
pub struct TrustframeworkApplicationPatchResource {
    graph: Arc<dyn GraphApi>,
    templates: Arc<PatchTemplates>,
}

impl TrustframeworkApplicationPatchResource {
    pub fn new(graph: Arc<dyn GraphApi>, templates: Arc<PatchTemplates>) -> Self {
        Self { graph, templates }
    }
}

#[async_trait]
impl Resource for TrustframeworkApplicationPatchResource {
    type State = TrustframeworkApplicationPatchState;

    const TYPE_SUFFIX: &'static str = "trustframework_application_patch";

    fn schema() -> Schema {
        Schema::new(vec![object_id_attribute(), data_attribute()])
            .describe("Patch an identity experience framework application.")
    }

    async fn create(
        &self,
        mut plan: TrustframeworkApplicationPatchState,
    ) -> Outcome<TrustframeworkApplicationPatchState> {
        let Some(object_id) = plan.object_id.clone() else {
            return Outcome::failed(missing_object_id());
        };
        let patch = plan.get_patch(&self.templates);
        match apply_patch(self.graph.as_ref(), &object_id, &patch).await {
            Ok(application) => {
                plan.consume(&application);
                Outcome::ok(plan)
            }
            Err(diagnostic) => Outcome::failed(diagnostic),
        }
    }

    async fn read(
        &self,
        mut state: TrustframeworkApplicationPatchState,
    ) -> Outcome<TrustframeworkApplicationPatchState> {
        let Some(object_id) = state.object_id.clone() else {
            return Outcome::failed(missing_object_id());
        };
        match find_application(self.graph.as_ref(), &object_id).await {
            Ok(Some(application)) => {
                state.consume(&application);
                Outcome::ok(state)
            }
            Ok(None) => Outcome::removed(),
            Err(diagnostic) => Outcome::failed(diagnostic),
        }
    }

    async fn delete(&self, state: TrustframeworkApplicationPatchState) -> Diagnostics {
        not_reverted(state.object_id.as_deref())
    }
}

/// Applies the embedded SAML template with the configured metadata url.
pub struct SamlApplicationPatchResource {
    graph: Arc<dyn GraphApi>,
    templates: Arc<PatchTemplates>,
}

impl SamlApplicationPatchResource {
    pub fn new(graph: Arc<dyn GraphApi>, templates: Arc<PatchTemplates>) -> Self {
        Self { graph, templates }
    }
}

#[async_trait]
impl Resource for SamlApplicationPatchResource {
    type State = SamlApplicationPatchState;

    const TYPE_SUFFIX: &'static str = "saml_application_patch";

    fn schema() -> Schema {
        Schema::new(vec![
            object_id_attribute(),
            Attribute::string("saml_metadata_url")
                .describe("The metadata url")
                .required()
                .requires_replace(),
            data_attribute().sensitive(),
        ])
        .describe("Patch a saml app")
    }

    async fn create(
        &self,
        mut plan: SamlApplicationPatchState,
    ) -> Outcome<SamlApplicationPatchState> {
        let Some(object_id) = plan.object_id.clone() else {
            return Outcome::failed(missing_object_id());
        };
        let patch = plan.get_patch(&self.templates);
        match apply_patch(self.graph.as_ref(), &object_id, &patch).await {
            Ok(application) => {
                plan.consume(&application);
                Outcome::ok(plan)
            }
            Err(diagnostic) => Outcome::failed(diagnostic),
        }
    }

    async fn read(
        &self,
        mut state: SamlApplicationPatchState,
    ) -> Outcome<SamlApplicationPatchState> {
        let Some(object_id) = state.object_id.clone() else {
            return Outcome::failed(missing_object_id());
        };
        match find_application(self.graph.as_ref(), &object_id).await {
            Ok(Some(application)) => {
                state.consume(&application);
                Outcome::ok(state)
            }
            Ok(None) => Outcome::removed(),
            Err(diagnostic) => Outcome::failed(diagnostic),
        }
    }

    async fn delete(&self, state: SamlApplicationPatchState) -> Diagnostics {
        not_reverted(state.object_id.as_deref())
    }
}
