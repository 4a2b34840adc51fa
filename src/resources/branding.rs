use std::sync::Arc;

use async_trait::async_trait;

use super::{api_error, Outcome, Resource};
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::graph::{BrandingLocalization, GraphApi};
use crate::model::{BrandingImages, BrandingLocalizationState};
use crate::schema::{Attribute, ConfigValidator, Schema, Validator};

pub struct OrganizationalBrandingLocalizationResource {
    graph: Arc<dyn GraphApi>,
}

fn missing_id() -> Diagnostic {
    Diagnostic::error("missing localization id", "id must be configured").at("id")
}

impl OrganizationalBrandingLocalizationResource {
    pub fn new(graph: Arc<dyn GraphApi>) -> Self {
        Self { graph }
    }

    // Uploads run after the base record write and are never rolled back.
    async fn upload_images(&self, id: &str, images: &BrandingImages) -> Diagnostics {
        let mut diagnostics = Diagnostics::new();
        for (image, content) in images.iter() {
            match self
                .graph
                .upload_branding_image(id, image, content.clone())
                .await
            {
                Ok(()) => {
                    tracing::debug!(localization = %id, image = image.as_str(), "image uploaded")
                }
                Err(err) => diagnostics.push(
                    api_error(&format!("failed to upload {}", image.label()), &err)
                        .at(image.attribute()),
                ),
            }
        }
        diagnostics
    }

    /// Re-reads the localization so computed urls reflect whatever was uploaded.
    async fn refresh(
        &self,
        mut state: BrandingLocalizationState,
        id: &str,
        summary: &str,
        mut diagnostics: Diagnostics,
    ) -> Outcome<BrandingLocalizationState> {
        match self.graph.get_branding_localization(id).await {
            Ok(remote) => {
                state.consume(&remote);
                Outcome::new(Some(state), diagnostics)
            }
            Err(err) => {
                diagnostics.push(api_error(summary, &err));
                Outcome::failed(diagnostics)
            }
        }
    }
}

#[async_trait]
impl Resource for OrganizationalBrandingLocalizationResource {
    type State = BrandingLocalizationState;

    const TYPE_SUFFIX: &'static str = "organizational_branding_localization";

    fn schema() -> Schema {
        Schema::new(vec![
            Attribute::string("id")
                .describe("Locale of the localization, `0` for the default branding.")
                .required()
                .requires_replace(),
            Attribute::string("background_color")
                .describe("Shown in place of the background image on slow connections.")
                .optional(),
            Attribute::string("background_image")
                .describe("Base64 encoded background image.")
                .optional(),
            Attribute::string("background_image_url").computed(),
            Attribute::string("banner_logo")
                .describe("Base64 encoded banner logo.")
                .optional(),
            Attribute::string("banner_logo_url").computed(),
            Attribute::string("sign_in_page_text")
                .optional()
                .validate_with(Validator::LengthAtMost(1024)),
            Attribute::string("square_logo_light")
                .describe("Base64 encoded square logo for light themes.")
                .optional(),
            Attribute::string("square_logo_light_url").computed(),
            Attribute::string("square_logo_dark")
                .describe("Base64 encoded square logo for dark themes.")
                .optional(),
            Attribute::string("square_logo_dark_url").computed(),
            Attribute::string("username_hint_text")
                .optional()
                .validate_with(Validator::LengthAtMost(64)),
        ])
        .with_config_validator(ConfigValidator::AtLeastOneOf(vec![
            "background_color",
            "sign_in_page_text",
            "username_hint_text",
        ]))
    }

    async fn create(
        &self,
        plan: BrandingLocalizationState,
    ) -> Outcome<BrandingLocalizationState> {
        let Some(id) = plan.id.clone() else {
            return Outcome::failed(missing_id());
        };

        let existing = match self.graph.get_branding_localization(&id).await {
            Ok(existing) => Some(existing),
            Err(err) if err.is_not_found() => None,
            Err(err) => {
                return Outcome::failed(api_error("create organizational branding failed", &err))
            }
        };
        let exists = existing.is_some();
        let mut target = existing.unwrap_or_else(|| BrandingLocalization {
            id: Some(id.clone()),
            ..Default::default()
        });

        let populated = plan.populate(&mut target);
        let mut diagnostics = populated.diagnostics;
        if diagnostics.has_error() {
            return Outcome::failed(diagnostics);
        }

        let written = if exists {
            tracing::info!(localization = %id, "adopting existing branding localization");
            if populated.changes.is_empty() {
                Ok(())
            } else {
                self.graph
                    .update_branding_localization(&id, &populated.changes)
                    .await
            }
        } else {
            self.graph
                .create_branding_localization(&target)
                .await
                .map(|_| ())
        };
        if let Err(err) = written {
            diagnostics.push(api_error("create organizational branding failed", &err));
            return Outcome::failed(diagnostics);
        }

        diagnostics.append(self.upload_images(&id, &populated.images).await);
        self.refresh(plan, &id, "get created organizational branding failed", diagnostics)
            .await
    }

    async fn read(
        &self,
        mut state: BrandingLocalizationState,
    ) -> Outcome<BrandingLocalizationState> {
        let Some(id) = state.id.clone() else {
            return Outcome::failed(missing_id());
        };
        match self.graph.get_branding_localization(&id).await {
            Ok(remote) => {
                state.consume(&remote);
                Outcome::ok(state)
            }
            Err(err) if err.is_not_found() => {
                tracing::warn!(
                    localization = %id,
                    "branding localization no longer exists, removing from state"
                );
                Outcome::removed()
            }
            Err(err) => Outcome::failed(api_error("get organizational branding failed", &err)),
        }
    }

    async fn update(
        &self,
        _prior: BrandingLocalizationState,
        plan: BrandingLocalizationState,
    ) -> Outcome<BrandingLocalizationState> {
        let Some(id) = plan.id.clone() else {
            return Outcome::failed(missing_id());
        };

        let mut remote = match self.graph.get_branding_localization(&id).await {
            Ok(remote) => remote,
            Err(err) => {
                return Outcome::failed(api_error("get organizational branding failed", &err))
            }
        };

        let populated = plan.populate(&mut remote);
        let mut diagnostics = populated.diagnostics;
        if diagnostics.has_error() {
            return Outcome::failed(diagnostics);
        }

        if !populated.changes.is_empty() {
            if let Err(err) = self
                .graph
                .update_branding_localization(&id, &populated.changes)
                .await
            {
                diagnostics.push(api_error("update organizational branding failed", &err));
                return Outcome::failed(diagnostics);
            }
        }

        diagnostics.append(self.upload_images(&id, &populated.images).await);
        self.refresh(plan, &id, "get updated organizational branding failed", diagnostics)
            .await
    }

    async fn delete(&self, state: BrandingLocalizationState) -> Diagnostics {
        let mut diagnostics = Diagnostics::new();
        if state.banner_logo.is_some() {
            diagnostics.add_warning(
                "removing the banner logo is not supported",
                "Please remove the banner logo manually, before destroying this resource",
            );
            return diagnostics;
        }
        let Some(id) = state.id else {
            return missing_id().into();
        };
        match self.graph.delete_branding_localization(&id).await {
            Ok(()) => tracing::info!(localization = %id, "branding localization deleted"),
            Err(err) if err.is_not_found() => {}
            Err(err) => {
                diagnostics.add_warning("delete organizational branding failed", err.to_string())
            }
        }
        diagnostics
    }
}
