use base64::engine::general_purpose::STANDARD as Base64Engine;
use base64::Engine;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::graph::{BrandingLocalization, ImageType};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BrandingLocalizationState {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub background_color: Option<String>,
    #[serde(default)]
    pub background_image: Option<String>,
    #[serde(default)]
    pub background_image_url: Option<String>,
    #[serde(default)]
    pub banner_logo: Option<String>,
    #[serde(default)]
    pub banner_logo_url: Option<String>,
    #[serde(default)]
    pub sign_in_page_text: Option<String>,
    #[serde(default)]
    pub square_logo_light: Option<String>,
    #[serde(default)]
    pub square_logo_light_url: Option<String>,
    #[serde(default)]
    pub square_logo_dark: Option<String>,
    #[serde(default)]
    pub square_logo_dark_url: Option<String>,
    #[serde(default)]
    pub username_hint_text: Option<String>,
}

/// Decoded image payloads awaiting upload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BrandingImages {
    images: Vec<(ImageType, Bytes)>,
}

impl BrandingImages {
    pub fn get(&self, image: ImageType) -> Option<&Bytes> {
        self.images
            .iter()
            .find(|(kind, _)| *kind == image)
            .map(|(_, content)| content)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ImageType, &Bytes)> {
        self.images.iter().map(|(kind, content)| (*kind, content))
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

/// Result of projecting state onto a remote localization.
#[derive(Debug, Default)]
pub struct Populated {
    /// Changed text fields in Graph naming; `null` clears a field.
    pub changes: Map<String, Value>,
    pub images: BrandingImages,
    pub diagnostics: Diagnostics,
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.clone().filter(|text| !text.is_empty())
}

fn image_not_set(image: ImageType) -> Diagnostic {
    Diagnostic::warning(
        format!("{} is not set", image.label()),
        "removing images is currently not supported. please remove it manually",
    )
    .at(image.attribute())
}

fn cdn_url(cdn_list: &[String], relative_url: &Option<String>) -> Option<String> {
    match (cdn_list.first(), relative_url) {
        (Some(cdn), Some(relative)) => Some(format!("https://{cdn}/{relative}")),
        _ => None,
    }
}

impl BrandingLocalizationState {
    fn image_input(&self, image: ImageType) -> &Option<String> {
        match image {
            ImageType::BannerLogo => &self.banner_logo,
            ImageType::BackgroundImage => &self.background_image,
            ImageType::SquareLogo => &self.square_logo_light,
            ImageType::SquareLogoDark => &self.square_logo_dark,
        }
    }

    /// Copies the remote text fields and resolves image urls against the first CDN host.
    pub fn consume(&mut self, localization: &BrandingLocalization) {
        self.background_color = non_empty(&localization.background_color);
        self.sign_in_page_text = non_empty(&localization.sign_in_page_text);
        self.username_hint_text = non_empty(&localization.username_hint_text);

        let cdn = &localization.cdn_list;
        self.banner_logo_url = cdn_url(cdn, &localization.banner_logo_relative_url);
        self.background_image_url = cdn_url(cdn, &localization.background_image_relative_url);
        self.square_logo_light_url = cdn_url(cdn, &localization.square_logo_relative_url);
        self.square_logo_dark_url = cdn_url(cdn, &localization.square_logo_dark_relative_url);
    }

    /// Writes differing text fields into `target` and decodes the image inputs.
    ///
    /// Every image is attempted; decode failures are errors scoped to their
    /// attribute. An unset image produces one warning because the backend offers
    /// no way to remove an uploaded image. An empty image counts as unset.
    pub fn populate(&self, target: &mut BrandingLocalization) -> Populated {
        let mut populated = Populated::default();

        let text_fields = [
            (
                "backgroundColor",
                &mut target.background_color,
                &self.background_color,
            ),
            (
                "signInPageText",
                &mut target.sign_in_page_text,
                &self.sign_in_page_text,
            ),
            (
                "usernameHintText",
                &mut target.username_hint_text,
                &self.username_hint_text,
            ),
        ];
        for (field, remote, desired) in text_fields {
            if remote.as_deref().unwrap_or_default() != desired.as_deref().unwrap_or_default() {
                *remote = desired.clone();
                populated.changes.insert(
                    field.to_string(),
                    desired.clone().map(Value::String).unwrap_or(Value::Null),
                );
            }
        }

        for image in ImageType::ALL {
            let Some(encoded) = self.image_input(image) else {
                populated.diagnostics.push(image_not_set(image));
                continue;
            };
            match Base64Engine.decode(encoded) {
                Ok(content) if content.is_empty() => {
                    populated.diagnostics.push(image_not_set(image))
                }
                Ok(content) => populated.images.images.push((image, Bytes::from(content))),
                Err(err) => populated.diagnostics.push(
                    Diagnostic::error(
                        format!("failed to upload {}", image.label()),
                        err.to_string(),
                    )
                    .at(image.attribute()),
                ),
            }
        }

        populated
    }
}
