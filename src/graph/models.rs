use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrustFrameworkKeySet {
    pub id: String,
    #[serde(default)]
    pub keys: Vec<TrustFrameworkKey>,
    #[serde(rename = "@odata.context", default, skip_serializing)]
    pub odata_context: Option<String>,
}

/// JSON Web Key as returned by the trust framework endpoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrustFrameworkKey {
    #[serde(default)]
    pub kid: Option<String>,
    #[serde(default)]
    pub kty: Option<String>,
    #[serde(rename = "use", default)]
    pub key_use: Option<String>,
    #[serde(default)]
    pub n: Option<String>,
    #[serde(default)]
    pub e: Option<String>,
    #[serde(default)]
    pub exp: Option<i64>,
    #[serde(default)]
    pub nbf: Option<i64>,
    #[serde(default)]
    pub x5c: Vec<String>,
    #[serde(default)]
    pub x5t: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerateKeyRequest {
    #[serde(rename = "use")]
    pub key_use: String,
    pub kty: String,
}

#[derive(Clone, PartialEq, Serialize)]
pub struct UploadSecretRequest {
    #[serde(rename = "use")]
    pub key_use: String,
    pub k: String,
}

impl std::fmt::Debug for UploadSecretRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadSecretRequest")
            .field("key_use", &self.key_use)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, PartialEq, Serialize)]
pub struct UploadPkcs12Request {
    pub key: String,
    pub password: String,
}

impl std::fmt::Debug for UploadPkcs12Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadPkcs12Request").finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub app_id: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub saml_metadata_url: Option<String>,
    #[serde(default)]
    pub identifier_uris: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrandingLocalization {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sign_in_page_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username_hint_text: Option<String>,
    #[serde(default, skip_serializing)]
    pub cdn_list: Vec<String>,
    #[serde(default, skip_serializing)]
    pub banner_logo_relative_url: Option<String>,
    #[serde(default, skip_serializing)]
    pub background_image_relative_url: Option<String>,
    #[serde(default, skip_serializing)]
    pub square_logo_relative_url: Option<String>,
    #[serde(default, skip_serializing)]
    pub square_logo_dark_relative_url: Option<String>,
}

/// Image slots of a branding localization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageType {
    BannerLogo,
    BackgroundImage,
    SquareLogo,
    SquareLogoDark,
}

impl ImageType {
    pub const ALL: [ImageType; 4] = [
        ImageType::BannerLogo,
        ImageType::BackgroundImage,
        ImageType::SquareLogo,
        ImageType::SquareLogoDark,
    ];

    /// Path segment used by the branding image endpoints.
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageType::BannerLogo => "bannerLogo",
            ImageType::BackgroundImage => "backgroundImage",
            ImageType::SquareLogo => "squareLogo",
            ImageType::SquareLogoDark => "squareLogoDark",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ImageType::BannerLogo => "banner logo",
            ImageType::BackgroundImage => "background image",
            ImageType::SquareLogo => "square logo (light)",
            ImageType::SquareLogoDark => "square logo (dark)",
        }
    }

    /// State attribute carrying the base64 input.
    pub fn attribute(&self) -> &'static str {
        match self {
            ImageType::BannerLogo => "banner_logo",
            ImageType::BackgroundImage => "background_image",
            ImageType::SquareLogo => "square_logo_light",
            ImageType::SquareLogoDark => "square_logo_dark",
        }
    }
}

/// Best effort content type for an uploaded image.
pub fn sniff_image_content_type(content: &[u8]) -> &'static str {
    if content.starts_with(&[0x89, b'P', b'N', b'G']) {
        "image/png"
    } else if content.starts_with(&[0xFF, 0xD8, 0xFF]) {
        "image/jpeg"
    } else if content.starts_with(b"GIF8") {
        "image/gif"
    } else {
        "application/octet-stream"
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ODataErrorResponse {
    pub error: ODataError,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ODataError {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}
