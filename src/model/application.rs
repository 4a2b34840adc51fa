use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::diagnostics::Diagnostic;
use crate::graph::Application;

const SAML_METADATA_URL: &str = "samlMetadataUrl";

#[derive(Debug, Error)]
pub enum PatchError {
    #[error("expected absolute path, got: {0}")]
    NotAbsolute(String),
    #[error("cannot read patch file: {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("{0}")]
    Parse(#[from] serde_json::Error),
    #[error("patch must be a json object")]
    NotAnObject,
}

impl PatchError {
    pub fn summary(&self) -> &'static str {
        match self {
            PatchError::NotAbsolute(_) => "path must be absolute",
            PatchError::Read { .. } => "failed to read",
            PatchError::Parse(_) | PatchError::NotAnObject => "failed to parse json",
        }
    }

    pub fn to_diagnostic(&self, attribute: &str) -> Diagnostic {
        Diagnostic::error(self.summary(), self.to_string()).at(attribute)
    }
}

fn parse_object(source: &str) -> Result<Map<String, Value>, PatchError> {
    match serde_json::from_str::<Value>(source)? {
        Value::Object(fields) => Ok(fields),
        _ => Err(PatchError::NotAnObject),
    }
}

/// Fixed patch documents shipped with the provider, parsed once at startup.
#[derive(Debug, Clone)]
pub struct PatchTemplates {
    trustframework: Map<String, Value>,
    saml: Map<String, Value>,
}

impl PatchTemplates {
    pub fn embedded() -> Result<Self, PatchError> {
        Self::parse(
            include_str!("../../patches/trustframework_application.json"),
            include_str!("../../patches/saml_application.json"),
        )
    }

    pub fn parse(trustframework: &str, saml: &str) -> Result<Self, PatchError> {
        Ok(Self {
            trustframework: parse_object(trustframework)?,
            saml: parse_object(saml)?,
        })
    }

    pub fn trustframework(&self) -> &Map<String, Value> {
        &self.trustframework
    }

    pub fn saml(&self) -> &Map<String, Value> {
        &self.saml
    }
}

/// Reads a practitioner supplied patch document. The file is read on every
/// call so edits are picked up by the next plan.
pub fn read_patch_file(path: &str) -> Result<Map<String, Value>, PatchError> {
    if path.is_empty() || !Path::new(path).is_absolute() {
        return Err(PatchError::NotAbsolute(path.to_string()));
    }
    let source = std::fs::read_to_string(path).map_err(|source| PatchError::Read {
        path: path.to_string(),
        source,
    })?;
    parse_object(&source)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplicationData {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub app_id: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub saml_metadata_url: Option<String>,
    #[serde(default)]
    pub identifier_uris: Option<Vec<String>>,
}

impl From<&Application> for ApplicationData {
    fn from(application: &Application) -> Self {
        Self {
            id: application.id.clone(),
            app_id: application.app_id.clone(),
            display_name: application.display_name.clone(),
            saml_metadata_url: application.saml_metadata_url.clone(),
            identifier_uris: Some(application.identifier_uris.clone()),
        }
    }
}

/// Patch read from a file on disk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplicationPatchState {
    #[serde(default)]
    pub object_id: Option<String>,
    #[serde(default)]
    pub patch_file: Option<String>,
    #[serde(default)]
    pub saml_metadata_url: Option<String>,
    #[serde(default)]
    pub data: Option<ApplicationData>,
}

impl ApplicationPatchState {
    /// File content with `samlMetadataUrl` always overridden by the configured
    /// value, or an explicit null when unset.
    pub fn get_patch(&self) -> Result<Map<String, Value>, PatchError> {
        let mut patch = read_patch_file(self.patch_file.as_deref().unwrap_or_default())?;
        let saml_metadata_url = self
            .saml_metadata_url
            .clone()
            .map(Value::String)
            .unwrap_or(Value::Null);
        patch.insert(SAML_METADATA_URL.to_string(), saml_metadata_url);
        Ok(patch)
    }

    pub fn consume(&mut self, application: &Application) {
        self.data = Some(ApplicationData::from(application));
    }
}

/// Applies the fixed trust framework template.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrustframeworkApplicationPatchState {
    #[serde(default)]
    pub object_id: Option<String>,
    #[serde(default)]
    pub data: Option<ApplicationData>,
}

impl TrustframeworkApplicationPatchState {
    pub fn get_patch(&self, templates: &PatchTemplates) -> Map<String, Value> {
        templates.trustframework().clone()
    }

    pub fn consume(&mut self, application: &Application) {
        self.data = Some(ApplicationData::from(application));
    }
}

/// Applies the fixed SAML template plus the configured metadata url.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SamlApplicationPatchState {
    #[serde(default)]
    pub object_id: Option<String>,
    #[serde(default)]
    pub saml_metadata_url: Option<String>,
    #[serde(default)]
    pub data: Option<ApplicationData>,
}

impl SamlApplicationPatchState {
    pub fn get_patch(&self, templates: &PatchTemplates) -> Map<String, Value> {
        let mut patch = templates.saml().clone();
        patch.insert(
            SAML_METADATA_URL.to_string(),
            self.saml_metadata_url
                .clone()
                .map(Value::String)
                .unwrap_or(Value::Null),
        );
        patch
    }

    pub fn consume(&mut self, application: &Application) {
        self.data = Some(ApplicationData::from(application));
    }
}
