use serde::{Deserialize, Serialize};

use super::keyset::{single_key, KeySetState};
use crate::diagnostics::Diagnostics;
use crate::graph::{GenerateKeyRequest, TrustFrameworkKeySet, UploadSecretRequest};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeySetKeyState {
    #[serde(default)]
    pub key_set: Option<KeySetState>,
    #[serde(rename = "use", default)]
    pub key_use: Option<String>,
    #[serde(rename = "type", default)]
    pub key_type: Option<String>,
    #[serde(default)]
    pub secret: Option<String>,
}

/// How the single key of a new key set is produced.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyRequest {
    Generate(GenerateKeyRequest),
    UploadSecret(UploadSecretRequest),
}

impl KeySetKeyState {
    pub fn key_set_id(&self) -> Option<String> {
        self.key_set.as_ref().and_then(KeySetState::resolved_id)
    }

    /// A configured secret is uploaded as-is; otherwise the service generates the key.
    pub fn key_request(&self) -> KeyRequest {
        let key_use = self.key_use.clone().unwrap_or_default();
        match &self.secret {
            Some(secret) => KeyRequest::UploadSecret(UploadSecretRequest {
                key_use,
                k: secret.clone(),
            }),
            None => KeyRequest::Generate(GenerateKeyRequest {
                key_use,
                kty: self.key_type.clone().unwrap_or_default(),
            }),
        }
    }

    pub fn consume(&mut self, key_set: &TrustFrameworkKeySet) -> Diagnostics {
        let mut nested = self.key_set.clone().unwrap_or_default();
        let diagnostics = nested.consume_single(key_set);
        if diagnostics.has_error() {
            return diagnostics;
        }
        self.key_set = Some(nested);

        // consume_single guarantees exactly one key.
        let key = &key_set.keys[0];
        if let Some(key_use) = &key.key_use {
            self.key_use = Some(key_use.to_lowercase());
        }
        if let Some(kty) = &key.kty {
            self.key_type = Some(kty.to_uppercase());
        }
        diagnostics
    }
}

/// Public part of a key as exposed by the key data source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyData {
    #[serde(default)]
    pub kid: Option<String>,
    #[serde(rename = "use", default)]
    pub key_use: Option<String>,
    #[serde(default)]
    pub kty: Option<String>,
    #[serde(default)]
    pub n: Option<String>,
    #[serde(default)]
    pub e: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeySetKeyDataState {
    #[serde(default)]
    pub keyset_id: Option<String>,
    #[serde(default)]
    pub data: Option<KeyData>,
}

impl KeySetKeyDataState {
    pub fn consume(&mut self, key_set: &TrustFrameworkKeySet) -> Diagnostics {
        match single_key(key_set) {
            Ok(key) => {
                self.data = Some(KeyData {
                    kid: key.kid.clone(),
                    key_use: key.key_use.clone(),
                    kty: key.kty.clone(),
                    n: key.n.clone(),
                    e: key.e.clone(),
                });
                Diagnostics::new()
            }
            Err(diagnostic) => diagnostic.into(),
        }
    }
}
