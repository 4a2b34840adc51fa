use serde::{Deserialize, Serialize};

use super::keyset::{single_key, KeySetState};
use crate::diagnostics::Diagnostics;
use crate::graph::{TrustFrameworkKeySet, UploadPkcs12Request};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeySetCertificateState {
    #[serde(default)]
    pub key_set: Option<KeySetState>,
    /// Base64 encoded PKCS12 archive. Write-only.
    #[serde(default)]
    pub certificate: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl KeySetCertificateState {
    pub fn key_set_id(&self) -> Option<String> {
        self.key_set.as_ref().and_then(KeySetState::resolved_id)
    }

    pub fn upload_request(&self) -> UploadPkcs12Request {
        UploadPkcs12Request {
            key: self.certificate.clone().unwrap_or_default(),
            password: self.password.clone().unwrap_or_default(),
        }
    }

    /// Only the key set mirror is refreshed; certificate and password are kept.
    pub fn consume(&mut self, key_set: &TrustFrameworkKeySet) -> Diagnostics {
        let mut nested = self.key_set.clone().unwrap_or_default();
        let diagnostics = nested.consume_single(key_set);
        if !diagnostics.has_error() {
            self.key_set = Some(nested);
        }
        diagnostics
    }
}

/// Certificate details as exposed by the certificate data source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CertificateData {
    #[serde(default)]
    pub kid: Option<String>,
    #[serde(default)]
    pub exp: Option<i64>,
    #[serde(default)]
    pub e: Option<String>,
    #[serde(default)]
    pub x5c: Option<Vec<String>>,
    #[serde(default)]
    pub kty: Option<String>,
    #[serde(default)]
    pub n: Option<String>,
    #[serde(default)]
    pub x5t: Option<String>,
    #[serde(default)]
    pub nbf: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeySetCertificateDataState {
    #[serde(default)]
    pub keyset_id: Option<String>,
    #[serde(default)]
    pub data: Option<CertificateData>,
}

impl KeySetCertificateDataState {
    pub fn consume(&mut self, key_set: &TrustFrameworkKeySet) -> Diagnostics {
        match single_key(key_set) {
            Ok(key) => {
                self.data = Some(CertificateData {
                    kid: key.kid.clone(),
                    exp: key.exp,
                    e: key.e.clone(),
                    x5c: Some(key.x5c.clone()),
                    kty: key.kty.clone(),
                    n: key.n.clone(),
                    x5t: key.x5t.clone(),
                    nbf: key.nbf,
                });
                Diagnostics::new()
            }
            Err(diagnostic) => diagnostic.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::TrustFrameworkKey;

    fn key_set(keys: usize) -> TrustFrameworkKeySet {
        TrustFrameworkKeySet {
            id: "B2C_1A_Cert".into(),
            keys: (0..keys)
                .map(|_| TrustFrameworkKey {
                    kid: Some("thumb".into()),
                    x5c: vec!["MIIC".into()],
                    exp: Some(1_900_000_000),
                    ..Default::default()
                })
                .collect(),
            odata_context: None,
        }
    }

    #[test]
    fn consume_keeps_write_only_inputs() {
        let mut state = KeySetCertificateState {
            key_set: Some(KeySetState::named("Cert")),
            certificate: Some("cGtjcw==".into()),
            password: Some("pw".into()),
        };
        assert!(!state.consume(&key_set(1)).has_error());
        assert_eq!(state.certificate.as_deref(), Some("cGtjcw=="));
        assert_eq!(state.password.as_deref(), Some("pw"));
        assert_eq!(state.key_set_id().as_deref(), Some("B2C_1A_Cert"));
    }

    #[test]
    fn data_state_requires_one_key() {
        let mut state = KeySetCertificateDataState::default();
        let diagnostics = state.consume(&key_set(3));
        assert!(diagnostics.iter().any(|d| d.detail.contains("got 3")));

        assert!(!state.consume(&key_set(1)).has_error());
        let data = state.data.unwrap();
        assert_eq!(data.x5c, Some(vec!["MIIC".to_string()]));
        assert_eq!(data.exp, Some(1_900_000_000));
    }
}
