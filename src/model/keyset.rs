use serde::{Deserialize, Serialize};

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::graph::{TrustFrameworkKey, TrustFrameworkKeySet};
use crate::schema::validators::KEY_SET_ID_PREFIX;

/// `B2C_1A_<name>`.
pub fn key_set_id(name: &str) -> String {
    format!("{KEY_SET_ID_PREFIX}{name}")
}

/// Inverse of [`key_set_id`]; ids without the exact prefix have no name.
pub fn key_set_name(id: &str) -> Option<&str> {
    id.strip_prefix(KEY_SET_ID_PREFIX)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyState {
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
    pub x5c: Option<Vec<String>>,
    #[serde(default)]
    pub x5t: Option<String>,
}

impl From<&TrustFrameworkKey> for KeyState {
    fn from(key: &TrustFrameworkKey) -> Self {
        Self {
            kid: key.kid.clone(),
            kty: key.kty.clone(),
            key_use: key.key_use.clone(),
            n: key.n.clone(),
            e: key.e.clone(),
            exp: key.exp,
            nbf: key.nbf,
            x5c: Some(key.x5c.clone()),
            x5t: key.x5t.clone(),
        }
    }
}

/// Nested `key_set` object shared by the key and certificate resources.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeySetState {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub keys: Option<Vec<KeyState>>,
}

impl KeySetState {
    pub fn named(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            ..Default::default()
        }
    }

    pub fn with_id(id: &str) -> Self {
        Self {
            id: Some(id.to_string()),
            ..Default::default()
        }
    }

    pub fn resolved_id(&self) -> Option<String> {
        resolve_id(&self.id, &self.name)
    }

    /// Mirrors a remote key set without constraining its key count.
    pub fn from_remote(key_set: &TrustFrameworkKeySet) -> Self {
        Self {
            id: Some(key_set.id.clone()),
            name: key_set_name(&key_set.id).map(str::to_string),
            keys: Some(key_set.keys.iter().map(KeyState::from).collect()),
        }
    }

    /// Mirrors a key set that backs a single key or certificate. Anything but
    /// exactly one key is an inconsistent remote state.
    pub fn consume_single(&mut self, key_set: &TrustFrameworkKeySet) -> Diagnostics {
        match single_key(key_set) {
            Ok(_) => {
                *self = Self::from_remote(key_set);
                Diagnostics::new()
            }
            Err(diagnostic) => diagnostic.into(),
        }
    }
}

/// Configured id, or the id derived from the configured name.
fn resolve_id(id: &Option<String>, name: &Option<String>) -> Option<String> {
    id.clone().or_else(|| name.as_deref().map(key_set_id))
}

/// The only key of a set that backs a single key or certificate.
pub fn single_key(key_set: &TrustFrameworkKeySet) -> Result<&TrustFrameworkKey, Diagnostic> {
    match key_set.keys.as_slice() {
        [key] => Ok(key),
        keys => Err(Diagnostic::error(
            "unexpected resource state",
            format!("a keyset can only contain one key, got {}", keys.len()),
        )),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeySetMetadata {
    #[serde(default)]
    pub odata_context: Option<String>,
}

/// State of the standalone key set resource.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeySetResourceState {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub metadata: Option<KeySetMetadata>,
}

impl KeySetResourceState {
    pub fn resolved_id(&self) -> Option<String> {
        resolve_id(&self.id, &self.name)
    }

    pub fn consume(&mut self, key_set: &TrustFrameworkKeySet) {
        self.id = Some(key_set.id.clone());
        if let Some(name) = key_set_name(&key_set.id) {
            self.name = Some(name.to_string());
        }
        // Graph only returns the context on direct entity reads.
        if key_set.odata_context.is_some() || self.metadata.is_none() {
            self.metadata = Some(KeySetMetadata {
                odata_context: key_set.odata_context.clone(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_state_derives_id_and_name() {
        let mut state = KeySetResourceState {
            name: Some("TestContainer".into()),
            ..Default::default()
        };
        assert_eq!(state.resolved_id().as_deref(), Some("B2C_1A_TestContainer"));

        state.consume(&TrustFrameworkKeySet {
            id: "B2C_1A_TestContainer".into(),
            keys: Vec::new(),
            odata_context: Some("ctx".into()),
        });
        assert_eq!(state.id.as_deref(), Some("B2C_1A_TestContainer"));
        assert_eq!(state.name.as_deref(), Some("TestContainer"));
        assert_eq!(
            state.metadata.and_then(|m| m.odata_context).as_deref(),
            Some("ctx")
        );
    }

    fn remote(id: &str, keys: usize) -> TrustFrameworkKeySet {
        TrustFrameworkKeySet {
            id: id.to_string(),
            keys: (0..keys)
                .map(|index| TrustFrameworkKey {
                    kid: Some(format!("kid-{index}")),
                    ..Default::default()
                })
                .collect(),
            odata_context: None,
        }
    }

    #[test]
    fn prefix_round_trip() {
        assert_eq!(key_set_id("TestContainer"), "B2C_1A_TestContainer");
        assert_eq!(key_set_name("B2C_1A_TestContainer"), Some("TestContainer"));
        assert_eq!(key_set_name(&key_set_id("Signing")), Some("Signing"));
    }

    #[test]
    fn prefix_strip_is_exact() {
        assert_eq!(key_set_name("b2c_1a_Lower"), None);
        assert_eq!(key_set_name("X_B2C_1A_Foo"), None);
        assert_eq!(key_set_name("B2C_1A_B2C_1A_Foo"), Some("B2C_1A_Foo"));
    }

    #[test]
    fn resolved_id_prefers_explicit_id() {
        assert_eq!(
            KeySetState::named("Foo").resolved_id().as_deref(),
            Some("B2C_1A_Foo")
        );
        let both = KeySetState {
            id: Some("B2C_1A_Bar".into()),
            name: Some("Foo".into()),
            keys: None,
        };
        assert_eq!(both.resolved_id().as_deref(), Some("B2C_1A_Bar"));
        assert_eq!(KeySetState::default().resolved_id(), None);
    }

    #[test]
    fn consume_single_requires_exactly_one_key() {
        let mut state = KeySetState::named("Foo");
        let diagnostics = state.consume_single(&remote("B2C_1A_Foo", 2));
        assert!(diagnostics.has_error());
        assert!(diagnostics.iter().next().unwrap().detail.contains("got 2"));
        assert_eq!(state, KeySetState::named("Foo"));

        let diagnostics = state.consume_single(&remote("B2C_1A_Foo", 0));
        assert!(diagnostics.iter().next().unwrap().detail.contains("got 0"));

        let diagnostics = state.consume_single(&remote("B2C_1A_Foo", 1));
        assert!(!diagnostics.has_error());
        assert_eq!(state.id.as_deref(), Some("B2C_1A_Foo"));
        assert_eq!(state.name.as_deref(), Some("Foo"));
        assert_eq!(state.keys.unwrap()[0].kid.as_deref(), Some("kid-0"));
    }
}
