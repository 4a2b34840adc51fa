use std::fmt;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::diagnostics::{Diagnostic, Diagnostics};

pub const TENANT_ID_ENV: &str = "B2C_ARM_TENANT_ID";
pub const CLIENT_ID_ENV: &str = "B2C_ARM_CLIENT_ID";
pub const CLIENT_SECRET_ENV: &str = "B2C_ARM_CLIENT_SECRET";

/// Address the provider host surface binds to. Defaults to `127.0.0.1`.
pub static BIND_ADDRESS: Lazy<String> =
    Lazy::new(|| std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "127.0.0.1".to_string()));

/// Port the provider host surface listens on. Defaults to `8787`.
pub static BIND_PORT: Lazy<u16> = Lazy::new(|| {
    std::env::var("BIND_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8787)
});

/// Microsoft Graph root. Overridable for national clouds.
pub static GRAPH_ENDPOINT: Lazy<String> = Lazy::new(|| {
    read_optional_env("B2C_ARM_GRAPH_ENDPOINT")
        .unwrap_or_else(|| "https://graph.microsoft.com".to_string())
});

/// Microsoft identity platform authority host.
pub static LOGIN_ENDPOINT: Lazy<String> = Lazy::new(|| {
    read_optional_env("B2C_ARM_LOGIN_ENDPOINT")
        .unwrap_or_else(|| "https://login.microsoftonline.com".to_string())
});

fn read_optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Provider block as written by the practitioner. Every field may be left out
/// and supplied through the `B2C_ARM_*` environment instead.
#[derive(Clone, Default, Deserialize, Serialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Fully resolved client-credentials triple.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientCredentials {
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
}

impl fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

impl ProviderConfig {
    pub fn resolve(&self) -> Result<ClientCredentials, Diagnostics> {
        self.resolve_with(read_optional_env)
    }

    /// Resolves each field from the explicit value first, then from `lookup`.
    /// All missing fields are reported together.
    pub fn resolve_with(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<ClientCredentials, Diagnostics> {
        let mut diagnostics = Diagnostics::new();
        let mut field = |attribute: &str, explicit: &Option<String>, env_key: &str| {
            let value = explicit
                .as_deref()
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
                .or_else(|| {
                    lookup(env_key)
                        .map(|value| value.trim().to_string())
                        .filter(|value| !value.is_empty())
                });
            if value.is_none() {
                diagnostics.push(
                    Diagnostic::error(
                        format!("missing {attribute}"),
                        format!("must be configured or provided via {env_key} env var"),
                    )
                    .at(attribute),
                );
            }
            value
        };

        let tenant_id = field("tenant_id", &self.tenant_id, TENANT_ID_ENV);
        let client_id = field("client_id", &self.client_id, CLIENT_ID_ENV);
        let client_secret = field("client_secret", &self.client_secret, CLIENT_SECRET_ENV);

        match (tenant_id, client_id, client_secret) {
            (Some(tenant_id), Some(client_id), Some(client_secret)) => Ok(ClientCredentials {
                tenant_id,
                client_id,
                client_secret,
            }),
            _ => Err(diagnostics),
        }
    }
}
