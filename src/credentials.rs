//! Client-credentials token acquisition for Microsoft Graph.

use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::config::ClientCredentials;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("invalid azure ad b2c client credentials: {0}")]
    Invalid(String),
    #[error("token request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("token endpoint rejected the request with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Source of bearer tokens for Graph requests.
#[async_trait]
pub trait TokenCredential: Send + Sync {
    async fn token(&self) -> Result<String, CredentialError>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_expired(&self, grace_period: Duration) -> bool {
        Utc::now() + grace_period >= self.expires_at
    }
}

pub struct ClientSecretCredential {
    client: reqwest::Client,
    token_url: String,
    scope: String,
    client_id: String,
    client_secret: String,
    cached: RwLock<Option<CachedToken>>,
    grace_period: Duration,
}

impl ClientSecretCredential {
    pub fn new(
        credentials: &ClientCredentials,
        login_endpoint: &str,
        graph_endpoint: &str,
    ) -> Result<Self, CredentialError> {
        validate_tenant_id(&credentials.tenant_id)?;
        let client = reqwest::Client::builder()
            .timeout(StdDuration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            token_url: format!(
                "{}/{}/oauth2/v2.0/token",
                login_endpoint.trim_end_matches('/'),
                credentials.tenant_id
            ),
            scope: format!("{}/.default", graph_endpoint.trim_end_matches('/')),
            client_id: credentials.client_id.clone(),
            client_secret: credentials.client_secret.clone(),
            cached: RwLock::new(None),
            grace_period: Duration::minutes(5),
        })
    }

    async fn acquire(&self) -> Result<CachedToken, CredentialError> {
        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("scope", self.scope.as_str()),
        ];
        let response = self.client.post(&self.token_url).form(&params).send().await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(CredentialError::Rejected { status, body });
        }
        let parsed: TokenResponse = response.json().await?;
        let expires_at = Utc::now() + Duration::seconds(parsed.expires_in);
        tracing::debug!(%expires_at, "acquired graph access token");
        Ok(CachedToken {
            access_token: parsed.access_token,
            expires_at,
        })
    }
}

#[async_trait]
impl TokenCredential for ClientSecretCredential {
    async fn token(&self) -> Result<String, CredentialError> {
        {
            let cached = self.cached.read().await;
            if let Some(token) = cached.as_ref() {
                if !token.is_expired(self.grace_period) {
                    return Ok(token.access_token.clone());
                }
            }
        }

        let fresh = self.acquire().await?;
        let access_token = fresh.access_token.clone();
        *self.cached.write().await = Some(fresh);
        Ok(access_token)
    }
}

// Tenant ids are GUIDs or domain names.
fn validate_tenant_id(tenant_id: &str) -> Result<(), CredentialError> {
    let valid = !tenant_id.is_empty()
        && tenant_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.');
    if valid {
        Ok(())
    } else {
        Err(CredentialError::Invalid(format!(
            "tenant id {tenant_id:?} contains invalid characters"
        )))
    }
}

pub mod testing {
    use super::*;

    /// Hands out a fixed token.
    pub struct StaticToken(pub String);

    #[async_trait]
    impl TokenCredential for StaticToken {
        async fn token(&self) -> Result<String, CredentialError> {
            Ok(self.0.clone())
        }
    }
}
