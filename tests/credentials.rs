use std::panic::{catch_unwind, resume_unwind, AssertUnwindSafe};
use std::sync::Mutex;

use httpmock::prelude::*;
use once_cell::sync::Lazy;
use serde_json::json;
use terraform_provider_azureadb2c::config::{
    ClientCredentials, ProviderConfig, CLIENT_ID_ENV, CLIENT_SECRET_ENV, TENANT_ID_ENV,
};
use terraform_provider_azureadb2c::credentials::{
    ClientSecretCredential, CredentialError, TokenCredential,
};

static ENV_GUARD: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

fn with_env<T>(vars: &[(&str, Option<&str>)], f: impl FnOnce() -> T) -> T {
    let guard = ENV_GUARD.lock().expect("env guard poisoned");
    let mut previous = Vec::with_capacity(vars.len());
    for (key, value) in vars {
        previous.push(((*key).to_string(), std::env::var(key).ok()));
        match value {
            Some(val) => std::env::set_var(key, val),
            None => std::env::remove_var(key),
        }
    }

    let result = catch_unwind(AssertUnwindSafe(f));

    for (key, old) in previous.into_iter() {
        if let Some(val) = old {
            std::env::set_var(&key, val);
        } else {
            std::env::remove_var(&key);
        }
    }

    drop(guard);

    match result {
        Ok(value) => value,
        Err(panic) => resume_unwind(panic),
    }
}

fn credentials() -> ClientCredentials {
    ClientCredentials {
        tenant_id: "contoso.onmicrosoft.com".into(),
        client_id: "client-id".into(),
        client_secret: "client-secret".into(),
    }
}

#[tokio::test]
async fn token_is_requested_once_and_cached() {
    let server = MockServer::start_async().await;
    let token = server.mock(|when, then| {
        when.method(POST)
            .path("/contoso.onmicrosoft.com/oauth2/v2.0/token")
            .body_contains("grant_type=client_credentials")
            .body_contains("client_id=client-id");
        then.status(200).json_body(json!({
            "token_type": "Bearer",
            "expires_in": 3599,
            "access_token": "eyJ0eXAi"
        }));
    });

    let credential =
        ClientSecretCredential::new(&credentials(), &server.base_url(), "https://graph.example")
            .expect("credential");
    assert_eq!(credential.token().await.expect("first token"), "eyJ0eXAi");
    assert_eq!(credential.token().await.expect("cached token"), "eyJ0eXAi");
    token.assert_hits(1);
}

#[tokio::test]
async fn short_lived_tokens_are_refreshed() {
    let server = MockServer::start_async().await;
    let token = server.mock(|when, then| {
        when.method(POST)
            .path("/contoso.onmicrosoft.com/oauth2/v2.0/token");
        then.status(200).json_body(json!({
            "expires_in": 60,
            "access_token": "short"
        }));
    });

    let credential =
        ClientSecretCredential::new(&credentials(), &server.base_url(), "https://graph.example")
            .expect("credential");
    credential.token().await.expect("first token");
    credential.token().await.expect("second token");
    token.assert_hits(2);
}

#[tokio::test]
async fn rejected_token_requests_surface_the_body() {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(POST)
            .path("/contoso.onmicrosoft.com/oauth2/v2.0/token");
        then.status(401)
            .body(r#"{"error":"invalid_client","error_description":"AADSTS7000215"}"#);
    });

    let credential =
        ClientSecretCredential::new(&credentials(), &server.base_url(), "https://graph.example")
            .expect("credential");
    match credential.token().await {
        Err(CredentialError::Rejected { status, body }) => {
            assert_eq!(status, 401);
            assert!(body.contains("invalid_client"));
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn environment_fills_unset_fields() {
    let resolved = with_env(
        &[
            (TENANT_ID_ENV, Some("env-tenant")),
            (CLIENT_ID_ENV, Some("env-client")),
            (CLIENT_SECRET_ENV, Some("env-secret")),
        ],
        || {
            ProviderConfig {
                client_id: Some("explicit-client".into()),
                ..Default::default()
            }
            .resolve()
        },
    )
    .expect("resolved");
    assert_eq!(resolved.tenant_id, "env-tenant");
    assert_eq!(resolved.client_id, "explicit-client");
    assert_eq!(resolved.client_secret, "env-secret");
}

#[test]
fn every_missing_field_is_reported() {
    let diagnostics = with_env(
        &[
            (TENANT_ID_ENV, None),
            (CLIENT_ID_ENV, Some("  ")),
            (CLIENT_SECRET_ENV, None),
        ],
        || ProviderConfig::default().resolve(),
    )
    .expect_err("nothing configured");
    let summaries: Vec<_> = diagnostics.errors().map(|d| d.summary.as_str()).collect();
    assert_eq!(
        summaries,
        vec!["missing tenant_id", "missing client_id", "missing client_secret"]
    );
    assert!(diagnostics
        .errors()
        .any(|d| d.detail == "must be configured or provided via B2C_ARM_CLIENT_SECRET env var"));
}
