use std::sync::Arc;

use bytes::Bytes;
use httpmock::prelude::*;
use httpmock::Method::PATCH;
use serde_json::{json, Map};
use terraform_provider_azureadb2c::credentials::testing::StaticToken;
use terraform_provider_azureadb2c::graph::{
    BrandingLocalization, GenerateKeyRequest, GraphApi, GraphError, HttpGraphClient, ImageType,
};

const TENANT: &str = "contoso.onmicrosoft.com";

fn client(server: &MockServer) -> HttpGraphClient {
    HttpGraphClient::new(
        &server.base_url(),
        TENANT,
        Arc::new(StaticToken("test-token".into())),
    )
    .expect("graph client")
}

#[tokio::test]
async fn reads_key_set_with_bearer_token() {
    let server = MockServer::start_async().await;
    let get = server.mock(|when, then| {
        when.method(GET)
            .path("/beta/trustFramework/keySets/B2C_1A_Signing")
            .header("authorization", "Bearer test-token")
            .header_exists("client-request-id");
        then.status(200).json_body(json!({
            "@odata.context": "https://graph.microsoft.com/beta/$metadata#trustFramework/keySets/$entity",
            "id": "B2C_1A_Signing",
            "keys": [{ "kid": "kid-1", "use": "sig", "kty": "RSA", "e": "AQAB", "x5c": [] }]
        }));
    });

    let key_set = client(&server)
        .get_key_set("B2C_1A_Signing")
        .await
        .expect("key set");

    get.assert();
    assert_eq!(key_set.id, "B2C_1A_Signing");
    assert_eq!(key_set.keys.len(), 1);
    assert_eq!(key_set.keys[0].key_use.as_deref(), Some("sig"));
    assert!(key_set.odata_context.is_some());
}

#[tokio::test]
async fn maps_missing_objects_to_not_found() {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(GET)
            .path("/beta/trustFramework/keySets/B2C_1A_Missing");
        then.status(404).json_body(json!({
            "error": { "code": "AADB2C", "message": "The key set was not found." }
        }));
    });

    let err = client(&server)
        .get_key_set("B2C_1A_Missing")
        .await
        .expect_err("missing key set");
    assert!(err.is_not_found());
}

#[tokio::test]
async fn decodes_odata_errors() {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(POST).path("/beta/trustFramework/keySets");
        then.status(409).json_body(json!({
            "error": { "code": "AADB2C95028", "message": "A key set with id B2C_1A_Dup already exists." }
        }));
    });

    let err = client(&server)
        .create_key_set("B2C_1A_Dup")
        .await
        .expect_err("conflict");
    match err {
        GraphError::Api {
            status,
            code,
            message,
        } => {
            assert_eq!(status, 409);
            assert_eq!(code, "AADB2C95028");
            assert!(message.contains("already exists"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn generates_keys_and_deletes_backups() {
    let server = MockServer::start_async().await;
    let generate = server.mock(|when, then| {
        when.method(POST)
            .path("/beta/trustFramework/keySets/B2C_1A_Signing/generateKey")
            .json_body(json!({ "use": "sig", "kty": "RSA" }));
        then.status(200)
            .json_body(json!({ "kid": "generated", "use": "sig", "kty": "RSA" }));
    });
    let delete_backup = server.mock(|when, then| {
        when.method(DELETE)
            .path("/beta/trustFramework/keySets/B2C_1A_Signing.bak");
        then.status(204);
    });

    let graph = client(&server);
    let key = graph
        .generate_key(
            "B2C_1A_Signing",
            &GenerateKeyRequest {
                key_use: "sig".into(),
                kty: "RSA".into(),
            },
        )
        .await
        .expect("generated key");
    assert_eq!(key.kid.as_deref(), Some("generated"));

    graph
        .delete_key_set("B2C_1A_Signing.bak")
        .await
        .expect("backup deleted");
    generate.assert();
    delete_backup.assert();
}

#[tokio::test]
async fn patches_applications() {
    let server = MockServer::start_async().await;
    let patch = server.mock(|when, then| {
        when.method(PATCH)
            .path("/beta/applications/11111111-2222-3333-4444-555555555555")
            .json_body(json!({ "samlMetadataUrl": "https://metadata.example.com" }));
        then.status(204);
    });

    let mut body = Map::new();
    body.insert(
        "samlMetadataUrl".into(),
        json!("https://metadata.example.com"),
    );
    client(&server)
        .patch_application("11111111-2222-3333-4444-555555555555", &body)
        .await
        .expect("patched");
    patch.assert();
}

#[tokio::test]
async fn branding_calls_are_scoped_to_the_tenant() {
    let server = MockServer::start_async().await;
    let create = server.mock(|when, then| {
        when.method(POST)
            .path(format!("/beta/organization/{TENANT}/branding/localizations"))
            .json_body(json!({ "id": "de-DE", "backgroundColor": "#FFFFFF" }));
        then.status(201).json_body(json!({
            "id": "de-DE",
            "backgroundColor": "#FFFFFF",
            "cdnList": ["cdn.example.net"]
        }));
    });
    let upload = server.mock(|when, then| {
        when.method(PUT)
            .path(format!(
                "/beta/organization/{TENANT}/branding/localizations/de-DE/bannerLogo"
            ))
            .header("content-type", "image/png");
        then.status(204);
    });

    let graph = client(&server);
    let created = graph
        .create_branding_localization(&BrandingLocalization {
            id: Some("de-DE".into()),
            background_color: Some("#FFFFFF".into()),
            ..Default::default()
        })
        .await
        .expect("created");
    assert_eq!(created.cdn_list, vec!["cdn.example.net".to_string()]);

    graph
        .upload_branding_image(
            "de-DE",
            ImageType::BannerLogo,
            Bytes::from_static(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A]),
        )
        .await
        .expect("uploaded");
    create.assert();
    upload.assert();
}
