use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as Base64Engine;
use base64::Engine;
use serde_json::json;
use terraform_provider_azureadb2c::diagnostics::Severity;
use terraform_provider_azureadb2c::graph::testing::{InMemoryGraph, CDN_HOST};
use terraform_provider_azureadb2c::graph::{BrandingLocalization, ImageType};
use terraform_provider_azureadb2c::model::PatchTemplates;
use terraform_provider_azureadb2c::provider::ProviderRegistry;
use terraform_provider_azureadb2c::resources::ResourceHandler;

const BRANDING: &str = "azureadb2c_organizational_branding_localization";
const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

fn registry() -> (Arc<InMemoryGraph>, ProviderRegistry) {
    let graph = Arc::new(InMemoryGraph::default());
    let templates = Arc::new(PatchTemplates::embedded().expect("templates"));
    (graph.clone(), ProviderRegistry::new(graph, templates))
}

fn handler(registry: &ProviderRegistry) -> &dyn ResourceHandler {
    registry.resource(BRANDING).expect("branding handler")
}

#[tokio::test]
async fn create_warns_once_per_unset_image() {
    let (graph, registry) = registry();

    let created = handler(&registry)
        .create(json!({ "id": "de-DE", "background_color": "#FFFFFF" }))
        .await;
    assert!(!created.diagnostics.has_error(), "{:?}", created.diagnostics);
    assert_eq!(created.diagnostics.warnings().count(), 4);
    assert!(created
        .diagnostics
        .warnings()
        .any(|d| d.summary == "square logo (dark) is not set"));

    let state = created.state.expect("state");
    assert_eq!(state["background_color"], "#FFFFFF");
    assert!(state["banner_logo_url"].is_null());
    assert!(graph.localization("de-DE").await.is_some());
}

#[tokio::test]
async fn uploaded_images_get_cdn_urls() {
    let (graph, registry) = registry();

    let created = handler(&registry)
        .create(json!({
            "id": "de-DE",
            "sign_in_page_text": "Willkommen",
            "banner_logo": Base64Engine.encode(PNG),
            "square_logo_dark": Base64Engine.encode(PNG)
        }))
        .await;
    assert_eq!(created.diagnostics.warnings().count(), 2);
    let state = created.state.expect("state");
    assert_eq!(
        state["banner_logo_url"],
        format!("https://{CDN_HOST}/de-DE/bannerLogo.png")
    );
    assert_eq!(
        state["square_logo_dark_url"],
        format!("https://{CDN_HOST}/de-DE/squareLogoDark.png")
    );
    assert_eq!(
        graph.image("de-DE", ImageType::BannerLogo).await.as_deref(),
        Some(PNG)
    );

    let calls = graph.calls().await;
    let created_at = calls
        .iter()
        .position(|call| call == "create_branding_localization de-DE")
        .expect("base record written");
    let uploaded_at = calls
        .iter()
        .position(|call| call == "upload_branding_image de-DE bannerLogo")
        .expect("banner uploaded");
    assert!(created_at < uploaded_at);
    assert_eq!(calls.last().map(String::as_str), Some("get_branding_localization de-DE"));
}

#[tokio::test]
async fn undecodable_image_stops_before_any_write() {
    let (graph, registry) = registry();

    let created = handler(&registry)
        .create(json!({
            "id": "de-DE",
            "background_color": "#000000",
            "banner_logo": "not base64!",
            "background_image": "also not base64!"
        }))
        .await;
    assert!(created.state.is_none());
    let errors: Vec<_> = created.diagnostics.errors().collect();
    assert_eq!(errors.len(), 2);
    assert_eq!(errors[0].summary, "failed to upload banner logo");
    assert_eq!(errors[0].attribute.as_deref(), Some("banner_logo"));
    assert_eq!(errors[1].attribute.as_deref(), Some("background_image"));
    assert!(graph.localization("de-DE").await.is_none());
}

#[tokio::test]
async fn upload_failures_are_collected_and_record_is_kept() {
    let (graph, registry) = registry();
    graph.fail_image_upload(ImageType::BackgroundImage).await;

    let created = handler(&registry)
        .create(json!({
            "id": "0",
            "username_hint_text": "you@contoso.com",
            "banner_logo": Base64Engine.encode(PNG),
            "background_image": Base64Engine.encode(PNG)
        }))
        .await;
    let errors: Vec<_> = created.diagnostics.errors().collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].summary, "failed to upload background image");
    assert_eq!(errors[0].attribute.as_deref(), Some("background_image"));

    let state = created.state.expect("state after partial upload");
    assert!(state["banner_logo_url"].is_string());
    assert!(state["background_image_url"].is_null());
    assert!(graph.localization("0").await.is_some());
}

#[tokio::test]
async fn existing_localization_is_adopted() {
    let (graph, registry) = registry();
    graph
        .insert_localization(BrandingLocalization {
            id: Some("0".into()),
            background_color: Some("#FFFFFF".into()),
            cdn_list: vec![CDN_HOST.into()],
            ..Default::default()
        })
        .await;

    let created = handler(&registry)
        .create(json!({ "id": "0", "background_color": "#123456" }))
        .await;
    assert_eq!(created.state.expect("state")["background_color"], "#123456");
    let calls = graph.calls().await;
    assert!(calls.contains(&"update_branding_localization 0".to_string()));
    assert!(!calls.contains(&"create_branding_localization 0".to_string()));
}

#[tokio::test]
async fn update_writes_only_changed_fields() {
    let (graph, registry) = registry();
    let handler = handler(&registry);
    let created = handler
        .create(json!({ "id": "en-US", "sign_in_page_text": "Hello" }))
        .await;
    let prior = created.state.expect("state");

    let mut planned = prior.clone();
    planned["sign_in_page_text"] = json!("Hello again");
    planned["username_hint_text"] = json!("name@example.com");
    let updated = handler.update(prior, planned).await;
    assert!(!updated.diagnostics.has_error(), "{:?}", updated.diagnostics);

    let state = updated.state.expect("updated state");
    assert_eq!(state["sign_in_page_text"], "Hello again");
    let stored = graph.localization("en-US").await.expect("stored");
    assert_eq!(stored.username_hint_text.as_deref(), Some("name@example.com"));
}

#[tokio::test]
async fn text_limits_and_required_combination_are_validated() {
    let (graph, registry) = registry();
    let handler = handler(&registry);

    let nothing = handler.create(json!({ "id": "fr-FR" })).await;
    assert!(nothing
        .diagnostics
        .errors()
        .any(|d| d.summary == "Invalid Attribute Combination"));

    let too_long = handler
        .create(json!({ "id": "fr-FR", "username_hint_text": "x".repeat(65) }))
        .await;
    assert!(too_long
        .diagnostics
        .errors()
        .any(|d| d.attribute.as_deref() == Some("username_hint_text")));
    assert!(graph.calls().await.is_empty());
}

#[tokio::test]
async fn delete_leaves_localizations_with_banner_logo() {
    let (graph, registry) = registry();
    let handler = handler(&registry);
    let created = handler
        .create(json!({
            "id": "de-DE",
            "background_color": "#FFFFFF",
            "banner_logo": Base64Engine.encode(PNG)
        }))
        .await;

    let deleted = handler.delete(created.state.expect("state")).await;
    let diagnostics: Vec<_> = deleted.diagnostics.iter().collect();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].severity, Severity::Warning);
    assert_eq!(
        diagnostics[0].summary,
        "removing the banner logo is not supported"
    );
    assert!(graph.localization("de-DE").await.is_some());
}

#[tokio::test]
async fn delete_failures_are_downgraded_to_warnings() {
    let (graph, registry) = registry();
    let handler = handler(&registry);
    graph
        .insert_localization(BrandingLocalization {
            id: Some("it-IT".into()),
            background_color: Some("#FFFFFF".into()),
            ..Default::default()
        })
        .await;
    graph.fail_delete("it-IT").await;

    let deleted = handler
        .delete(json!({ "id": "it-IT", "background_color": "#FFFFFF" }))
        .await;
    assert!(!deleted.diagnostics.has_error());
    assert_eq!(
        deleted.diagnostics.warnings().next().map(|d| d.summary.as_str()),
        Some("delete organizational branding failed")
    );

    let already_gone = handler.delete(json!({ "id": "pt-BR" })).await;
    assert!(already_gone.diagnostics.is_empty());
}

#[tokio::test]
async fn read_of_removed_localization_drops_state() {
    let (_, registry) = registry();

    let read = handler(&registry)
        .read(json!({ "id": "nl-NL", "background_color": "#FFFFFF" }))
        .await;
    assert!(read.state.is_none());
    assert!(read.diagnostics.is_empty());
}

#[tokio::test]
async fn empty_image_counts_as_unset() {
    let (graph, registry) = registry();

    let created = handler(&registry)
        .create(json!({
            "id": "de-DE",
            "background_color": "#FFFFFF",
            "banner_logo": ""
        }))
        .await;
    assert!(!created.diagnostics.has_error(), "{:?}", created.diagnostics);
    assert_eq!(created.diagnostics.warnings().count(), 4);
    assert!(created
        .diagnostics
        .warnings()
        .any(|d| d.summary == "banner logo is not set"));
    assert!(!graph
        .calls()
        .await
        .iter()
        .any(|call| call.starts_with("upload_branding_image")));
    assert!(graph.image("de-DE", ImageType::BannerLogo).await.is_none());
}
