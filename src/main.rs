use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{routing::get, Extension, Router};
use axum_prometheus::PrometheusMetricLayer;
use tracing_subscriber::{fmt, EnvFilter};

use terraform_provider_azureadb2c::config;
use terraform_provider_azureadb2c::model::PatchTemplates;
use terraform_provider_azureadb2c::provider::ProviderServer;
use terraform_provider_azureadb2c::routes::{provider_routes, root};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    dotenvy::dotenv().ok();

    let templates = PatchTemplates::embedded().context("embedded patch templates are invalid")?;
    let server = Arc::new(ProviderServer::new(Arc::new(templates)));

    let (prometheus_layer, metrics_handle) = PrometheusMetricLayer::pair();
    let app = Router::new()
        .route("/", get(root))
        .route(
            "/metrics",
            get(move || async move { metrics_handle.render() }),
        )
        .merge(provider_routes())
        .layer(prometheus_layer)
        .layer(Extension(server));

    let addr: SocketAddr = format!("{}:{}", config::BIND_ADDRESS.as_str(), *config::BIND_PORT)
        .parse()
        .context("invalid BIND_ADDRESS or BIND_PORT")?;
    tracing::info!(%addr, "Listening for incoming connections");
    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await
        .context("provider server failed")?;

    Ok(())
}
