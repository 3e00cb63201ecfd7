//! CSV Storefront - catalog, discount code and checkout API over flat files

use std::sync::Arc;

use anyhow::Result;
use axum::http::HeaderValue;
use csv_storefront::{api, config::Config, payments::StripeCheckout};
use tower::ServiceBuilder;
use tower_http::{cors::{Any, CorsLayer}, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())).with(tracing_subscriber::fmt::layer()).init();

    let config = Config::from_env()?;
    let state = api::AppState::new(&config, Arc::new(StripeCheckout::new(&config)));
    match state.discounts.initialize() {
        Ok(true) => {}
        Ok(false) => tracing::info!(path = %config.discount_csv.display(), "discount codes loaded"),
        Err(e) => tracing::error!(error = %e, "could not initialize discount codes"),
    }

    let cors = CorsLayer::new()
        .allow_origin(config.client_url.parse::<HeaderValue>()?)
        .allow_methods(Any)
        .allow_headers(Any);
    let app = api::router(state).layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(cors));

    tracing::info!("🚀 CSV Storefront listening on 0.0.0.0:{}", config.port);
    axum::serve(tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?, app).await?;
    Ok(())
}
