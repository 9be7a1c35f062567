//! Application setup and router configuration.

use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::Extension,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        Method,
    },
    routing::{get, post},
    Router,
};
use openai_client::OpenAIClient;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::kernel::{LlmGateway, RetailerEnricher, SearchService};
use crate::server::routes::{
    extract_image_handler, health_handler, image_proxy_handler, judge_handler, search_handler,
};

/// Retailer whose product pages get site-specific enrichment selectors
/// and whose domains the alternatives search is filtered to.
const RETAILER: &str = "amazon";

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<SearchService>,
    pub enricher: Arc<RetailerEnricher>,
}

/// Build the axum application router
pub fn build_app(config: &Config) -> Result<Router> {
    let gateway = config.openai_api_key.as_ref().map(|key| {
        LlmGateway::new(
            Arc::new(OpenAIClient::new(key.clone())),
            config.default_model.clone(),
        )
    });
    if gateway.is_none() {
        tracing::warn!("OPENAI_API_KEY not set; /search and /judge will refuse requests");
    }

    let enricher = Arc::new(RetailerEnricher::new(RETAILER)?);
    let service = Arc::new(SearchService::new(gateway, enricher.clone(), RETAILER));

    let state = AppState { service, enricher };

    // CORS for the browser extension: any origin, GET/POST only
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE]);

    Ok(Router::new()
        .route("/health", get(health_handler))
        .route("/search", post(search_handler))
        .route("/judge", post(judge_handler))
        .route("/extract-image", get(extract_image_handler))
        .route("/image-proxy", get(image_proxy_handler))
        .layer(Extension(state))
        .layer(cors)
        .layer(TraceLayer::new_for_http()))
}
