//! Image helpers for the extension UI: preview extraction and a caching
//! proxy for retailer CDNs that refuse cross-origin embedding.

use axum::extract::{Extension, Query};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::kernel::retail::Enricher;
use crate::server::app::AppState;
use crate::server::error::{ApiError, ErrorBody};

/// Cache lifetime advertised on proxied images.
const PROXY_CACHE_CONTROL: &str = "public, max-age=86400";

#[derive(Debug, Deserialize)]
pub struct ImageQuery {
    pub url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ExtractImageResponse {
    pub image: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_data_url: Option<String>,
}

/// GET /extract-image?url= — find a preview image for a product page.
///
/// The image URL is empty when nothing could be extracted; the data URL
/// is attached only when the image bytes could also be fetched.
pub async fn extract_image_handler(
    Extension(state): Extension<AppState>,
    Query(query): Query<ImageQuery>,
) -> Result<Json<ExtractImageResponse>, ApiError> {
    let url = query
        .url
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing url parameter".to_string()))?;

    let enrichment = state.enricher.enrich(&url).await;
    let image = enrichment.image.unwrap_or_default();
    let image_data_url = if image.is_empty() {
        None
    } else {
        state.enricher.fetch_image_data_url(&image).await
    };

    Ok(Json(ExtractImageResponse {
        image,
        image_data_url,
    }))
}

/// GET /image-proxy?url= — stream upstream image bytes with their
/// content type.
pub async fn image_proxy_handler(
    Extension(state): Extension<AppState>,
    Query(query): Query<ImageQuery>,
) -> Response {
    let Some(url) = query.url.filter(|u| !u.trim().is_empty()) else {
        return ApiError::BadRequest("Missing url parameter".to_string()).into_response();
    };
    let scheme_ok = Url::parse(&url)
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false);
    if !scheme_ok {
        return ApiError::BadRequest("Only http(s) URLs are supported".to_string())
            .into_response();
    }

    match state.enricher.fetch_raw(&url).await {
        Ok((content_type, payload)) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, content_type),
                (header::CACHE_CONTROL, PROXY_CACHE_CONTROL.to_string()),
            ],
            payload,
        )
            .into_response(),
        Err(error) => (
            StatusCode::BAD_GATEWAY,
            Json(ErrorBody {
                error: "upstream_error",
                message: error.to_string(),
            }),
        )
            .into_response(),
    }
}
