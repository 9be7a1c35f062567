//! POST /search — topic search or product-alternatives search.

use axum::extract::Extension;
use axum::Json;
use serde::Deserialize;
use tracing::info;

use crate::kernel::search::{ProductRef, SearchOutcome, SearchRequest, DEFAULT_LIMIT};
use crate::server::app::AppState;
use crate::server::error::ApiError;

#[derive(Debug, Default, Deserialize)]
pub struct SearchBody {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub product: Option<ProductBody>,
    #[serde(default)]
    pub model: Option<String>,
}

/// Product reference in request bodies; `link` falls back to a `url` key.
#[derive(Debug, Default, Deserialize)]
pub struct ProductBody {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl ProductBody {
    pub fn into_ref(self) -> ProductRef {
        ProductRef {
            name: self.name.unwrap_or_default().trim().to_string(),
            link: self.link.or(self.url).unwrap_or_default().trim().to_string(),
        }
    }
}

/// A missing or malformed body is treated as an empty one, mirroring the
/// lenient contract the browser extension relies on.
pub async fn search_handler(
    Extension(state): Extension<AppState>,
    body: Option<Json<SearchBody>>,
) -> Result<Json<SearchOutcome>, ApiError> {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    info!(query = %body.query, has_product = body.product.is_some(), "incoming /search request");

    let request = SearchRequest {
        query: body.query,
        limit: body.limit.unwrap_or(DEFAULT_LIMIT),
        product: body.product.map(ProductBody::into_ref),
        model: body.model,
    };

    let outcome = state.service.search(request).await?;
    Ok(Json(outcome))
}
