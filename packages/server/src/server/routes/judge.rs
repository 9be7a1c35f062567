//! POST /judge — score a single product without searching.

use axum::extract::Extension;
use axum::Json;
use serde::Deserialize;
use tracing::info;

use super::search::ProductBody;
use crate::kernel::search::{JudgeOutcome, ProductRef};
use crate::server::app::AppState;
use crate::server::error::ApiError;

#[derive(Debug, Default, Deserialize)]
pub struct JudgeBody {
    #[serde(default)]
    pub product: Option<ProductBody>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

pub async fn judge_handler(
    Extension(state): Extension<AppState>,
    body: Option<Json<JudgeBody>>,
) -> Result<Json<JudgeOutcome>, ApiError> {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    let model = body.model;

    // The product object takes precedence over top-level name/link.
    let product = match body.product {
        Some(product) => product.into_ref(),
        None => ProductRef {
            name: body.name.unwrap_or_default().trim().to_string(),
            link: body.link.unwrap_or_default().trim().to_string(),
        },
    };
    info!(name = %product.name, link = %product.link, "incoming /judge request");

    let outcome = state.service.judge(&product, model.as_deref()).await?;
    Ok(Json(outcome))
}
