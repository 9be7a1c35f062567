//! Request orchestration: judge, search, filter, enrich, respond.

use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

use super::ecoscore::{evaluate_judge_text, ImpactLabel, JudgeResult};
use super::extract::{extract_items, second_level_domain, top_level_domain};
use super::llm::{GatewayError, LlmGateway};
use super::prompts;
use super::retail::Enricher;

/// Judge score at or above which the original product is considered good
/// enough and the alternatives search is skipped.
const EARLY_RETURN_THRESHOLD: f64 = 3.0;

/// Result count used when the caller does not specify a limit.
pub const DEFAULT_LIMIT: usize = 5;

/// Service-level failures, mapped onto the HTTP error taxonomy by the
/// route layer.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("OPENAI_API_KEY is not set on the server.")]
    MissingApiKey,

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Upstream(String),

    #[error("{0}")]
    Internal(String),
}

impl From<GatewayError> for ServiceError {
    fn from(error: GatewayError) -> Self {
        match error {
            GatewayError::Upstream(message) => ServiceError::Upstream(message),
            GatewayError::Internal(message) => ServiceError::Internal(message),
        }
    }
}

/// A product supplied by the caller; either field may be blank.
#[derive(Debug, Clone, Default)]
pub struct ProductRef {
    pub name: String,
    pub link: String,
}

impl ProductRef {
    pub fn is_empty(&self) -> bool {
        self.name.trim().is_empty() && self.link.trim().is_empty()
    }
}

/// Inputs for the search operation.
#[derive(Debug, Clone, Default)]
pub struct SearchRequest {
    pub query: String,
    pub limit: usize,
    pub product: Option<ProductRef>,
    pub model: Option<String>,
}

/// One enriched result row.
#[derive(Debug, Clone, Serialize)]
pub struct ResultItem {
    pub name: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_data_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tld: Option<String>,
}

/// Product echoed back in responses.
#[derive(Debug, Clone, Serialize)]
pub struct ProductOut {
    pub name: String,
    pub link: String,
}

/// Search outcome assembled for the HTTP layer. Optional fields appear
/// only when applicable.
#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    pub results: Vec<ResultItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product: Option<ProductOut>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub impact: Option<ImpactLabel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ecoscore: Option<f64>,
}

/// Judge outcome for the judge endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct JudgeOutcome {
    pub product: ProductOut,
    pub impact: ImpactLabel,
    pub ecoscore: f64,
}

/// Sequences the pipeline for each request: judge when a product is
/// given, early-return on a good score, otherwise search, parse, filter
/// and enrich.
pub struct SearchService {
    gateway: Option<LlmGateway>,
    enricher: Arc<dyn Enricher>,
    retailer: String,
}

impl SearchService {
    pub fn new(
        gateway: Option<LlmGateway>,
        enricher: Arc<dyn Enricher>,
        retailer: impl Into<String>,
    ) -> Self {
        Self {
            gateway,
            enricher,
            retailer: retailer.into(),
        }
    }

    fn gateway(&self) -> Result<&LlmGateway, ServiceError> {
        self.gateway.as_ref().ok_or(ServiceError::MissingApiKey)
    }

    /// Judge one product's environmental friendliness.
    pub async fn judge(
        &self,
        product: &ProductRef,
        model: Option<&str>,
    ) -> Result<JudgeOutcome, ServiceError> {
        let gateway = self.gateway()?;
        if product.is_empty() {
            return Err(ServiceError::BadRequest(
                "Provide product.name and/or product.link".to_string(),
            ));
        }

        let prompt = prompts::judge_prompt(&product.name, &product.link);
        let text = gateway.invoke(&prompt, model, false).await?;
        let verdict = evaluate_judge_text(&text, &product.name, &product.link);
        info!(impact = ?verdict.impact, ecoscore = verdict.ecoscore, "judge verdict");

        Ok(JudgeOutcome {
            product: product_out(product),
            impact: verdict.impact,
            ecoscore: verdict.ecoscore,
        })
    }

    /// Run the full search pipeline.
    pub async fn search(&self, request: SearchRequest) -> Result<SearchOutcome, ServiceError> {
        let gateway = self.gateway()?;
        let limit = if request.limit == 0 {
            DEFAULT_LIMIT
        } else {
            request.limit
        };
        let model = request.model.as_deref();
        let product = request.product.clone().filter(|p| !p.is_empty());

        // Always judge first when a product is given.
        let mut judged: Option<JudgeResult> = None;
        if let Some(product) = &product {
            let prompt = prompts::judge_prompt(&product.name, &product.link);
            let text = gateway.invoke(&prompt, model, false).await?;
            let verdict = evaluate_judge_text(&text, &product.name, &product.link);
            info!(impact = ?verdict.impact, ecoscore = verdict.ecoscore, "judge verdict");

            if verdict.ecoscore >= EARLY_RETURN_THRESHOLD {
                // Good enough already; alternatives are unnecessary.
                return Ok(SearchOutcome {
                    results: Vec::new(),
                    query: None,
                    product: Some(product_out(product)),
                    impact: Some(verdict.impact),
                    ecoscore: Some(verdict.ecoscore),
                });
            }
            judged = Some(verdict);
        }

        let prompt = match &product {
            Some(product) => prompts::alternatives_prompt(&product.name, &product.link, limit),
            None => prompts::search_prompt(&request.query, limit),
        };
        debug!(prompt = %prompt, "search prompt");

        let output = gateway.invoke(&prompt, model, true).await?;
        let mut candidates = extract_items(&output);
        debug!(count = candidates.len(), "candidates extracted");

        if product.is_some() {
            candidates.retain(|c| second_level_domain(&c.url) == self.retailer);
            candidates.truncate(limit);
        }

        let mut results = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let enrichment = self.enricher.enrich(&candidate.url).await;
            let tld = top_level_domain(&candidate.url);
            results.push(ResultItem {
                name: candidate.name,
                url: candidate.url,
                price: candidate.price.or(enrichment.price),
                image: enrichment.image,
                image_data_url: None,
                tld: (!tld.is_empty()).then_some(tld),
            });
        }

        Ok(SearchOutcome {
            results,
            query: blank_to_none(&request.query),
            product: product.as_ref().map(product_out),
            impact: judged.map(|j| j.impact),
            ecoscore: judged.map(|j| j.ecoscore),
        })
    }
}

fn product_out(product: &ProductRef) -> ProductOut {
    ProductOut {
        name: product.name.trim().to_string(),
        link: product.link.trim().to_string(),
    }
}

fn blank_to_none(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
