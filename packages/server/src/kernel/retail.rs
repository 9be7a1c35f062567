//! Best-effort retailer page enrichment (preview image + price).
//!
//! Every step degrades to `None`: a fetch error, a missing element or a
//! bad attribute never fails the surrounding request. Site-specific DOM
//! selectors are a pluggable strategy keyed by the recognized retailer
//! domain; unrecognized domains get the generic meta-tag chain and a
//! first-image fallback only, and price extraction does not run for them
//! at all.

use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::Engine as _;
use lazy_static::lazy_static;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use tracing::debug;

use super::extract::second_level_domain;

/// Page fetch timeout.
const FETCH_TIMEOUT: Duration = Duration::from_secs(8);

/// Upper bound on image payloads rendered as data URLs.
const MAX_IMAGE_BYTES: usize = 2 * 1024 * 1024;

lazy_static! {
    /// Currency-symbol-prefixed price, e.g. "$12.99" or "£ 8,50".
    static ref PRICE_PATTERN: Regex = Regex::new(r"[$£€]\s?\d+(?:[.,]\d{2})?").unwrap();
}

/// Extracted page metadata for one candidate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Enrichment {
    pub image: Option<String>,
    pub price: Option<String>,
}

/// Seam over page enrichment so the orchestrator can be tested without
/// network access.
#[async_trait]
pub trait Enricher: Send + Sync {
    /// Fetch the candidate page and extract a preview image and price.
    async fn enrich(&self, url: &str) -> Enrichment;
}

/// Site-specific DOM selectors for a recognized retailer.
trait SiteStrategy: Send + Sync {
    /// Primary product image via retailer-specific wrapper elements.
    fn product_image(&self, document: &Html) -> Option<String>;

    /// Price via retailer-specific containers.
    fn price(&self, document: &Html) -> Option<String>;
}

/// Wrapper elements holding the primary Amazon product image, in order.
const AMAZON_IMAGE_WRAPPERS: &[&str] = &[
    "#imgTagWrapperId img",
    "#landingImage",
    "#imgBlkFront",
    "#main-image-container img",
];

/// Amazon price containers, most specific first.
const AMAZON_PRICE_SELECTORS: &[&str] = &[
    "#corePrice_feature_div span.a-offscreen",
    "span.a-price span.a-offscreen",
    "#priceblock_ourprice",
    "#priceblock_dealprice",
    "#price_inside_buybox",
];

struct AmazonStrategy;

static AMAZON: AmazonStrategy = AmazonStrategy;

impl SiteStrategy for AmazonStrategy {
    fn product_image(&self, document: &Html) -> Option<String> {
        for selector_str in AMAZON_IMAGE_WRAPPERS {
            let Ok(selector) = Selector::parse(selector_str) else {
                continue;
            };
            if let Some(element) = document.select(&selector).next() {
                if let Some(src) = image_from_element(&element) {
                    return Some(src);
                }
            }
        }
        None
    }

    fn price(&self, document: &Html) -> Option<String> {
        for selector_str in AMAZON_PRICE_SELECTORS {
            let Ok(selector) = Selector::parse(selector_str) else {
                continue;
            };
            if let Some(element) = document.select(&selector).next() {
                let text = element.text().collect::<String>().trim().to_string();
                if !text.is_empty() {
                    return Some(text);
                }
            }
        }
        None
    }
}

/// Attribute chain for a product `<img>`: explicit hi-res hint, then the
/// structured multi-resolution map, then the densest srcset entry, then
/// the plain source.
fn image_from_element(element: &ElementRef) -> Option<String> {
    let value = element.value();
    if let Some(hires) = value.attr("data-old-hires").map(str::trim).filter(|v| !v.is_empty()) {
        return Some(hires.to_string());
    }
    if let Some(dynamic) = value.attr("data-a-dynamic-image") {
        if let Some(url) = largest_dynamic_image(dynamic) {
            return Some(url);
        }
    }
    if let Some(srcset) = value.attr("srcset") {
        if let Some(url) = densest_srcset_entry(srcset) {
            return Some(url);
        }
    }
    value
        .attr("src")
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Pick the widest entry from a `data-a-dynamic-image` JSON map of
/// `{"url": [width, height], ...}`.
fn largest_dynamic_image(raw: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(raw).ok()?;
    let map = value.as_object()?;
    let mut best: Option<(&String, f64)> = None;
    for (url, dims) in map {
        let width = dims
            .as_array()
            .and_then(|d| d.first())
            .and_then(|w| w.as_f64())
            .unwrap_or(0.0);
        if best.map(|(_, w)| width > w).unwrap_or(true) {
            best = Some((url, width));
        }
    }
    best.map(|(url, _)| url.clone())
}

/// Pick the highest-density (or widest) entry from a srcset list.
fn densest_srcset_entry(srcset: &str) -> Option<String> {
    let mut best: Option<(String, f64)> = None;
    for entry in srcset.split(',') {
        let mut parts = entry.split_whitespace();
        let Some(url) = parts.next() else {
            continue;
        };
        let weight = parts
            .next()
            .and_then(|d| d.trim_end_matches(['x', 'w']).parse::<f64>().ok())
            .unwrap_or(1.0);
        if best.as_ref().map(|(_, w)| weight > *w).unwrap_or(true) {
            best = Some((url.to_string(), weight));
        }
    }
    best.map(|(url, _)| url)
}

/// Meta-tag preview image: Open Graph first, then the secure variant,
/// then the Twitter card.
fn meta_image(document: &Html) -> Option<String> {
    const META_SELECTORS: &[&str] = &[
        r#"meta[property="og:image"]"#,
        r#"meta[property="og:image:secure_url"]"#,
        r#"meta[name="twitter:image"]"#,
    ];
    for selector_str in META_SELECTORS {
        let Ok(selector) = Selector::parse(selector_str) else {
            continue;
        };
        if let Some(content) = document
            .select(&selector)
            .next()
            .and_then(|el| el.value().attr("content"))
            .map(str::trim)
            .filter(|c| !c.is_empty())
        {
            return Some(content.to_string());
        }
    }
    None
}

fn first_image(document: &Html) -> Option<String> {
    let selector = Selector::parse("img").ok()?;
    document
        .select(&selector)
        .find_map(|el| image_from_element(&el))
}

fn page_text(document: &Html) -> String {
    document.root_element().text().collect::<String>()
}

/// Full image chain for one page.
fn page_image(strategy: Option<&dyn SiteStrategy>, document: &Html) -> Option<String> {
    meta_image(document)
        .or_else(|| strategy.and_then(|s| s.product_image(document)))
        .or_else(|| first_image(document))
}

/// Price extraction, gated to recognized retailer pages.
fn page_price(strategy: Option<&dyn SiteStrategy>, document: &Html) -> Option<String> {
    let strategy = strategy?;
    strategy.price(document).or_else(|| {
        PRICE_PATTERN
            .find(&page_text(document))
            .map(|m| m.as_str().to_string())
    })
}

/// Fetches retailer pages and extracts preview metadata.
pub struct RetailerEnricher {
    client: reqwest::Client,
    retailer: String,
}

impl RetailerEnricher {
    /// Create an enricher recognizing the given retailer's second-level
    /// domain (e.g. "amazon").
    pub fn new(retailer: impl Into<String>) -> Result<Self> {
        // Browser-like headers; retail pages serve bot-flagged requests a stub page
        let user_agent = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8"
                .parse()
                .unwrap(),
        );
        headers.insert(
            reqwest::header::ACCEPT_LANGUAGE,
            "en-US,en;q=0.5".parse().unwrap(),
        );

        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .user_agent(user_agent)
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            retailer: retailer.into(),
        })
    }

    /// Whether a URL belongs to the recognized retailer class.
    pub fn is_retailer(&self, url: &str) -> bool {
        second_level_domain(url) == self.retailer
    }

    fn strategy_for(&self, url: &str) -> Option<&'static dyn SiteStrategy> {
        if self.is_retailer(url) {
            Some(&AMAZON)
        } else {
            None
        }
    }

    async fn fetch_page(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("page request failed")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("HTTP {} for {}", status, url);
        }

        response.text().await.context("failed to read page body")
    }

    /// Fetch an image and render it as a base64 data URL. Best-effort;
    /// oversized or unreadable payloads yield `None`.
    pub async fn fetch_image_data_url(&self, image_url: &str) -> Option<String> {
        let response = self.client.get(image_url).send().await.ok()?;
        if !response.status().is_success() {
            return None;
        }
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("image/jpeg")
            .to_string();
        let payload = response.bytes().await.ok()?;
        if payload.is_empty() || payload.len() > MAX_IMAGE_BYTES {
            return None;
        }
        let encoded = base64::engine::general_purpose::STANDARD.encode(&payload);
        Some(format!("data:{};base64,{}", content_type, encoded))
    }

    /// Fetch raw bytes with their upstream content type (image proxy).
    pub async fn fetch_raw(&self, url: &str) -> Result<(String, bytes::Bytes)> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("upstream request failed")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("HTTP {} for {}", status, url);
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();
        let payload = response
            .bytes()
            .await
            .context("failed to read upstream body")?;

        Ok((content_type, payload))
    }
}

#[async_trait]
impl Enricher for RetailerEnricher {
    async fn enrich(&self, url: &str) -> Enrichment {
        let html = match self.fetch_page(url).await {
            Ok(html) => html,
            Err(error) => {
                debug!(url = %url, error = %error, "enrichment fetch failed");
                return Enrichment::default();
            }
        };

        let document = Html::parse_document(&html);
        let strategy = self.strategy_for(url);

        Enrichment {
            image: page_image(strategy, &document),
            price: page_price(strategy, &document),
        }
    }
}
