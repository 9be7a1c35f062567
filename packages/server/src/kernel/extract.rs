//! Candidate extraction from LLM output.
//!
//! The model is asked for a strict JSON object but in practice wraps it
//! in prose, emits a bare array, or drops fields. Extraction is an
//! explicit two-stage pipeline: parse structured JSON first, and only
//! when that yields no usable items fall back to scanning the raw text
//! for URLs.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;
use url::Url;

lazy_static! {
    /// http(s) URLs up to whitespace or a closing bracket/paren.
    static ref URL_PATTERN: Regex = Regex::new(r"https?://[^\s)\]]+").unwrap();
}

/// Hostname suffixes that span more than one label.
const MULTI_PART_SUFFIXES: &[&str] = &[
    "co.uk", "org.uk", "ac.uk", "com.au", "net.au", "org.au", "co.nz", "co.jp", "com.br",
    "com.mx", "co.in",
];

/// A candidate item recovered from model output.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub name: String,
    pub url: String,
    pub price: Option<String>,
}

/// Extract candidate items from model output text.
///
/// Items keep their source order; URLs are unique with the first
/// occurrence winning.
pub fn extract_items(text: &str) -> Vec<Candidate> {
    if let Some(items) = structured_items(text) {
        return items;
    }
    url_scan_items(text)
}

/// Stage 1: strict JSON. `Some` only when at least one usable item came
/// out of a `{"results": [...]}` object or a bare array.
fn structured_items(text: &str) -> Option<Vec<Candidate>> {
    let value: serde_json::Value = serde_json::from_str(text.trim()).ok()?;
    let elements = match &value {
        serde_json::Value::Object(map) => map.get("results")?.as_array()?,
        serde_json::Value::Array(items) => items,
        _ => return None,
    };

    let items: Vec<Candidate> = elements.iter().filter_map(candidate_from_value).collect();
    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}

fn candidate_from_value(value: &serde_json::Value) -> Option<Candidate> {
    let item = value.as_object()?;
    let url = item
        .get("url")
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .trim()
        .to_string();
    if url.is_empty() {
        return None;
    }

    let name = item
        .get("name")
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .trim()
        .to_string();
    let name = if name.is_empty() {
        name_from_url(&url)
    } else {
        name
    };

    let price = item
        .get("price")
        .and_then(|v| match v {
            serde_json::Value::String(s) => Some(s.trim().to_string()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .filter(|p| !p.is_empty());

    Some(Candidate { name, url, price })
}

/// Stage 2: URL scan over the raw text, deduplicated in first-occurrence
/// order, with derived names and no price.
fn url_scan_items(text: &str) -> Vec<Candidate> {
    let mut seen = HashSet::new();
    let mut items = Vec::new();
    for found in URL_PATTERN.find_iter(text) {
        let url = found.as_str().to_string();
        if seen.insert(url.clone()) {
            items.push(Candidate {
                name: name_from_url(&url),
                url,
                price: None,
            });
        }
    }
    items
}

/// Derive a display name from a URL's hostname.
///
/// Strips a leading `www.`, drops the last dot-label, maps `-`/`_` to
/// spaces and capitalizes each alphabetic run. Unparseable input comes
/// back verbatim.
pub fn name_from_url(url: &str) -> String {
    let host = match Url::parse(url).ok().and_then(|u| u.host_str().map(str::to_string)) {
        Some(host) => host,
        None => return url.to_string(),
    };
    let trimmed = host.strip_prefix("www.").unwrap_or(host.as_str());
    let base = match trimmed.rsplit_once('.') {
        Some((left, _)) => left,
        None => trimmed,
    };
    title_case(&base.replace(['-', '_'], " "))
}

fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;
    for ch in text.chars() {
        if ch.is_alphabetic() {
            if at_word_start {
                out.extend(ch.to_uppercase());
            } else {
                out.extend(ch.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(ch);
            at_word_start = true;
        }
    }
    out
}

fn domain_labels(url: &str) -> Option<Vec<String>> {
    let parsed = Url::parse(url).ok()?;
    match parsed.host() {
        Some(url::Host::Domain(domain)) => Some(domain.split('.').map(str::to_string).collect()),
        _ => None,
    }
}

/// Public-suffix portion of a URL's hostname ("com", "co.uk").
///
/// Resolved against a small fixed table of multi-part suffixes; empty
/// when the URL has no usable hostname.
pub fn top_level_domain(url: &str) -> String {
    let labels = match domain_labels(url) {
        Some(labels) if labels.len() >= 2 => labels,
        _ => return String::new(),
    };
    let last_two = labels[labels.len() - 2..].join(".");
    if MULTI_PART_SUFFIXES.contains(&last_two.as_str()) {
        last_two
    } else {
        labels.last().cloned().unwrap_or_default()
    }
}

/// Registrable label left of the public suffix ("amazon" for
/// "www.amazon.co.uk"). Empty when there is none.
pub fn second_level_domain(url: &str) -> String {
    let labels = match domain_labels(url) {
        Some(labels) if !labels.is_empty() => labels,
        _ => return String::new(),
    };
    let suffix = top_level_domain(url);
    let suffix_len = if suffix.is_empty() {
        0
    } else {
        suffix.split('.').count()
    };
    if labels.len() > suffix_len {
        labels[labels.len() - suffix_len - 1].clone()
    } else {
        String::new()
    }
}
