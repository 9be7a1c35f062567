//! Eco-alternatives search service.
//!
//! Judges how environmentally harmful a consumer product is and finds
//! greener alternatives through an LLM web-search tool, with
//! deterministic scoring heuristics and best-effort retailer-page
//! enrichment.

pub mod config;
pub mod kernel;
pub mod server;

pub use config::Config;
