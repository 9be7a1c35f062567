use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;

/// Model used when `OPENAI_MODEL` is not set.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// OpenAI credential. Optional at startup: without it the server
    /// still boots and /search and /judge refuse requests.
    pub openai_api_key: Option<String>,
    pub default_model: String,
    pub port: u16,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            openai_api_key: env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty()),
            default_model: env::var("OPENAI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "5057".to_string())
                .parse()
                .context("PORT must be a valid number")?,
        })
    }
}
