//! LLM gateway: model selection, invocation and rate-limit fallback.
//!
//! The upstream error surface is plain text, not a structured contract,
//! so failure classification is substring-based: an error mentioning
//! HTTP 429 or a rate limit triggers exactly one retry against the
//! low-cost fallback model after a fixed backoff. Every other failure,
//! and any failure of the retry itself, is terminal.

use async_trait::async_trait;
use openai_client::{OpenAIClient, OpenAIError, ResponsesRequest};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Low-cost model used for the single rate-limit retry.
pub const FALLBACK_MODEL: &str = "gpt-4o-mini";

/// Backoff before the fallback retry.
const RETRY_BACKOFF: Duration = Duration::from_millis(1500);

/// Gateway failures, already classified for the HTTP error taxonomy.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The upstream API call failed (after the fallback retry, if any)
    #[error("{0}")]
    Upstream(String),

    /// The upstream response could not be decoded
    #[error("{0}")]
    Internal(String),
}

/// Seam over the model call so tests can inject a double.
#[async_trait]
pub trait ModelResponder: Send + Sync {
    /// Run one prompt against one model and return the plain-text output.
    async fn respond(
        &self,
        model: &str,
        prompt: &str,
        web_search: bool,
    ) -> openai_client::Result<String>;
}

#[async_trait]
impl ModelResponder for OpenAIClient {
    async fn respond(
        &self,
        model: &str,
        prompt: &str,
        web_search: bool,
    ) -> openai_client::Result<String> {
        let mut request = ResponsesRequest::new(model, prompt);
        if web_search {
            request = request.with_web_search();
        }
        let response = self.responses(request).await?;
        let text = response.text();
        debug!(model = %model, output = %text, "model output text");
        Ok(text)
    }
}

/// Classify an upstream failure as rate limiting.
///
/// Best-effort by construction: the rule is "the message mentions 429 or
/// a rate limit", nothing more.
pub fn is_rate_limited(error: &OpenAIError) -> bool {
    let message = error.to_string();
    message.contains("429") || message.to_lowercase().contains("rate limit")
}

/// Gateway over a model responder with per-request model override and a
/// single fallback retry on rate limiting.
pub struct LlmGateway {
    responder: Arc<dyn ModelResponder>,
    default_model: String,
}

impl LlmGateway {
    pub fn new(responder: Arc<dyn ModelResponder>, default_model: impl Into<String>) -> Self {
        Self {
            responder,
            default_model: default_model.into(),
        }
    }

    /// Effective model for a request: the override when non-blank, else
    /// the process-wide default.
    fn resolve_model<'a>(&'a self, model_override: Option<&'a str>) -> &'a str {
        match model_override.map(str::trim) {
            Some(model) if !model.is_empty() => model,
            _ => &self.default_model,
        }
    }

    /// Invoke the model once, retrying once against [`FALLBACK_MODEL`]
    /// when the primary call is rate limited and not already on it.
    pub async fn invoke(
        &self,
        prompt: &str,
        model_override: Option<&str>,
        web_search: bool,
    ) -> Result<String, GatewayError> {
        let model = self.resolve_model(model_override);

        match self.responder.respond(model, prompt, web_search).await {
            Ok(text) => Ok(text),
            Err(error) if is_rate_limited(&error) && model != FALLBACK_MODEL => {
                warn!(model = %model, error = %error, "model rate limited, retrying with fallback");
                tokio::time::sleep(RETRY_BACKOFF).await;
                match self.responder.respond(FALLBACK_MODEL, prompt, web_search).await {
                    Ok(text) => {
                        info!(model = FALLBACK_MODEL, "fallback model succeeded");
                        Ok(text)
                    }
                    Err(retry_error) => {
                        warn!(error = %retry_error, "fallback model also failed");
                        Err(classify_terminal(retry_error))
                    }
                }
            }
            Err(error) => Err(classify_terminal(error)),
        }
    }
}

fn classify_terminal(error: OpenAIError) -> GatewayError {
    match error {
        OpenAIError::Parse(message) => GatewayError::Internal(message),
        other => GatewayError::Upstream(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct ScriptedResponder {
        calls: Mutex<Vec<(String, bool)>>,
        script: Mutex<Vec<openai_client::Result<String>>>,
    }

    impl ScriptedResponder {
        fn new(script: Vec<openai_client::Result<String>>) -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                script: Mutex::new(script),
            })
        }

        fn calls(&self) -> Vec<(String, bool)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ModelResponder for ScriptedResponder {
        async fn respond(
            &self,
            model: &str,
            _prompt: &str,
            web_search: bool,
        ) -> openai_client::Result<String> {
            self.calls
                .lock()
                .unwrap()
                .push((model.to_string(), web_search));
            self.script.lock().unwrap().remove(0)
        }
    }

    fn rate_limit_error() -> OpenAIError {
        OpenAIError::Api("HTTP 429: Rate limit reached for gpt-4o".to_string())
    }

    #[test]
    fn test_is_rate_limited() {
        assert!(is_rate_limited(&rate_limit_error()));
        assert!(is_rate_limited(&OpenAIError::Api(
            "upstream said: Rate Limit exceeded".to_string()
        )));
        assert!(!is_rate_limited(&OpenAIError::Api(
            "HTTP 500: internal error".to_string()
        )));
        assert!(!is_rate_limited(&OpenAIError::Network(
            "connection reset".to_string()
        )));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limited_primary_falls_back_once() {
        let responder = ScriptedResponder::new(vec![
            Err(rate_limit_error()),
            Ok("fallback output".to_string()),
        ]);
        let gateway = LlmGateway::new(responder.clone(), "gpt-4o");

        let text = gateway.invoke("prompt", None, true).await.unwrap();
        assert_eq!(text, "fallback output");
        assert_eq!(
            responder.calls(),
            vec![
                ("gpt-4o".to_string(), true),
                (FALLBACK_MODEL.to_string(), true)
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_fallback_is_terminal() {
        let responder = ScriptedResponder::new(vec![
            Err(rate_limit_error()),
            Err(OpenAIError::Api("HTTP 429: still limited".to_string())),
        ]);
        let gateway = LlmGateway::new(responder.clone(), "gpt-4o");

        let error = gateway.invoke("prompt", None, false).await.unwrap_err();
        assert!(matches!(error, GatewayError::Upstream(_)));
        assert_eq!(responder.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_non_rate_limit_error_does_not_retry() {
        let responder =
            ScriptedResponder::new(vec![Err(OpenAIError::Api("HTTP 500: boom".to_string()))]);
        let gateway = LlmGateway::new(responder.clone(), "gpt-4o");

        let error = gateway.invoke("prompt", None, false).await.unwrap_err();
        assert!(matches!(error, GatewayError::Upstream(_)));
        assert_eq!(responder.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_rate_limit_on_fallback_model_is_terminal() {
        let responder = ScriptedResponder::new(vec![Err(rate_limit_error())]);
        let gateway = LlmGateway::new(responder.clone(), FALLBACK_MODEL);

        let error = gateway.invoke("prompt", None, false).await.unwrap_err();
        assert!(matches!(error, GatewayError::Upstream(_)));
        assert_eq!(responder.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_model_override_wins_over_default() {
        let responder = ScriptedResponder::new(vec![Ok("ok".to_string())]);
        let gateway = LlmGateway::new(responder.clone(), "gpt-4o");

        gateway.invoke("prompt", Some("gpt-4.1"), false).await.unwrap();
        assert_eq!(responder.calls()[0].0, "gpt-4.1");
    }

    #[tokio::test]
    async fn test_blank_override_uses_default() {
        let responder = ScriptedResponder::new(vec![Ok("ok".to_string())]);
        let gateway = LlmGateway::new(responder.clone(), "gpt-4o");

        gateway.invoke("prompt", Some("   "), false).await.unwrap();
        assert_eq!(responder.calls()[0].0, "gpt-4o");
    }

    #[tokio::test]
    async fn test_parse_error_maps_to_internal() {
        let responder =
            ScriptedResponder::new(vec![Err(OpenAIError::Parse("bad json".to_string()))]);
        let gateway = LlmGateway::new(responder, "gpt-4o");

        let error = gateway.invoke("prompt", None, false).await.unwrap_err();
        assert!(matches!(error, GatewayError::Internal(_)));
    }
}
