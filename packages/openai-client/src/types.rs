//! Request and response types for the Responses API.

use serde::{Deserialize, Serialize};

// =============================================================================
// Request
// =============================================================================

/// Request body for `POST /v1/responses`.
#[derive(Debug, Clone, Serialize)]
pub struct ResponsesRequest {
    /// Model to use (e.g., "gpt-4o", "gpt-4o-mini")
    pub model: String,

    /// Prompt text, passed as a single input blob
    pub input: String,

    /// Built-in tools to enable for this call
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolSpec>,
}

impl ResponsesRequest {
    /// Create a new request with the given model and input text.
    pub fn new(model: impl Into<String>, input: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            input: input.into(),
            tools: Vec::new(),
        }
    }

    /// Enable the hosted web search tool.
    pub fn with_web_search(mut self) -> Self {
        self.tools.push(ToolSpec::web_search());
        self
    }
}

/// Reference to a built-in tool.
#[derive(Debug, Clone, Serialize)]
pub struct ToolSpec {
    #[serde(rename = "type")]
    pub kind: String,
}

impl ToolSpec {
    /// The hosted `web_search` tool.
    pub fn web_search() -> Self {
        Self {
            kind: "web_search".to_string(),
        }
    }
}

// =============================================================================
// Response
// =============================================================================

/// Response body from `POST /v1/responses`.
///
/// Only the fields this client reads are modeled; everything else in the
/// payload is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct ResponsesResponse {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub model: Option<String>,

    /// Convenience field carried by some API surfaces; not guaranteed.
    #[serde(default)]
    pub output_text: Option<String>,

    /// Output items (messages, tool traces) in generation order.
    #[serde(default)]
    pub output: Vec<OutputItem>,

    #[serde(default)]
    pub usage: Option<Usage>,
}

impl ResponsesResponse {
    /// Plain-text output of the response.
    ///
    /// Prefers the `output_text` convenience field; when it is absent,
    /// walks the output content for the first text segment. Empty string
    /// when the response carries no text at all.
    pub fn text(&self) -> String {
        if let Some(text) = &self.output_text {
            return text.clone();
        }
        for item in &self.output {
            for part in &item.content {
                if let Some(text) = &part.text {
                    return text.clone();
                }
            }
        }
        String::new()
    }
}

/// One item of the response output.
#[derive(Debug, Clone, Deserialize)]
pub struct OutputItem {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,

    #[serde(default)]
    pub content: Vec<ContentPart>,
}

/// One content part of an output item.
#[derive(Debug, Clone, Deserialize)]
pub struct ContentPart {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,

    #[serde(default)]
    pub text: Option<String>,
}

/// Token usage reported by the API.
#[derive(Debug, Clone, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub input_tokens: Option<u64>,

    #[serde(default)]
    pub output_tokens: Option<u64>,

    #[serde(default)]
    pub total_tokens: Option<u64>,
}
