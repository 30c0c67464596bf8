//! Per-provider wire shapes.
//!
//! Each [`Provider`] maps to one [`ProviderEndpoint`]: where to send the
//! request, how to authenticate it, what the body looks like and where the
//! generated text lives in the response.

use std::fmt::Write as _;

use promptlift_ai_provider_models::Provider;
use serde_json::{Value, json};

pub const DEFAULT_GROK_BASE_URL: &str = "https://api.x.ai";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GROK_MODEL: &str = "grok-4";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash-latest";

/// Errors that can occur when dispatching a message to an AI provider.
#[derive(Debug, thiserror::Error)]
pub enum AiProviderError {
    /// The caller named a provider that is not supported.
    #[error("Unsupported provider: {0}")]
    UnsupportedProvider(String),

    /// The credential for the requested provider is not configured.
    #[error("Missing credential for {}", display_name(.0))]
    MissingCredential(Provider),

    /// Transport failure or non-success response from the provider.
    #[error("{}", format_api_failure(.provider, .status, .message, .url))]
    ApiCallFailed {
        provider: Provider,
        status: Option<u16>,
        message: Option<String>,
        url: String,
    },

    /// The provider answered successfully but the body did not have the
    /// expected shape.
    #[error("Unexpected {} response: {detail}", display_name(.provider))]
    UnexpectedResponse { provider: Provider, detail: String },
}

impl AiProviderError {
    /// Upstream HTTP status, if the provider answered at all.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::ApiCallFailed { status, .. } => *status,
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_rate_limited(&self) -> bool {
        matches!(self.status(), Some(429))
    }
}

const fn display_name(provider: &Provider) -> &'static str {
    provider.display_name()
}

fn format_api_failure(
    provider: &Provider,
    status: &Option<u16>,
    message: &Option<String>,
    url: &str,
) -> String {
    let mut out = format!("{} API call failed", provider.display_name());
    if let Some(status) = status {
        let _ = write!(out, " with status {status}");
    }
    if let Some(message) = message {
        let _ = write!(out, ": {message}");
    }
    let _ = write!(out, " ({url})");
    out
}

/// Endpoint description for one provider.
#[derive(Debug, Clone)]
pub struct ProviderEndpoint {
    provider: Provider,
    base_url: String,
    model: String,
}

impl ProviderEndpoint {
    /// Endpoint pointing at the provider's public API with its default model.
    #[must_use]
    pub fn new(provider: Provider) -> Self {
        let (base_url, model) = match provider {
            Provider::Grok => (DEFAULT_GROK_BASE_URL, DEFAULT_GROK_MODEL),
            Provider::Gemini => (DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL),
        };
        Self {
            provider,
            base_url: base_url.to_string(),
            model: model.to_string(),
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    #[must_use]
    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }

    #[must_use]
    pub fn url(&self) -> String {
        match self.provider {
            Provider::Grok => format!("{}/v1/chat/completions", self.base_url),
            Provider::Gemini => format!(
                "{}/v1beta/models/{}:generateContent",
                self.base_url, self.model
            ),
        }
    }

    /// Header name and value carrying the credential.
    #[must_use]
    pub fn auth_header(&self, credential: &str) -> (&'static str, String) {
        match self.provider {
            Provider::Grok => ("Authorization", format!("Bearer {credential}")),
            Provider::Gemini => ("x-goog-api-key", credential.to_string()),
        }
    }

    #[must_use]
    pub fn request_body(&self, message: &str) -> Value {
        match self.provider {
            Provider::Grok => json!({
                "model": self.model,
                "messages": [{ "role": "user", "content": message }],
            }),
            Provider::Gemini => json!({
                "contents": [{ "parts": [{ "text": message }] }],
            }),
        }
    }

    /// JSON pointer to the generated text in a successful response.
    #[must_use]
    pub const fn completion_pointer(&self) -> &'static str {
        match self.provider {
            Provider::Grok => "/choices/0/message/content",
            Provider::Gemini => "/candidates/0/content/parts/0/text",
        }
    }

    /// # Errors
    ///
    /// * If the completion text is missing or is not a string
    pub fn extract_text(&self, payload: &Value) -> Result<String, AiProviderError> {
        let pointer = self.completion_pointer();
        payload
            .pointer(pointer)
            .and_then(Value::as_str)
            .map(ToString::to_string)
            .ok_or_else(|| AiProviderError::UnexpectedResponse {
                provider: self.provider,
                detail: format!("missing text at {pointer}"),
            })
    }
}

/// Pull a human-readable message out of an error response body.
///
/// Both providers use `{"error": {"message": ...}}`; some gateways answer
/// with a bare `{"error": "..."}`.
pub(crate) fn upstream_error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let error = value.get("error")?;
    error
        .get("message")
        .and_then(Value::as_str)
        .or_else(|| error.as_str())
        .map(ToString::to_string)
}
