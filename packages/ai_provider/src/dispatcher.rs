//! Sends a single message to the selected provider and returns the reply.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use promptlift_ai_provider_models::Provider;
use reqwest::StatusCode;
use serde_json::Value;

use crate::provider::{AiProviderError, ProviderEndpoint, upstream_error_message};

/// Delay before the single retry that follows an HTTP 429.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// API keys for each provider, read once at startup.
#[derive(Clone, Default)]
pub struct AiCredentials {
    pub grok_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
}

impl AiCredentials {
    #[must_use]
    pub const fn new(grok_api_key: Option<String>, gemini_api_key: Option<String>) -> Self {
        Self {
            grok_api_key,
            gemini_api_key,
        }
    }

    #[must_use]
    pub fn key_for(&self, provider: Provider) -> Option<&str> {
        match provider {
            Provider::Grok => self.grok_api_key.as_deref(),
            Provider::Gemini => self.gemini_api_key.as_deref(),
        }
        .filter(|key| !key.is_empty())
    }
}

impl fmt::Debug for AiCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |key: &Option<String>| key.as_ref().map(|_| "<redacted>");
        f.debug_struct("AiCredentials")
            .field("grok_api_key", &redact(&self.grok_api_key))
            .field("gemini_api_key", &redact(&self.gemini_api_key))
            .finish()
    }
}

/// Dispatches messages to the configured AI providers.
///
/// Holds no mutable state; one instance is shared by all requests.
#[derive(Debug, Clone)]
pub struct AiDispatcher {
    http_client: reqwest::Client,
    credentials: AiCredentials,
    grok: ProviderEndpoint,
    gemini: ProviderEndpoint,
    retry_delay: Duration,
}

impl AiDispatcher {
    #[must_use]
    pub fn new(credentials: AiCredentials) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            credentials,
            grok: ProviderEndpoint::new(Provider::Grok),
            gemini: ProviderEndpoint::new(Provider::Gemini),
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, provider: Provider, base_url: String) -> Self {
        let endpoint = self.endpoint_mut(provider);
        *endpoint = endpoint.clone().with_base_url(base_url);
        self
    }

    #[must_use]
    pub fn with_model(mut self, provider: Provider, model: String) -> Self {
        let endpoint = self.endpoint_mut(provider);
        *endpoint = endpoint.clone().with_model(model);
        self
    }

    #[must_use]
    pub const fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    #[must_use]
    pub const fn endpoint(&self, provider: Provider) -> &ProviderEndpoint {
        match provider {
            Provider::Grok => &self.grok,
            Provider::Gemini => &self.gemini,
        }
    }

    fn endpoint_mut(&mut self, provider: Provider) -> &mut ProviderEndpoint {
        match provider {
            Provider::Grok => &mut self.grok,
            Provider::Gemini => &mut self.gemini,
        }
    }

    /// Parse `provider` and dispatch `message` to it.
    ///
    /// # Errors
    ///
    /// * [`AiProviderError::UnsupportedProvider`] if `provider` is not a known
    ///   provider name; no request is sent
    /// * Any error from [`Self::dispatch`]
    pub async fn dispatch_named(
        &self,
        provider: &str,
        message: &str,
    ) -> Result<String, AiProviderError> {
        let provider = Provider::from_str(provider)
            .map_err(|_| AiProviderError::UnsupportedProvider(provider.to_string()))?;
        self.dispatch(provider, message).await
    }

    /// Send `message` to `provider` and return the generated text.
    ///
    /// A 429 response triggers exactly one retry of the identical request
    /// after the retry delay; the second response is final.
    ///
    /// # Errors
    ///
    /// * [`AiProviderError::MissingCredential`] if no key is configured for
    ///   `provider`; no request is sent
    /// * [`AiProviderError::ApiCallFailed`] on transport failure or a
    ///   non-success status
    /// * [`AiProviderError::UnexpectedResponse`] if the reply lacks the
    ///   completion text
    pub async fn dispatch(
        &self,
        provider: Provider,
        message: &str,
    ) -> Result<String, AiProviderError> {
        let credential = self
            .credentials
            .key_for(provider)
            .ok_or(AiProviderError::MissingCredential(provider))?;

        let endpoint = self.endpoint(provider);
        let url = endpoint.url();
        let (header_name, header_value) = endpoint.auth_header(credential);
        let body = endpoint.request_body(message);

        let mut response = self
            .send(provider, &url, header_name, &header_value, &body)
            .await?;

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            log::warn!(
                "{} rate limited the request, retrying once in {:?}",
                provider.display_name(),
                self.retry_delay
            );
            tokio::time::sleep(self.retry_delay).await;
            response = self
                .send(provider, &url, header_name, &header_value, &body)
                .await?;
        }

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| transport_error(provider, &url, &e))?;

        if !status.is_success() {
            log::error!("{} API error: {text}", provider.display_name());
            return Err(AiProviderError::ApiCallFailed {
                provider,
                status: Some(status.as_u16()),
                message: upstream_error_message(&text),
                url,
            });
        }

        let payload: Value =
            serde_json::from_str(&text).map_err(|e| AiProviderError::UnexpectedResponse {
                provider,
                detail: format!("invalid JSON: {e}"),
            })?;

        endpoint.extract_text(&payload)
    }

    async fn send(
        &self,
        provider: Provider,
        url: &str,
        header_name: &str,
        header_value: &str,
        body: &Value,
    ) -> Result<reqwest::Response, AiProviderError> {
        log::debug!("POST {url}");
        self.http_client
            .post(url)
            .header(header_name, header_value)
            .json(body)
            .send()
            .await
            .map_err(|e| transport_error(provider, url, &e))
    }
}

fn transport_error(provider: Provider, url: &str, error: &reqwest::Error) -> AiProviderError {
    log::error!("{} request failed: {error}", provider.display_name());
    AiProviderError::ApiCallFailed {
        provider,
        status: error.status().map(|s| s.as_u16()),
        message: Some(error.to_string()),
        url: url.to_string(),
    }
}
