use std::sync::Arc;
use std::time::Duration;

use promptlift_ai_provider::{AiCredentials, AiDispatcher, models::Provider};
use promptlift_git_provider::RepoHost;
use promptlift_github::GitHubProvider;

use crate::config::ServerConfig;
use crate::rate_limit::RateLimiter;

/// Shared, read-only request context. The rate limiter is the only piece
/// with interior mutability.
pub struct AppState {
    pub dispatcher: AiDispatcher,
    pub repo_host: Arc<dyn RepoHost>,
    pub ingest_retry_delay: Duration,
    pub rate_limiter: RateLimiter,
}

impl AppState {
    #[must_use]
    pub fn new(
        dispatcher: AiDispatcher,
        repo_host: Arc<dyn RepoHost>,
        ingest_retry_delay: Duration,
        rate_limiter: RateLimiter,
    ) -> Self {
        Self {
            dispatcher,
            repo_host,
            ingest_retry_delay,
            rate_limiter,
        }
    }

    #[must_use]
    pub fn from_config(config: &ServerConfig) -> Self {
        let credentials =
            AiCredentials::new(config.grok_api_key.clone(), config.gemini_api_key.clone());

        let mut dispatcher =
            AiDispatcher::new(credentials).with_retry_delay(config.ai_retry_delay);
        for (provider, base_url, model) in [
            (Provider::Grok, &config.grok_base_url, &config.grok_model),
            (Provider::Gemini, &config.gemini_base_url, &config.gemini_model),
        ] {
            if let Some(base_url) = base_url {
                dispatcher = dispatcher.with_base_url(provider, base_url.clone());
            }
            if let Some(model) = model {
                dispatcher = dispatcher.with_model(provider, model.clone());
            }
        }

        let mut github = GitHubProvider::new();
        if let Some(token) = &config.github_token {
            github = github.with_token(token.clone());
        }
        if let Some(base_url) = &config.github_base_url {
            github = github.with_base_url(base_url.clone());
        }
        log::debug!(
            "GitHub client configured (authenticated: {})",
            github.is_authenticated()
        );

        Self::new(
            dispatcher,
            Arc::new(github),
            config.ingest_retry_delay,
            RateLimiter::new(config.rate_limit_max, config.rate_limit_window),
        )
    }
}
