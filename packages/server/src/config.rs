//! Process configuration, read once at startup.

use std::time::Duration;

use promptlift_ai_provider::{DEFAULT_RETRY_DELAY, models::Provider};
use promptlift_git_provider::DEFAULT_FLATTEN_RETRY_DELAY;

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_RATE_LIMIT_MAX: u32 = 100;
pub const DEFAULT_RATE_LIMIT_WINDOW: Duration = Duration::from_secs(15 * 60);
pub const DEFAULT_JSON_BODY_LIMIT: usize = 16 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: '{value}' ({reason})")]
    InvalidValue {
        name: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub grok_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub github_token: Option<String>,
    pub grok_model: Option<String>,
    pub gemini_model: Option<String>,
    pub grok_base_url: Option<String>,
    pub gemini_base_url: Option<String>,
    pub github_base_url: Option<String>,
    pub ai_retry_delay: Duration,
    pub ingest_retry_delay: Duration,
    /// Requests allowed per window across all clients; `0` disables the limit.
    pub rate_limit_max: u32,
    pub rate_limit_window: Duration,
    pub json_body_limit: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            grok_api_key: None,
            gemini_api_key: None,
            github_token: None,
            grok_model: None,
            gemini_model: None,
            grok_base_url: None,
            gemini_base_url: None,
            github_base_url: None,
            ai_retry_delay: DEFAULT_RETRY_DELAY,
            ingest_retry_delay: DEFAULT_FLATTEN_RETRY_DELAY,
            rate_limit_max: DEFAULT_RATE_LIMIT_MAX,
            rate_limit_window: DEFAULT_RATE_LIMIT_WINDOW,
            json_body_limit: DEFAULT_JSON_BODY_LIMIT,
        }
    }
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let set = |v: &Option<String>| if v.is_some() { "<set>" } else { "<unset>" };
        f.debug_struct("ServerConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("grok_api_key", &set(&self.grok_api_key))
            .field("gemini_api_key", &set(&self.gemini_api_key))
            .field("github_token", &set(&self.github_token))
            .field("grok_model", &self.grok_model)
            .field("gemini_model", &self.gemini_model)
            .field("rate_limit_max", &self.rate_limit_max)
            .field("rate_limit_window", &self.rate_limit_window)
            .field("json_body_limit", &self.json_body_limit)
            .finish_non_exhaustive()
    }
}

impl ServerConfig {
    /// Read configuration from the process environment.
    ///
    /// # Errors
    ///
    /// * If a numeric variable cannot be parsed
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable source.
    ///
    /// Empty values are treated as unset.
    ///
    /// # Errors
    ///
    /// * If a numeric variable cannot be parsed
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        Ok(Self {
            host: get("HOST").unwrap_or(defaults.host),
            port: parse_var("PORT", get("PORT"))?.unwrap_or(defaults.port),
            grok_api_key: get("GROK_API_KEY"),
            gemini_api_key: get("GEMINI_API_KEY"),
            github_token: get("GITHUB_TOKEN"),
            grok_model: get("GROK_MODEL"),
            gemini_model: get("GEMINI_MODEL"),
            grok_base_url: get("GROK_BASE_URL"),
            gemini_base_url: get("GEMINI_BASE_URL"),
            github_base_url: get("GITHUB_API_URL"),
            rate_limit_max: parse_var("RATE_LIMIT_MAX", get("RATE_LIMIT_MAX"))?
                .unwrap_or(defaults.rate_limit_max),
            rate_limit_window: parse_var::<u64>(
                "RATE_LIMIT_WINDOW_SECS",
                get("RATE_LIMIT_WINDOW_SECS"),
            )?
            .map_or(defaults.rate_limit_window, Duration::from_secs),
            json_body_limit: parse_var("JSON_BODY_LIMIT", get("JSON_BODY_LIMIT"))?
                .unwrap_or(defaults.json_body_limit),
            ..defaults
        })
    }

    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    #[must_use]
    pub fn with_host(mut self, host: String) -> Self {
        self.host = host;
        self
    }

    #[must_use]
    pub fn with_api_key(mut self, provider: Provider, key: Option<String>) -> Self {
        match provider {
            Provider::Grok => self.grok_api_key = key,
            Provider::Gemini => self.gemini_api_key = key,
        }
        self
    }

    #[must_use]
    pub fn with_ai_base_url(mut self, provider: Provider, base_url: Option<String>) -> Self {
        match provider {
            Provider::Grok => self.grok_base_url = base_url,
            Provider::Gemini => self.gemini_base_url = base_url,
        }
        self
    }

    #[must_use]
    pub fn with_github_token(mut self, token: Option<String>) -> Self {
        self.github_token = token;
        self
    }

    #[must_use]
    pub fn with_github_base_url(mut self, base_url: Option<String>) -> Self {
        self.github_base_url = base_url;
        self
    }

    #[must_use]
    pub const fn with_retry_delays(mut self, ai: Duration, ingest: Duration) -> Self {
        self.ai_retry_delay = ai;
        self.ingest_retry_delay = ingest;
        self
    }

    #[must_use]
    pub const fn with_rate_limit(mut self, max_requests: u32, window: Duration) -> Self {
        self.rate_limit_max = max_requests;
        self.rate_limit_window = window;
        self
    }

    #[must_use]
    pub const fn with_json_body_limit(mut self, limit: usize) -> Self {
        self.json_body_limit = limit;
        self
    }
}

fn parse_var<T>(name: &'static str, value: Option<String>) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| ConfigError::InvalidValue {
                    name,
                    reason: e.to_string(),
                    value: raw,
                })
        })
        .transpose()
}
