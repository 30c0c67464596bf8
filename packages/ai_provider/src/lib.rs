#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! AI dispatch for `PromptLift`.
//!
//! [`AiDispatcher`] turns a provider identifier and a message into one
//! outbound call to that provider's API and returns the generated text.

mod dispatcher;
mod provider;

pub use dispatcher::{AiCredentials, AiDispatcher, DEFAULT_RETRY_DELAY};
pub use promptlift_ai_provider_models as models;
pub use provider::{
    AiProviderError, DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL, DEFAULT_GROK_BASE_URL,
    DEFAULT_GROK_MODEL, ProviderEndpoint,
};
