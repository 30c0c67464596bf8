#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! AI provider models for `PromptLift`.
//!
//! Identifiers shared between the dispatcher and the HTTP surface: which
//! upstream model service to call and the quality level threaded into
//! prompt text.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// An upstream large-language-model service.
#[derive(
    Debug,
    Copy,
    Clone,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    AsRefStr,
    Display,
    EnumIter,
    EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Provider {
    /// xAI Grok chat completions.
    Grok,
    /// Google Gemini `generateContent`.
    Gemini,
}

impl Provider {
    /// Human-readable product name.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Grok => "Grok",
            Self::Gemini => "Gemini",
        }
    }
}

/// Requested quality level. Only interpolated into prompt text.
#[derive(
    Debug,
    Copy,
    Clone,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    AsRefStr,
    Display,
    EnumIter,
    EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Level {
    #[default]
    Basic,
    Advanced,
    Production,
}
