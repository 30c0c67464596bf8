#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use promptlift_git_provider_models::{ContentEntry, EntryKind};
use serde::{Deserialize, Serialize};

/// An item from `GET /repos/{owner}/{repo}/contents/{path}`.
///
/// Directory listings return an array of these without `content`; a file
/// request returns a single item with `content` and `encoding` set.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GithubContentItem {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    #[serde(default)]
    pub size: u64,
    pub sha: Option<String>,
    pub content: Option<String>,
    pub encoding: Option<String>,
}

impl From<GithubContentItem> for ContentEntry {
    fn from(item: GithubContentItem) -> Self {
        Self {
            name: item.name,
            path: item.path,
            kind: item.kind,
        }
    }
}

/// Contents endpoint response: a listing for directories, a single item
/// otherwise.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum GithubContentsResponse {
    Listing(Vec<GithubContentItem>),
    Item(Box<GithubContentItem>),
}

/// Error body returned by the GitHub REST API.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GithubErrorResponse {
    pub message: String,
    pub documentation_url: Option<String>,
}
