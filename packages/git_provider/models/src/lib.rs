#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Optional scheme and user info, then `github.com` as the whole host.
static REPO_URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^(?:[A-Za-z][A-Za-z0-9+.-]*://)?(?:[^@/\s]+@)?(?:www\.)?github\.com[/:]",
        r"([A-Za-z0-9_.-]+)/([A-Za-z0-9_.-]+?)(?:\.git)?(?:[/?#].*)?$",
    ))
    .unwrap()
});

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid repository URL: {0}")]
pub struct ParseRepoUrlError(pub String);

/// Owner and name of a hosted repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoCoordinate {
    pub owner: String,
    pub name: String,
}

impl RepoCoordinate {
    #[must_use]
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Parse `github.com/<owner>/<repo>[.git]`, with or without a scheme.
    ///
    /// # Errors
    ///
    /// * If `url` is not hosted on `github.com` or lacks an owner and name
    pub fn parse_url(url: &str) -> Result<Self, ParseRepoUrlError> {
        let trimmed = url.trim();
        let captures = REPO_URL_REGEX
            .captures(trimmed)
            .ok_or_else(|| ParseRepoUrlError(url.to_string()))?;

        let owner = &captures[1];
        let name = &captures[2];

        if name.is_empty() || name == "." || name == ".." || owner == "." || owner == ".." {
            return Err(ParseRepoUrlError(url.to_string()));
        }

        Ok(Self::new(owner, name))
    }
}

impl FromStr for RepoCoordinate {
    type Err = ParseRepoUrlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_url(s)
    }
}

impl fmt::Display for RepoCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Dir,
    Symlink,
    Submodule,
    #[serde(other)]
    Other,
}

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentEntry {
    pub name: String,
    /// Path from the repository root.
    pub path: String,
    pub kind: EntryKind,
}

impl ContentEntry {
    #[must_use]
    pub fn new(path: impl Into<String>, kind: EntryKind) -> Self {
        let path = path.into();
        let name = path.rsplit('/').next().unwrap_or(&path).to_string();
        Self { name, path, kind }
    }
}
