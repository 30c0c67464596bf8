use promptlift_git_provider_models::ContentEntry;

/// Failures reported by a repository host.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepoHostError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Invalid content for {path}: {reason}")]
    InvalidContent { path: String, reason: String },
}

impl RepoHostError {
    #[must_use]
    pub const fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited(_))
    }
}

/// Read access to a hosted repository's file tree.
#[async_trait::async_trait]
pub trait RepoHost: Send + Sync {
    /// List the entries of the directory at `path` (`""` for the root),
    /// in the host's listing order.
    async fn list_contents(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
    ) -> Result<Vec<ContentEntry>, RepoHostError>;

    /// Fetch a file and decode it to text.
    async fn get_file_content(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
    ) -> Result<String, RepoHostError>;

    fn provider_name(&self) -> &str;
}
