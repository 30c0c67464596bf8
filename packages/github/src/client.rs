use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use promptlift_git_provider::models::ContentEntry;
use promptlift_git_provider::{RepoHost, RepoHostError};
use promptlift_github_models::{GithubContentItem, GithubContentsResponse, GithubErrorResponse};
use reqwest::StatusCode;
use reqwest::header::HeaderMap;

pub struct GitHubProvider {
    http_client: reqwest::Client,
    auth_token: Option<String>,
    base_url: String,
}

impl GitHubProvider {
    /// Create a new GitHub provider without authentication.
    #[must_use]
    pub fn new() -> Self {
        let http_client = reqwest::Client::builder()
            .user_agent("PromptLift")
            .build()
            .unwrap_or_default();
        Self {
            http_client,
            auth_token: None,
            base_url: "https://api.github.com".to_string(),
        }
    }

    #[must_use]
    pub fn with_token(mut self, token: String) -> Self {
        self.auth_token = Some(token).filter(|t| !t.is_empty());
        self
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.auth_token.is_some()
    }

    fn contents_url(&self, owner: &str, repo: &str, path: &str) -> String {
        let mut url = format!(
            "{}/repos/{}/{}/contents",
            self.base_url,
            urlencoding::encode(owner),
            urlencoding::encode(repo)
        );
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            url.push('/');
            url.push_str(&urlencoding::encode(segment));
        }
        url
    }

    async fn get_contents(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
    ) -> Result<GithubContentsResponse, RepoHostError> {
        let url = self.contents_url(owner, repo, path);
        log::debug!("GET {url}");
        let mut request = self
            .http_client
            .get(&url)
            .header("Accept", "application/vnd.github.v3+json");

        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| RepoHostError::Transport(e.to_string()))?;
        let status = response.status();

        if !status.is_success() {
            let headers = response.headers().clone();
            let body = response.text().await.unwrap_or_default();
            log::error!("GitHub API error: {body}");
            return Err(classify_error(status, &headers, &body, &url));
        }

        response
            .json()
            .await
            .map_err(|e| RepoHostError::InvalidContent {
                path: path.to_string(),
                reason: e.to_string(),
            })
    }
}

impl Default for GitHubProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl RepoHost for GitHubProvider {
    async fn list_contents(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
    ) -> Result<Vec<ContentEntry>, RepoHostError> {
        let entries = match self.get_contents(owner, repo, path).await? {
            GithubContentsResponse::Listing(items) => items.into_iter().map(Into::into).collect(),
            GithubContentsResponse::Item(item) => vec![ContentEntry::from(*item)],
        };
        Ok(entries)
    }

    async fn get_file_content(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
    ) -> Result<String, RepoHostError> {
        match self.get_contents(owner, repo, path).await? {
            GithubContentsResponse::Item(item) => decode_content(&item),
            GithubContentsResponse::Listing(_) => Err(RepoHostError::InvalidContent {
                path: path.to_string(),
                reason: "expected a file, got a directory listing".to_string(),
            }),
        }
    }

    fn provider_name(&self) -> &str {
        "github"
    }
}

fn decode_content(item: &GithubContentItem) -> Result<String, RepoHostError> {
    let content = item.content.as_deref().unwrap_or_default();

    if item.encoding.as_deref() != Some("base64") {
        return Ok(content.to_string());
    }

    let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD
        .decode(compact)
        .map_err(|e| RepoHostError::InvalidContent {
            path: item.path.clone(),
            reason: e.to_string(),
        })?;

    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn classify_error(status: StatusCode, headers: &HeaderMap, body: &str, url: &str) -> RepoHostError {
    let message = serde_json::from_str::<GithubErrorResponse>(body)
        .map(|e| e.message)
        .unwrap_or_else(|_| body.to_string());

    let quota_exhausted = headers
        .get("x-ratelimit-remaining")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.trim() == "0");

    match status {
        StatusCode::NOT_FOUND => RepoHostError::NotFound(url.to_string()),
        StatusCode::UNAUTHORIZED => RepoHostError::Unauthorized(message),
        StatusCode::TOO_MANY_REQUESTS => RepoHostError::RateLimited(message),
        StatusCode::FORBIDDEN if quota_exhausted => RepoHostError::RateLimited(message),
        _ => RepoHostError::Api {
            status: status.as_u16(),
            message,
        },
    }
}
