//! Concatenates a repository's file tree into one text blob.

use std::time::Duration;

use futures::future::BoxFuture;
use promptlift_git_provider_models::{EntryKind, RepoCoordinate};

use crate::provider::{RepoHost, RepoHostError};

/// Delay before restarting a traversal that hit a rate limit.
pub const DEFAULT_FLATTEN_RETRY_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Failed to fetch repository {owner}/{repo}: {source}")]
pub struct FlattenError {
    pub owner: String,
    pub repo: String,
    #[source]
    pub source: RepoHostError,
}

impl FlattenError {
    #[must_use]
    pub const fn is_rate_limited(&self) -> bool {
        self.source.is_rate_limited()
    }
}

/// Flatten the whole repository starting at its root.
///
/// # Errors
///
/// * If any listing or file fetch fails; nothing fetched so far is returned
pub async fn flatten_repo(
    host: &dyn RepoHost,
    coordinate: &RepoCoordinate,
) -> Result<String, FlattenError> {
    flatten(host, &coordinate.owner, &coordinate.name, "").await
}

/// Flatten the subtree rooted at `path`.
///
/// Every file contributes `"<path>:\n<content>\n\n"`, in listing order,
/// depth first. Entries that are neither files nor directories are skipped.
///
/// # Errors
///
/// * If any listing or file fetch fails; nothing fetched so far is returned
pub async fn flatten(
    host: &dyn RepoHost,
    owner: &str,
    repo: &str,
    path: &str,
) -> Result<String, FlattenError> {
    let mut output = String::new();
    walk(host, owner, repo, path.to_string(), &mut output)
        .await
        .map_err(|source| {
            log::error!("Failed to flatten {owner}/{repo}: {source}");
            FlattenError {
                owner: owner.to_string(),
                repo: repo.to_string(),
                source,
            }
        })?;
    Ok(output)
}

/// Flatten the repository, restarting once from the root after `delay` if
/// the first attempt was rate limited.
///
/// # Errors
///
/// * If the first attempt fails for any other reason
/// * If the second attempt fails
pub async fn flatten_with_retry(
    host: &dyn RepoHost,
    coordinate: &RepoCoordinate,
    delay: Duration,
) -> Result<String, FlattenError> {
    match flatten_repo(host, coordinate).await {
        Err(e) if e.is_rate_limited() => {
            log::warn!("Rate limited while fetching {coordinate}, retrying once in {delay:?}");
            tokio::time::sleep(delay).await;
            flatten_repo(host, coordinate).await
        }
        result => result,
    }
}

fn walk<'a>(
    host: &'a dyn RepoHost,
    owner: &'a str,
    repo: &'a str,
    path: String,
    output: &'a mut String,
) -> BoxFuture<'a, Result<(), RepoHostError>> {
    Box::pin(async move {
        log::trace!("Listing {owner}/{repo}:/{path}");
        let entries = host.list_contents(owner, repo, &path).await?;

        for entry in entries {
            match entry.kind {
                EntryKind::File => {
                    let content = host.get_file_content(owner, repo, &entry.path).await?;
                    output.push_str(&entry.path);
                    output.push_str(":\n");
                    output.push_str(&content);
                    output.push_str("\n\n");
                }
                EntryKind::Dir => walk(host, owner, repo, entry.path, output).await?,
                EntryKind::Symlink | EntryKind::Submodule | EntryKind::Other => {
                    log::debug!("Skipping {:?} entry {}", entry.kind, entry.path);
                }
            }
        }

        Ok(())
    })
}
