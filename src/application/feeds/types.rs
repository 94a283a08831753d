use thiserror::Error;
use time::OffsetDateTime;

use crate::application::repos::RepoError;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("permission denied")]
    PermissionDenied,
    #[error("feed not found")]
    NotFound,
    /// Carries the public message.
    #[error("{0}")]
    Validation(&'static str),
    #[error("failed to insert feed")]
    InsertFailed(#[source] RepoError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone, Default)]
pub struct ListFeedsQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    /// Raw `type` query value: empty, `publish`, `draft` or `private`.
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct CreateFeedCommand {
    pub title: Option<String>,
    pub content: Option<String>,
    pub summary: Option<String>,
    pub alias: Option<String>,
    pub status: Option<String>,
    pub property: Option<String>,
    pub allow_comment: Option<bool>,
    pub tags: Vec<String>,
    pub categories: Vec<String>,
    pub created_at: Option<OffsetDateTime>,
    pub updated_at: Option<OffsetDateTime>,
}

/// Fields left as `None` keep their stored value.
#[derive(Debug, Clone, Default)]
pub struct UpdateFeedCommand {
    pub title: Option<String>,
    pub content: Option<String>,
    pub summary: Option<String>,
    /// An empty alias clears it.
    pub alias: Option<String>,
    pub status: Option<String>,
    pub property: Option<String>,
    pub top: Option<i32>,
    pub allow_comment: Option<bool>,
    pub tags: Option<Vec<String>>,
    pub categories: Option<Vec<String>>,
    pub created_at: Option<OffsetDateTime>,
    pub updated_at: Option<OffsetDateTime>,
}

/// Returns the value when it holds anything besides whitespace.
pub fn ensure_non_empty(
    value: Option<String>,
    message: &'static str,
) -> Result<String, FeedError> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(FeedError::Validation(message)),
    }
}

pub(crate) fn normalize_alias(alias: Option<String>) -> Option<String> {
    alias
        .map(|alias| alias.trim().to_string())
        .filter(|alias| !alias.is_empty())
}
