//! Reader comments on feeds.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::application::auth::Viewer;
use crate::application::repos::{CommentsRepo, CreateCommentParams, FeedsRepo, RepoError};
use crate::domain::entities::{CommentWithAuthor, FeedRecord};
use crate::domain::types::FeedStatus;

#[derive(Debug, Error)]
pub enum CommentError {
    #[error("permission denied")]
    PermissionDenied,
    #[error("not found")]
    NotFound,
    #[error("content is required")]
    ContentRequired,
    #[error("comments are disabled for this feed")]
    NotAllowed,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Clone)]
pub struct CommentService {
    comments: Arc<dyn CommentsRepo>,
    feeds: Arc<dyn FeedsRepo>,
}

impl CommentService {
    pub fn new(comments: Arc<dyn CommentsRepo>, feeds: Arc<dyn FeedsRepo>) -> Self {
        Self { comments, feeds }
    }

    pub async fn list(
        &self,
        viewer: Viewer,
        feed_id: i64,
    ) -> Result<Vec<CommentWithAuthor>, CommentError> {
        self.visible_feed(viewer, feed_id).await?;
        Ok(self.comments.list_for_feed(feed_id).await?)
    }

    pub async fn create(
        &self,
        viewer: Viewer,
        feed_id: i64,
        content: Option<String>,
    ) -> Result<i64, CommentError> {
        let user_id = viewer.uid.ok_or(CommentError::PermissionDenied)?;
        let content = content
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or(CommentError::ContentRequired)?;

        let feed = self.visible_feed(viewer, feed_id).await?;
        if !feed.allow_comment {
            return Err(CommentError::NotAllowed);
        }

        let id = self
            .comments
            .create_comment(CreateCommentParams {
                feed_id,
                user_id,
                content,
            })
            .await?;
        info!(
            target = "inkpad::comments",
            comment_id = id,
            feed_id,
            user_id,
            "Created comment"
        );
        Ok(id)
    }

    /// Authors and admins may delete a comment.
    pub async fn delete(&self, viewer: Viewer, id: i64) -> Result<(), CommentError> {
        if !viewer.is_signed_in() {
            return Err(CommentError::PermissionDenied);
        }
        let comment = self
            .comments
            .find_comment(id)
            .await?
            .ok_or(CommentError::NotFound)?;
        if !viewer.can_manage(comment.user_id) {
            return Err(CommentError::PermissionDenied);
        }
        self.comments.delete_comment(id).await?;
        Ok(())
    }

    async fn visible_feed(&self, viewer: Viewer, feed_id: i64) -> Result<FeedRecord, CommentError> {
        let feed = self
            .feeds
            .find_by_id(feed_id)
            .await?
            .ok_or(CommentError::NotFound)?;
        if feed.status != FeedStatus::Publish && !viewer.can_manage(feed.uid) {
            return Err(CommentError::PermissionDenied);
        }
        Ok(feed)
    }
}
