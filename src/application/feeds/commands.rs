use time::OffsetDateTime;
use tracing::info;

use crate::application::auth::Viewer;
use crate::application::repos::{CreateFeedParams, UpdateFeedParams};
use crate::domain::entities::FeedRecord;
use crate::domain::types::{FeedProperty, FeedStatus, MetaType};

use super::service::FeedService;
use super::types::{
    CreateFeedCommand, FeedError, UpdateFeedCommand, ensure_non_empty, normalize_alias,
};

impl FeedService {
    /// Creates a feed owned by the viewer and binds its tags and
    /// categories. Returns the new id.
    pub async fn create(
        &self,
        viewer: Viewer,
        command: CreateFeedCommand,
    ) -> Result<i64, FeedError> {
        let uid = match viewer.uid {
            Some(uid) if viewer.admin => uid,
            _ => return Err(FeedError::PermissionDenied),
        };
        let title = ensure_non_empty(command.title, "Title is required")?;
        let content = ensure_non_empty(command.content, "Content is required")?;

        if self
            .reader
            .find_by_title_or_content(&title, &content)
            .await?
            .is_some()
        {
            return Err(FeedError::Validation("Content already exists"));
        }

        let now = OffsetDateTime::now_utc();
        let alias = normalize_alias(command.alias);
        let params = CreateFeedParams {
            alias: alias.clone(),
            title,
            summary: command.summary.unwrap_or_default(),
            content,
            property: FeedProperty::parse_or_default(command.property.as_deref()),
            uid,
            allow_comment: command.allow_comment.unwrap_or(true),
            status: FeedStatus::parse_or_default(command.status.as_deref()),
            created_at: command.created_at.unwrap_or(now),
            updated_at: command.updated_at.unwrap_or(now),
        };
        let id = self
            .writer
            .create_feed(params)
            .await
            .map_err(FeedError::InsertFailed)?;

        let (tags, categories) = (command.tags, command.categories);
        let bound = async {
            if !tags.is_empty() {
                self.binder.bind(id, &tags, MetaType::Tag).await?;
            }
            if !categories.is_empty() {
                self.binder
                    .bind(id, &categories, MetaType::Category)
                    .await?;
            }
            Ok::<_, FeedError>(())
        }
        .await;

        // The row is committed even when binding fails.
        self.cache.feed_changed(id, None, alias.as_deref());
        bound?;
        info!(target = "inkpad::feeds", feed_id = id, uid, "Created feed");
        Ok(id)
    }

    /// Applies the fields present in `command`. Status and property are
    /// always written and fall back to `publish` and `post`. Tag and
    /// category lists replace the bound set when given.
    pub async fn update(
        &self,
        viewer: Viewer,
        id: i64,
        command: UpdateFeedCommand,
    ) -> Result<(), FeedError> {
        let feed = self.owned_feed(viewer, id).await?;

        let alias = command.alias.map(|alias| normalize_alias(Some(alias)));
        let params = UpdateFeedParams {
            id,
            title: command.title,
            alias: alias.clone(),
            content: command.content,
            summary: command.summary,
            top: command.top,
            status: Some(FeedStatus::parse_or_default(command.status.as_deref())),
            property: Some(FeedProperty::parse_or_default(
                command.property.as_deref(),
            )),
            allow_comment: command.allow_comment,
            created_at: command.created_at,
            updated_at: command.updated_at,
        };
        self.writer.update_feed(params).await?;

        let (tags, categories) = (command.tags, command.categories);
        let bound = async {
            if let Some(tags) = tags.as_deref() {
                self.binder.bind(id, tags, MetaType::Tag).await?;
            }
            if let Some(categories) = categories.as_deref() {
                self.binder.bind(id, categories, MetaType::Category).await?;
            }
            Ok::<_, FeedError>(())
        }
        .await;

        let new_alias = alias.flatten();
        self.cache
            .feed_changed(id, feed.alias.as_deref(), new_alias.as_deref());
        bound?;
        info!(target = "inkpad::feeds", feed_id = id, "Updated feed");
        Ok(())
    }

    /// Sets the pin weight; higher values sort first.
    pub async fn pin(&self, viewer: Viewer, id: i64, top: i32) -> Result<(), FeedError> {
        let feed = self.owned_feed(viewer, id).await?;
        self.writer.update_top(id, top).await?;
        self.cache.feed_changed(id, feed.alias.as_deref(), None);
        Ok(())
    }

    pub async fn delete(&self, viewer: Viewer, id: i64) -> Result<(), FeedError> {
        let feed = self.owned_feed(viewer, id).await?;
        self.writer.delete_feed(id).await?;
        self.cache.feed_changed(id, feed.alias.as_deref(), None);
        info!(target = "inkpad::feeds", feed_id = id, "Deleted feed");
        Ok(())
    }

    async fn owned_feed(&self, viewer: Viewer, id: i64) -> Result<FeedRecord, FeedError> {
        if !viewer.is_signed_in() {
            return Err(FeedError::PermissionDenied);
        }
        let feed = self
            .reader
            .find_by_id(id)
            .await?
            .ok_or(FeedError::NotFound)?;
        if !viewer.can_manage(feed.uid) {
            return Err(FeedError::PermissionDenied);
        }
        Ok(feed)
    }
}
