//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;

use crate::domain::entities::{
    CommentRecord, CommentWithAuthor, FeedAggregate, FeedRecord, FriendRecord, InfoRecord,
    MetaRecord, MetaWithCount, TimelineEntry, UserRecord, UserTokenRecord,
};
use crate::domain::types::{FeedProperty, FeedStatus, MetaType};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Row predicate shared by the feed count and the feed page query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedListFilter {
    /// `status = publish AND property = post`
    PublishedPosts,
    Status(FeedStatus),
}

#[derive(Debug, Clone)]
pub struct CreateFeedParams {
    pub alias: Option<String>,
    pub title: String,
    pub summary: String,
    pub content: String,
    pub property: FeedProperty,
    pub uid: i64,
    pub allow_comment: bool,
    pub status: FeedStatus,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Partial update; `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdateFeedParams {
    pub id: i64,
    pub title: Option<String>,
    /// `Some(None)` clears the alias.
    pub alias: Option<Option<String>>,
    pub content: Option<String>,
    pub summary: Option<String>,
    pub top: Option<i32>,
    pub status: Option<FeedStatus>,
    pub property: Option<FeedProperty>,
    pub allow_comment: Option<bool>,
    pub created_at: Option<OffsetDateTime>,
    pub updated_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone)]
pub struct CreateMetaParams {
    pub name: String,
    pub alias: Option<String>,
    pub kind: MetaType,
}

#[derive(Debug, Clone)]
pub struct CreateCommentParams {
    pub feed_id: i64,
    pub user_id: i64,
    pub content: String,
}

#[derive(Debug, Clone)]
pub struct CreateFriendParams {
    pub name: String,
    pub desc: String,
    pub avatar: String,
    pub url: String,
    pub uid: i64,
    pub accepted: bool,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateFriendParams {
    pub id: i64,
    pub name: Option<String>,
    pub desc: Option<String>,
    pub avatar: Option<String>,
    pub url: Option<String>,
    pub accepted: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct UpsertUserParams {
    pub username: String,
    pub openid: String,
    pub avatar: Option<String>,
    pub permission: bool,
}

#[derive(Debug, Clone)]
pub struct CreateUserTokenParams {
    pub user_id: i64,
    pub prefix: String,
    pub hashed_secret: Vec<u8>,
}

#[async_trait]
pub trait FeedsRepo: Send + Sync {
    async fn count_feeds(&self, filter: FeedListFilter) -> Result<u64, RepoError>;

    /// Ordered by `top DESC, created_at DESC`.
    async fn list_feeds(
        &self,
        filter: FeedListFilter,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<FeedAggregate>, RepoError>;

    async fn list_timeline(&self) -> Result<Vec<TimelineEntry>, RepoError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<FeedRecord>, RepoError>;

    /// Resolves a path segment that is either a numeric id or an alias.
    async fn find_aggregate(&self, id_or_alias: &str) -> Result<Option<FeedAggregate>, RepoError>;

    async fn find_by_title_or_content(
        &self,
        title: &str,
        content: &str,
    ) -> Result<Option<FeedRecord>, RepoError>;

    /// Case-insensitive substring search over title, content, summary and
    /// alias, newest first.
    async fn search_feeds(&self, keyword: &str) -> Result<Vec<FeedAggregate>, RepoError>;
}

#[async_trait]
pub trait FeedsWriteRepo: Send + Sync {
    async fn create_feed(&self, params: CreateFeedParams) -> Result<i64, RepoError>;

    async fn update_feed(&self, params: UpdateFeedParams) -> Result<(), RepoError>;

    async fn update_top(&self, id: i64, top: i32) -> Result<(), RepoError>;

    async fn update_views(&self, id: i64, views: i64) -> Result<(), RepoError>;

    async fn delete_feed(&self, id: i64) -> Result<(), RepoError>;
}

#[async_trait]
pub trait MetasRepo: Send + Sync {
    async fn list_with_counts(&self, kind: Option<MetaType>)
    -> Result<Vec<MetaWithCount>, RepoError>;

    async fn find_by_alias_or_name(&self, value: &str) -> Result<Option<MetaRecord>, RepoError>;

    async fn find_by_name(&self, name: &str, kind: MetaType)
    -> Result<Option<MetaRecord>, RepoError>;

    async fn create_meta(&self, params: CreateMetaParams) -> Result<MetaRecord, RepoError>;

    async fn list_feeds_for_meta(
        &self,
        meta_id: i64,
        include_unpublished: bool,
    ) -> Result<Vec<FeedAggregate>, RepoError>;
}

/// Join rows between feeds and metas.
#[async_trait]
pub trait FeedMetasRepo: Send + Sync {
    async fn clear_feed_metas(&self, feed_id: i64, kind: MetaType) -> Result<(), RepoError>;

    async fn insert_feed_meta(
        &self,
        feed_id: i64,
        meta_id: i64,
        kind: MetaType,
    ) -> Result<(), RepoError>;
}

#[async_trait]
pub trait CommentsRepo: Send + Sync {
    /// Newest first.
    async fn list_for_feed(&self, feed_id: i64) -> Result<Vec<CommentWithAuthor>, RepoError>;

    async fn find_comment(&self, id: i64) -> Result<Option<CommentRecord>, RepoError>;

    async fn create_comment(&self, params: CreateCommentParams) -> Result<i64, RepoError>;

    async fn delete_comment(&self, id: i64) -> Result<(), RepoError>;
}

#[async_trait]
pub trait FriendsRepo: Send + Sync {
    /// Ordered by creation time.
    async fn list_friends(&self) -> Result<Vec<FriendRecord>, RepoError>;

    async fn find_friend(&self, id: i64) -> Result<Option<FriendRecord>, RepoError>;

    async fn find_by_owner(&self, uid: i64) -> Result<Option<FriendRecord>, RepoError>;

    async fn create_friend(&self, params: CreateFriendParams) -> Result<i64, RepoError>;

    async fn update_friend(&self, params: UpdateFriendParams) -> Result<(), RepoError>;

    async fn delete_friend(&self, id: i64) -> Result<(), RepoError>;
}

#[async_trait]
pub trait InfoRepo: Send + Sync {
    /// Entries whose key starts with `prefix`.
    async fn list_info(&self, prefix: &str) -> Result<Vec<InfoRecord>, RepoError>;

    async fn upsert_info(&self, key: &str, value: &str) -> Result<(), RepoError>;
}

#[async_trait]
pub trait UsersRepo: Send + Sync {
    async fn find_user(&self, id: i64) -> Result<Option<UserRecord>, RepoError>;

    async fn upsert_user(&self, params: UpsertUserParams) -> Result<UserRecord, RepoError>;
}

#[async_trait]
pub trait UserTokensRepo: Send + Sync {
    async fn create_token(&self, params: CreateUserTokenParams)
    -> Result<UserTokenRecord, RepoError>;

    async fn find_by_prefix(&self, prefix: &str) -> Result<Option<UserTokenRecord>, RepoError>;

    async fn touch_token(&self, id: i64, at: OffsetDateTime) -> Result<(), RepoError>;
}
