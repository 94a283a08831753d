//! Request bodies and response shapes of the JSON API.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::application::auth::Viewer;
use crate::application::feeds::{CreateFeedCommand, ListFeedsQuery, UpdateFeedCommand};
use crate::application::friends::{CreateFriendCommand, UpdateFriendCommand};
use crate::application::metas::MetaDetail;
use crate::domain::content::{extract_image, summary_or_excerpt};
use crate::domain::entities::{FeedAggregate, FeedRecord, MetaRecord, MetaRef, UserRecord, UserSummary};
use crate::domain::types::{FeedProperty, FeedStatus, MetaType};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FeedListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

impl From<FeedListQuery> for ListFeedsQuery {
    fn from(query: FeedListQuery) -> Self {
        Self {
            page: query.page,
            limit: query.limit,
            kind: query.kind,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct MetaListQuery {
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FeedCreateRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub summary: Option<String>,
    pub alias: Option<String>,
    pub status: Option<String>,
    pub property: Option<String>,
    pub tags: Option<Vec<String>>,
    pub categories: Option<Vec<String>>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
    pub allow_comment: Option<bool>,
}

impl From<FeedCreateRequest> for CreateFeedCommand {
    fn from(body: FeedCreateRequest) -> Self {
        Self {
            title: body.title,
            content: body.content,
            summary: body.summary,
            alias: body.alias,
            status: body.status,
            property: body.property,
            allow_comment: body.allow_comment,
            tags: body.tags.unwrap_or_default(),
            categories: body.categories.unwrap_or_default(),
            created_at: body.created_at,
            updated_at: body.updated_at,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FeedUpdateRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub summary: Option<String>,
    pub alias: Option<String>,
    pub status: Option<String>,
    pub property: Option<String>,
    pub top: Option<i32>,
    pub tags: Option<Vec<String>>,
    pub categories: Option<Vec<String>>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
    pub allow_comment: Option<bool>,
}

impl From<FeedUpdateRequest> for UpdateFeedCommand {
    fn from(body: FeedUpdateRequest) -> Self {
        Self {
            title: body.title,
            content: body.content,
            summary: body.summary,
            alias: body.alias,
            status: body.status,
            property: body.property,
            top: body.top,
            allow_comment: body.allow_comment,
            tags: body.tags,
            categories: body.categories,
            created_at: body.created_at,
            updated_at: body.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PinRequest {
    pub top: i32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CommentCreateRequest {
    pub content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FriendCreateRequest {
    pub name: Option<String>,
    pub desc: Option<String>,
    pub avatar: Option<String>,
    pub url: Option<String>,
}

impl From<FriendCreateRequest> for CreateFriendCommand {
    fn from(body: FriendCreateRequest) -> Self {
        Self {
            name: body.name,
            desc: body.desc,
            avatar: body.avatar,
            url: body.url,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FriendUpdateRequest {
    pub name: Option<String>,
    pub desc: Option<String>,
    pub avatar: Option<String>,
    pub url: Option<String>,
    pub accepted: Option<bool>,
}

impl From<FriendUpdateRequest> for UpdateFriendCommand {
    fn from(body: FriendUpdateRequest) -> Self {
        Self {
            name: body.name,
            desc: body.desc,
            avatar: body.avatar,
            url: body.url,
            accepted: body.accepted,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertedId {
    pub inserted_id: i64,
}

/// Listing and search item. Content is replaced by a summary and the first
/// image; `status` and `property` are only shown to admins.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedListItem {
    pub id: i64,
    pub alias: Option<String>,
    pub title: String,
    pub summary: String,
    pub tags: Vec<MetaRef>,
    pub categories: Vec<MetaRef>,
    pub avatar: Option<String>,
    pub top: i32,
    pub uid: i64,
    pub allow_comment: bool,
    pub views: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    pub user: Option<UserSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<FeedStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property: Option<FeedProperty>,
}

impl FeedListItem {
    pub fn shape(aggregate: FeedAggregate, viewer: Viewer) -> Self {
        let tags = aggregate.metas_of(MetaType::Tag);
        let categories = aggregate.metas_of(MetaType::Category);
        let FeedAggregate { feed, author, .. } = aggregate;

        Self {
            id: feed.id,
            summary: summary_or_excerpt(&feed.summary, &feed.content),
            avatar: extract_image(&feed.content),
            alias: feed.alias,
            title: feed.title,
            tags,
            categories,
            top: feed.top,
            uid: feed.uid,
            allow_comment: feed.allow_comment,
            views: feed.views,
            created_at: feed.created_at,
            updated_at: feed.updated_at,
            user: author,
            status: viewer.admin.then_some(feed.status),
            property: viewer.admin.then_some(feed.property),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FeedDetailView {
    #[serde(flatten)]
    pub feed: FeedRecord,
    pub tags: Vec<MetaRef>,
    pub categories: Vec<MetaRef>,
    pub user: Option<UserSummary>,
}

impl From<FeedAggregate> for FeedDetailView {
    fn from(aggregate: FeedAggregate) -> Self {
        let tags = aggregate.metas_of(MetaType::Tag);
        let categories = aggregate.metas_of(MetaType::Category);
        Self {
            feed: aggregate.feed,
            tags,
            categories,
            user: aggregate.author,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaFeedItem {
    pub id: i64,
    pub alias: Option<String>,
    pub title: String,
    pub summary: String,
    pub content: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    pub user: Option<UserSummary>,
    pub tags: Vec<MetaRef>,
    pub categories: Vec<MetaRef>,
}

impl From<FeedAggregate> for MetaFeedItem {
    fn from(aggregate: FeedAggregate) -> Self {
        let tags = aggregate.metas_of(MetaType::Tag);
        let categories = aggregate.metas_of(MetaType::Category);
        let FeedAggregate { feed, author, .. } = aggregate;
        Self {
            id: feed.id,
            alias: feed.alias,
            title: feed.title,
            summary: feed.summary,
            content: feed.content,
            created_at: feed.created_at,
            updated_at: feed.updated_at,
            user: author,
            tags,
            categories,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MetaDetailView {
    #[serde(flatten)]
    pub meta: MetaRecord,
    pub feeds: Vec<MetaFeedItem>,
}

impl From<MetaDetail> for MetaDetailView {
    fn from(detail: MetaDetail) -> Self {
        Self {
            meta: detail.meta,
            feeds: detail.feeds.into_iter().map(MetaFeedItem::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    pub avatar: Option<String>,
    pub permission: bool,
}

impl From<UserRecord> for UserProfile {
    fn from(user: UserRecord) -> Self {
        Self {
            id: user.id,
            username: user.username,
            avatar: user.avatar,
            permission: user.permission,
        }
    }
}
