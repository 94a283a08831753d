//! Domain entities mirrored from persistent storage.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::domain::types::{FeedProperty, FeedStatus, MetaType};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedRecord {
    pub id: i64,
    pub alias: Option<String>,
    pub title: String,
    pub summary: String,
    pub content: String,
    pub property: FeedProperty,
    pub top: i32,
    pub uid: i64,
    pub allow_comment: bool,
    pub status: FeedStatus,
    pub views: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Public projection of a user attached to feeds and comments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: i64,
    pub username: String,
    pub avatar: Option<String>,
}

/// Compact meta reference carried by feeds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaRef {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: MetaType,
}

/// A feed joined with its author and every bound meta.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedAggregate {
    pub feed: FeedRecord,
    pub author: Option<UserSummary>,
    pub metas: Vec<MetaRef>,
}

impl FeedAggregate {
    pub fn metas_of(&self, kind: MetaType) -> Vec<MetaRef> {
        self.metas
            .iter()
            .filter(|meta| meta.kind == kind)
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEntry {
    pub id: i64,
    pub title: String,
    pub alias: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaRecord {
    pub id: i64,
    pub name: String,
    pub alias: Option<String>,
    #[serde(rename = "type")]
    pub kind: MetaType,
    pub description: Option<String>,
    pub parent: Option<i64>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaWithCount {
    #[serde(flatten)]
    pub meta: MetaRecord,
    pub feeds: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserRecord {
    pub id: i64,
    pub username: String,
    pub openid: String,
    pub avatar: Option<String>,
    pub permission: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl UserRecord {
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            username: self.username.clone(),
            avatar: self.avatar.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserTokenRecord {
    pub id: i64,
    pub user_id: i64,
    pub prefix: String,
    pub hashed_secret: Vec<u8>,
    pub created_at: OffsetDateTime,
    pub last_used_at: Option<OffsetDateTime>,
    pub revoked_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentRecord {
    pub id: i64,
    pub feed_id: i64,
    pub user_id: i64,
    pub content: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentWithAuthor {
    #[serde(flatten)]
    pub comment: CommentRecord,
    pub user: UserSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendRecord {
    pub id: i64,
    pub name: String,
    pub desc: String,
    pub avatar: String,
    pub url: String,
    pub uid: i64,
    pub accepted: bool,
    pub health: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InfoRecord {
    pub key: String,
    pub value: String,
}
