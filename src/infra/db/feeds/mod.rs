mod read;
mod write;

use std::collections::HashMap;

use sqlx::{Postgres, QueryBuilder};
use time::OffsetDateTime;

use crate::application::repos::{FeedListFilter, RepoError};
use crate::domain::entities::{FeedAggregate, FeedRecord, MetaRef, UserSummary};
use crate::domain::types::{FeedProperty, FeedStatus, MetaType};

use super::{PostgresRepositories, map_sqlx_error};

/// Feed columns joined with the author. Append `WHERE` clauses directly.
pub(super) const FEED_SELECT: &str = "SELECT f.id, f.alias, f.title, f.summary, f.content, \
     f.property, f.top, f.uid, f.allow_comment, f.status, f.views, f.created_at, f.updated_at, \
     u.id AS author_id, u.username AS author_username, u.avatar AS author_avatar \
     FROM feeds f LEFT JOIN users u ON u.id = f.uid";

#[derive(sqlx::FromRow)]
pub(super) struct FeedRow {
    id: i64,
    alias: Option<String>,
    title: String,
    summary: String,
    content: String,
    property: FeedProperty,
    top: i32,
    uid: i64,
    allow_comment: bool,
    status: FeedStatus,
    views: i64,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
    author_id: Option<i64>,
    author_username: Option<String>,
    author_avatar: Option<String>,
}

impl FeedRow {
    fn into_parts(self) -> (FeedRecord, Option<UserSummary>) {
        let author = match (self.author_id, self.author_username) {
            (Some(id), Some(username)) => Some(UserSummary {
                id,
                username,
                avatar: self.author_avatar,
            }),
            _ => None,
        };
        let feed = FeedRecord {
            id: self.id,
            alias: self.alias,
            title: self.title,
            summary: self.summary,
            content: self.content,
            property: self.property,
            top: self.top,
            uid: self.uid,
            allow_comment: self.allow_comment,
            status: self.status,
            views: self.views,
            created_at: self.created_at,
            updated_at: self.updated_at,
        };
        (feed, author)
    }
}

impl From<FeedRow> for FeedRecord {
    fn from(row: FeedRow) -> Self {
        row.into_parts().0
    }
}

#[derive(sqlx::FromRow)]
struct FeedMetaRow {
    feed_id: i64,
    id: i64,
    name: String,
    kind: MetaType,
}

impl PostgresRepositories {
    fn apply_list_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: FeedListFilter) {
        match filter {
            FeedListFilter::PublishedPosts => {
                qb.push(" AND f.status = ");
                qb.push_bind(FeedStatus::Publish);
                qb.push(" AND f.property = ");
                qb.push_bind(FeedProperty::Post);
            }
            FeedListFilter::Status(status) => {
                qb.push(" AND f.status = ");
                qb.push_bind(status);
            }
        }
    }

    /// Loads the metas of every row in one query and assembles aggregates
    /// in row order.
    pub(super) async fn attach_metas(
        &self,
        rows: Vec<FeedRow>,
    ) -> Result<Vec<FeedAggregate>, RepoError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i64> = rows.iter().map(|row| row.id).collect();
        let meta_rows = sqlx::query_as::<_, FeedMetaRow>(
            r#"
            SELECT fm.feed_id, m.id, m.name, m.type AS kind
            FROM feed_metas fm
            INNER JOIN metas m ON m.id = fm.meta_id
            WHERE fm.feed_id = ANY($1)
            ORDER BY fm.created_at, m.id
            "#,
        )
        .bind(ids)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        let mut grouped: HashMap<i64, Vec<MetaRef>> = HashMap::new();
        for row in meta_rows {
            grouped.entry(row.feed_id).or_default().push(MetaRef {
                id: row.id,
                name: row.name,
                kind: row.kind,
            });
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let metas = grouped.remove(&row.id).unwrap_or_default();
                let (feed, author) = row.into_parts();
                FeedAggregate {
                    feed,
                    author,
                    metas,
                }
            })
            .collect())
    }
}

/// Escapes `LIKE` wildcards so the keyword matches literally.
pub(super) fn like_pattern(keyword: &str) -> String {
    let escaped = keyword
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}
