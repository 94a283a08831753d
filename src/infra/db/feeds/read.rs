use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};
use time::OffsetDateTime;

use crate::application::repos::{FeedListFilter, FeedsRepo, RepoError};
use crate::domain::entities::{FeedAggregate, FeedRecord, TimelineEntry};
use crate::domain::types::{FeedProperty, FeedStatus};
use crate::infra::db::map_sqlx_error;

use super::PostgresRepositories;
use super::{FEED_SELECT, FeedRow, like_pattern};

#[derive(sqlx::FromRow)]
struct TimelineRow {
    id: i64,
    title: String,
    alias: Option<String>,
    created_at: OffsetDateTime,
}

impl PostgresRepositories {
    async fn find_row(
        &self,
        clause: &str,
        value: FeedLookup<'_>,
    ) -> Result<Option<FeedRow>, RepoError> {
        let sql = format!("{FEED_SELECT} WHERE {clause} LIMIT 1");
        let query = sqlx::query_as::<_, FeedRow>(&sql);
        let query = match value {
            FeedLookup::Id(id) => query.bind(id),
            FeedLookup::Alias(alias) => query.bind(alias),
        };
        query
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)
    }
}

enum FeedLookup<'a> {
    Id(i64),
    Alias(&'a str),
}

#[async_trait]
impl FeedsRepo for PostgresRepositories {
    async fn count_feeds(&self, filter: FeedListFilter) -> Result<u64, RepoError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM feeds f WHERE 1=1");
        Self::apply_list_filter(&mut qb, filter);

        let count = qb
            .build_query_scalar::<i64>()
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Self::convert_count(count)
    }

    async fn list_feeds(
        &self,
        filter: FeedListFilter,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<FeedAggregate>, RepoError> {
        let mut qb = QueryBuilder::<Postgres>::new(FEED_SELECT);
        qb.push(" WHERE 1=1");
        Self::apply_list_filter(&mut qb, filter);
        qb.push(" ORDER BY f.top DESC, f.created_at DESC LIMIT ");
        qb.push_bind(Self::convert_bound(limit)?);
        qb.push(" OFFSET ");
        qb.push_bind(Self::convert_bound(offset)?);

        let rows = qb
            .build_query_as::<FeedRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        self.attach_metas(rows).await
    }

    async fn list_timeline(&self) -> Result<Vec<TimelineEntry>, RepoError> {
        let rows = sqlx::query_as::<_, TimelineRow>(
            r#"
            SELECT id, title, alias, created_at
            FROM feeds
            WHERE status = $1 AND property = $2
            ORDER BY created_at DESC, updated_at DESC
            "#,
        )
        .bind(FeedStatus::Publish)
        .bind(FeedProperty::Post)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows
            .into_iter()
            .map(|row| TimelineEntry {
                id: row.id,
                title: row.title,
                alias: row.alias,
                created_at: row.created_at,
            })
            .collect())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<FeedRecord>, RepoError> {
        let row = self.find_row("f.id = $1", FeedLookup::Id(id)).await?;
        Ok(row.map(FeedRecord::from))
    }

    async fn find_aggregate(&self, id_or_alias: &str) -> Result<Option<FeedAggregate>, RepoError> {
        let mut row = None;
        if let Ok(id) = id_or_alias.parse::<i64>() {
            row = self.find_row("f.id = $1", FeedLookup::Id(id)).await?;
        }
        if row.is_none() {
            row = self
                .find_row("f.alias = $1", FeedLookup::Alias(id_or_alias))
                .await?;
        }

        let Some(row) = row else {
            return Ok(None);
        };
        Ok(self.attach_metas(vec![row]).await?.pop())
    }

    async fn find_by_title_or_content(
        &self,
        title: &str,
        content: &str,
    ) -> Result<Option<FeedRecord>, RepoError> {
        let sql = format!("{FEED_SELECT} WHERE f.title = $1 OR f.content = $2 LIMIT 1");
        let row = sqlx::query_as::<_, FeedRow>(&sql)
            .bind(title)
            .bind(content)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.map(FeedRecord::from))
    }

    async fn search_feeds(&self, keyword: &str) -> Result<Vec<FeedAggregate>, RepoError> {
        let sql = format!(
            "{FEED_SELECT} WHERE f.title ILIKE $1 OR f.content ILIKE $1 \
             OR f.summary ILIKE $1 OR f.alias ILIKE $1 \
             ORDER BY f.created_at DESC, f.updated_at DESC"
        );
        let rows = sqlx::query_as::<_, FeedRow>(&sql)
            .bind(like_pattern(keyword))
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        self.attach_metas(rows).await
    }
}
