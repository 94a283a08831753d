use async_trait::async_trait;
use time::OffsetDateTime;

use crate::application::repos::{CreateMetaParams, FeedMetasRepo, MetasRepo, RepoError};
use crate::domain::entities::{FeedAggregate, MetaRecord, MetaWithCount};
use crate::domain::types::{FeedStatus, MetaType};

use super::feeds::{FEED_SELECT, FeedRow};
use super::{PostgresRepositories, map_sqlx_error};

const META_COLUMNS: &str =
    "m.id, m.name, m.alias, m.type AS kind, m.description, m.parent, m.created_at, m.updated_at";

#[derive(sqlx::FromRow)]
struct MetaRow {
    id: i64,
    name: String,
    alias: Option<String>,
    kind: MetaType,
    description: Option<String>,
    parent: Option<i64>,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<MetaRow> for MetaRecord {
    fn from(row: MetaRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            alias: row.alias,
            kind: row.kind,
            description: row.description,
            parent: row.parent,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct MetaCountRow {
    #[sqlx(flatten)]
    meta: MetaRow,
    feeds: i64,
}

#[async_trait]
impl MetasRepo for PostgresRepositories {
    async fn list_with_counts(
        &self,
        kind: Option<MetaType>,
    ) -> Result<Vec<MetaWithCount>, RepoError> {
        let sql = format!(
            "SELECT {META_COLUMNS}, COUNT(fm.feed_id) AS feeds \
             FROM metas m \
             LEFT JOIN feed_metas fm ON fm.meta_id = m.id \
             WHERE $1::meta_type IS NULL OR m.type = $1 \
             GROUP BY m.id \
             ORDER BY m.id"
        );
        let rows = sqlx::query_as::<_, MetaCountRow>(&sql)
            .bind(kind)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows
            .into_iter()
            .map(|row| MetaWithCount {
                meta: row.meta.into(),
                feeds: row.feeds,
            })
            .collect())
    }

    async fn find_by_alias_or_name(&self, value: &str) -> Result<Option<MetaRecord>, RepoError> {
        let sql = format!(
            "SELECT {META_COLUMNS} FROM metas m \
             WHERE m.alias = $1 OR m.name = $1 \
             ORDER BY CASE WHEN m.alias = $1 THEN 0 ELSE 1 END, m.id \
             LIMIT 1"
        );
        let row = sqlx::query_as::<_, MetaRow>(&sql)
            .bind(value)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.map(MetaRecord::from))
    }

    async fn find_by_name(
        &self,
        name: &str,
        kind: MetaType,
    ) -> Result<Option<MetaRecord>, RepoError> {
        let sql = format!("SELECT {META_COLUMNS} FROM metas m WHERE m.name = $1 AND m.type = $2");
        let row = sqlx::query_as::<_, MetaRow>(&sql)
            .bind(name)
            .bind(kind)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.map(MetaRecord::from))
    }

    async fn create_meta(&self, params: CreateMetaParams) -> Result<MetaRecord, RepoError> {
        // A concurrent bind may have inserted the same name first.
        let row = sqlx::query_as::<_, MetaRow>(
            r#"
            INSERT INTO metas AS m (name, alias, type)
            VALUES ($1, $2, $3)
            ON CONFLICT (name, type) DO UPDATE SET name = EXCLUDED.name
            RETURNING m.id, m.name, m.alias, m.type AS kind, m.description, m.parent,
                      m.created_at, m.updated_at
            "#,
        )
        .bind(params.name)
        .bind(params.alias)
        .bind(params.kind)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;
        Ok(row.into())
    }

    async fn list_feeds_for_meta(
        &self,
        meta_id: i64,
        include_unpublished: bool,
    ) -> Result<Vec<FeedAggregate>, RepoError> {
        let sql = format!(
            "{FEED_SELECT} \
             INNER JOIN feed_metas fm ON fm.feed_id = f.id \
             WHERE fm.meta_id = $1 AND ($2 OR f.status = $3) \
             ORDER BY f.top DESC, f.created_at DESC"
        );
        let rows = sqlx::query_as::<_, FeedRow>(&sql)
            .bind(meta_id)
            .bind(include_unpublished)
            .bind(FeedStatus::Publish)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        self.attach_metas(rows).await
    }
}

#[async_trait]
impl FeedMetasRepo for PostgresRepositories {
    async fn clear_feed_metas(&self, feed_id: i64, kind: MetaType) -> Result<(), RepoError> {
        sqlx::query("DELETE FROM feed_metas WHERE feed_id = $1 AND type = $2")
            .bind(feed_id)
            .bind(kind)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn insert_feed_meta(
        &self,
        feed_id: i64,
        meta_id: i64,
        kind: MetaType,
    ) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            INSERT INTO feed_metas (feed_id, meta_id, type)
            VALUES ($1, $2, $3)
            ON CONFLICT (feed_id, meta_id) DO NOTHING
            "#,
        )
        .bind(feed_id)
        .bind(meta_id)
        .bind(kind)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;
        Ok(())
    }
}
