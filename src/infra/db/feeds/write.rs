use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};

use crate::application::repos::{CreateFeedParams, FeedsWriteRepo, RepoError, UpdateFeedParams};
use crate::infra::db::map_sqlx_error;

use super::PostgresRepositories;

#[async_trait]
impl FeedsWriteRepo for PostgresRepositories {
    async fn create_feed(&self, params: CreateFeedParams) -> Result<i64, RepoError> {
        sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO feeds (
                alias, title, summary, content, property, uid,
                allow_comment, status, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id
            "#,
        )
        .bind(params.alias)
        .bind(params.title)
        .bind(params.summary)
        .bind(params.content)
        .bind(params.property)
        .bind(params.uid)
        .bind(params.allow_comment)
        .bind(params.status)
        .bind(params.created_at)
        .bind(params.updated_at)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)
    }

    async fn update_feed(&self, params: UpdateFeedParams) -> Result<(), RepoError> {
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE feeds SET updated_at = COALESCE(");
        qb.push_bind(params.updated_at);
        qb.push(", updated_at)");

        if let Some(title) = params.title {
            qb.push(", title = ");
            qb.push_bind(title);
        }
        if let Some(alias) = params.alias {
            qb.push(", alias = ");
            qb.push_bind(alias);
        }
        if let Some(content) = params.content {
            qb.push(", content = ");
            qb.push_bind(content);
        }
        if let Some(summary) = params.summary {
            qb.push(", summary = ");
            qb.push_bind(summary);
        }
        if let Some(top) = params.top {
            qb.push(", top = ");
            qb.push_bind(top);
        }
        if let Some(status) = params.status {
            qb.push(", status = ");
            qb.push_bind(status);
        }
        if let Some(property) = params.property {
            qb.push(", property = ");
            qb.push_bind(property);
        }
        if let Some(allow_comment) = params.allow_comment {
            qb.push(", allow_comment = ");
            qb.push_bind(allow_comment);
        }
        if let Some(created_at) = params.created_at {
            qb.push(", created_at = ");
            qb.push_bind(created_at);
        }
        qb.push(" WHERE id = ");
        qb.push_bind(params.id);

        let result = qb
            .build()
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Self::expect_affected(result.rows_affected())
    }

    async fn update_top(&self, id: i64, top: i32) -> Result<(), RepoError> {
        let result = sqlx::query("UPDATE feeds SET top = $1 WHERE id = $2")
            .bind(top)
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Self::expect_affected(result.rows_affected())
    }

    async fn update_views(&self, id: i64, views: i64) -> Result<(), RepoError> {
        sqlx::query("UPDATE feeds SET views = $1 WHERE id = $2")
            .bind(views)
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn delete_feed(&self, id: i64) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM feeds WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Self::expect_affected(result.rows_affected())
    }
}
