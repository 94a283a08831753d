use async_trait::async_trait;

use crate::application::repos::{InfoRepo, RepoError};
use crate::domain::entities::InfoRecord;

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct InfoRow {
    key: String,
    value: String,
}

#[async_trait]
impl InfoRepo for PostgresRepositories {
    async fn list_info(&self, prefix: &str) -> Result<Vec<InfoRecord>, RepoError> {
        let rows = sqlx::query_as::<_, InfoRow>(
            "SELECT key, value FROM info WHERE left(key, length($1)) = $1 ORDER BY key",
        )
        .bind(prefix)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows
            .into_iter()
            .map(|row| InfoRecord {
                key: row.key,
                value: row.value,
            })
            .collect())
    }

    async fn upsert_info(&self, key: &str, value: &str) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            INSERT INTO info (key, value)
            VALUES ($1, $2)
            ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;
        Ok(())
    }
}
