use async_trait::async_trait;
use time::OffsetDateTime;

use crate::application::repos::{CreateUserTokenParams, RepoError, UserTokensRepo};
use crate::domain::entities::UserTokenRecord;

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct UserTokenRow {
    id: i64,
    user_id: i64,
    prefix: String,
    hashed_secret: Vec<u8>,
    created_at: OffsetDateTime,
    last_used_at: Option<OffsetDateTime>,
    revoked_at: Option<OffsetDateTime>,
}

impl From<UserTokenRow> for UserTokenRecord {
    fn from(row: UserTokenRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            prefix: row.prefix,
            hashed_secret: row.hashed_secret,
            created_at: row.created_at,
            last_used_at: row.last_used_at,
            revoked_at: row.revoked_at,
        }
    }
}

#[async_trait]
impl UserTokensRepo for PostgresRepositories {
    async fn create_token(
        &self,
        params: CreateUserTokenParams,
    ) -> Result<UserTokenRecord, RepoError> {
        let row = sqlx::query_as::<_, UserTokenRow>(
            r#"
            INSERT INTO user_tokens (user_id, prefix, hashed_secret)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, prefix, hashed_secret, created_at, last_used_at, revoked_at
            "#,
        )
        .bind(params.user_id)
        .bind(params.prefix)
        .bind(params.hashed_secret)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;
        Ok(row.into())
    }

    async fn find_by_prefix(&self, prefix: &str) -> Result<Option<UserTokenRecord>, RepoError> {
        let row = sqlx::query_as::<_, UserTokenRow>(
            r#"
            SELECT id, user_id, prefix, hashed_secret, created_at, last_used_at, revoked_at
            FROM user_tokens
            WHERE prefix = $1
            "#,
        )
        .bind(prefix)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;
        Ok(row.map(UserTokenRecord::from))
    }

    async fn touch_token(&self, id: i64, at: OffsetDateTime) -> Result<(), RepoError> {
        sqlx::query("UPDATE user_tokens SET last_used_at = $1 WHERE id = $2")
            .bind(at)
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }
}
