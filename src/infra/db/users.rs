use async_trait::async_trait;
use time::OffsetDateTime;

use crate::application::repos::{RepoError, UpsertUserParams, UsersRepo};
use crate::domain::entities::UserRecord;

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    username: String,
    openid: String,
    avatar: Option<String>,
    permission: bool,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<UserRow> for UserRecord {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            username: row.username,
            openid: row.openid,
            avatar: row.avatar,
            permission: row.permission,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl UsersRepo for PostgresRepositories {
    async fn find_user(&self, id: i64) -> Result<Option<UserRecord>, RepoError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, openid, avatar, permission, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;
        Ok(row.map(UserRecord::from))
    }

    async fn upsert_user(&self, params: UpsertUserParams) -> Result<UserRecord, RepoError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (username, openid, avatar, permission)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (openid) DO UPDATE SET
                username = EXCLUDED.username,
                avatar = COALESCE(EXCLUDED.avatar, users.avatar),
                permission = EXCLUDED.permission,
                updated_at = now()
            RETURNING id, username, openid, avatar, permission, created_at, updated_at
            "#,
        )
        .bind(params.username)
        .bind(params.openid)
        .bind(params.avatar)
        .bind(params.permission)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;
        Ok(row.into())
    }
}
