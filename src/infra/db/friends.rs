use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};
use time::OffsetDateTime;

use crate::application::repos::{CreateFriendParams, FriendsRepo, RepoError, UpdateFriendParams};
use crate::domain::entities::FriendRecord;

use super::{PostgresRepositories, map_sqlx_error};

const FRIEND_SELECT: &str = "SELECT id, name, \"desc\", avatar, url, uid, accepted, health, \
     created_at, updated_at FROM friends";

#[derive(sqlx::FromRow)]
struct FriendRow {
    id: i64,
    name: String,
    desc: String,
    avatar: String,
    url: String,
    uid: i64,
    accepted: bool,
    health: String,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<FriendRow> for FriendRecord {
    fn from(row: FriendRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            desc: row.desc,
            avatar: row.avatar,
            url: row.url,
            uid: row.uid,
            accepted: row.accepted,
            health: row.health,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl PostgresRepositories {
    async fn find_friend_where(
        &self,
        clause: &str,
        value: i64,
    ) -> Result<Option<FriendRecord>, RepoError> {
        let sql = format!("{FRIEND_SELECT} WHERE {clause} ORDER BY id LIMIT 1");
        let row = sqlx::query_as::<_, FriendRow>(&sql)
            .bind(value)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.map(FriendRecord::from))
    }
}

#[async_trait]
impl FriendsRepo for PostgresRepositories {
    async fn list_friends(&self) -> Result<Vec<FriendRecord>, RepoError> {
        let sql = format!("{FRIEND_SELECT} ORDER BY created_at, id");
        let rows = sqlx::query_as::<_, FriendRow>(&sql)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(rows.into_iter().map(FriendRecord::from).collect())
    }

    async fn find_friend(&self, id: i64) -> Result<Option<FriendRecord>, RepoError> {
        self.find_friend_where("id = $1", id).await
    }

    async fn find_by_owner(&self, uid: i64) -> Result<Option<FriendRecord>, RepoError> {
        self.find_friend_where("uid = $1", uid).await
    }

    async fn create_friend(&self, params: CreateFriendParams) -> Result<i64, RepoError> {
        sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO friends (name, "desc", avatar, url, uid, accepted)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(params.name)
        .bind(params.desc)
        .bind(params.avatar)
        .bind(params.url)
        .bind(params.uid)
        .bind(params.accepted)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)
    }

    async fn update_friend(&self, params: UpdateFriendParams) -> Result<(), RepoError> {
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE friends SET updated_at = now()");
        if let Some(name) = params.name {
            qb.push(", name = ");
            qb.push_bind(name);
        }
        if let Some(desc) = params.desc {
            qb.push(r#", "desc" = "#);
            qb.push_bind(desc);
        }
        if let Some(avatar) = params.avatar {
            qb.push(", avatar = ");
            qb.push_bind(avatar);
        }
        if let Some(url) = params.url {
            qb.push(", url = ");
            qb.push_bind(url);
        }
        if let Some(accepted) = params.accepted {
            qb.push(", accepted = ");
            qb.push_bind(accepted);
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

    async fn delete_friend(&self, id: i64) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM friends WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Self::expect_affected(result.rows_affected())
    }
}
