use async_trait::async_trait;
use time::OffsetDateTime;

use crate::application::repos::{CommentsRepo, CreateCommentParams, RepoError};
use crate::domain::entities::{CommentRecord, CommentWithAuthor, UserSummary};

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct CommentRow {
    id: i64,
    feed_id: i64,
    user_id: i64,
    content: String,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<CommentRow> for CommentRecord {
    fn from(row: CommentRow) -> Self {
        Self {
            id: row.id,
            feed_id: row.feed_id,
            user_id: row.user_id,
            content: row.content,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CommentAuthorRow {
    #[sqlx(flatten)]
    comment: CommentRow,
    username: String,
    avatar: Option<String>,
}

#[async_trait]
impl CommentsRepo for PostgresRepositories {
    async fn list_for_feed(&self, feed_id: i64) -> Result<Vec<CommentWithAuthor>, RepoError> {
        let rows = sqlx::query_as::<_, CommentAuthorRow>(
            r#"
            SELECT c.id, c.feed_id, c.user_id, c.content, c.created_at, c.updated_at,
                   u.username, u.avatar
            FROM comments c
            INNER JOIN users u ON u.id = c.user_id
            WHERE c.feed_id = $1
            ORDER BY c.created_at DESC, c.id DESC
            "#,
        )
        .bind(feed_id)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows
            .into_iter()
            .map(|row| CommentWithAuthor {
                user: UserSummary {
                    id: row.comment.user_id,
                    username: row.username,
                    avatar: row.avatar,
                },
                comment: row.comment.into(),
            })
            .collect())
    }

    async fn find_comment(&self, id: i64) -> Result<Option<CommentRecord>, RepoError> {
        let row = sqlx::query_as::<_, CommentRow>(
            r#"
            SELECT id, feed_id, user_id, content, created_at, updated_at
            FROM comments
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;
        Ok(row.map(CommentRecord::from))
    }

    async fn create_comment(&self, params: CreateCommentParams) -> Result<i64, RepoError> {
        sqlx::query_scalar::<_, i64>(
            "INSERT INTO comments (feed_id, user_id, content) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(params.feed_id)
        .bind(params.user_id)
        .bind(params.content)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)
    }

    async fn delete_comment(&self, id: i64) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Self::expect_affected(result.rows_affected())
    }
}
