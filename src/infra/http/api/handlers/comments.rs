use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::response::IntoResponse;

use crate::application::auth::Viewer;
use crate::application::error::HttpError;
use crate::infra::http::api::models::CommentCreateRequest;
use crate::infra::http::api::state::ApiState;

pub async fn list_comments(
    State(state): State<ApiState>,
    Extension(viewer): Extension<Viewer>,
    Path(feed_id): Path<i64>,
) -> Result<impl IntoResponse, HttpError> {
    Ok(Json(state.comments.list(viewer, feed_id).await?))
}

pub async fn create_comment(
    State(state): State<ApiState>,
    Extension(viewer): Extension<Viewer>,
    Path(feed_id): Path<i64>,
    Json(payload): Json<CommentCreateRequest>,
) -> Result<impl IntoResponse, HttpError> {
    state
        .comments
        .create(viewer, feed_id, payload.content)
        .await?;
    Ok("OK")
}

pub async fn delete_comment(
    State(state): State<ApiState>,
    Extension(viewer): Extension<Viewer>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, HttpError> {
    state.comments.delete(viewer, id).await?;
    Ok("OK")
}
