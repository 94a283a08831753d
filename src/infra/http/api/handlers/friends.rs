use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::response::IntoResponse;

use crate::application::auth::Viewer;
use crate::application::error::HttpError;
use crate::infra::http::api::models::{FriendCreateRequest, FriendUpdateRequest};
use crate::infra::http::api::state::ApiState;

pub async fn list_friends(
    State(state): State<ApiState>,
    Extension(viewer): Extension<Viewer>,
) -> Result<impl IntoResponse, HttpError> {
    Ok(Json(state.friends.list(viewer).await?))
}

pub async fn create_friend(
    State(state): State<ApiState>,
    Extension(viewer): Extension<Viewer>,
    Json(payload): Json<FriendCreateRequest>,
) -> Result<impl IntoResponse, HttpError> {
    state.friends.create(viewer, payload.into()).await?;
    Ok("OK")
}

pub async fn update_friend(
    State(state): State<ApiState>,
    Extension(viewer): Extension<Viewer>,
    Path(id): Path<i64>,
    Json(payload): Json<FriendUpdateRequest>,
) -> Result<impl IntoResponse, HttpError> {
    state.friends.update(viewer, id, payload.into()).await?;
    Ok("OK")
}

pub async fn delete_friend(
    State(state): State<ApiState>,
    Extension(viewer): Extension<Viewer>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, HttpError> {
    state.friends.delete(viewer, id).await?;
    Ok("OK")
}
