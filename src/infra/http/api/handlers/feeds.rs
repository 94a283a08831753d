//! Feed handlers

use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::response::IntoResponse;

use crate::application::auth::Viewer;
use crate::application::error::HttpError;
use crate::application::pagination::PageRequest;
use crate::infra::http::api::models::{
    FeedCreateRequest, FeedDetailView, FeedListItem, FeedListQuery, FeedUpdateRequest,
    InsertedId, PageQuery, PinRequest,
};
use crate::infra::http::api::state::ApiState;

pub async fn list_feeds(
    State(state): State<ApiState>,
    Extension(viewer): Extension<Viewer>,
    Query(query): Query<FeedListQuery>,
) -> Result<impl IntoResponse, HttpError> {
    let page = state.feeds.list(viewer, query.into()).await?;
    Ok(Json(page.map(|feed| FeedListItem::shape(feed, viewer))))
}

pub async fn feed_timeline(State(state): State<ApiState>) -> Result<impl IntoResponse, HttpError> {
    Ok(Json(state.feeds.timeline().await?))
}

pub async fn get_feed(
    State(state): State<ApiState>,
    Extension(viewer): Extension<Viewer>,
    Path(id_or_alias): Path<String>,
) -> Result<impl IntoResponse, HttpError> {
    let feed = state.feeds.get(viewer, &id_or_alias).await?;
    Ok(Json(FeedDetailView::from(feed)))
}

pub async fn search_feeds(
    State(state): State<ApiState>,
    Extension(viewer): Extension<Viewer>,
    Path(keyword): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, HttpError> {
    let page = PageRequest::new(query.page, query.limit);
    let hits = state.feeds.search(viewer, &keyword, page).await?;
    Ok(Json(hits.map(|feed| FeedListItem::shape(feed, viewer))))
}

pub async fn create_feed(
    State(state): State<ApiState>,
    Extension(viewer): Extension<Viewer>,
    Json(payload): Json<FeedCreateRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let inserted_id = state.feeds.create(viewer, payload.into()).await?;
    Ok(Json(InsertedId { inserted_id }))
}

pub async fn update_feed(
    State(state): State<ApiState>,
    Extension(viewer): Extension<Viewer>,
    Path(id): Path<i64>,
    Json(payload): Json<FeedUpdateRequest>,
) -> Result<impl IntoResponse, HttpError> {
    state.feeds.update(viewer, id, payload.into()).await?;
    Ok("Updated")
}

pub async fn pin_feed(
    State(state): State<ApiState>,
    Extension(viewer): Extension<Viewer>,
    Path(id): Path<i64>,
    Json(payload): Json<PinRequest>,
) -> Result<impl IntoResponse, HttpError> {
    state.feeds.pin(viewer, id, payload.top).await?;
    Ok("Updated")
}

pub async fn delete_feed(
    State(state): State<ApiState>,
    Extension(viewer): Extension<Viewer>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, HttpError> {
    state.feeds.delete(viewer, id).await?;
    Ok("Deleted")
}
