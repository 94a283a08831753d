use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::response::IntoResponse;

use crate::application::auth::Viewer;
use crate::application::error::HttpError;
use crate::infra::http::api::models::{MetaDetailView, MetaListQuery};
use crate::infra::http::api::state::ApiState;

pub async fn list_metas(
    State(state): State<ApiState>,
    Query(query): Query<MetaListQuery>,
) -> Result<impl IntoResponse, HttpError> {
    Ok(Json(state.metas.list(query.kind.as_deref()).await?))
}

pub async fn get_meta(
    State(state): State<ApiState>,
    Extension(viewer): Extension<Viewer>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, HttpError> {
    let detail = state.metas.detail(viewer, &name).await?;
    Ok(Json(MetaDetailView::from(detail)))
}
