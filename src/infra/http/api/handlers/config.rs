use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::response::IntoResponse;
use serde_json::{Map, Value};

use crate::application::auth::Viewer;
use crate::application::error::HttpError;
use crate::infra::http::api::state::ApiState;

pub async fn get_config(
    State(state): State<ApiState>,
    Extension(viewer): Extension<Viewer>,
    Path(scope): Path<String>,
) -> Result<impl IntoResponse, HttpError> {
    Ok(Json(state.site_config.read(viewer, &scope).await?))
}

pub async fn update_config(
    State(state): State<ApiState>,
    Extension(viewer): Extension<Viewer>,
    Path(scope): Path<String>,
    Json(entries): Json<Map<String, Value>>,
) -> Result<impl IntoResponse, HttpError> {
    state.site_config.update(viewer, &scope, entries).await?;
    Ok("OK")
}
