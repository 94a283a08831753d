use axum::Json;
use axum::extract::{Extension, State};
use axum::response::IntoResponse;

use crate::application::auth::Viewer;
use crate::application::error::HttpError;
use crate::infra::http::api::models::UserProfile;
use crate::infra::http::api::state::ApiState;

pub async fn user_profile(
    State(state): State<ApiState>,
    Extension(viewer): Extension<Viewer>,
) -> Result<impl IntoResponse, HttpError> {
    let user = state.users.profile(viewer).await?;
    Ok(Json(UserProfile::from(user)))
}
