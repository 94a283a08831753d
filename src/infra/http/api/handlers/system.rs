use axum::extract::State;
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};

use crate::application::error::ErrorReport;
use crate::infra::http::api::state::ApiState;
use crate::infra::http::db_health_response;

pub async fn index() -> &'static str {
    "Hi"
}

pub async fn db_health(State(state): State<ApiState>) -> Response {
    db_health_response(state.db.ping().await)
}

pub async fn not_found(uri: Uri) -> Response {
    let message = format!("{} not found", uri.path());
    let mut response = (StatusCode::NOT_FOUND, message.clone()).into_response();
    ErrorReport::from_message("infra::http::fallback", StatusCode::NOT_FOUND, message)
        .attach(&mut response);
    response
}
