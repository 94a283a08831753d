pub mod handlers;
pub mod middleware;
pub mod models;
pub mod state;

pub use state::ApiState;

use std::time::Duration;

use axum::{
    Router,
    http::{HeaderName, header},
    middleware as axum_middleware,
    routing::{delete, get, post, put},
};
use tower_http::cors::{AllowMethods, AllowOrigin, CorsLayer};

use crate::infra::http::middleware::{
    REQUEST_ID_HEADER, SERVER_TIMING_HEADER, log_responses, server_timing, set_request_context,
};

const CORS_MAX_AGE: Duration = Duration::from_secs(600);

pub fn build_router(state: ApiState) -> Router {
    let auth_state = state.clone();

    Router::new()
        .route("/", get(handlers::index))
        .route("/_health/db", get(handlers::db_health))
        .route("/feed", get(handlers::list_feeds).post(handlers::create_feed))
        .route("/feed/timeline", get(handlers::feed_timeline))
        .route("/feed/search/{keyword}", get(handlers::search_feeds))
        .route("/search/{keyword}", get(handlers::search_feeds))
        .route("/feed/top/{id}", post(handlers::pin_feed))
        .route(
            "/feed/comment/{feed}",
            get(handlers::list_comments).post(handlers::create_comment),
        )
        .route(
            "/feed/{id}",
            get(handlers::get_feed)
                .post(handlers::update_feed)
                .delete(handlers::delete_feed),
        )
        .route("/comment/{id}", delete(handlers::delete_comment))
        .route("/meta", get(handlers::list_metas))
        .route("/meta/{name}", get(handlers::get_meta))
        .route(
            "/friend",
            get(handlers::list_friends).post(handlers::create_friend),
        )
        .route(
            "/friend/{id}",
            put(handlers::update_friend).delete(handlers::delete_friend),
        )
        .route(
            "/config/{scope}",
            get(handlers::get_config).post(handlers::update_config),
        )
        .route("/user/profile", get(handlers::user_profile))
        .fallback(handlers::not_found)
        .with_state(state)
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn_with_state(
            auth_state,
            middleware::resolve_viewer,
        ))
        .layer(axum_middleware::from_fn(server_timing))
        .layer(axum_middleware::from_fn(set_request_context))
        .layer(cors_layer())
}

/// Reflects the caller's origin and method so credentialed requests work
/// from any site.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(CORS_MAX_AGE)
        .expose_headers([
            HeaderName::from_static(REQUEST_ID_HEADER),
            HeaderName::from_static(SERVER_TIMING_HEADER),
        ])
}
