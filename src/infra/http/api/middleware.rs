use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderValue, Request, header};
use axum::middleware::Next;
use axum::response::Response;
use tracing::debug;

use crate::application::auth::Viewer;

use super::state::ApiState;

/// Resolves the bearer token into a [`Viewer`]. Requests without a usable
/// token continue as anonymous; handlers decide what that may access.
pub async fn resolve_viewer(
    State(state): State<ApiState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let viewer = match extract_token(request.headers().get(header::AUTHORIZATION)) {
        Some(token) => match state.auth.authenticate(&token).await {
            Ok(viewer) => viewer,
            Err(err) => {
                debug!(
                    target = "inkpad::http::auth",
                    error = %err,
                    "Ignoring unusable bearer token"
                );
                Viewer::anonymous()
            }
        },
        None => Viewer::anonymous(),
    };

    request.extensions_mut().insert(viewer);
    next.run(request).await
}

fn extract_token(header: Option<&HeaderValue>) -> Option<String> {
    let raw = header?.to_str().ok()?;
    let bearer = raw.strip_prefix("Bearer ")?.trim();
    if bearer.is_empty() {
        return None;
    }
    Some(bearer.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_bearer_tokens_only() {
        let bearer = HeaderValue::from_static("Bearer ink_abc_def");
        let basic = HeaderValue::from_static("Basic Zm9vOmJhcg==");
        let blank = HeaderValue::from_static("Bearer   ");

        assert_eq!(extract_token(Some(&bearer)).as_deref(), Some("ink_abc_def"));
        assert_eq!(extract_token(Some(&basic)), None);
        assert_eq!(extract_token(Some(&blank)), None);
        assert_eq!(extract_token(None), None);
    }
}
