use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use super::error::ApiError;
use super::state::AppState;

/// Gate for admin-mutation routes: resolves the bearer token to an
/// [`AdminPrincipal`](crate::application::auth::AdminPrincipal) and attaches
/// it to the request.
pub async fn admin_auth(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let token = match extract_token(request.headers().get(axum::http::header::AUTHORIZATION)) {
        Some(token) => token,
        None => return ApiError::unauthorized("No token provided").into_response(),
    };

    let principal = match state.auth.authenticate(&token).await {
        Ok(principal) => principal,
        Err(error) => return ApiError::from(error).into_response(),
    };

    request.extensions_mut().insert(principal);
    next.run(request).await
}

fn extract_token(header: Option<&axum::http::HeaderValue>) -> Option<String> {
    let raw = header?.to_str().ok()?;
    let bearer = raw.strip_prefix("Bearer ")?;
    Some(bearer.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_bearer_token() {
        let value = axum::http::HeaderValue::from_static("Bearer atn_abc_def");
        assert_eq!(
            extract_token(Some(&value)).as_deref(),
            Some("atn_abc_def")
        );
    }

    #[test]
    fn rejects_non_bearer_schemes() {
        let value = axum::http::HeaderValue::from_static("Basic dXNlcjpwYXNz");
        assert!(extract_token(Some(&value)).is_none());
        assert!(extract_token(None).is_none());
    }
}
