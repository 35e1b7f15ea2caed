use crate::api::ErrorResponse;
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use tracing::debug;

/// Name of the cookie carrying the session token
pub const SESSION_COOKIE: &str = "frontdesk_session";

/// Extract Bearer token from Authorization header
fn extract_bearer_token(auth_header: &str) -> Option<String> {
    // Authorization: Bearer <token>
    let parts: Vec<&str> = auth_header.split_whitespace().collect();

    if parts.len() != 2 || parts[0] != "Bearer" {
        return None;
    }

    Some(parts[1].to_string())
}

/// Find `name` in a `Cookie` header value
fn extract_cookie(cookie_header: &str, name: &str) -> Option<String> {
    cookie_header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Session token from the session cookie, or else from a Bearer header
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .find_map(|cookies| extract_cookie(cookies, SESSION_COOKIE))
        .or_else(|| {
            headers
                .get(header::AUTHORIZATION)
                .and_then(|h| h.to_str().ok())
                .and_then(extract_bearer_token)
        })
}

/// Client IP address from proxy headers only
pub fn client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("X-Forwarded-For")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string())
        .or_else(|| {
            headers
                .get("X-Real-IP")
                .and_then(|h| h.to_str().ok())
                .map(|s| s.to_string())
        })
}

/// API callers get a 401 body, browsers are sent to the login page
fn reject(path: &str) -> Response {
    if path.starts_with("/api/") {
        (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse::new("Authentication required")),
        )
            .into_response()
    } else {
        Redirect::to("/login").into_response()
    }
}

/// Session middleware
pub async fn session_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, Response> {
    let path = request.uri().path().to_string();

    let Some(token) = session_token(request.headers()) else {
        debug!("no session token: path={}", path);
        return Err(reject(&path));
    };

    let session = match state.sessions.validate_session(&token).await {
        Ok(session) => session,
        Err(_) => {
            debug!("unknown or expired session: path={}", path);
            return Err(reject(&path));
        }
    };

    // Attach session to request extensions
    request.extensions_mut().insert(session);

    Ok(next.run(request).await)
}
