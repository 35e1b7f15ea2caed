use crate::api::requests::{LoginPageQuery, LoginRequest};
use crate::api::responses::{LoginPageResponse, LoginResponse};
use crate::api::ErrorResponse;
use crate::middleware::{client_ip, session_token, SESSION_COOKIE};
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Extension, Json,
};
use chrono::Utc;
use frontdesk::auth::{AuthError, BackendTokens, Session, StaffIdentity, TokenClaims};
use tracing::{info, warn};

fn session_cookie(token: &str, max_age_secs: u64, secure: bool) -> String {
    let mut cookie =
        format!("{SESSION_COOKIE}={token}; HttpOnly; Path=/; SameSite=Lax; Max-Age={max_age_secs}");
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// GET /login
///
/// Bootstrap data for the external login page, or a redirect home when the
/// caller already holds a live session.
pub async fn login_page(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<LoginPageQuery>,
) -> Response {
    if let Some(token) = session_token(&headers) {
        if state.sessions.is_valid_session(&token).await.unwrap_or(false) {
            return Redirect::to("/").into_response();
        }
    }

    Json(LoginPageResponse {
        backend_url: state.login.backend_url.clone(),
        anon_key: state.login.anon_key.clone(),
        logged_out: query.logout.unwrap_or(false),
    })
    .into_response()
}

/// POST /auth/login
///
/// Exchange a backend access token for a staff session.
///
/// The token's claims supply the staff identity; the session token is returned
/// in the body and set as an HttpOnly cookie.
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<LoginRequest>,
) -> Result<Response, (StatusCode, Json<ErrorResponse>)> {
    let claims = TokenClaims::decode_unverified(&req.access_token).map_err(|e| {
        warn!("login rejected: {}", e);
        (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(e.to_string())))
    })?;

    if claims.is_expired_at(Utc::now().timestamp()) {
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse::new("Access token has expired")),
        ));
    }

    let identity = StaffIdentity::from_claims(&claims).map_err(|e| match e {
        AuthError::MissingSubject => (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse::new(e.to_string())),
        ),
        _ => (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(e.to_string()))),
    })?;

    let backend_tokens = BackendTokens {
        access_token: req.access_token,
        refresh_token: req.refresh_token,
    };

    let session = state
        .sessions
        .create_session(identity, backend_tokens, client_ip(&headers))
        .await
        .map_err(|_| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("Failed to create session")),
            )
        })?;

    let expires_in = state.session_ttl_secs();
    let cookie = session_cookie(&session.token, expires_in, state.secure_cookies);

    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(LoginResponse {
            token: session.token,
            expires_in,
            user: session.identity,
        }),
    )
        .into_response())
}

/// GET /auth/logout
///
/// End the caller's session, if any, and send them back to the login page.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    if let Some(token) = session_token(&headers) {
        match state.sessions.invalidate_session(&token).await {
            Ok(true) => info!("session logged out"),
            Ok(false) => {}
            Err(e) => warn!("failed to close session: {}", e),
        }
    }

    (
        [(header::SET_COOKIE, session_cookie("", 0, state.secure_cookies))],
        Redirect::to("/login?logout=true"),
    )
}

/// GET /debug/session
pub async fn debug_session(Extension(session): Extension<Session>) -> Json<Session> {
    Json(session)
}
