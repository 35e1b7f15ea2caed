use crate::api::requests::LanguageRequest;
use crate::api::responses::{LanguageResponse, PageResponse, SaveSettingsResponse, SettingsResponse};
use crate::api::ErrorResponse;
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, Extension, Json};
use frontdesk::auth::{AuthError, Session};
use frontdesk::locale::{Locale, PageHeader};
use serde_json::Value;
use tracing::info;

type SettingsResult<T> = Result<Json<T>, (StatusCode, Json<ErrorResponse>)>;

fn session_error(err: shared::Error) -> (StatusCode, Json<ErrorResponse>) {
    let err = AuthError::from(err);
    let status = match err {
        AuthError::SessionNotFound => StatusCode::UNAUTHORIZED,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(ErrorResponse::new(err.to_string())))
}

/// GET /settings
pub async fn settings(Extension(session): Extension<Session>) -> Json<PageResponse<SettingsResponse>> {
    Json(PageResponse {
        header: PageHeader::now(session.locale, session.identity.greeting_name()),
        content: SettingsResponse {
            locale: session.locale,
            settings: session.settings,
            user: session.identity,
        },
    })
}

/// POST /api/settings/language
pub async fn set_language(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(req): Json<LanguageRequest>,
) -> SettingsResult<LanguageResponse> {
    let locale: Locale = req
        .language
        .parse()
        .map_err(|e: frontdesk::locale::UnsupportedLocale| {
            (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(e.to_string())))
        })?;

    let updated = state
        .sessions
        .set_locale(&session.token, locale)
        .await
        .map_err(session_error)?;
    info!("locale changed: user={}, locale={}", updated.identity.user_id, locale);

    Ok(Json(LanguageResponse {
        success: true,
        locale: updated.locale,
    }))
}

/// POST /api/settings/save
pub async fn save_settings(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(settings): Json<Value>,
) -> SettingsResult<SaveSettingsResponse> {
    let updated = state
        .sessions
        .save_settings(&session.token, settings)
        .await
        .map_err(session_error)?;

    Ok(Json(SaveSettingsResponse {
        success: true,
        settings: updated.settings,
    }))
}
