use crate::handlers;
use crate::middleware::session_middleware;
use crate::state::AppState;
use axum::{
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::normalize_path::NormalizePathLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Build and configure the application router
pub fn build_router(state: AppState, allowed_origins: &[String]) -> Router {
    // Everything except health and the login flow needs a live session
    let protected = Router::new()
        // Pages
        .route("/", get(handlers::dashboard))
        .route("/clients", get(handlers::clients))
        .route("/clients-actuels", get(handlers::occupied_rooms))
        .route("/reservations", get(handlers::reservations))
        .route("/client/{id}", get(handlers::client_detail))
        .route("/reservation/{id}", get(handlers::reservation_detail))
        .route("/settings", get(handlers::settings))
        .route("/debug/session", get(handlers::debug_session))
        // Record API
        .route(
            "/api/client/{id}",
            get(handlers::get_client).put(handlers::update_client),
        )
        .route(
            "/api/reservation/{id}",
            get(handlers::get_reservation).put(handlers::update_reservation),
        )
        .route("/api/calendar/{year}/{month}", get(handlers::calendar))
        .route("/api/system/status", get(handlers::system_status))
        // Settings and assistant
        .route("/api/settings/language", post(handlers::set_language))
        .route("/api/settings/save", post(handlers::save_settings))
        .route("/api/assistant", post(handlers::ask))
        // Maintenance
        .route("/admin/cache", get(handlers::cache_stats))
        .route("/clear-cache", post(handlers::clear_cache))
        .route_layer(from_fn_with_state(state.clone(), session_middleware));

    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Login flow
        .route("/login", get(handlers::login_page))
        .route("/auth/login", post(handlers::login))
        .route("/auth/logout", get(handlers::logout))
        .merge(protected)
        // Middleware
        .layer(build_cors_layer(allowed_origins))
        .layer(NormalizePathLayer::trim_trailing_slash())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// `*` (or nothing) allows any origin; otherwise only the listed origins, with credentials
fn build_cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    if allowed_origins.is_empty() || allowed_origins.iter().any(|o| o == "*") {
        info!("CORS: allowing all origins");
        cors.allow_origin(Any)
    } else {
        info!("CORS: allowing origins {:?}", allowed_origins);
        let origins: Vec<HeaderValue> = allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        cors.allow_origin(origins).allow_credentials(true)
    }
}
