use frontdesk::assistant::{Assistant, ChatCompletionsClient};
use frontdesk::auth::{MokaSessionRepository, SessionStore};
use frontdesk::store::PostgrestStore;
use frontdesk::Backoffice;
use server_http::{build_router, AppState};
use shared::config::Config;
use shared::TtlSecs;
use std::process::ExitCode;
use std::sync::Arc;
use storage_engine::TtlCache;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting front-desk HTTP server...");

    // Load environment variables from .env file (if exists)
    match dotenvy::dotenv() {
        Ok(_) => info!("Loaded environment variables from .env file"),
        Err(_) => info!("No .env file found, using system environment variables"),
    }

    // Load configuration from environment variables
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let store = match PostgrestStore::new(&config.record_store) {
        Ok(store) => store,
        Err(e) => {
            error!("Failed to initialize record store client: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // One cache per process, shared by every request through the back-office service
    let cache_ttl = TtlSecs(config.cache_ttl_secs).as_duration();
    info!("Initializing cache (default TTL {}s)...", config.cache_ttl_secs);
    let cache = Arc::new(TtlCache::with_default_ttl(cache_ttl));
    let backoffice = Arc::new(Backoffice::new(Arc::new(store), cache));

    info!("Initializing session store...");
    let session_ttl = TtlSecs(config.session_ttl_secs).as_duration();
    let session_repository = Arc::new(MokaSessionRepository::new(None, Some(session_ttl)));
    let sessions = Arc::new(SessionStore::new(
        session_repository,
        config.session_ttl_secs.saturating_mul(1000),
    ));

    let assistant: Option<Arc<dyn Assistant>> = match &config.assistant {
        Some(settings) => match ChatCompletionsClient::new(settings) {
            Ok(client) => {
                info!("Assistant enabled (model {})", client.model());
                Some(Arc::new(client))
            }
            Err(e) => {
                warn!("Assistant disabled: {}", e);
                None
            }
        },
        None => None,
    };

    // Initialize state
    let state = AppState::new(&config, backoffice, sessions, assistant);

    // Build router
    let router = build_router(state, &config.allowed_origins);

    // Start server
    let address = config.bind_address();
    let listener = match tokio::net::TcpListener::bind(&address).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {}: {}", address, e);
            return ExitCode::FAILURE;
        }
    };

    info!("HTTP Server listening on http://{}", address);

    // Graceful shutdown handler
    if let Err(e) = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    info!("Server shutdown complete");
    ExitCode::SUCCESS
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received terminate signal");
        },
    }

    info!("Shutting down gracefully...");
}
