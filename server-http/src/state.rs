use frontdesk::assistant::Assistant;
use frontdesk::auth::{MokaSessionRepository, SessionStore};
use frontdesk::Backoffice;
use shared::config::Config;
use std::sync::Arc;

/// What the external login page needs to talk to the backend's auth service
#[derive(Clone, Debug, Default)]
pub struct LoginSettings {
    pub backend_url: String,
    pub anon_key: Option<String>,
}

/// Server state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub backoffice: Arc<Backoffice>,
    pub sessions: Arc<SessionStore<MokaSessionRepository>>,
    pub assistant: Option<Arc<dyn Assistant>>,
    pub login: Arc<LoginSettings>,
    pub secure_cookies: bool,
}

impl AppState {
    pub fn new(
        config: &Config,
        backoffice: Arc<Backoffice>,
        sessions: Arc<SessionStore<MokaSessionRepository>>,
        assistant: Option<Arc<dyn Assistant>>,
    ) -> Self {
        Self {
            backoffice,
            sessions,
            assistant,
            login: Arc::new(LoginSettings {
                backend_url: config.record_store.url.clone(),
                anon_key: config.record_store.anon_key.clone(),
            }),
            secure_cookies: config.secure_cookies,
        }
    }

    /// Session cookie lifetime, in seconds
    pub fn session_ttl_secs(&self) -> u64 {
        self.sessions.ttl_ms() / 1000
    }
}
