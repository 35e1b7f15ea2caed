use super::claims::StaffIdentity;
use super::session::{BackendTokens, Session, SessionToken};
use crate::locale::Locale;
use async_trait::async_trait;
use shared::Result;
use std::sync::Arc;
use tracing::info;

/// Trait for session storage operations
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Store a new session living `ttl_ms`
    async fn create_session(
        &self,
        identity: StaffIdentity,
        backend_tokens: BackendTokens,
        ttl_ms: u64,
        client_ip: Option<String>,
    ) -> Result<Session>;

    /// Get a live session by token, refreshing its last access time
    async fn get_session(&self, token: &SessionToken) -> Result<Session>;

    /// Delete a session (logout)
    async fn delete_session(&self, token: &SessionToken) -> Result<bool>;

    async fn session_exists(&self, token: &SessionToken) -> Result<bool>;

    /// Replace a stored session with `session`
    async fn update_session(&self, session: &Session) -> Result<()>;
}

/// Session store service
pub struct SessionStore<S: SessionRepository> {
    repository: Arc<S>,
    ttl_ms: u64,
}

impl<S: SessionRepository> SessionStore<S> {
    pub fn new(repository: Arc<S>, ttl_ms: u64) -> Self {
        Self { repository, ttl_ms }
    }

    pub fn ttl_ms(&self) -> u64 {
        self.ttl_ms
    }

    /// Open a session for a staff member who just logged in
    pub async fn create_session(
        &self,
        identity: StaffIdentity,
        backend_tokens: BackendTokens,
        client_ip: Option<String>,
    ) -> Result<Session> {
        let session = self
            .repository
            .create_session(identity, backend_tokens, self.ttl_ms, client_ip)
            .await?;
        info!(
            "session created: user={}, expires_at={}",
            session.identity.user_id,
            super::session::format_utc_time(session.expires_at)
        );
        Ok(session)
    }

    /// Validate a session token and return the session
    pub async fn validate_session(&self, token: &SessionToken) -> Result<Session> {
        self.repository.get_session(token).await
    }

    /// Invalidate a session (logout)
    pub async fn invalidate_session(&self, token: &SessionToken) -> Result<bool> {
        let removed = self.repository.delete_session(token).await?;
        if removed {
            info!("session closed");
        }
        Ok(removed)
    }

    pub async fn is_valid_session(&self, token: &SessionToken) -> Result<bool> {
        self.repository.session_exists(token).await
    }

    /// Store the interface language chosen by the staff member
    pub async fn set_locale(&self, token: &SessionToken, locale: Locale) -> Result<Session> {
        let mut session = self.repository.get_session(token).await?;
        session.locale = locale;
        self.repository.update_session(&session).await?;
        Ok(session)
    }

    /// Store the settings blob posted from the settings page
    pub async fn save_settings(
        &self,
        token: &SessionToken,
        settings: serde_json::Value,
    ) -> Result<Session> {
        let mut session = self.repository.get_session(token).await?;
        session.settings = Some(settings);
        self.repository.update_session(&session).await?;
        Ok(session)
    }
}
