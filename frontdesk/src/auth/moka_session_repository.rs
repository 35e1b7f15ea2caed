use super::claims::StaffIdentity;
use super::session::{generate_session_token, BackendTokens, Session, SessionToken};
use super::session_store::SessionRepository;
use async_trait::async_trait;
use moka::future::Cache;
use shared::Result;
use std::time::Duration;

/// Moka-based in-memory session repository keyed by token
pub struct MokaSessionRepository {
    sessions: Cache<SessionToken, Session>,
}

impl MokaSessionRepository {
    /// Create a new Moka session repository with specified capacity and default TTL
    pub fn new(max_sessions: Option<u64>, default_ttl: Option<Duration>) -> Self {
        let mut builder = Cache::builder();

        if let Some(capacity) = max_sessions {
            builder = builder.max_capacity(capacity);
        }

        if let Some(ttl) = default_ttl {
            builder = builder.time_to_live(ttl);
        }

        Self {
            sessions: builder.build(),
        }
    }

    /// Create with default settings (unbounded, 1 hour TTL)
    pub fn with_defaults() -> Self {
        Self::new(None, Some(Duration::from_secs(3600)))
    }
}

#[async_trait]
impl SessionRepository for MokaSessionRepository {
    async fn create_session(
        &self,
        identity: StaffIdentity,
        backend_tokens: BackendTokens,
        ttl_ms: u64,
        client_ip: Option<String>,
    ) -> Result<Session> {
        let token = generate_session_token();
        let session = Session::new(token.clone(), identity, backend_tokens, ttl_ms, client_ip);

        self.sessions.insert(token, session.clone()).await;

        Ok(session)
    }

    async fn get_session(&self, token: &SessionToken) -> Result<Session> {
        let mut session = self
            .sessions
            .get(token)
            .await
            .ok_or(shared::Error::NotFound)?;

        if session.is_expired() {
            self.sessions.invalidate(token).await;
            return Err(shared::Error::NotFound);
        }

        session.update_last_accessed();
        self.sessions.insert(token.clone(), session.clone()).await;

        Ok(session)
    }

    async fn delete_session(&self, token: &SessionToken) -> Result<bool> {
        Ok(self.sessions.remove(token).await.is_some())
    }

    async fn session_exists(&self, token: &SessionToken) -> Result<bool> {
        Ok(self
            .sessions
            .get(token)
            .await
            .is_some_and(|session| !session.is_expired()))
    }

    async fn update_session(&self, session: &Session) -> Result<()> {
        self.sessions
            .insert(session.token.clone(), session.clone())
            .await;
        Ok(())
    }
}
