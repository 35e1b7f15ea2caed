// Public API
pub mod claims;
pub mod error;
pub mod moka_session_repository;
pub mod session;
pub mod session_store;

// Re-export commonly used types
pub use claims::{StaffIdentity, TokenClaims, UserMetadata};
pub use error::AuthError;
pub use moka_session_repository::MokaSessionRepository;
pub use session::{
    current_timestamp_ms, format_utc_time, generate_session_token, BackendTokens, Session,
    SessionToken,
};
pub use session_store::{SessionRepository, SessionStore};
