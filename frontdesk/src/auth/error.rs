use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Missing access token")]
    MissingToken,

    #[error("Malformed access token: {0}")]
    MalformedToken(String),

    #[error("Access token has no subject")]
    MissingSubject,

    #[error("Session not found or expired")]
    SessionNotFound,

    #[error("Session storage error: {0}")]
    StorageError(String),
}

impl From<serde_json::Error> for AuthError {
    fn from(err: serde_json::Error) -> Self {
        AuthError::MalformedToken(err.to_string())
    }
}

impl From<base64::DecodeError> for AuthError {
    fn from(err: base64::DecodeError) -> Self {
        AuthError::MalformedToken(err.to_string())
    }
}

impl From<shared::Error> for AuthError {
    fn from(err: shared::Error) -> Self {
        match err {
            shared::Error::NotFound => AuthError::SessionNotFound,
            other => AuthError::StorageError(other.to_string()),
        }
    }
}
