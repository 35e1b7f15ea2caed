use super::error::AuthError;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::{Deserialize, Serialize};

pub const DEFAULT_ROLE: &str = "User";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserMetadata {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub full_name: Option<String>,
    pub role: Option<String>,
}

/// Payload of an access token issued by the backend's auth service
#[derive(Debug, Clone, Deserialize)]
pub struct TokenClaims {
    pub sub: Option<String>,
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: UserMetadata,
    pub exp: Option<i64>,
}

impl TokenClaims {
    /// Decode the payload segment of a JWT.
    ///
    /// The signature is not checked here; the backend verifies it on every
    /// query made with the token.
    pub fn decode_unverified(token: &str) -> Result<Self, AuthError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AuthError::MissingToken);
        }

        let segments: Vec<&str> = token.split('.').collect();
        if segments.len() != 3 || segments[1].is_empty() {
            return Err(AuthError::MalformedToken(
                "expected three dot-separated segments".to_string(),
            ));
        }

        let payload = URL_SAFE_NO_PAD.decode(segments[1].trim_end_matches('='))?;
        Ok(serde_json::from_slice(&payload)?)
    }

    /// Whether `exp` lies before `now_secs`. Tokens without `exp` never expire here.
    pub fn is_expired_at(&self, now_secs: i64) -> bool {
        self.exp.is_some_and(|exp| exp <= now_secs)
    }
}

/// Who is logged in, as carried by a staff session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StaffIdentity {
    pub user_id: String,
    pub email: Option<String>,
    pub full_name: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
}

impl StaffIdentity {
    pub fn from_claims(claims: &TokenClaims) -> Result<Self, AuthError> {
        let user_id = claims
            .sub
            .clone()
            .filter(|s| !s.is_empty())
            .ok_or(AuthError::MissingSubject)?;
        let metadata = &claims.user_metadata;

        Ok(Self {
            user_id,
            email: claims.email.clone(),
            full_name: metadata.full_name.clone().unwrap_or_default(),
            first_name: resolve_first_name(metadata, claims.email.as_deref()),
            last_name: metadata.last_name.clone().unwrap_or_default(),
            role: metadata
                .role
                .clone()
                .filter(|r| !r.is_empty())
                .unwrap_or_else(|| DEFAULT_ROLE.to_string()),
        })
    }

    /// First name for greetings, `None` when nothing could be derived
    pub fn greeting_name(&self) -> Option<&str> {
        Some(self.first_name.as_str()).filter(|n| !n.is_empty())
    }
}

/// First name from metadata, else the first word of the full name, else the
/// email local part up to the first dot, capitalised.
pub fn resolve_first_name(metadata: &UserMetadata, email: Option<&str>) -> String {
    if let Some(first) = metadata
        .first_name
        .as_deref()
        .map(str::trim)
        .filter(|f| !f.is_empty())
    {
        return first.to_string();
    }

    if let Some(word) = metadata
        .full_name
        .as_deref()
        .and_then(|full| full.split_whitespace().next())
    {
        return word.to_string();
    }

    email
        .and_then(|e| e.split_once('@'))
        .map(|(local, _)| local.split('.').next().unwrap_or(local))
        .map(capitalize)
        .unwrap_or_default()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
