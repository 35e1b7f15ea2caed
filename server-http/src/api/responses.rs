use frontdesk::auth::StaffIdentity;
use frontdesk::locale::{Locale, PageHeader};
use serde::Serialize;
use serde_json::Value;
use storage_engine::CacheStats;

#[derive(Serialize)]
pub struct HealthResponse {
    pub message: String,
}

// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// A staff page: the shared header plus the page's own content
#[derive(Serialize)]
pub struct PageResponse<T: Serialize> {
    pub header: PageHeader,
    #[serde(flatten)]
    pub content: T,
}

// === Auth Models ===

#[derive(Serialize)]
pub struct LoginPageResponse {
    pub backend_url: String,
    pub anon_key: Option<String>,
    pub logged_out: bool,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_in: u64,
    pub user: StaffIdentity,
}

// === Record Models ===

#[derive(Serialize)]
pub struct UpdateResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
}

// === Settings Models ===

#[derive(Serialize)]
pub struct SettingsResponse {
    pub locale: Locale,
    pub settings: Option<Value>,
    pub user: StaffIdentity,
}

#[derive(Serialize)]
pub struct LanguageResponse {
    pub success: bool,
    pub locale: Locale,
}

#[derive(Serialize)]
pub struct SaveSettingsResponse {
    pub success: bool,
    pub settings: Option<Value>,
}

// === Assistant Models ===

#[derive(Serialize)]
pub struct AskResponse {
    pub answer: String,
}

// === Maintenance Models ===

#[derive(Serialize)]
pub struct CacheStatsResponse {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

impl From<CacheStats> for CacheStatsResponse {
    fn from(stats: CacheStats) -> Self {
        Self {
            entries: stats.entries,
            hits: stats.hits,
            misses: stats.misses,
        }
    }
}

#[derive(Serialize)]
pub struct ClearCacheResponse {
    pub success: bool,
    pub message: String,
}
