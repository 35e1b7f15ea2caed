use crate::{Error, Result};
use tracing::warn;

pub struct Config {
    pub host: String,
    pub http_port: u16,
    pub record_store: RecordStoreConfig,
    pub assistant: Option<AssistantConfig>,
    pub session_ttl_secs: u64,
    pub cache_ttl_secs: u64,
    pub allowed_origins: Vec<String>,
    pub secure_cookies: bool,
}

/// Connection details for the hosted REST backend holding guests and stays.
#[derive(Clone)]
pub struct RecordStoreConfig {
    pub url: String,
    pub service_key: String,
    /// Public key handed to the browser-side login flow.
    pub anon_key: Option<String>,
}

#[derive(Clone)]
pub struct AssistantConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

impl Config {
    const DEFAULT_HOST: &str = "0.0.0.0";
    const DEFAULT_HTTP_PORT: u16 = 5003;
    const DEFAULT_ASSISTANT_BASE_URL: &str = "https://api.openai.com/v1";
    const DEFAULT_ASSISTANT_MODEL: &str = "gpt-4o-mini";
    const DEFAULT_SESSION_TTL_SECS: u64 = 3600;
    const DEFAULT_CACHE_TTL_SECS: u64 = 30;

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| Error::Config(format!("{name} must be set")))
        };

        let record_store = RecordStoreConfig {
            url: required("SUPABASE_URL")?.trim_end_matches('/').to_string(),
            service_key: required("SUPABASE_KEY")?,
            anon_key: lookup("SUPABASE_ANON_KEY"),
        };

        let assistant = match lookup("ASSISTANT_API_KEY").filter(|k| !k.is_empty()) {
            Some(api_key) => Some(AssistantConfig {
                api_key,
                base_url: lookup("ASSISTANT_BASE_URL")
                    .unwrap_or_else(|| Self::DEFAULT_ASSISTANT_BASE_URL.to_string())
                    .trim_end_matches('/')
                    .to_string(),
                model: lookup("ASSISTANT_MODEL")
                    .unwrap_or_else(|| Self::DEFAULT_ASSISTANT_MODEL.to_string()),
            }),
            None => {
                warn!("ASSISTANT_API_KEY not set, the assistant endpoint will be unavailable");
                None
            }
        };

        Ok(Self {
            host: lookup("FRONTDESK_HOST").unwrap_or_else(|| Self::DEFAULT_HOST.to_string()),
            http_port: parse_or(&lookup, "FRONTDESK_HTTP_PORT", Self::DEFAULT_HTTP_PORT),
            record_store,
            assistant,
            session_ttl_secs: parse_or(
                &lookup,
                "FRONTDESK_SESSION_TTL_SECS",
                Self::DEFAULT_SESSION_TTL_SECS,
            ),
            cache_ttl_secs: parse_or(
                &lookup,
                "FRONTDESK_CACHE_TTL_SECS",
                Self::DEFAULT_CACHE_TTL_SECS,
            ),
            allowed_origins: lookup("FRONTDESK_ALLOWED_ORIGINS")
                .unwrap_or_else(|| "*".to_string())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            secure_cookies: parse_or(&lookup, "FRONTDESK_SECURE_COOKIES", false),
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.http_port)
    }
}

fn parse_or<F, T>(lookup: &F, name: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr + Copy + std::fmt::Display,
{
    match lookup(name) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{name}={raw} is not valid, falling back to {default}");
            default
        }),
        None => default,
    }
}
