use frontdesk::assistant::ChatMessage;
use frontdesk::models::PageRequest;
use serde::Deserialize;

/// `?search=...&page=...` on every listing page
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub page: Option<u32>,
}

impl ListQuery {
    pub fn into_page_request(self) -> PageRequest {
        PageRequest::new(self.search.unwrap_or_default(), self.page.unwrap_or(1))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginPageQuery {
    #[serde(default)]
    pub logout: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LanguageRequest {
    pub language: String,
}

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,
    #[serde(default)]
    pub history: Vec<ChatMessage>,
}
