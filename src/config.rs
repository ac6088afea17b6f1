//! API configuration resolved at build time.
//!
//! Browser bundles have no process environment, so the base URL is baked in
//! from `WALL_API_URL` when the crate is compiled.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8000";

/// Where the REST API lives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: String,
}

impl ApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        let trimmed = base_url.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            return Self { base_url: DEFAULT_API_BASE_URL.to_owned() };
        }
        Self { base_url: trimmed.to_owned() }
    }

    /// Build config from the compile-time `WALL_API_URL` variable.
    ///
    /// Falls back to [`DEFAULT_API_BASE_URL`] when unset or blank.
    pub fn from_env() -> Self {
        Self::new(option_env!("WALL_API_URL").unwrap_or(DEFAULT_API_BASE_URL))
    }

    /// Absolute URL for an API path such as `/api/messages/`.
    pub fn endpoint(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{path}", self.base_url)
        } else {
            format!("{}/{path}", self.base_url)
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_BASE_URL)
    }
}
