//! Client configuration.

use serde::Deserialize;

/// Environment variable overriding the API base URL.
pub const API_URL_ENV: &str = "LEXORA_API_URL";

/// Configuration for [`SessionClient`](crate::SessionClient).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the versioned API, e.g. `https://backend.lexora.uz/api/v1`.
    #[serde(default = "ClientConfig::default_base_url")]
    pub base_url: String,
}

impl ClientConfig {
    /// Production API base URL.
    pub const DEFAULT_BASE_URL: &'static str = "https://backend.lexora.uz/api/v1";

    fn default_base_url() -> String {
        Self::DEFAULT_BASE_URL.to_string()
    }

    /// Create a configuration for the given base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    /// Read the configuration from the environment, falling back to defaults.
    #[must_use]
    pub fn from_env() -> Self {
        std::env::var(API_URL_ENV)
            .ok()
            .filter(|url| !url.trim().is_empty())
            .map_or_else(Self::default, Self::new)
    }

    /// Base URL without trailing slashes.
    #[must_use]
    pub fn normalized_base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: Self::default_base_url(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "https://backend.lexora.uz/api/v1");
    }

    #[test]
    fn trailing_slash_trimmed() {
        let config = ClientConfig::new("http://localhost:8000/api/v1//");
        assert_eq!(config.normalized_base_url(), "http://localhost:8000/api/v1");
    }

    #[test]
    fn deserialize_with_defaults() {
        let config: ClientConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, ClientConfig::default());

        let config: ClientConfig =
            serde_json::from_str(r#"{"base_url":"http://localhost:8000/api/v1"}"#).unwrap();
        assert_eq!(config.base_url, "http://localhost:8000/api/v1");
    }
}
