//! Client configuration.
//!
//! Values can come from code, from any serde source, or from the
//! `TOPSY_API_KEY`, `TOPSY_USER_AGENT` and `TOPSY_BASE_URL` environment
//! variables.

use serde::Deserialize;

pub const DEFAULT_BASE_URL: &str = "http://otter.topsy.com";

pub const API_KEY_ENV: &str = "TOPSY_API_KEY";
pub const USER_AGENT_ENV: &str = "TOPSY_USER_AGENT";
pub const BASE_URL_ENV: &str = "TOPSY_BASE_URL";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Sent as the `apikey` parameter on every request when set.
    pub api_key: Option<String>,
    /// Sent as the `User-Agent` header. Topsy asks for the URL of the calling
    /// application or service.
    pub user_agent: Option<String>,
    pub base_url: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            user_agent: None,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl ClientConfig {
    /// Load from the process environment. Unset or empty variables keep
    /// their defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |name: &str| lookup(name).filter(|v| !v.is_empty());
        let defaults = Self::default();
        Self {
            api_key: read(API_KEY_ENV),
            user_agent: read(USER_AGENT_ENV),
            base_url: read(BASE_URL_ENV).unwrap_or(defaults.base_url),
        }
    }
}
