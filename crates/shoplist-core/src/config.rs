//! ============================================================================
//! App Configuration - Environment-driven settings
//! ============================================================================
//! SHOPLIST_WEBHOOK_URL        webhook base URL
//! SHOPLIST_DB_PATH            redb file (default ~/.shoplist/state.redb)
//! SHOPLIST_HTTP_TIMEOUT_SECS  per-request timeout
//! ============================================================================

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

/// Automation backend hosting the shopping-list webhooks
pub const DEFAULT_WEBHOOK_URL: &str = "https://complexo111.app.n8n.cloud/webhook";

const DEFAULT_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub webhook_base_url: String,
    /// None means the database picks its own default location
    pub db_path: Option<String>,
    pub request_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            webhook_base_url: DEFAULT_WEBHOOK_URL.to_string(),
            db_path: None,
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let request_timeout_secs = match lookup("SHOPLIST_HTTP_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse::<u64>().unwrap_or_else(|e| {
                warn!("Invalid SHOPLIST_HTTP_TIMEOUT_SECS '{}': {}, using default", raw, e);
                defaults.request_timeout_secs
            }),
            None => defaults.request_timeout_secs,
        };

        Self {
            webhook_base_url: lookup("SHOPLIST_WEBHOOK_URL")
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(defaults.webhook_base_url),
            db_path: lookup("SHOPLIST_DB_PATH").filter(|s| !s.trim().is_empty()),
            request_timeout_secs,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup_from(&[]));
        assert_eq!(config.webhook_base_url, DEFAULT_WEBHOOK_URL);
        assert_eq!(config.db_path, None);
        assert_eq!(config.request_timeout(), Duration::from_secs(15));
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("SHOPLIST_WEBHOOK_URL", "http://localhost:5678/webhook"),
            ("SHOPLIST_DB_PATH", "/tmp/list.redb"),
            ("SHOPLIST_HTTP_TIMEOUT_SECS", "3"),
        ]));
        assert_eq!(config.webhook_base_url, "http://localhost:5678/webhook");
        assert_eq!(config.db_path.as_deref(), Some("/tmp/list.redb"));
        assert_eq!(config.request_timeout_secs, 3);
    }

    #[test]
    fn test_bad_timeout_falls_back() {
        let config = AppConfig::from_lookup(lookup_from(&[("SHOPLIST_HTTP_TIMEOUT_SECS", "soon")]));
        assert_eq!(config.request_timeout_secs, 15);
    }
}
