//! CLI configuration.

use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use storefront_commerce::search::SearchConfig;

/// Longest per-request timeout the CLI will use.
pub const MAX_TIMEOUT_SECS: u64 = 3600;

/// CLI configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CliConfig {
    /// Backend connection.
    #[serde(default)]
    pub api: ApiConfig,

    /// Product search tuning.
    #[serde(default)]
    pub search: SearchSettings,

    /// Presentation.
    #[serde(default)]
    pub display: DisplayConfig,
}

impl CliConfig {
    /// Load config from a file.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        if path.ends_with(".json") {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path))
        } else {
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse TOML config: {}", path))
        }
    }

    /// Save config to a file.
    pub fn save(&self, path: &str) -> Result<()> {
        let content = if path.ends_with(".json") {
            serde_json::to_string_pretty(self)?
        } else {
            toml::to_string_pretty(self)?
        };

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path))
    }

    /// Debounce and page size for [`storefront_commerce::ProductSearch`].
    pub fn search_config(&self) -> SearchConfig {
        SearchConfig {
            quiescence: Duration::from_millis(self.search.debounce_ms),
            page_size: self.search.page_size,
        }
    }

    /// Per-request timeout, capped at [`MAX_TIMEOUT_SECS`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs.min(MAX_TIMEOUT_SECS))
    }
}

/// Backend connection settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiConfig {
    /// Root URL of the storefront API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Search settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchSettings {
    /// Products per page.
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Idle time after typing before a search is sent.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_page_size() -> u32 {
    10
}

fn default_debounce_ms() -> u64 {
    300
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            debounce_ms: default_debounce_ms(),
        }
    }
}

/// Display settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DisplayConfig {
    /// Prefix for prices.
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,
}

fn default_currency_symbol() -> String {
    "R$".to_string()
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            currency_symbol: default_currency_symbol(),
        }
    }
}

/// Generate a default storefront.toml config file.
pub fn generate_default_config() -> String {
    r#"# Storefront CLI configuration

[api]
base_url = "http://localhost:8080"
timeout_secs = 10

[search]
page_size = 10
debounce_ms = 300

[display]
currency_symbol = "R$"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_config_matches_defaults() {
        let parsed: CliConfig = toml::from_str(&generate_default_config()).unwrap();
        assert_eq!(parsed, CliConfig::default());
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let parsed: CliConfig = toml::from_str(
            r#"
            [api]
            base_url = "https://shop.example"

            [search]
            debounce_ms = 150
            "#,
        )
        .unwrap();

        assert_eq!(parsed.api.base_url, "https://shop.example");
        assert_eq!(parsed.api.timeout_secs, 10);
        assert_eq!(parsed.search.page_size, 10);
        assert_eq!(parsed.search_config().quiescence, Duration::from_millis(150));
        assert_eq!(parsed.display.currency_symbol, "R$");
    }

    #[test]
    fn test_json_config() {
        let parsed: CliConfig =
            serde_json::from_str(r#"{"display": {"currency_symbol": "$"}}"#).unwrap();
        assert_eq!(parsed.display.currency_symbol, "$");
        assert_eq!(parsed.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_timeout_is_capped() {
        let mut config = CliConfig::default();
        config.api.timeout_secs = u64::MAX;
        assert_eq!(config.timeout(), Duration::from_secs(MAX_TIMEOUT_SECS));
    }
}
