//! CLI execution context.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use storefront_commerce::Money;
use storefront_data::StorefrontClient;
use tracing::debug;

use crate::config::CliConfig;
use crate::output::Output;

/// Config file names, in lookup order.
pub const CONFIG_NAMES: [&str; 3] = ["storefront.toml", ".storefront.toml", "storefront.json"];

/// Environment variable overriding `api.base_url`.
pub const API_URL_ENV: &str = "STOREFRONT_API_URL";

/// Execution context for CLI commands.
pub struct Context {
    /// CLI configuration.
    pub config: CliConfig,
    /// Where the configuration came from, if a file was found.
    pub config_path: Option<PathBuf>,
    /// Output handler.
    pub output: Output,
    /// Working directory.
    pub cwd: PathBuf,
}

impl Context {
    /// Load context from config file.
    pub fn load(config_path: Option<&str>, output: Output) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current directory")?;

        let (mut config, config_path) = if let Some(path) = config_path {
            (CliConfig::load(path)?, Some(PathBuf::from(path)))
        } else {
            // Try to find config in current directory or parent directories
            match Self::find_config(&cwd) {
                Some((config, path)) => (config, Some(path)),
                None => (CliConfig::default(), None),
            }
        };

        apply_env_overrides(&mut config, std::env::var(API_URL_ENV).ok());
        debug!(
            config = ?config_path,
            base_url = %config.api.base_url,
            "configuration loaded"
        );

        Ok(Self {
            config,
            config_path,
            output,
            cwd,
        })
    }

    /// Find config file in directory tree.
    fn find_config(start: &Path) -> Option<(CliConfig, PathBuf)> {
        let mut current = start.to_path_buf();
        loop {
            for name in &CONFIG_NAMES {
                let config_path = current.join(name);
                if config_path.exists() {
                    if let Ok(config) = CliConfig::load(config_path.to_str()?) {
                        return Some((config, config_path));
                    }
                }
            }

            if !current.pop() {
                break;
            }
        }

        None
    }

    /// Client for the configured API.
    pub fn client(&self) -> Result<StorefrontClient> {
        StorefrontClient::new(self.config.api.base_url.clone(), self.config.timeout())
            .with_context(|| format!("Failed to create client for {}", self.config.api.base_url))
    }

    /// Format an amount with the configured currency symbol.
    pub fn money(&self, amount: Money) -> String {
        amount.display_with(&self.config.display.currency_symbol)
    }
}

/// Apply environment overrides on top of file configuration.
fn apply_env_overrides(config: &mut CliConfig, api_url: Option<String>) {
    if let Some(url) = api_url.filter(|u| !u.trim().is_empty()) {
        config.api.base_url = url.trim().to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_override_replaces_base_url() {
        let mut config = CliConfig::default();
        apply_env_overrides(&mut config, Some(" https://api.shop.example ".to_string()));
        assert_eq!(config.api.base_url, "https://api.shop.example");
    }

    #[test]
    fn test_blank_env_override_is_ignored() {
        let mut config = CliConfig::default();
        apply_env_overrides(&mut config, Some("  ".to_string()));
        apply_env_overrides(&mut config, None);
        assert_eq!(config.api.base_url, "http://localhost:8080");
    }

    #[test]
    fn test_find_config_walks_up() {
        let root = std::env::temp_dir().join(format!("storefront-cli-ctx-{}", std::process::id()));
        let nested = root.join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(
            root.join("storefront.toml"),
            "[display]\ncurrency_symbol = \"EUR\"\n",
        )
        .unwrap();

        let (config, path) = Context::find_config(&nested).unwrap();
        assert_eq!(config.display.currency_symbol, "EUR");
        assert_eq!(path, root.join("storefront.toml"));

        std::fs::remove_dir_all(&root).unwrap();
    }
}
