//! Configuration management commands.

use std::fs;

use anyhow::{bail, Result};

use super::{ConfigArgs, ConfigCommand};
use crate::config::{generate_default_config, CliConfig, MAX_TIMEOUT_SECS};
use crate::context::{Context, CONFIG_NAMES};

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => show_config(ctx).await,
        ConfigCommand::Get { key } => get_config(&key, ctx).await,
        ConfigCommand::Set { key, value } => set_config(&key, &value, ctx).await,
        ConfigCommand::Init { force } => init_config(force, ctx).await,
        ConfigCommand::Validate => validate_config(ctx).await,
    }
}

async fn show_config(ctx: &Context) -> Result<()> {
    if ctx.output.is_json() {
        ctx.output.json(&ctx.config);
        return Ok(());
    }

    ctx.output.header("Current Configuration");
    match ctx.config_path {
        Some(ref path) => ctx.output.kv("file", &path.display().to_string()),
        None => ctx.output.kv("file", "(defaults)"),
    }

    ctx.output.info("");
    ctx.output.info("[api]");
    ctx.output.kv("base_url", &ctx.config.api.base_url);
    ctx.output.kv("timeout_secs", &ctx.config.api.timeout_secs.to_string());

    ctx.output.info("");
    ctx.output.info("[search]");
    ctx.output.kv("page_size", &ctx.config.search.page_size.to_string());
    ctx.output.kv("debounce_ms", &ctx.config.search.debounce_ms.to_string());

    ctx.output.info("");
    ctx.output.info("[display]");
    ctx.output.kv("currency_symbol", &ctx.config.display.currency_symbol);

    Ok(())
}

async fn get_config(key: &str, ctx: &Context) -> Result<()> {
    let value = get_config_value(&ctx.config, key)?;

    if ctx.output.is_json() {
        ctx.output.json(&serde_json::json!({ "key": key, "value": value }));
    } else {
        println!("{}", value);
    }

    Ok(())
}

async fn set_config(key: &str, value: &str, ctx: &Context) -> Result<()> {
    let config_path = match ctx.config_path {
        Some(ref path) => path.to_string_lossy().to_string(),
        None => find_config_file(&ctx.cwd)?,
    };

    // Values from the environment must not leak into the file.
    let mut config = CliConfig::load(&config_path)?;
    set_config_value(&mut config, key, value)?;
    config.save(&config_path)?;

    ctx.output.success(&format!("Set {} = {}", key, value));

    Ok(())
}

async fn init_config(force: bool, ctx: &Context) -> Result<()> {
    let config_path = ctx.cwd.join(CONFIG_NAMES[0]);

    if config_path.exists() && !force {
        bail!(
            "Config file already exists: {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    fs::write(&config_path, generate_default_config())?;

    ctx.output.success(&format!("Created: {}", config_path.display()));

    Ok(())
}

async fn validate_config(ctx: &Context) -> Result<()> {
    ctx.output.header("Validating configuration");

    let (errors, warnings) = check_config(&ctx.config);

    if errors.is_empty() && warnings.is_empty() {
        ctx.output.success("Configuration is valid");
        return Ok(());
    }

    for error in &errors {
        ctx.output.error(&format!("Error: {}", error));
    }

    for warning in &warnings {
        ctx.output.warn(&format!("Warning: {}", warning));
    }

    if !errors.is_empty() {
        bail!("Configuration has {} error(s)", errors.len());
    }

    ctx.output.success("Configuration is valid (with warnings)");

    Ok(())
}

/// Returns (errors, warnings).
fn check_config(config: &CliConfig) -> (Vec<String>, Vec<String>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let url = &config.api.base_url;
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        errors.push(format!("api.base_url '{}' must be an http(s) URL", url));
    }

    if config.api.timeout_secs == 0 {
        errors.push("api.timeout_secs must be greater than 0".to_string());
    } else if config.api.timeout_secs > MAX_TIMEOUT_SECS {
        errors.push(format!(
            "api.timeout_secs must be at most {}",
            MAX_TIMEOUT_SECS
        ));
    } else if config.api.timeout_secs > 120 {
        warnings.push(format!(
            "api.timeout_secs {} is unusually long",
            config.api.timeout_secs
        ));
    }

    if !(1..=100).contains(&config.search.page_size) {
        errors.push("search.page_size must be 1-100".to_string());
    }

    if config.search.debounce_ms > 5000 {
        errors.push("search.debounce_ms must be at most 5000".to_string());
    } else if config.search.debounce_ms == 0 {
        warnings.push("search.debounce_ms is 0; every keystroke will hit the API".to_string());
    }

    if config.display.currency_symbol.trim().is_empty() {
        warnings.push("display.currency_symbol is empty".to_string());
    }

    (errors, warnings)
}

fn get_config_value(config: &CliConfig, key: &str) -> Result<String> {
    let parts: Vec<&str> = key.split('.').collect();

    match parts.as_slice() {
        ["api", "base_url"] => Ok(format!("\"{}\"", config.api.base_url)),
        ["api", "timeout_secs"] => Ok(config.api.timeout_secs.to_string()),
        ["search", "page_size"] => Ok(config.search.page_size.to_string()),
        ["search", "debounce_ms"] => Ok(config.search.debounce_ms.to_string()),
        ["display", "currency_symbol"] => Ok(format!("\"{}\"", config.display.currency_symbol)),
        _ => bail!("Unknown config key: {}", key),
    }
}

fn set_config_value(config: &mut CliConfig, key: &str, value: &str) -> Result<()> {
    let parts: Vec<&str> = key.split('.').collect();

    match parts.as_slice() {
        ["api", "base_url"] => config.api.base_url = value.to_string(),
        ["api", "timeout_secs"] => config.api.timeout_secs = value.parse()?,
        ["search", "page_size"] => config.search.page_size = value.parse()?,
        ["search", "debounce_ms"] => config.search.debounce_ms = value.parse()?,
        ["display", "currency_symbol"] => config.display.currency_symbol = value.to_string(),
        _ => bail!("Unknown or read-only config key: {}", key),
    }

    Ok(())
}

fn find_config_file(cwd: &std::path::Path) -> Result<String> {
    for name in &CONFIG_NAMES {
        let path = cwd.join(name);
        if path.exists() {
            return Ok(path.to_string_lossy().to_string());
        }
    }
    bail!("No config file found. Run `storefront config init` to create one.")
}
