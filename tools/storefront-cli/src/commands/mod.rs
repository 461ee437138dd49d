//! CLI command implementations.

pub mod config;
pub mod order;
pub mod products;
pub mod shell;

use clap::{Args, Subcommand};

use order::ItemSpec;

/// Arguments for the products command.
#[derive(Args)]
pub struct ProductsArgs {
    /// Only products whose name matches this term.
    #[arg(short, long)]
    pub search: Option<String>,

    /// Page to show (0-indexed).
    #[arg(short, long, default_value = "0")]
    pub page: u32,

    /// Products per page (default: search.page_size from config).
    #[arg(long)]
    pub size: Option<u32>,
}

/// Arguments for the order command.
#[derive(Args)]
pub struct OrderArgs {
    /// Item to order as PRODUCT_ID:QUANTITY (repeatable).
    #[arg(short, long = "item", value_name = "ID:QTY", required = true, value_parser = order::parse_item)]
    pub items: Vec<ItemSpec>,

    /// Skip confirmation prompt.
    #[arg(short, long)]
    pub yes: bool,
}

/// Arguments for the shell command.
#[derive(Args)]
pub struct ShellArgs {
    /// Initial search term.
    #[arg(short, long)]
    pub search: Option<String>,
}

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration.
    Show,
    /// Get a config value.
    Get {
        /// Config key (dot-separated).
        key: String,
    },
    /// Set a config value.
    Set {
        /// Config key (dot-separated).
        key: String,
        /// Value to set.
        value: String,
    },
    /// Initialize a new config file.
    Init {
        /// Force overwrite existing config.
        #[arg(short, long)]
        force: bool,
    },
    /// Validate the config file.
    Validate,
}
