//! Subcommands and the state they share.

pub mod config;
pub mod edit;
pub mod export;
pub mod ingest;
pub mod list;
pub mod parse;
pub mod stats;

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Args;
use rust_decimal::Decimal;
use tracing::debug;

use rcpt_core::models::config::RcptConfig;
use rcpt_core::storage::{ReceiptQuery, ReceiptStore, SortField, SortOrder};

/// Global options every command may consult.
pub struct Context {
    pub config_path: Option<PathBuf>,
    pub db_path: Option<PathBuf>,
}

impl Context {
    /// Config file in effect: `--config`, else the per-user default.
    pub fn config_file(&self) -> PathBuf {
        self.config_path.clone().unwrap_or_else(config::default_config_path)
    }

    /// Load the configuration, falling back to defaults when no file exists.
    ///
    /// An explicit `--config` must exist.
    pub fn load_config(&self) -> anyhow::Result<RcptConfig> {
        let path = self.config_file();
        if self.config_path.is_none() && !path.exists() {
            debug!("No config file at {}, using defaults", path.display());
            return Ok(RcptConfig::default());
        }

        RcptConfig::from_file(&path)
            .with_context(|| format!("Failed to load config from {}", path.display()))
    }

    /// Open the receipt database named by `--db` or the configuration.
    pub fn open_store(&self, config: &RcptConfig) -> anyhow::Result<ReceiptStore> {
        let path = self
            .db_path
            .clone()
            .unwrap_or_else(|| config.storage.database_path.clone());

        ReceiptStore::open(&path)
            .with_context(|| format!("Failed to open database {}", path.display()))
    }
}

/// Filters and ordering shared by `list` and `export`.
#[derive(Args, Debug, Default)]
pub struct FilterArgs {
    /// Substring to look for in vendor, category or filename
    #[arg(short, long)]
    search: Option<String>,

    /// Exact vendor
    #[arg(long)]
    vendor: Option<String>,

    /// Exact category
    #[arg(long)]
    category: Option<String>,

    /// Exact currency code
    #[arg(long)]
    currency: Option<String>,

    /// Minimum amount (inclusive)
    #[arg(long)]
    min_amount: Option<Decimal>,

    /// Maximum amount (inclusive)
    #[arg(long)]
    max_amount: Option<Decimal>,

    /// Earliest date, YYYY-MM-DD (inclusive)
    #[arg(long)]
    date_from: Option<String>,

    /// Latest date, YYYY-MM-DD (inclusive)
    #[arg(long)]
    date_to: Option<String>,

    /// Sort by amount, date, vendor, category or currency
    #[arg(long)]
    sort_by: Option<SortField>,

    /// Sort order (asc or desc)
    #[arg(long, default_value = "asc")]
    order: SortOrder,
}

impl FilterArgs {
    pub fn to_query(&self) -> ReceiptQuery {
        ReceiptQuery {
            search: self.search.clone(),
            vendor: self.vendor.clone(),
            category: self.category.clone(),
            currency: self.currency.clone(),
            min_amount: self.min_amount,
            max_amount: self.max_amount,
            date_from: self.date_from.clone(),
            date_to: self.date_to.clone(),
            sort_by: self.sort_by,
            order: self.order,
            ..ReceiptQuery::default()
        }
    }
}
