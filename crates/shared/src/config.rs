//! Application configuration management.
//!
//! Configuration is layered: `config/default.toml`, then `config/{RUN_MODE}.toml`,
//! then `FREIGHTLEDGER__*` environment variables. The accounting section is the
//! explicit settings object handed to the ledger core; [`SettingsHandle`] gives
//! long-running processes a way to refresh it without restarting.

use std::sync::{Arc, PoisonError, RwLock};

use chrono::Datelike;
use serde::{Deserialize, Serialize};

/// Environment variable prefix for configuration overrides.
pub const ENV_PREFIX: &str = "FREIGHTLEDGER";

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Accounting settings consumed by the ledger core.
    #[serde(default)]
    pub accounting: AccountingSettings,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// What to do when a month has no period lock row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostingPolicy {
    /// A missing period row means the period is open.
    #[default]
    OpenIfMissing,
    /// A missing period row means the period is locked.
    StrictRequire,
}

impl PostingPolicy {
    /// Returns the stored string form.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::OpenIfMissing => "open_if_missing",
            Self::StrictRequire => "strict_require",
        }
    }
}

impl std::fmt::Display for PostingPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PostingPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "open_if_missing" => Ok(Self::OpenIfMissing),
            "strict_require" => Ok(Self::StrictRequire),
            other => Err(format!("Unknown posting policy: {other}")),
        }
    }
}

/// Default account mappings used by collaborators (invoicing, receipts).
///
/// Values are account codes in the active fiscal year's chart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DefaultAccounts {
    /// Accounts receivable for sales invoices.
    #[serde(default)]
    pub ar: Option<String>,
    /// Sales revenue for sales invoices.
    #[serde(default)]
    pub sales: Option<String>,
    /// Output tax payable for sales invoices.
    #[serde(default)]
    pub tax: Option<String>,
    /// Cash/bank account for receipts and payments.
    #[serde(default)]
    pub cash: Option<String>,
    /// Withholding tax (PPh) taken on customer receipts.
    #[serde(default)]
    pub pph: Option<String>,
}

impl DefaultAccounts {
    /// Returns every mapping as `(name, code)`, skipping unset ones.
    pub fn configured(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            ("ar", self.ar.as_deref()),
            ("sales", self.sales.as_deref()),
            ("tax", self.tax.as_deref()),
            ("cash", self.cash.as_deref()),
            ("pph", self.pph.as_deref()),
        ]
        .into_iter()
        .filter_map(|(name, code)| code.map(|c| (name, c)))
    }
}

/// Accounting settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AccountingSettings {
    /// Fiscal year whose chart of accounts is active.
    #[serde(default = "default_fiscal_year")]
    pub active_fiscal_year: i32,
    /// Resolution for months without a period lock row.
    #[serde(default)]
    pub posting_policy: PostingPolicy,
    /// Default account mappings.
    #[serde(default)]
    pub default_accounts: DefaultAccounts,
}

fn default_fiscal_year() -> i32 {
    chrono::Local::now().year()
}

impl Default for AccountingSettings {
    fn default() -> Self {
        Self {
            active_fiscal_year: default_fiscal_year(),
            posting_policy: PostingPolicy::default(),
            default_accounts: DefaultAccounts::default(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());
        Self::load_from("config", &run_mode)
    }

    /// Loads configuration from a specific directory and run mode.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load_from(config_dir: &str, run_mode: &str) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(&format!("{config_dir}/default")).required(false))
            .add_source(
                config::File::with_name(&format!("{config_dir}/{run_mode}")).required(false),
            )
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

/// Shared, refreshable view of the accounting settings.
///
/// Readers take a cheap snapshot with [`SettingsHandle::current`]; a snapshot
/// never changes underneath the operation holding it.
#[derive(Debug, Clone)]
pub struct SettingsHandle {
    inner: Arc<RwLock<Arc<AccountingSettings>>>,
}

impl SettingsHandle {
    /// Wraps settings loaded at process start.
    #[must_use]
    pub fn new(settings: AccountingSettings) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(settings))),
        }
    }

    /// Returns the current settings snapshot.
    #[must_use]
    pub fn current(&self) -> Arc<AccountingSettings> {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&*guard)
    }

    /// Swaps in new settings, returning the previous snapshot.
    pub fn replace(&self, settings: AccountingSettings) -> Arc<AccountingSettings> {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, Arc::new(settings))
    }

    /// Re-reads the layered configuration and swaps in its accounting section.
    ///
    /// On error the current settings are kept.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn reload(&self) -> Result<Arc<AccountingSettings>, config::ConfigError> {
        let config = AppConfig::load()?;
        self.replace(config.accounting);
        Ok(self.current())
    }
}

impl From<AccountingSettings> for SettingsHandle {
    fn from(settings: AccountingSettings) -> Self {
        Self::new(settings)
    }
}
