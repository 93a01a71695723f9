//! Application configuration.
//!
//! Settings are layered: compiled-in defaults, then the user's TOML file,
//! then `KURSPAD_*` environment variables. A commented default file is
//! written on first start so the knobs are discoverable.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::document::CompanyProfile;
use crate::rates::RatesConfig;

/// Directory under the platform config root.
pub const CONFIG_DIR_NAME: &str = "kurspad";

/// Configuration file name.
pub const CONFIG_FILE_NAME: &str = "config.toml";

const DEFAULT_CONFIG: &str = r#"# kurspad configuration

# Currency label printed next to totals.
base_currency_label = "Rp."

# Directory exported receipts are written into. Defaults to a "kurspad"
# folder under the user's documents directory.
# export_dir = "/home/user/Documents/kurspad"

# Command run after an export, with the exported file path appended as the
# final argument. Leave unset to only copy to the clipboard.
# share_command = "lp"

[company]
name = "KURSPAD EXCHANGE"
tagline = "Authorized Money Changer"
address = "Jl. Melawai Raya No. 1, Jakarta"

[rates]
model = "gemini-3-flash-preview"
currencies = ["USD", "EUR", "SGD", "AUD", "JPY", "GBP", "CNY", "MYR"]
# api_key = ""
"#;

/// Top-level application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Company header printed on every receipt.
    pub company: CompanyProfile,
    /// Currency label for totals.
    pub base_currency_label: String,
    /// Directory exports are written into.
    pub export_dir: PathBuf,
    /// Optional command run with the exported file path appended.
    pub share_command: Option<String>,
    /// Exchange-rate lookup settings.
    pub rates: RatesConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            company: CompanyProfile::default(),
            base_currency_label: "Rp.".to_string(),
            export_dir: default_export_dir(),
            share_command: None,
            rates: RatesConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default file path plus the environment.
    pub fn load() -> Result<Self> {
        Self::load_from(&config_file_path())
    }

    fn load_from(path: &Path) -> Result<Self> {
        let settings = Config::builder()
            .add_source(Config::try_from(&AppConfig::default())?)
            .add_source(File::from(path).required(false))
            .add_source(Environment::with_prefix("KURSPAD").separator("__"))
            .build()
            .context("failed to read configuration")?;
        let config: AppConfig = settings
            .try_deserialize()
            .context("invalid configuration")?;
        debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }
}

/// Path of the user's configuration file.
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR_NAME)
        .join(CONFIG_FILE_NAME)
}

/// Write the commented default configuration file if none exists yet.
pub fn ensure_default_config() -> Result<()> {
    write_default_config(&config_file_path())
}

fn write_default_config(path: &Path) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, DEFAULT_CONFIG)
        .with_context(|| format!("failed to write {}", path.display()))?;
    debug!(path = %path.display(), "wrote default configuration");
    Ok(())
}

fn default_export_dir() -> PathBuf {
    dirs::document_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR_NAME)
}
