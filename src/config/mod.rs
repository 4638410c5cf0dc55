use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{
    core::{
        ledger_store::DEFAULT_STORAGE_KEY,
        utils::{ensure_dir, write_replacing, PathResolver},
    },
    currency::{CurrencyCode, FormatOptions, LocaleConfig, NegativeStyle},
    errors::LedgerError,
};

/// Station preferences: display locale, currency and storage layout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub locale: LocaleConfig,
    #[serde(default = "Config::default_currency")]
    pub currency: String,
    #[serde(default = "Config::default_storage_key")]
    pub storage_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Overrides the base directory used for ledger data and archives.
    pub data_dir: Option<PathBuf>,
    #[serde(default = "Config::default_archive_retention")]
    pub archive_retention: usize,
    #[serde(default = "Config::default_negative_style")]
    pub negative_style: NegativeStyle,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            locale: LocaleConfig::default(),
            currency: Self::default_currency(),
            storage_key: Self::default_storage_key(),
            data_dir: None,
            archive_retention: Self::default_archive_retention(),
            negative_style: Self::default_negative_style(),
        }
    }
}

impl Config {
    fn default_currency() -> String {
        "COP".into()
    }

    fn default_storage_key() -> String {
        DEFAULT_STORAGE_KEY.into()
    }

    fn default_archive_retention() -> usize {
        5
    }

    fn default_negative_style() -> NegativeStyle {
        NegativeStyle::Sign
    }

    pub fn currency_code(&self) -> CurrencyCode {
        CurrencyCode::new(self.currency.clone())
    }

    pub fn format_options(&self) -> FormatOptions {
        FormatOptions {
            negative_style: self.negative_style,
            ..FormatOptions::default()
        }
    }
}

/// Loads and saves [`Config`] as `config/config.json` under the base directory.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Result<Self, LedgerError> {
        Self::with_base_dir(PathResolver::base_dir())
    }

    pub fn with_base_dir(base: PathBuf) -> Result<Self, LedgerError> {
        ensure_dir(&base)?;
        ensure_dir(&PathResolver::config_dir_in(&base))?;
        Ok(Self::locate_in(&base))
    }

    /// Points at the default config file without creating any directories.
    pub fn locate() -> Self {
        Self::locate_in(&PathResolver::base_dir())
    }

    pub fn locate_in(base: &Path) -> Self {
        Self {
            path: PathResolver::config_file_in(base),
        }
    }

    pub fn load(&self) -> Result<Config, LedgerError> {
        if self.path.exists() {
            let data = fs::read_to_string(&self.path)?;
            Ok(serde_json::from_str(&data)?)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self, config: &Config) -> Result<(), LedgerError> {
        let json = serde_json::to_string_pretty(config)?;
        write_replacing(&self.path, &json)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
