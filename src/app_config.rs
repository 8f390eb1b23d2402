use anyhow::{anyhow, Context, Result};
use log::{debug, LevelFilter};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::ofx::{AccountInfo, OfxTimezone};
use crate::providers::google::DEFAULT_ENDPOINT;

/// Application configuration module
///
/// Handles loading and validating `conf.json`. Every field has a default,
/// so a partial file or no file at all is a valid configuration.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// Target language code (ISO)
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// Translation config
    #[serde(default)]
    pub translation: TranslationSettings,

    /// Statement account and institution values
    #[serde(default)]
    pub account: AccountSettings,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Google translation settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TranslationSettings {
    // @field: API key; the command line and environment take precedence
    #[serde(default)]
    pub api_key: String,

    // @field: Service URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    // @field: Timeout seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    // @field: Retries for connection failures and server errors
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    // @field: Base backoff, doubled on each retry
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    // @field: Persistent translation cache
    #[serde(default = "default_cache_file")]
    pub cache_file: String,

    // @field: Render "translation (source)" rather than the bare translation
    #[serde(default = "default_true")]
    pub append_source_text: bool,
}

impl Default for TranslationSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: default_endpoint(),
            timeout_secs: default_timeout_secs(),
            retry_count: default_retry_count(),
            retry_backoff_ms: default_retry_backoff_ms(),
            cache_file: default_cache_file(),
            append_source_text: true,
        }
    }
}

/// Values written into the statement's account and sign-on sections
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AccountSettings {
    #[serde(default = "default_institution")]
    pub bank_id: String,

    #[serde(default = "default_institution")]
    pub org: String,

    #[serde(default = "default_fid")]
    pub fid: String,

    /// CHECKING, SAVINGS, MONEYMRKT or CREDITLINE
    #[serde(default = "default_account_type")]
    pub account_type: String,

    #[serde(default = "default_currency")]
    pub currency: String,

    #[serde(default = "default_timezone_offset_hours")]
    pub timezone_offset_hours: i32,

    #[serde(default = "default_timezone_name")]
    pub timezone_name: String,
}

impl Default for AccountSettings {
    fn default() -> Self {
        Self {
            bank_id: default_institution(),
            org: default_institution(),
            fid: default_fid(),
            account_type: default_account_type(),
            currency: default_currency(),
            timezone_offset_hours: default_timezone_offset_hours(),
            timezone_name: default_timezone_name(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

const ACCOUNT_TYPES: [&str; 4] = ["CHECKING", "SAVINGS", "MONEYMRKT", "CREDITLINE"];

/// Retries per translation request accepted from configuration
pub const MAX_RETRY_COUNT: u32 = 10;

fn default_target_language() -> String {
    "en".to_string()
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_retry_count() -> u32 {
    2
}

fn default_retry_backoff_ms() -> u64 {
    1000 // doubled on each retry
}

fn default_cache_file() -> String {
    "translations.txt".to_string()
}

fn default_true() -> bool {
    true
}

fn default_institution() -> String {
    "ALIPAY".to_string()
}

fn default_fid() -> String {
    "NOFID".to_string()
}

fn default_account_type() -> String {
    "CHECKING".to_string()
}

fn default_currency() -> String {
    "CNY".to_string()
}

fn default_timezone_offset_hours() -> i32 {
    8
}

fn default_timezone_name() -> String {
    "CST".to_string()
}

impl Config {
    /// Load `path`, or use defaults when the file does not exist
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!("Config file {:?} not found, using defaults", path);
            return Ok(Self::default());
        }

        let file = File::open(path)
            .with_context(|| format!("Failed to open config file: {:?}", path))?;
        let config: Config = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;
        debug!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        crate::language_utils::validate_language_code(&self.target_language)?;

        let currency = &self.account.currency;
        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(anyhow!("Currency must be a 3-letter ISO 4217 code, got '{}'", currency));
        }

        if !ACCOUNT_TYPES.contains(&self.account.account_type.as_str()) {
            return Err(anyhow!(
                "Unsupported account type '{}', expected one of {}",
                self.account.account_type,
                ACCOUNT_TYPES.join(", ")
            ));
        }

        if self.translation.retry_count > MAX_RETRY_COUNT {
            return Err(anyhow!(
                "retry_count must be at most {}, got {}",
                MAX_RETRY_COUNT,
                self.translation.retry_count
            ));
        }

        if !(-12..=14).contains(&self.account.timezone_offset_hours) {
            return Err(anyhow!("Timezone offset out of range: {}", self.account.timezone_offset_hours));
        }

        if self.translation.cache_file.trim().is_empty() {
            return Err(anyhow!("Translation cache file must not be empty"));
        }

        Ok(())
    }

    /// Account values for the OFX document; statement-specific values are left unset
    pub fn account_info(&self) -> AccountInfo {
        AccountInfo {
            bank_id: self.account.bank_id.clone(),
            org: self.account.org.clone(),
            fid: self.account.fid.clone(),
            account_type: self.account.account_type.clone(),
            currency: self.account.currency.clone(),
            timezone: OfxTimezone {
                offset_hours: self.account.timezone_offset_hours,
                name: self.account.timezone_name.clone(),
            },
            ..AccountInfo::default()
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            target_language: default_target_language(),
            translation: TranslationSettings::default(),
            account: AccountSettings::default(),
            log_level: LogLevel::default(),
        }
    }
}
