#[cfg(feature = "cli")]
pub mod cli;

use crate::adapters::csv_sink::OutputFileNames;
use crate::adapters::hubspot::{HubSpotOptions, DEFAULT_BASE_URL};
use crate::core::assembler::AssemblerOptions;
use crate::core::association::TieBreakPolicy;
use crate::core::batch::DEFAULT_CAPACITY;
use crate::core::collector::DEFAULT_MAX_PAGES;
use crate::core::validator::OrphanPolicy;
use crate::utils::error::{MigrationError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_path, validate_positive_number, validate_range,
    validate_source_url, Validate,
};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

static ENV_VAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$\{([^}]+)\}").unwrap());

/// Migration settings loaded from TOML, then overridden by CLI flags.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MigrationConfig {
    pub source: SourceConfig,
    pub migration: MigrationSettings,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub base_url: String,
    /// HubSpot private app token; `secrecy` keeps it out of Debug output.
    pub token: Option<SecretString>,
    pub page_size: u32,
    pub max_pages: usize,
    pub retry_attempts: u32,
    pub retry_delay_ms: u64,
    pub timeout_seconds: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token: None,
            page_size: 100,
            max_pages: DEFAULT_MAX_PAGES,
            retry_attempts: 3,
            retry_delay_ms: 1000,
            timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MigrationSettings {
    pub capacity: usize,
    pub tie_break: TieBreakPolicy,
    pub orphan_deals: OrphanPolicy,
    /// Close date written for deals without one. Defaults to the run date.
    pub default_close_date: Option<NaiveDate>,
}

impl Default for MigrationSettings {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            tie_break: TieBreakPolicy::default(),
            orphan_deals: OrphanPolicy::default(),
            default_close_date: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub output_path: String,
    pub files: OutputFileNames,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_path: "./output".to_string(),
            files: OutputFileNames::default(),
        }
    }
}

impl MigrationConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed = Self::substitute_env_vars(content);
        toml::from_str(&processed).map_err(|e| MigrationError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換 ${VAR} 形式的環境變數，找不到的保持原樣
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR
            .replace_all(content, |caps: &regex::Captures| {
                let name = &caps[1];
                std::env::var(name).unwrap_or_else(|_| format!("${{{}}}", name))
            })
            .into_owned()
    }

    pub fn token(&self) -> Result<&SecretString> {
        self.source
            .token
            .as_ref()
            .ok_or_else(|| MigrationError::MissingConfigError {
                field: "source.token".to_string(),
            })
    }

    pub fn hubspot_options(&self) -> HubSpotOptions {
        HubSpotOptions {
            page_size: self.source.page_size,
            retry_attempts: self.source.retry_attempts,
            retry_delay: Duration::from_millis(self.source.retry_delay_ms),
            timeout: Duration::from_secs(self.source.timeout_seconds),
        }
    }

    /// Assembler options for a run started on `today`.
    pub fn assembler_options(&self, today: NaiveDate) -> AssemblerOptions {
        AssemblerOptions {
            capacity: self.migration.capacity,
            tie_break: self.migration.tie_break,
            orphan_deals: self.migration.orphan_deals,
            run_date: self.migration.default_close_date.unwrap_or(today),
        }
    }
}

impl Validate for MigrationConfig {
    fn validate(&self) -> Result<()> {
        validate_source_url("source.base_url", &self.source.base_url)?;
        validate_range("source.page_size", self.source.page_size, 1, 100)?;
        validate_positive_number("source.max_pages", self.source.max_pages, 1)?;
        validate_positive_number("source.timeout_seconds", self.source.timeout_seconds as usize, 1)?;
        validate_positive_number("migration.capacity", self.migration.capacity, 1)?;
        validate_path("output.output_path", &self.output.output_path)?;

        let names = self.output.files.all();
        for (i, name) in names.iter().enumerate() {
            validate_path("output.files", name)?;
            if names[..i].contains(name) {
                return Err(MigrationError::ConfigValidationError {
                    field: "output.files".to_string(),
                    message: format!("file name '{}' is used twice", name),
                });
            }
        }

        let token = self.token()?.expose_secret();
        validate_non_empty_string("source.token", token)?;
        if ENV_VAR.is_match(token) {
            return Err(MigrationError::ConfigValidationError {
                field: "source.token".to_string(),
                message: "token refers to an environment variable that is not set".to_string(),
            });
        }
        Ok(())
    }
}
