use crate::config::MigrationConfig;
use crate::core::association::TieBreakPolicy;
use crate::core::validator::OrphanPolicy;
use crate::domain::ports::Storage;
use crate::utils::error::{MigrationError, Result};
use clap::Parser;
use secrecy::SecretString;
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(name = "crm-migrate")]
#[command(about = "Migrate HubSpot companies, contacts and deals into Salesforce import CSV files")]
pub struct CliArgs {
    /// TOML configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory for the four CSV files; must be empty or missing
    #[arg(long)]
    pub output_dir: Option<String>,

    /// HubSpot private app token
    #[arg(long, env = "HUBSPOT_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Maximum rows per output file
    #[arg(long)]
    pub capacity: Option<usize>,

    #[arg(long, value_name = "first_seen|last_seen")]
    pub tie_break: Option<TieBreakPolicy>,

    #[arg(long, value_name = "blank|reject")]
    pub orphan_deals: Option<OrphanPolicy>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log as JSON lines")]
    pub log_json: bool,
}

impl CliArgs {
    /// Load the config file (if any) and apply the flags on top of it.
    pub fn load_config(&self) -> Result<MigrationConfig> {
        let mut config = match &self.config {
            Some(path) => MigrationConfig::from_file(path)?,
            None => MigrationConfig::default(),
        };
        self.apply(&mut config);
        Ok(config)
    }

    pub fn apply(&self, config: &mut MigrationConfig) {
        if let Some(dir) = &self.output_dir {
            config.output.output_path = dir.clone();
        }
        if let Some(token) = &self.token {
            config.source.token = Some(SecretString::new(token.clone()));
        }
        if let Some(capacity) = self.capacity {
            config.migration.capacity = capacity;
        }
        if let Some(tie_break) = self.tie_break {
            config.migration.tie_break = tie_break;
        }
        if let Some(orphan_deals) = self.orphan_deals {
            config.migration.orphan_deals = orphan_deals;
        }
    }
}

/// Refuse to mix a new run with files left by an earlier one.
pub fn ensure_empty_output_dir(path: &str) -> Result<()> {
    let dir = Path::new(path);
    if !dir.exists() {
        return Ok(());
    }
    if !dir.is_dir() {
        return Err(MigrationError::ConfigValidationError {
            field: "output.output_path".to_string(),
            message: format!("{} exists and is not a directory", path),
        });
    }
    if std::fs::read_dir(dir)?.next().is_some() {
        return Err(MigrationError::ConfigValidationError {
            field: "output.output_path".to_string(),
            message: format!("{} is not empty, choose a new or empty directory", path),
        });
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }
}

impl Storage for LocalStorage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        Ok(tokio::fs::read(self.base_path.join(path)).await?)
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = self.base_path.join(path);
        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(full_path, data).await?;
        Ok(())
    }
}
