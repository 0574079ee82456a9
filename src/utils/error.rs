use crate::domain::model::EntityType;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MigrationError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("HubSpot rejected the credentials (HTTP {status})")]
    AuthError { status: u16 },

    /// 抓取階段失敗，整個遷移中止，不會寫出任何檔案
    #[error(
        "Fetching {entity} failed after {pages} page(s) and {records} record(s): {message}"
    )]
    FetchError {
        entity: EntityType,
        pages: usize,
        records: usize,
        message: String,
    },

    #[error("Missing configuration value: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid configuration value for {field} ('{value}'): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Authentication,
    Configuration,
    Output,
    Processing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl MigrationError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            MigrationError::ApiError(_) => ErrorCategory::Network,
            MigrationError::FetchError { .. } => ErrorCategory::Network,
            MigrationError::AuthError { .. } => ErrorCategory::Authentication,
            MigrationError::CsvError(_) | MigrationError::IoError(_) => ErrorCategory::Output,
            MigrationError::ProcessingError { .. } => ErrorCategory::Processing,
            MigrationError::MissingConfigError { .. }
            | MigrationError::InvalidConfigValueError { .. }
            | MigrationError::ConfigValidationError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Processing => ErrorSeverity::High,
            ErrorCategory::Authentication | ErrorCategory::Output => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Network => {
                "Check network connectivity and HubSpot API status, then rerun the migration"
            }
            ErrorCategory::Authentication => {
                "Verify the HubSpot private app token and its company/contact/deal read scopes"
            }
            ErrorCategory::Configuration => "Fix the configuration file or command line flags",
            ErrorCategory::Output => "Check that the output directory is writable and has free space",
            ErrorCategory::Processing => "Inspect the source data reported in the log",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            MigrationError::FetchError {
                entity,
                pages,
                records,
                ..
            } => format!(
                "Could not download {} from HubSpot ({} records in {} pages fetched before the failure). No CSV files were written.",
                entity.plural(),
                records,
                pages
            ),
            MigrationError::AuthError { .. } => {
                "HubSpot refused the token. No CSV files were written.".to_string()
            }
            other => other.to_string(),
        }
    }

    pub(crate) fn fetch(
        entity: EntityType,
        pages: usize,
        records: usize,
        source: impl std::fmt::Display,
    ) -> Self {
        MigrationError::FetchError {
            entity,
            pages,
            records,
            message: source.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MigrationError>;
