pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::{CliArgs, LocalStorage};

pub use adapters::{CsvFileSink, HubSpotFetcher, HubSpotOptions, OutputFileNames};
pub use config::MigrationConfig;
pub use core::assembler::{AssemblerOptions, MigrationSummary};
pub use core::{etl::MigrationEngine, pipeline::MigrationPipeline};
pub use utils::error::{MigrationError, Result};
