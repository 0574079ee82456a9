use clap::Parser;
use crm_migrate::config::cli::ensure_empty_output_dir;
use crm_migrate::core::assembler::MigrationSummary;
use crm_migrate::utils::error::{ErrorSeverity, MigrationError};
use crm_migrate::utils::{logger, validation::Validate};
use crm_migrate::{
    CliArgs, CsvFileSink, HubSpotFetcher, LocalStorage, MigrationConfig, MigrationEngine,
    MigrationPipeline,
};
use std::path::Path;

const IMPORT_STEPS: &str = "\
How to import the accounts and contacts file:
  1. Open Accounts → Import → Data Import Wizard
  2. Select \"Accounts and Contacts\" - \"Add new records\"
  3. Match Contact by Name, match Account by Name & Site
  4. Set Character Code to Unicode (UTF-8)
  5. Upload the file and follow the wizard

How to import the opportunities file:
  1. Open Sales → Opportunities → Import
  2. Select \"Import From File\", upload the file and follow the wizard
  3. The Account name of each opportunity is stored in its Next Step field.
     Run a Flow that finds the Account with that Name, sets the
     Opportunity's Account and clears Next Step.

Rows in the errors files were not imported; fix them by hand.";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    if args.log_json {
        logger::init_json_logger(args.verbose);
    } else {
        logger::init_cli_logger(args.verbose);
    }
    tracing::info!("Starting crm-migrate CLI");

    let config = match args.load_config().and_then(|config| {
        config.validate()?;
        ensure_empty_output_dir(&config.output.output_path)?;
        Ok(config)
    }) {
        Ok(config) => config,
        Err(e) => exit_with(&e),
    };
    tracing::debug!("Config: {:?}", config);

    let engine = match build_engine(&config) {
        Ok(engine) => engine,
        Err(e) => exit_with(&e),
    };

    match engine.run().await {
        Ok(report) => {
            print_summary(&report.summary);
            let output_dir = Path::new(&config.output.output_path);
            for file in &report.files {
                println!("📁 {}", output_dir.join(file).display());
            }
            println!();
            println!("{}", IMPORT_STEPS);
        }
        Err(e) => exit_with(&e),
    }

    Ok(())
}

type Engine = MigrationEngine<MigrationPipeline<HubSpotFetcher, CsvFileSink<LocalStorage>>>;

fn build_engine(config: &MigrationConfig) -> crm_migrate::Result<Engine> {
    let fetcher = HubSpotFetcher::new(
        &config.source.base_url,
        config.token()?.clone(),
        config.hubspot_options(),
    )?;
    let sink = CsvFileSink::new(
        LocalStorage::new(&config.output.output_path),
        config.output.files.clone(),
    );
    let today = chrono::Local::now().date_naive();
    let pipeline = MigrationPipeline::new(
        fetcher,
        sink,
        config.assembler_options(today),
        config.source.max_pages,
    );
    Ok(MigrationEngine::new(pipeline))
}

fn print_summary(summary: &MigrationSummary) {
    println!("✅ Migration completed");
    println!();
    print!("{}", summary);
    if summary.total_rejected() > 0 {
        println!();
        println!(
            "⚠️ {} records were rejected, see the errors_*.csv files",
            summary.total_rejected()
        );
    }
}

fn exit_with(e: &MigrationError) -> ! {
    tracing::error!(
        "❌ Migration failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    // 依嚴重程度決定退出碼
    let code = match e.severity() {
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(code)
}
