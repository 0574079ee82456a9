use crate::core::assembler::MigrationSummary;
use crate::domain::ports::Pipeline;
use crate::utils::error::Result;

/// What a completed run produced.
#[derive(Debug, Clone)]
pub struct MigrationReport {
    pub summary: MigrationSummary,
    pub files: Vec<String>,
}

pub struct MigrationEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> MigrationEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    /// Run the three phases. Nothing is written unless extraction completed.
    pub async fn run(&self) -> Result<MigrationReport> {
        tracing::info!("🚀 Starting HubSpot → Salesforce migration");

        tracing::info!("📡 Fetching companies, contacts and deals...");
        let snapshot = self.pipeline.extract().await?;

        tracing::info!("🔄 Validating and mapping {} records...", snapshot.total_records());
        let output = self.pipeline.transform(snapshot).await?;

        let summary = output.summary.clone();
        tracing::info!("💾 Writing output files...");
        let files = self.pipeline.load(output).await?;

        for file in &files {
            tracing::info!("📁 {}", file);
        }
        tracing::info!("✅ Migration completed");

        Ok(MigrationReport { summary, files })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::assembler::AssemblerOptions;
    use crate::core::collector::tests::ScriptedFetcher;
    use crate::core::pipeline::tests::RecordingSink;
    use crate::core::pipeline::MigrationPipeline;
    use crate::domain::model::{AssociationEdge, EntityType, FetchedPage, RawRecord};
    use crate::utils::error::MigrationError;
    use chrono::NaiveDate;

    fn options() -> AssemblerOptions {
        AssemblerOptions::new(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap())
    }

    #[tokio::test]
    async fn test_run_reports_summary_and_files() {
        let fetcher = ScriptedFetcher::default()
            .page(
                EntityType::Company,
                None,
                FetchedPage::last(
                    vec![RawRecord::new(EntityType::Company, "c1").with_field("name", "Acme")],
                    Vec::new(),
                ),
            )
            .page(
                EntityType::Deal,
                None,
                FetchedPage::last(
                    vec![RawRecord::new(EntityType::Deal, "d1")
                        .with_field("dealname", "Rollout")
                        .with_field("dealstage", "closedwon")],
                    vec![AssociationEdge::deal_to_company("d1", "c1")],
                ),
            );
        let engine = MigrationEngine::new(MigrationPipeline::new(
            fetcher,
            RecordingSink::default(),
            options(),
            10,
        ));

        let report = engine.run().await.unwrap();
        assert_eq!(report.files.len(), 4);
        assert_eq!(report.summary.entity(EntityType::Deal).accepted, 1);
    }

    #[tokio::test]
    async fn test_fetch_failure_writes_nothing() {
        let fetcher = ScriptedFetcher::default().fail(EntityType::Company, None, "503 Service Unavailable");
        let sink = RecordingSink::default();
        let engine = MigrationEngine::new(MigrationPipeline::new(fetcher, sink.clone(), options(), 10));

        let err = engine.run().await.unwrap_err();
        assert!(matches!(
            err,
            MigrationError::FetchError {
                entity: EntityType::Company,
                ..
            }
        ));
        assert!(sink.written.lock().unwrap().is_empty());
    }
}
