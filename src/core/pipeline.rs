use crate::core::assembler::{AssembledOutput, AssemblerOptions, BatchAssembler};
use crate::core::collector::{Collector, SourceSnapshot};
use crate::domain::ports::{CsvSink, Pipeline, RecordFetcher};
use crate::utils::error::Result;

/// HubSpot → Salesforce migration expressed as extract / transform / load.
pub struct MigrationPipeline<F: RecordFetcher, S: CsvSink> {
    fetcher: F,
    sink: S,
    options: AssemblerOptions,
    max_pages: usize,
}

impl<F: RecordFetcher, S: CsvSink> MigrationPipeline<F, S> {
    pub fn new(fetcher: F, sink: S, options: AssemblerOptions, max_pages: usize) -> Self {
        Self {
            fetcher,
            sink,
            options,
            max_pages,
        }
    }
}

#[async_trait::async_trait]
impl<F: RecordFetcher, S: CsvSink> Pipeline for MigrationPipeline<F, S> {
    async fn extract(&self) -> Result<SourceSnapshot> {
        Collector::new(&self.fetcher, self.max_pages).collect().await
    }

    async fn transform(&self, snapshot: SourceSnapshot) -> Result<AssembledOutput> {
        tracing::debug!(
            "Assembling {} records with capacity {} per file, tie-break {:?}, orphan deals {:?}",
            snapshot.total_records(),
            self.options.capacity,
            self.options.tie_break,
            self.options.orphan_deals
        );
        Ok(BatchAssembler::new(self.options).assemble(snapshot))
    }

    async fn load(&self, output: AssembledOutput) -> Result<Vec<String>> {
        let AssembledOutput {
            accounts_contacts,
            opportunities,
            account_errors,
            opportunity_errors,
            ..
        } = output;

        // 錯誤檔永遠寫出，即使只有表頭
        let files = vec![
            self.sink.write_rows(accounts_contacts).await?,
            self.sink.write_rows(opportunities).await?,
            self.sink.write_errors(account_errors).await?,
            self.sink.write_errors(opportunity_errors).await?,
        ];
        Ok(files)
    }
}
