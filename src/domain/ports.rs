use crate::core::assembler::AssembledOutput;
use crate::core::batch::{ErrorBatch, SealedBatch};
use crate::core::collector::SourceSnapshot;
use crate::domain::model::{EntityType, FetchedPage};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// 來源系統的分頁讀取能力
#[async_trait]
pub trait RecordFetcher: Send + Sync {
    /// Fetch one page of `entity` records. `cursor` is `None` for the first page.
    async fn fetch(&self, entity: EntityType, cursor: Option<&str>) -> Result<FetchedPage>;
}

/// Serializes sealed batches into files with a fixed header.
pub trait CsvSink: Send + Sync {
    fn write_rows(
        &self,
        batch: SealedBatch,
    ) -> impl std::future::Future<Output = Result<String>> + Send;
    fn write_errors(
        &self,
        batch: ErrorBatch,
    ) -> impl std::future::Future<Output = Result<String>> + Send;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<SourceSnapshot>;
    async fn transform(&self, snapshot: SourceSnapshot) -> Result<AssembledOutput>;
    async fn load(&self, output: AssembledOutput) -> Result<Vec<String>>;
}
