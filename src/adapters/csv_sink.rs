use crate::core::batch::{ErrorBatch, SealedBatch};
use crate::domain::model::FileKind;
use crate::domain::ports::{CsvSink, Storage};
use crate::utils::error::Result;
use serde::{Deserialize, Serialize};

/// File names of the four artifacts, relative to the storage root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputFileNames {
    pub accounts_contacts: String,
    pub opportunities: String,
    pub errors_accounts_contacts: String,
    pub errors_opportunities: String,
}

impl Default for OutputFileNames {
    fn default() -> Self {
        Self {
            accounts_contacts: "accounts_contacts.csv".to_string(),
            opportunities: "opportunities.csv".to_string(),
            errors_accounts_contacts: "errors_accounts_contacts.csv".to_string(),
            errors_opportunities: "errors_opportunities.csv".to_string(),
        }
    }
}

impl OutputFileNames {
    pub fn rows(&self, kind: FileKind) -> &str {
        match kind {
            FileKind::AccountsContacts => &self.accounts_contacts,
            FileKind::Opportunities => &self.opportunities,
        }
    }

    pub fn errors(&self, kind: FileKind) -> &str {
        match kind {
            FileKind::AccountsContacts => &self.errors_accounts_contacts,
            FileKind::Opportunities => &self.errors_opportunities,
        }
    }

    pub fn all(&self) -> [&str; 4] {
        [
            &self.accounts_contacts,
            &self.opportunities,
            &self.errors_accounts_contacts,
            &self.errors_opportunities,
        ]
    }
}

/// Writes batches as UTF-8 CSV through a `Storage` backend.
#[derive(Debug, Clone)]
pub struct CsvFileSink<S: Storage> {
    storage: S,
    names: OutputFileNames,
}

impl<S: Storage> CsvFileSink<S> {
    pub fn new(storage: S, names: OutputFileNames) -> Self {
        Self { storage, names }
    }

    async fn store(&self, name: &str, data: Vec<u8>) -> Result<String> {
        tracing::debug!("Writing {} ({} bytes)", name, data.len());
        self.storage.write_file(name, &data).await?;
        Ok(name.to_string())
    }
}

fn writer() -> csv::Writer<Vec<u8>> {
    csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new())
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<Vec<u8>> {
    writer.into_inner().map_err(|e| e.into_error().into())
}

impl<S: Storage> CsvSink for CsvFileSink<S> {
    async fn write_rows(&self, batch: SealedBatch) -> Result<String> {
        let mut csv = writer();
        csv.write_record(batch.kind.columns())?;
        for row in &batch.rows {
            csv.write_record(&row.values)?;
        }
        let data = finish(csv)?;

        tracing::info!("📁 {} rows → {}", batch.len(), self.names.rows(batch.kind));
        self.store(self.names.rows(batch.kind), data).await
    }

    async fn write_errors(&self, batch: ErrorBatch) -> Result<String> {
        let mut csv = writer();
        csv.write_record(batch.kind.error_columns())?;
        for row in &batch.rows {
            let mut record = vec![
                row.source_record_id.clone(),
                row.entity_type.to_string(),
                row.reason.as_str().to_string(),
                row.detail.clone(),
            ];
            for field in batch.kind.error_source_fields() {
                record.push(row.original_fields.get(*field).cloned().unwrap_or_default());
            }
            if batch.kind == FileKind::Opportunities {
                record.push(row.associated_ids.join(";"));
            }
            csv.write_record(&record)?;
        }
        let data = finish(csv)?;

        if batch.is_empty() {
            tracing::info!("✅ No rejected records for {}", batch.kind);
        } else {
            tracing::warn!(
                "❌ {} rejected records → {}",
                batch.len(),
                self.names.errors(batch.kind)
            );
        }
        self.store(self.names.errors(batch.kind), data).await
    }
}
