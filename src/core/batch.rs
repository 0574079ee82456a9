use crate::domain::model::{DestinationRow, ErrorRow, FileKind};

/// Salesforce Data Import Wizard limit per file.
pub const DEFAULT_CAPACITY: usize = 50_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    Accumulating,
    Sealed,
}

/// Accepted rows of one destination file.
///
/// Seals itself as soon as it holds `capacity` rows; after that every append
/// is refused and the row is handed back to the caller.
#[derive(Debug)]
pub struct OutputBatch {
    kind: FileKind,
    rows: Vec<DestinationRow>,
    capacity: usize,
    state: BatchState,
}

impl OutputBatch {
    pub fn new(kind: FileKind, capacity: usize) -> Self {
        Self {
            kind,
            rows: Vec::new(),
            capacity,
            state: BatchState::Accumulating,
        }
    }

    pub fn push(&mut self, row: DestinationRow) -> Result<(), DestinationRow> {
        if self.state == BatchState::Sealed || row.kind != self.kind {
            return Err(row);
        }
        self.rows.push(row);
        if self.rows.len() >= self.capacity {
            tracing::warn!(
                "📦 {} batch reached its capacity of {} rows and is sealed",
                self.kind,
                self.capacity
            );
            self.state = BatchState::Sealed;
        }
        Ok(())
    }

    pub fn state(&self) -> BatchState {
        self.state
    }

    pub fn kind(&self) -> FileKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[DestinationRow] {
        &self.rows
    }

    /// Input exhausted: no further appends, hand over to the writer.
    pub fn seal(self) -> SealedBatch {
        SealedBatch {
            kind: self.kind,
            rows: self.rows,
        }
    }
}

/// A batch that can only be written, once.
#[derive(Debug)]
pub struct SealedBatch {
    pub kind: FileKind,
    pub rows: Vec<DestinationRow>,
}

impl SealedBatch {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// 錯誤批次沒有筆數上限
#[derive(Debug)]
pub struct ErrorBatch {
    pub kind: FileKind,
    pub rows: Vec<ErrorRow>,
}

impl ErrorBatch {
    pub fn new(kind: FileKind) -> Self {
        Self {
            kind,
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: ErrorRow) {
        tracing::debug!(
            "🚫 {} {} rejected: {} ({})",
            row.entity_type,
            row.source_record_id,
            row.reason,
            row.detail
        );
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
