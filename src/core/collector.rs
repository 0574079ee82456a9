//! Phase 1 of a run: page every entity stream through the fetcher.

use crate::core::association::KnownIds;
use crate::domain::model::{AssociationEdge, EntityType, PageCursor, RawRecord};
use crate::domain::ports::RecordFetcher;
use crate::utils::error::{MigrationError, Result};

pub const DEFAULT_MAX_PAGES: usize = 10_000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStats {
    pub pages: usize,
    pub records: usize,
    pub edges: usize,
}

#[derive(Debug, Default)]
pub struct EntityStream {
    pub records: Vec<RawRecord>,
    pub edges: Vec<AssociationEdge>,
    pub stats: StreamStats,
}

/// Everything fetched for one run, in page arrival order per entity type.
#[derive(Debug, Default)]
pub struct SourceSnapshot {
    pub companies: Vec<RawRecord>,
    pub contacts: Vec<RawRecord>,
    pub deals: Vec<RawRecord>,
    pub edges: Vec<AssociationEdge>,
    pub stats: Vec<(EntityType, StreamStats)>,
}

impl SourceSnapshot {
    pub fn from_streams(companies: EntityStream, contacts: EntityStream, deals: EntityStream) -> Self {
        let stats = vec![
            (EntityType::Company, companies.stats),
            (EntityType::Contact, contacts.stats),
            (EntityType::Deal, deals.stats),
        ];
        let mut edges = companies.edges;
        edges.extend(contacts.edges);
        edges.extend(deals.edges);

        Self {
            companies: companies.records,
            contacts: contacts.records,
            deals: deals.records,
            edges,
            stats,
        }
    }

    pub fn records(&self, entity: EntityType) -> &[RawRecord] {
        match entity {
            EntityType::Company => &self.companies,
            EntityType::Contact => &self.contacts,
            EntityType::Deal => &self.deals,
        }
    }

    pub fn total_records(&self) -> usize {
        self.companies.len() + self.contacts.len() + self.deals.len()
    }

    pub fn known_ids(&self) -> KnownIds {
        let mut known = KnownIds::default();
        for entity in EntityType::ALL {
            for record in self.records(entity) {
                known.insert(entity, &record.id);
            }
        }
        known
    }
}

pub struct Collector<'a, F: RecordFetcher> {
    fetcher: &'a F,
    max_pages: usize,
}

impl<'a, F: RecordFetcher> Collector<'a, F> {
    pub fn new(fetcher: &'a F, max_pages: usize) -> Self {
        Self { fetcher, max_pages }
    }

    /// Fetch the three entity streams concurrently and wait for all of them.
    ///
    /// The first failing stream aborts the whole collection.
    pub async fn collect(&self) -> Result<SourceSnapshot> {
        let (companies, contacts, deals) = tokio::try_join!(
            self.collect_entity(EntityType::Company),
            self.collect_entity(EntityType::Contact),
            self.collect_entity(EntityType::Deal),
        )?;

        let snapshot = SourceSnapshot::from_streams(companies, contacts, deals);
        tracing::info!(
            "📥 Collected {} companies, {} contacts, {} deals and {} association edges",
            snapshot.companies.len(),
            snapshot.contacts.len(),
            snapshot.deals.len(),
            snapshot.edges.len()
        );
        Ok(snapshot)
    }

    pub async fn collect_entity(&self, entity: EntityType) -> Result<EntityStream> {
        let mut stream = EntityStream::default();
        let mut cursor: Option<String> = None;

        loop {
            if stream.stats.pages >= self.max_pages {
                return Err(MigrationError::fetch(
                    entity,
                    stream.stats.pages,
                    stream.stats.records,
                    format!("page limit of {} reached without end of data", self.max_pages),
                ));
            }

            let page = self
                .fetcher
                .fetch(entity, cursor.as_deref())
                .await
                .map_err(|e| match e {
                    // 權杖錯誤保留原本類別，退出碼才會是認證失敗
                    MigrationError::FetchError { .. } | MigrationError::AuthError { .. } => e,
                    other => MigrationError::fetch(
                        entity,
                        stream.stats.pages,
                        stream.stats.records,
                        other,
                    ),
                })?;

            stream.stats.pages += 1;
            stream.stats.records += page.records.len();
            stream.stats.edges += page.associations.len();

            if page.records.is_empty() {
                // 空頁不代表結束，只有 Done 才是
                tracing::debug!("📡 {}: empty page {}", entity.plural(), stream.stats.pages);
            } else {
                tracing::debug!(
                    "📡 {}: page {} with {} records",
                    entity.plural(),
                    stream.stats.pages,
                    page.records.len()
                );
            }

            stream.records.extend(page.records);
            stream.edges.extend(page.associations);

            match page.next {
                PageCursor::Done => break,
                PageCursor::Next(after) => {
                    if cursor.as_deref() == Some(after.as_str()) {
                        return Err(MigrationError::fetch(
                            entity,
                            stream.stats.pages,
                            stream.stats.records,
                            format!("cursor '{}' repeated, paging would never end", after),
                        ));
                    }
                    cursor = Some(after);
                }
            }
        }

        tracing::info!(
            "✅ {}: {} records in {} pages",
            entity.plural(),
            stream.stats.records,
            stream.stats.pages
        );
        Ok(stream)
    }
}
