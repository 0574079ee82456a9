//! Phase 2 of a run: validate, map and partition every fetched record.

use crate::core::association::{AssociationIndex, TieBreakPolicy};
use crate::core::batch::{ErrorBatch, OutputBatch, SealedBatch, DEFAULT_CAPACITY};
use crate::core::collector::SourceSnapshot;
use crate::core::mapper::{AccountFields, AccountTable, RowMapper};
use crate::core::validator::{OrphanPolicy, ParentLink, RecordValidator};
use crate::domain::model::{
    EntityType, ErrorKind, ErrorRow, FileKind, RawRecord, Rejection, Relation,
};
use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};
use std::fmt;

#[derive(Debug, Clone, Copy)]
pub struct AssemblerOptions {
    pub capacity: usize,
    pub tie_break: TieBreakPolicy,
    pub orphan_deals: OrphanPolicy,
    /// Stands in for missing close dates. Fixed per run so reruns match.
    pub run_date: NaiveDate,
}

impl AssemblerOptions {
    pub fn new(run_date: NaiveDate) -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            tie_break: TieBreakPolicy::default(),
            orphan_deals: OrphanPolicy::default(),
            run_date,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntityCounts {
    pub total: usize,
    pub accepted: usize,
    pub rejected: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileCounts {
    pub rows: usize,
    pub errors: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationSummary {
    pub entities: Vec<(EntityType, EntityCounts)>,
    pub files: Vec<(FileKind, FileCounts)>,
    pub rejections: Vec<(ErrorKind, usize)>,
}

impl MigrationSummary {
    pub fn entity(&self, entity: EntityType) -> EntityCounts {
        self.entities
            .iter()
            .find(|(e, _)| *e == entity)
            .map(|(_, c)| *c)
            .unwrap_or_default()
    }

    pub fn file(&self, kind: FileKind) -> FileCounts {
        self.files
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, c)| *c)
            .unwrap_or_default()
    }

    pub fn total_rejected(&self) -> usize {
        self.entities.iter().map(|(_, c)| c.rejected).sum()
    }
}

impl fmt::Display for MigrationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:<10} {:>10} {:>10} {:>10}", "Entity", "Total", "Accepted", "Rejected")?;
        for (entity, counts) in &self.entities {
            writeln!(
                f,
                "{:<10} {:>10} {:>10} {:>10}",
                entity.to_string(),
                counts.total,
                counts.accepted,
                counts.rejected
            )?;
        }
        writeln!(f)?;
        writeln!(f, "{:<20} {:>10} {:>10}", "File", "Rows", "Errors")?;
        for (kind, counts) in &self.files {
            writeln!(f, "{:<20} {:>10} {:>10}", kind.to_string(), counts.rows, counts.errors)?;
        }
        if !self.rejections.is_empty() {
            writeln!(f)?;
            for (kind, count) in &self.rejections {
                writeln!(f, "{:<24} {:>10}", kind.as_str(), count)?;
            }
        }
        Ok(())
    }
}

/// Output of one assembly, ready for the writer.
#[derive(Debug)]
pub struct AssembledOutput {
    pub accounts_contacts: SealedBatch,
    pub opportunities: SealedBatch,
    pub account_errors: ErrorBatch,
    pub opportunity_errors: ErrorBatch,
    pub summary: MigrationSummary,
}

pub struct BatchAssembler {
    options: AssemblerOptions,
    validator: RecordValidator,
}

impl BatchAssembler {
    pub fn new(options: AssemblerOptions) -> Self {
        Self {
            options,
            validator: RecordValidator::new(options.orphan_deals),
        }
    }

    pub fn assemble(&self, snapshot: SourceSnapshot) -> AssembledOutput {
        let known = snapshot.known_ids();
        let tie_break = self.options.tie_break.strategy();
        let index = AssociationIndex::build(&snapshot.edges, &known, tie_break.as_ref());
        let index_stats = index.stats();
        tracing::info!(
            "🔗 Association index built from {} edges ({} duplicate, {} dangling, {} ambiguous children)",
            index_stats.edges,
            index_stats.duplicate_edges,
            index_stats.dangling_edges,
            index_stats.ambiguous_children
        );

        let SourceSnapshot {
            companies,
            contacts,
            deals,
            ..
        } = snapshot;
        let totals = [
            (EntityType::Company, companies.len()),
            (EntityType::Contact, contacts.len()),
            (EntityType::Deal, deals.len()),
        ];

        let mut run = AssemblyRun {
            accounts_contacts: OutputBatch::new(FileKind::AccountsContacts, self.options.capacity),
            opportunities: OutputBatch::new(FileKind::Opportunities, self.options.capacity),
            account_errors: ErrorBatch::new(FileKind::AccountsContacts),
            opportunity_errors: ErrorBatch::new(FileKind::Opportunities),
            accepted: HashMap::new(),
        };

        let (accounts, company_order) = self.accept_companies(companies, &mut run);
        let mapper = RowMapper::new(&accounts, self.options.run_date);

        // 有聯絡人列的公司
        let mut companies_with_rows: HashSet<String> = HashSet::new();

        let mut seen = HashSet::new();
        for contact in contacts {
            if !seen.insert(contact.id.clone()) {
                run.reject(contact, duplicate_id(), Vec::new());
                continue;
            }
            let candidates = index
                .candidates(&contact.id, Relation::CompanyToContact)
                .to_vec();
            let parent = parent_link(&index, &contact.id, Relation::CompanyToContact, |id| {
                accounts.contains_key(id)
            });

            match self.validator.validate(contact, parent) {
                Ok(validated) => {
                    let row = mapper.map(&validated);
                    match run.accounts_contacts.push(row) {
                        Ok(()) => {
                            if let Some(company_id) = validated.parent_id {
                                companies_with_rows.insert(company_id);
                            }
                            run.accept(EntityType::Contact);
                        }
                        Err(_) => run.reject(validated.record, capacity_exceeded(), candidates),
                    }
                }
                Err((record, rejection)) => run.reject(record, rejection, candidates),
            }
        }

        for company in company_order {
            let Some(account) = accounts.get(&company.id) else {
                continue;
            };
            if companies_with_rows.contains(&company.id) {
                continue;
            }
            match run.accounts_contacts.push(mapper.account_row(account)) {
                Ok(()) => {
                    companies_with_rows.insert(company.id.clone());
                }
                Err(_) => run.reject(company, capacity_exceeded(), Vec::new()),
            }
        }
        run.accepted
            .insert(EntityType::Company, companies_with_rows.len());

        // 商機只能指向真的寫進檔案的公司

        let mut seen = HashSet::new();
        for deal in deals {
            if !seen.insert(deal.id.clone()) {
                run.reject(deal, duplicate_id(), Vec::new());
                continue;
            }
            let candidates = index.candidates(&deal.id, Relation::DealToCompany).to_vec();
            let parent = parent_link(&index, &deal.id, Relation::DealToCompany, |id| {
                companies_with_rows.contains(id)
            });

            match self.validator.validate(deal, parent) {
                Ok(validated) => match run.opportunities.push(mapper.map(&validated)) {
                    Ok(()) => run.accept(EntityType::Deal),
                    Err(_) => run.reject(validated.record, capacity_exceeded(), candidates),
                },
                Err((record, rejection)) => run.reject(record, rejection, candidates),
            }
        }

        run.finish(&totals)
    }

    /// Validate companies in arrival order and build the account table.
    ///
    /// Returns the table and the validated company records, in order, for the
    /// account-only pass.
    fn accept_companies(
        &self,
        companies: Vec<RawRecord>,
        run: &mut AssemblyRun,
    ) -> (AccountTable, Vec<RawRecord>) {
        let mut accounts = AccountTable::new();
        let mut order = Vec::new();
        let mut seen_ids = HashSet::new();
        let mut taken_names: HashMap<String, String> = HashMap::new();

        for company in companies {
            if !seen_ids.insert(company.id.clone()) {
                run.reject(company, duplicate_id(), Vec::new());
                continue;
            }

            let validated = match self.validator.validate(company, ParentLink::NotApplicable) {
                Ok(validated) => validated,
                Err((record, rejection)) => {
                    run.reject(record, rejection, Vec::new());
                    continue;
                }
            };

            let account = AccountFields::from_company(&validated.record, self.options.run_date);
            let name = account.name().to_string();
            if let Some(first) = taken_names.get(&name) {
                // 匯入精靈以名稱比對 Account，同名會被合併
                let rejection = Rejection::new(
                    ErrorKind::DuplicateKey,
                    format!("Account name '{}' already used by company {}", name, first),
                );
                run.reject(validated.record, rejection, Vec::new());
                continue;
            }

            taken_names.insert(name, validated.record.id.clone());
            accounts.insert(validated.record.id.clone(), account);
            order.push(validated.record);
        }

        (accounts, order)
    }
}

struct AssemblyRun {
    accounts_contacts: OutputBatch,
    opportunities: OutputBatch,
    account_errors: ErrorBatch,
    opportunity_errors: ErrorBatch,
    accepted: HashMap<EntityType, usize>,
}

impl AssemblyRun {
    fn accept(&mut self, entity: EntityType) {
        *self.accepted.entry(entity).or_default() += 1;
    }

    fn reject(&mut self, record: RawRecord, rejection: Rejection, associated_ids: Vec<String>) {
        let row = ErrorRow::from_record(record, rejection, associated_ids);
        match row.entity_type.file_kind() {
            FileKind::AccountsContacts => self.account_errors.push(row),
            FileKind::Opportunities => self.opportunity_errors.push(row),
        }
    }

    fn finish(self, totals: &[(EntityType, usize)]) -> AssembledOutput {
        let mut rejected: HashMap<EntityType, usize> = HashMap::new();
        let mut by_kind: HashMap<ErrorKind, usize> = HashMap::new();
        for row in self.account_errors.rows.iter().chain(&self.opportunity_errors.rows) {
            *rejected.entry(row.entity_type).or_default() += 1;
            *by_kind.entry(row.reason).or_default() += 1;
        }

        let entities = totals
            .iter()
            .map(|(entity, total)| {
                let counts = EntityCounts {
                    total: *total,
                    accepted: self.accepted.get(entity).copied().unwrap_or(0),
                    rejected: rejected.get(entity).copied().unwrap_or(0),
                };
                (*entity, counts)
            })
            .collect();

        let mut rejections: Vec<(ErrorKind, usize)> = by_kind.into_iter().collect();
        rejections.sort_by_key(|(kind, _)| kind.as_str());

        let accounts_contacts = self.accounts_contacts.seal();
        let opportunities = self.opportunities.seal();
        let files = vec![
            (
                FileKind::AccountsContacts,
                FileCounts {
                    rows: accounts_contacts.len(),
                    errors: self.account_errors.len(),
                },
            ),
            (
                FileKind::Opportunities,
                FileCounts {
                    rows: opportunities.len(),
                    errors: self.opportunity_errors.len(),
                },
            ),
        ];

        let summary = MigrationSummary {
            entities,
            files,
            rejections,
        };
        tracing::info!(
            "📊 Assembled {} account/contact rows and {} opportunity rows, {} records rejected",
            accounts_contacts.len(),
            opportunities.len(),
            summary.total_rejected()
        );

        AssembledOutput {
            accounts_contacts,
            opportunities,
            account_errors: self.account_errors,
            opportunity_errors: self.opportunity_errors,
            summary,
        }
    }
}

fn parent_link(
    index: &AssociationIndex,
    child_id: &str,
    relation: Relation,
    imported: impl Fn(&str) -> bool,
) -> ParentLink {
    match index.resolve(child_id, relation) {
        Some(company_id) if imported(company_id) => ParentLink::Resolved(company_id.to_string()),
        Some(company_id) => ParentLink::Rejected(format!(
            "associated company {} is not in the import file",
            company_id
        )),
        None => ParentLink::Unresolved("no associated company".to_string()),
    }
}

fn duplicate_id() -> Rejection {
    Rejection::new(ErrorKind::DuplicateKey, "Record id already seen in this run")
}

fn capacity_exceeded() -> Rejection {
    Rejection::new(
        ErrorKind::CapacityExceeded,
        "Output file already holds the maximum number of rows",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::AssociationEdge;

    fn run_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 12, 20).unwrap()
    }

    fn company(id: &str, name: &str) -> RawRecord {
        RawRecord::new(EntityType::Company, id)
            .with_field("name", name)
            .with_field("domain", format!("{}.example", id))
    }

    fn contact(id: &str, first: &str) -> RawRecord {
        RawRecord::new(EntityType::Contact, id)
            .with_field("firstname", first)
            .with_field("lastname", "Doe")
    }

    fn deal(id: &str) -> RawRecord {
        RawRecord::new(EntityType::Deal, id)
            .with_field("dealname", format!("Deal {}", id))
            .with_field("dealstage", "closedwon")
            .with_field("closedate", "2024-03-01")
    }

    fn snapshot(
        companies: Vec<RawRecord>,
        contacts: Vec<RawRecord>,
        deals: Vec<RawRecord>,
        edges: Vec<AssociationEdge>,
    ) -> SourceSnapshot {
        SourceSnapshot {
            companies,
            contacts,
            deals,
            edges,
            stats: Vec::new(),
        }
    }

    fn assemble(snapshot: SourceSnapshot) -> AssembledOutput {
        BatchAssembler::new(AssemblerOptions::new(run_date())).assemble(snapshot)
    }

    fn assert_totals_balance(output: &AssembledOutput) {
        for (entity, counts) in &output.summary.entities {
            assert_eq!(
                counts.accepted + counts.rejected,
                counts.total,
                "{} counts do not add up",
                entity
            );
        }
    }

    fn assert_required_columns(batch: &SealedBatch) {
        for row in &batch.rows {
            for column in batch.kind.required_columns() {
                assert!(
                    !row.get(column).unwrap_or("").is_empty(),
                    "{} empty in {:?}",
                    column,
                    row
                );
            }
        }
    }

    #[test]
    fn test_company_with_three_contacts() {
        let output = assemble(snapshot(
            vec![company("c1", "Acme")],
            vec![contact("p1", "Ann"), contact("p2", "Bob"), contact("p3", "Cid")],
            Vec::new(),
            vec![
                AssociationEdge::company_to_contact("c1", "p1"),
                AssociationEdge::company_to_contact("c1", "p2"),
                AssociationEdge::company_to_contact("c1", "p3"),
            ],
        ));

        let rows = &output.accounts_contacts.rows;
        assert_eq!(rows.len(), 3);
        for row in rows {
            assert_eq!(row.values[..6], rows[0].values[..6]);
            assert_eq!(row.get("Account Name"), Some("Acme"));
        }
        let firsts: Vec<&str> = rows
            .iter()
            .map(|r| r.get("Contact First Name").unwrap())
            .collect();
        assert_eq!(firsts, vec!["Ann", "Bob", "Cid"]);
        assert_eq!(output.summary.entity(EntityType::Company).accepted, 1);
        assert_totals_balance(&output);
    }

    #[test]
    fn test_orphan_contact_is_rejected() {
        let output = assemble(snapshot(
            vec![company("c1", "Acme")],
            vec![contact("p1", "Ann")],
            Vec::new(),
            Vec::new(),
        ));

        assert_eq!(output.account_errors.len(), 1);
        let error = &output.account_errors.rows[0];
        assert_eq!(error.source_record_id, "p1");
        assert_eq!(error.reason, ErrorKind::UnresolvableAssociation);
        // 公司本身仍有一列
        assert_eq!(output.accounts_contacts.len(), 1);
        assert_totals_balance(&output);
    }

    #[test]
    fn test_company_without_contacts_gets_one_row() {
        let output = assemble(snapshot(
            vec![company("c1", "Acme"), company("c2", "Globex")],
            vec![contact("p1", "Ann")],
            Vec::new(),
            vec![AssociationEdge::company_to_contact("c1", "p1")],
        ));

        let names: Vec<&str> = output
            .accounts_contacts
            .rows
            .iter()
            .map(|r| r.get("Account Name").unwrap())
            .collect();
        assert_eq!(names, vec!["Acme", "Globex"]);
        let globex = &output.accounts_contacts.rows[1];
        assert_eq!(globex.get("Contact Last Name"), Some(""));
    }

    #[test]
    fn test_contact_of_rejected_company_is_rejected() {
        let nameless = RawRecord::new(EntityType::Company, "c1").with_field("domain", "x.example");
        let output = assemble(snapshot(
            vec![nameless],
            vec![contact("p1", "Ann")],
            Vec::new(),
            vec![AssociationEdge::company_to_contact("c1", "p1")],
        ));

        assert!(output.accounts_contacts.is_empty());
        let reasons: Vec<ErrorKind> = output.account_errors.rows.iter().map(|r| r.reason).collect();
        assert_eq!(
            reasons,
            vec![ErrorKind::MissingRequiredField, ErrorKind::UnresolvableAssociation]
        );
        assert_totals_balance(&output);
    }

    #[test]
    fn test_orphan_deal_follows_policy() {
        let input = || snapshot(Vec::new(), Vec::new(), vec![deal("d1")], Vec::new());

        let rejected = assemble(input());
        assert!(rejected.opportunities.is_empty());
        assert_eq!(
            rejected.opportunity_errors.rows[0].reason,
            ErrorKind::UnresolvableAssociation
        );

        let mut options = AssemblerOptions::new(run_date());
        options.orphan_deals = OrphanPolicy::Blank;
        let blank = BatchAssembler::new(options).assemble(input());
        assert_eq!(blank.opportunities.len(), 1);
        assert_eq!(blank.opportunities.rows[0].get("Next Step"), Some(""));
    }

    #[test]
    fn test_deal_of_duplicate_name_company_is_rejected() {
        let mut options = AssemblerOptions::new(run_date());
        options.orphan_deals = OrphanPolicy::Blank;
        let output = BatchAssembler::new(options).assemble(snapshot(
            vec![company("c1", "Acme"), company("c2", "Acme")],
            Vec::new(),
            vec![deal("d1")],
            vec![AssociationEdge::deal_to_company("d1", "c2")],
        ));

        assert!(output.opportunities.is_empty());
        let error = &output.opportunity_errors.rows[0];
        assert_eq!(error.source_record_id, "d1");
        assert_eq!(error.reason, ErrorKind::UnresolvableAssociation);
        assert_eq!(error.associated_ids, vec!["c2"]);
        assert_totals_balance(&output);
    }

    #[test]
    fn test_deal_next_step_and_candidates() {
        let output = assemble(snapshot(
            vec![company("c1", "Acme"), company("c2", "Globex")],
            Vec::new(),
            vec![deal("d1"), deal("d2").with_field("amount", "lots")],
            vec![
                AssociationEdge::deal_to_company("d1", "c2"),
                AssociationEdge::deal_to_company("d1", "c1"),
                AssociationEdge::deal_to_company("d2", "c1"),
                AssociationEdge::deal_to_company("d2", "c2"),
            ],
        ));

        assert_eq!(output.opportunities.rows[0].get("Next Step"), Some("Globex"));
        let error = &output.opportunity_errors.rows[0];
        assert_eq!(error.reason, ErrorKind::InvalidFieldFormat);
        assert_eq!(error.associated_ids, vec!["c1", "c2"]);
    }

    #[test]
    fn test_capacity_overflow_becomes_error() {
        let deals: Vec<RawRecord> = (0..50_001).map(|i| deal(&format!("d{}", i))).collect();
        let edges = deals
            .iter()
            .map(|d| AssociationEdge::deal_to_company(&d.id, "c1"))
            .collect();
        let output = assemble(snapshot(vec![company("c1", "Acme")], Vec::new(), deals, edges));

        assert_eq!(output.opportunities.len(), 50_000);
        assert_eq!(output.opportunity_errors.len(), 1);
        let error = &output.opportunity_errors.rows[0];
        assert_eq!(error.reason, ErrorKind::CapacityExceeded);
        assert_eq!(error.source_record_id, "d50000");
        assert_totals_balance(&output);
    }

    #[test]
    fn test_company_refused_by_cap_is_an_error() {
        let mut options = AssemblerOptions::new(run_date());
        options.capacity = 1;
        let output = BatchAssembler::new(options).assemble(snapshot(
            vec![company("c1", "Acme"), company("c2", "Globex")],
            Vec::new(),
            Vec::new(),
            Vec::new(),
        ));

        assert_eq!(output.accounts_contacts.len(), 1);
        assert_eq!(output.account_errors.rows[0].source_record_id, "c2");
        assert_eq!(output.account_errors.rows[0].reason, ErrorKind::CapacityExceeded);
        assert_eq!(output.summary.entity(EntityType::Company).accepted, 1);
        assert_totals_balance(&output);
    }

    #[test]
    fn test_deal_of_company_refused_by_cap_is_rejected() {
        let mut options = AssemblerOptions::new(run_date());
        options.capacity = 1;
        let output = BatchAssembler::new(options).assemble(snapshot(
            vec![company("c1", "Acme"), company("c2", "Globex")],
            Vec::new(),
            vec![deal("d1")],
            vec![AssociationEdge::deal_to_company("d1", "c2")],
        ));

        let names: Vec<&str> = output
            .accounts_contacts
            .rows
            .iter()
            .map(|r| r.get("Account Name").unwrap())
            .collect();
        assert_eq!(names, vec!["Acme"]);
        assert_eq!(output.account_errors.rows[0].reason, ErrorKind::CapacityExceeded);
        assert!(output.opportunities.is_empty());
        let error = &output.opportunity_errors.rows[0];
        assert_eq!(error.source_record_id, "d1");
        assert_eq!(error.reason, ErrorKind::UnresolvableAssociation);
        assert_totals_balance(&output);
    }

    #[test]
    fn test_contact_refused_by_cap_is_an_error() {
        let mut options = AssemblerOptions::new(run_date());
        options.capacity = 1;
        let output = BatchAssembler::new(options).assemble(snapshot(
            vec![company("c1", "Acme")],
            vec![contact("p1", "Ann"), contact("p2", "Bob")],
            Vec::new(),
            vec![
                AssociationEdge::company_to_contact("c1", "p1"),
                AssociationEdge::company_to_contact("c1", "p2"),
            ],
        ));

        assert_eq!(output.accounts_contacts.len(), 1);
        assert_eq!(output.accounts_contacts.rows[0].get("Contact First Name"), Some("Ann"));
        assert_eq!(output.account_errors.len(), 1);
        let error = &output.account_errors.rows[0];
        assert_eq!(error.source_record_id, "p2");
        assert_eq!(error.reason, ErrorKind::CapacityExceeded);
        assert_eq!(error.associated_ids, vec!["c1"]);
        assert_eq!(output.summary.entity(EntityType::Contact).accepted, 1);
        assert_eq!(output.summary.entity(EntityType::Company).accepted, 1);
        assert_totals_balance(&output);
    }

    #[test]
    fn test_duplicate_ids_and_names() {
        let output = assemble(snapshot(
            vec![
                company("c1", "Acme"),
                company("c1", "Acme again"),
                company("c2", "Acme"),
            ],
            Vec::new(),
            vec![deal("d1"), deal("d1")],
            vec![AssociationEdge::deal_to_company("d1", "c1")],
        ));

        assert_eq!(output.accounts_contacts.len(), 1);
        assert_eq!(output.opportunities.len(), 1);
        let kinds: Vec<(&str, ErrorKind)> = output
            .account_errors
            .rows
            .iter()
            .chain(&output.opportunity_errors.rows)
            .map(|r| (r.source_record_id.as_str(), r.reason))
            .collect();
        assert_eq!(
            kinds,
            vec![
                ("c1", ErrorKind::DuplicateKey),
                ("c2", ErrorKind::DuplicateKey),
                ("d1", ErrorKind::DuplicateKey),
            ]
        );
        assert_totals_balance(&output);
    }

    #[test]
    fn test_accepted_rows_have_required_columns() {
        let output = assemble(snapshot(
            vec![company("c1", "Acme"), company("c2", "Globex")],
            vec![contact("p1", "Ann"), contact("p2", "")],
            vec![deal("d1"), RawRecord::new(EntityType::Deal, "d2").with_field("dealname", "x")],
            vec![
                AssociationEdge::company_to_contact("c1", "p1"),
                AssociationEdge::company_to_contact("c1", "p2"),
                AssociationEdge::deal_to_company("d1", "c2"),
            ],
        ));

        assert_required_columns(&output.accounts_contacts);
        assert_required_columns(&output.opportunities);
        assert_totals_balance(&output);
    }

    #[test]
    fn test_assembly_is_deterministic() {
        let input = || {
            snapshot(
                vec![company("c1", "Acme"), company("c2", "Globex")],
                vec![contact("p1", "Ann"), contact("p2", "Bob")],
                vec![deal("d1"), deal("d2")],
                vec![
                    AssociationEdge::company_to_contact("c2", "p1"),
                    AssociationEdge::company_to_contact("c1", "p1"),
                    AssociationEdge::company_to_contact("c1", "p2"),
                    AssociationEdge::deal_to_company("d2", "c1"),
                ],
            )
        };

        let first = assemble(input());
        let second = assemble(input());
        assert_eq!(first.accounts_contacts.rows, second.accounts_contacts.rows);
        assert_eq!(first.opportunities.rows, second.opportunities.rows);
        assert_eq!(first.account_errors.rows, second.account_errors.rows);
        assert_eq!(first.summary, second.summary);
    }
}
