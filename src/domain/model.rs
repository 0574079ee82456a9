use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityType {
    Company,
    Contact,
    Deal,
}

impl EntityType {
    pub const ALL: [EntityType; 3] = [EntityType::Company, EntityType::Contact, EntityType::Deal];

    /// HubSpot object type name, as used in `/crm/v3/objects/{name}`
    pub fn plural(&self) -> &'static str {
        match self {
            EntityType::Company => "companies",
            EntityType::Contact => "contacts",
            EntityType::Deal => "deals",
        }
    }

    pub fn file_kind(&self) -> FileKind {
        match self {
            EntityType::Company | EntityType::Contact => FileKind::AccountsContacts,
            EntityType::Deal => FileKind::Opportunities,
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityType::Company => "Company",
            EntityType::Contact => "Contact",
            EntityType::Deal => "Deal",
        };
        f.write_str(name)
    }
}

/// 從來源系統讀入的原始記錄，讀入後不再修改
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    pub entity_type: EntityType,
    pub id: String,
    pub fields: BTreeMap<String, String>,
}

impl RawRecord {
    pub fn new(entity_type: EntityType, id: impl Into<String>) -> Self {
        Self {
            entity_type,
            id: id.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, name: &str, value: impl Into<String>) -> Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }

    /// Present and non-blank value of a source field.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.as_str())
            .filter(|v| !v.trim().is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Relation {
    CompanyToContact,
    DealToCompany,
}

impl Relation {
    pub fn child_type(&self) -> EntityType {
        match self {
            Relation::CompanyToContact => EntityType::Contact,
            Relation::DealToCompany => EntityType::Deal,
        }
    }

    pub fn parent_type(&self) -> EntityType {
        EntityType::Company
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssociationEdge {
    pub from_id: String,
    pub to_id: String,
    pub relation: Relation,
}

impl AssociationEdge {
    pub fn company_to_contact(company_id: impl Into<String>, contact_id: impl Into<String>) -> Self {
        Self {
            from_id: company_id.into(),
            to_id: contact_id.into(),
            relation: Relation::CompanyToContact,
        }
    }

    pub fn deal_to_company(deal_id: impl Into<String>, company_id: impl Into<String>) -> Self {
        Self {
            from_id: deal_id.into(),
            to_id: company_id.into(),
            relation: Relation::DealToCompany,
        }
    }

    pub fn child_id(&self) -> &str {
        match self.relation {
            Relation::CompanyToContact => &self.to_id,
            Relation::DealToCompany => &self.from_id,
        }
    }

    pub fn parent_id(&self) -> &str {
        match self.relation {
            Relation::CompanyToContact => &self.from_id,
            Relation::DealToCompany => &self.to_id,
        }
    }
}

/// Fetcher 的分頁游標：繼續或已到資料結尾
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageCursor {
    Next(String),
    Done,
}

#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub records: Vec<RawRecord>,
    pub associations: Vec<AssociationEdge>,
    pub next: PageCursor,
}

impl FetchedPage {
    pub fn last(records: Vec<RawRecord>, associations: Vec<AssociationEdge>) -> Self {
        Self {
            records,
            associations,
            next: PageCursor::Done,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileKind {
    AccountsContacts,
    Opportunities,
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileKind::AccountsContacts => f.write_str("accounts_contacts"),
            FileKind::Opportunities => f.write_str("opportunities"),
        }
    }
}

/// One row of a destination file, aligned with `FileKind::columns()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationRow {
    pub kind: FileKind,
    pub values: Vec<String>,
}

impl DestinationRow {
    pub fn empty(kind: FileKind) -> Self {
        Self {
            kind,
            values: vec![String::new(); kind.columns().len()],
        }
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.kind
            .columns()
            .iter()
            .position(|c| *c == column)
            .map(|idx| self.values[idx].as_str())
    }

    pub fn set(&mut self, column: &str, value: String) {
        if let Some(idx) = self.kind.columns().iter().position(|c| *c == column) {
            self.values[idx] = value;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    MissingRequiredField,
    FieldTooLong,
    InvalidFieldFormat,
    UnresolvableAssociation,
    CapacityExceeded,
    DuplicateKey,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::MissingRequiredField => "MissingRequiredField",
            ErrorKind::FieldTooLong => "FieldTooLong",
            ErrorKind::InvalidFieldFormat => "InvalidFieldFormat",
            ErrorKind::UnresolvableAssociation => "UnresolvableAssociation",
            ErrorKind::CapacityExceeded => "CapacityExceeded",
            ErrorKind::DuplicateKey => "DuplicateKey",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub kind: ErrorKind,
    pub detail: String,
}

impl Rejection {
    pub fn new(kind: ErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }
}

/// 被拒絕的記錄，保留原始欄位以便人工補登
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorRow {
    pub source_record_id: String,
    pub entity_type: EntityType,
    pub reason: ErrorKind,
    pub detail: String,
    pub original_fields: BTreeMap<String, String>,
    pub associated_ids: Vec<String>,
}

impl ErrorRow {
    pub fn from_record(record: RawRecord, rejection: Rejection, associated_ids: Vec<String>) -> Self {
        Self {
            source_record_id: record.id,
            entity_type: record.entity_type,
            reason: rejection.kind,
            detail: rejection.detail,
            original_fields: record.fields,
            associated_ids,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRecord {
    pub record: RawRecord,
    pub parent_id: Option<String>,
}
