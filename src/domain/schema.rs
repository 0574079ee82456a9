//! Salesforce import schema and the HubSpot → Salesforce field mapping.
//!
//! Everything here is a constant: column layouts, required fields, length
//! limits and picklist vocabularies are fixed for the import wizard and are
//! never inferred from the data.

use crate::domain::model::{EntityType, FileKind};

pub const ACCOUNT_NAME: &str = "Account Name";
pub const NEXT_STEP: &str = "Next Step";

pub const ACCOUNTS_CONTACTS_COLUMNS: [&str; 15] = [
    ACCOUNT_NAME,
    "Account Website",
    "Account Billing Street",
    "Account Billing City",
    "Account Billing Zip/Postal Code",
    "Account Billing Country",
    "Contact First Name",
    "Contact Last Name",
    "Contact Phone",
    "Contact Email",
    "Contact Title",
    "Contact Mailing Street",
    "Contact Mailing City",
    "Contact Mailing Zip/Postal Code",
    "Contact Mailing Country",
];

pub const OPPORTUNITIES_COLUMNS: [&str; 6] =
    ["Name", "Type", "Stage", "Amount", "Close Date", NEXT_STEP];

/// 錯誤檔案的固定前置欄位
pub const ERROR_COLUMNS: [&str; 4] = ["Source Id", "Entity Type", "Error Kind", "Error"];

pub const ASSOCIATED_COMPANY_COLUMN: &str = "associated company";

const ACCOUNTS_CONTACTS_ERROR_FIELDS: [&str; 10] = [
    "name",
    "domain",
    "industry",
    "address",
    "country",
    "firstname",
    "lastname",
    "email",
    "phone",
    "jobtitle",
];

const OPPORTUNITIES_ERROR_FIELDS: [&str; 5] =
    ["dealname", "dealtype", "dealstage", "amount", "closedate"];

impl FileKind {
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            FileKind::AccountsContacts => &ACCOUNTS_CONTACTS_COLUMNS,
            FileKind::Opportunities => &OPPORTUNITIES_COLUMNS,
        }
    }

    /// Columns that must be non-empty on every accepted row of this file.
    pub fn required_columns(&self) -> &'static [&'static str] {
        match self {
            FileKind::AccountsContacts => &[ACCOUNT_NAME],
            FileKind::Opportunities => &["Name", "Stage", "Close Date"],
        }
    }

    /// Source property columns copied verbatim into the error file.
    pub fn error_source_fields(&self) -> &'static [&'static str] {
        match self {
            FileKind::AccountsContacts => &ACCOUNTS_CONTACTS_ERROR_FIELDS,
            FileKind::Opportunities => &OPPORTUNITIES_ERROR_FIELDS,
        }
    }

    pub fn error_columns(&self) -> Vec<&'static str> {
        let mut columns = ERROR_COLUMNS.to_vec();
        columns.extend_from_slice(self.error_source_fields());
        if *self == FileKind::Opportunities {
            columns.push(ASSOCIATED_COMPANY_COLUMN);
        }
        columns
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldFormat {
    NoWhitespace,
    Email,
    DealStage,
    Amount,
    IsoDate,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub source: &'static str,
    pub label: &'static str,
    pub required: bool,
    pub max_len: Option<usize>,
    pub format: Option<FieldFormat>,
}

const fn rule(
    source: &'static str,
    label: &'static str,
    required: bool,
    max_len: Option<usize>,
    format: Option<FieldFormat>,
) -> FieldRule {
    FieldRule {
        source,
        label,
        required,
        max_len,
        format,
    }
}

// Website 欄位上限 255，扣掉補上的 "https://"
const COMPANY_RULES: [FieldRule; 4] = [
    rule("name", ACCOUNT_NAME, true, Some(255), None),
    rule("domain", "Account Website", false, Some(247), Some(FieldFormat::NoWhitespace)),
    rule("address", "Account Billing Street", false, Some(255), None),
    rule("country", "Account Billing Country", false, Some(80), None),
];

const CONTACT_RULES: [FieldRule; 7] = [
    rule("firstname", "Contact First Name", true, Some(40), None),
    rule("lastname", "Contact Last Name", true, Some(80), None),
    rule("email", "Contact Email", false, Some(80), Some(FieldFormat::Email)),
    rule("phone", "Contact Phone", false, Some(40), None),
    rule("jobtitle", "Contact Title", false, Some(128), None),
    rule("address", "Contact Mailing Street", false, Some(255), None),
    rule("country", "Contact Mailing Country", false, Some(80), None),
];

const DEAL_RULES: [FieldRule; 5] = [
    rule("dealname", "Name", true, Some(120), None),
    rule("dealstage", "Stage", true, None, Some(FieldFormat::DealStage)),
    rule("dealtype", "Type", false, None, None),
    rule("amount", "Amount", false, None, Some(FieldFormat::Amount)),
    rule("closedate", "Close Date", false, None, Some(FieldFormat::IsoDate)),
];

pub fn field_rules(entity: EntityType) -> &'static [FieldRule] {
    match entity {
        EntityType::Company => &COMPANY_RULES,
        EntityType::Contact => &CONTACT_RULES,
        EntityType::Deal => &DEAL_RULES,
    }
}

/// Per-column value conversion applied by the row mapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    Copy,
    Website,
    AddressStreet,
    AddressCity,
    AddressZip,
    DealType,
    DealStage,
    Amount,
    CloseDate,
}

#[derive(Debug, Clone, Copy)]
pub struct ColumnRule {
    pub column: &'static str,
    pub source: &'static str,
    pub transform: Transform,
}

const fn column(column: &'static str, source: &'static str, transform: Transform) -> ColumnRule {
    ColumnRule {
        column,
        source,
        transform,
    }
}

pub const ACCOUNT_COLUMN_MAP: [ColumnRule; 6] = [
    column(ACCOUNT_NAME, "name", Transform::Copy),
    column("Account Website", "domain", Transform::Website),
    column("Account Billing Street", "address", Transform::AddressStreet),
    column("Account Billing City", "address", Transform::AddressCity),
    column("Account Billing Zip/Postal Code", "address", Transform::AddressZip),
    column("Account Billing Country", "country", Transform::Copy),
];

pub const CONTACT_COLUMN_MAP: [ColumnRule; 9] = [
    column("Contact First Name", "firstname", Transform::Copy),
    column("Contact Last Name", "lastname", Transform::Copy),
    column("Contact Phone", "phone", Transform::Copy),
    column("Contact Email", "email", Transform::Copy),
    column("Contact Title", "jobtitle", Transform::Copy),
    column("Contact Mailing Street", "address", Transform::AddressStreet),
    column("Contact Mailing City", "address", Transform::AddressCity),
    column("Contact Mailing Zip/Postal Code", "address", Transform::AddressZip),
    column("Contact Mailing Country", "country", Transform::Copy),
];

// Next Step 由關聯的公司名稱填入，不在此表
pub const OPPORTUNITY_COLUMN_MAP: [ColumnRule; 5] = [
    column("Name", "dealname", Transform::Copy),
    column("Type", "dealtype", Transform::DealType),
    column("Stage", "dealstage", Transform::DealStage),
    column("Amount", "amount", Transform::Amount),
    column("Close Date", "closedate", Transform::CloseDate),
];

pub const DEALTYPE_PICKLIST: [(&str, &str); 2] = [
    ("newbusiness", "New Business"),
    ("existingbusiness", "Existing Business"),
];

pub const DEALSTAGE_PICKLIST: [(&str, &str); 6] = [
    ("qualifiedtobuy", "Qualify"),
    ("presentationscheduled", "Meet & Present"),
    ("appointmentscheduled", "Propose"),
    ("decisionmakerboughtin", "Negotiate"),
    ("closedwon", "Closed Won"),
    ("closedlost", "Closed Lost"),
];

pub fn picklist_value(table: &[(&str, &'static str)], source: &str) -> Option<&'static str> {
    table
        .iter()
        .find(|(from, _)| *from == source)
        .map(|(_, to)| *to)
}

/// HubSpot properties requested per object type.
pub fn source_properties(entity: EntityType) -> &'static [&'static str] {
    match entity {
        EntityType::Company => &["name", "domain", "industry", "address", "country"],
        EntityType::Contact => &[
            "firstname",
            "lastname",
            "email",
            "phone",
            "address",
            "country",
            "jobtitle",
        ],
        EntityType::Deal => &["dealname", "closedate", "dealstage", "amount", "dealtype"],
    }
}
