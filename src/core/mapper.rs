use crate::core::transform::{format_close_date, normalize_amount, website_url};
use crate::domain::model::{DestinationRow, EntityType, FileKind, RawRecord, ValidatedRecord};
use crate::domain::schema::{
    picklist_value, ColumnRule, Transform, ACCOUNT_COLUMN_MAP, ACCOUNT_NAME, CONTACT_COLUMN_MAP,
    DEALSTAGE_PICKLIST, DEALTYPE_PICKLIST, NEXT_STEP, OPPORTUNITY_COLUMN_MAP,
};
use crate::utils::address::parse_address;
use chrono::NaiveDate;
use std::collections::HashMap;

/// Account columns of an accepted company, computed once and copied onto
/// each of its contact rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountFields {
    pub company_id: String,
    pub values: Vec<(&'static str, String)>,
}

impl AccountFields {
    pub fn from_company(record: &RawRecord, run_date: NaiveDate) -> Self {
        Self {
            company_id: record.id.clone(),
            values: map_columns(&ACCOUNT_COLUMN_MAP, record, run_date),
        }
    }

    pub fn name(&self) -> &str {
        self.values
            .iter()
            .find(|(column, _)| *column == ACCOUNT_NAME)
            .map(|(_, value)| value.as_str())
            .unwrap_or("")
    }
}

/// Accepted companies by id.
pub type AccountTable = HashMap<String, AccountFields>;

/// 將驗證過的記錄轉成目的檔案的一列
pub struct RowMapper<'a> {
    accounts: &'a AccountTable,
    run_date: NaiveDate,
}

impl<'a> RowMapper<'a> {
    pub fn new(accounts: &'a AccountTable, run_date: NaiveDate) -> Self {
        Self {
            accounts,
            run_date,
        }
    }

    pub fn map(&self, validated: &ValidatedRecord) -> DestinationRow {
        let parent = validated
            .parent_id
            .as_deref()
            .and_then(|id| self.accounts.get(id));

        match validated.record.entity_type {
            EntityType::Company => {
                let account = AccountFields::from_company(&validated.record, self.run_date);
                self.account_row(&account)
            }
            EntityType::Contact => {
                let mut row = DestinationRow::empty(FileKind::AccountsContacts);
                if let Some(account) = parent {
                    fill(&mut row, account.values.iter().cloned());
                }
                fill(
                    &mut row,
                    map_columns(&CONTACT_COLUMN_MAP, &validated.record, self.run_date),
                );
                row
            }
            EntityType::Deal => {
                let mut row = DestinationRow::empty(FileKind::Opportunities);
                fill(
                    &mut row,
                    map_columns(&OPPORTUNITY_COLUMN_MAP, &validated.record, self.run_date),
                );
                let next_step = parent.map(|a| a.name().to_string()).unwrap_or_default();
                row.set(NEXT_STEP, next_step);
                row
            }
        }
    }

    /// Account-only row: account columns filled, contact columns blank.
    pub fn account_row(&self, account: &AccountFields) -> DestinationRow {
        let mut row = DestinationRow::empty(FileKind::AccountsContacts);
        fill(&mut row, account.values.iter().cloned());
        row
    }
}

fn fill(row: &mut DestinationRow, values: impl IntoIterator<Item = (&'static str, String)>) {
    for (column, value) in values {
        row.set(column, value);
    }
}

fn map_columns(
    rules: &[ColumnRule],
    record: &RawRecord,
    run_date: NaiveDate,
) -> Vec<(&'static str, String)> {
    // 同一筆記錄的地址只解析一次
    let address = rules
        .iter()
        .find(|r| {
            matches!(
                r.transform,
                Transform::AddressStreet | Transform::AddressCity | Transform::AddressZip
            )
        })
        .and_then(|r| record.field(r.source))
        .and_then(parse_address);

    rules
        .iter()
        .map(|rule| {
            let source = record.field(rule.source).map(str::trim);
            let value = match rule.transform {
                Transform::Copy => source.map(str::to_string),
                Transform::Website => source.map(website_url),
                Transform::AddressStreet => address.as_ref().map(|a| a.street.clone()),
                Transform::AddressCity => address.as_ref().map(|a| a.city.clone()),
                Transform::AddressZip => address.as_ref().map(|a| a.zip.clone()),
                Transform::DealType => source
                    .and_then(|v| picklist_value(&DEALTYPE_PICKLIST, v))
                    .map(str::to_string),
                Transform::DealStage => source
                    .and_then(|v| picklist_value(&DEALSTAGE_PICKLIST, v))
                    .map(str::to_string),
                Transform::Amount => source.and_then(normalize_amount),
                Transform::CloseDate => Some(format_close_date(source, run_date)),
            };
            (rule.column, value.unwrap_or_default())
        })
        .collect()
}
