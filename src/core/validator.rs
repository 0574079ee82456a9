use crate::core::transform::{is_email, normalize_amount, parse_close_date};
use crate::domain::model::{EntityType, ErrorKind, RawRecord, Rejection, ValidatedRecord};
use crate::domain::schema::{field_rules, picklist_value, FieldFormat, FieldRule, DEALSTAGE_PICKLIST};
use serde::{Deserialize, Serialize};

/// Association state of a record, as resolved by the assembler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParentLink {
    NotApplicable,
    Resolved(String),
    /// No associated company at all.
    Unresolved(String),
    /// The associated company exists but has no row in the import file.
    Rejected(String),
}

/// What to do with a deal whose company cannot be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrphanPolicy {
    /// Keep the deal, leave `Next Step` empty.
    Blank,
    #[default]
    Reject,
}

impl std::str::FromStr for OrphanPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "blank" => Ok(OrphanPolicy::Blank),
            "reject" => Ok(OrphanPolicy::Reject),
            other => Err(format!(
                "unknown orphan policy '{}', expected blank or reject",
                other
            )),
        }
    }
}

/// Checks one record against the Salesforce import constraints.
///
/// Checks run in a fixed order (required fields, lengths, formats,
/// association) and the first failure is reported, so identical input always
/// produces identical error files.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordValidator {
    orphan_deals: OrphanPolicy,
}

impl RecordValidator {
    pub fn new(orphan_deals: OrphanPolicy) -> Self {
        Self { orphan_deals }
    }

    pub fn validate(
        &self,
        record: RawRecord,
        parent: ParentLink,
    ) -> Result<ValidatedRecord, (RawRecord, Rejection)> {
        match self.check(&record, &parent) {
            Ok(parent_id) => Ok(ValidatedRecord { record, parent_id }),
            Err(rejection) => Err((record, rejection)),
        }
    }

    fn check(&self, record: &RawRecord, parent: &ParentLink) -> Result<Option<String>, Rejection> {
        let rules = field_rules(record.entity_type);

        for rule in rules.iter().filter(|r| r.required) {
            if record.field(rule.source).is_none() {
                return Err(Rejection::new(
                    ErrorKind::MissingRequiredField,
                    format!("Missing value {} ({})", rule.source, rule.label),
                ));
            }
        }

        for rule in rules {
            if let (Some(max_len), Some(value)) = (rule.max_len, record.field(rule.source)) {
                let len = value.trim().chars().count();
                if len > max_len {
                    return Err(Rejection::new(
                        ErrorKind::FieldTooLong,
                        format!(
                            "Value of {} ({}) is {} characters, limit is {}",
                            rule.source, rule.label, len, max_len
                        ),
                    ));
                }
            }
        }

        for rule in rules {
            if let (Some(format), Some(value)) = (rule.format, record.field(rule.source)) {
                check_format(rule, format, value)?;
            }
        }

        self.check_association(record, parent)
    }

    fn check_association(
        &self,
        record: &RawRecord,
        parent: &ParentLink,
    ) -> Result<Option<String>, Rejection> {
        match (parent, record.entity_type) {
            (ParentLink::NotApplicable, _) => Ok(None),
            (ParentLink::Resolved(id), _) => Ok(Some(id.clone())),
            // 公司本身沒匯入時，Flow 找不到對應的 Account
            (ParentLink::Rejected(reason), _) => Err(Rejection::new(
                ErrorKind::UnresolvableAssociation,
                format!("{} has no usable company: {}", record.entity_type, reason),
            )),
            // 聯絡人匯入精靈需要 Account Name，無法留空
            (ParentLink::Unresolved(reason), EntityType::Contact) => Err(Rejection::new(
                ErrorKind::UnresolvableAssociation,
                format!("Contact has no usable company: {}", reason),
            )),
            (ParentLink::Unresolved(reason), _) => match self.orphan_deals {
                OrphanPolicy::Blank => {
                    tracing::debug!(
                        "{} {} kept without company ({})",
                        record.entity_type,
                        record.id,
                        reason
                    );
                    Ok(None)
                }
                OrphanPolicy::Reject => Err(Rejection::new(
                    ErrorKind::UnresolvableAssociation,
                    format!("{} has no usable company: {}", record.entity_type, reason),
                )),
            },
        }
    }
}

fn check_format(rule: &FieldRule, format: FieldFormat, value: &str) -> Result<(), Rejection> {
    let valid = match format {
        FieldFormat::NoWhitespace => !value.trim().contains(char::is_whitespace),
        FieldFormat::Email => is_email(value),
        FieldFormat::DealStage => picklist_value(&DEALSTAGE_PICKLIST, value.trim()).is_some(),
        FieldFormat::Amount => normalize_amount(value).is_some(),
        FieldFormat::IsoDate => parse_close_date(value).is_some(),
    };

    if valid {
        Ok(())
    } else {
        Err(Rejection::new(
            ErrorKind::InvalidFieldFormat,
            format!(
                "Invalid {} value '{}' for {} ({:?})",
                rule.source, value, rule.label, format
            ),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact() -> RawRecord {
        RawRecord::new(EntityType::Contact, "p1")
            .with_field("firstname", "Jane")
            .with_field("lastname", "Doe")
            .with_field("email", "jane@example.com")
    }

    fn deal() -> RawRecord {
        RawRecord::new(EntityType::Deal, "d1")
            .with_field("dealname", "Big deal")
            .with_field("dealstage", "closedwon")
            .with_field("amount", "1000")
    }

    fn rejection(result: Result<ValidatedRecord, (RawRecord, Rejection)>) -> Rejection {
        match result {
            Ok(v) => panic!("expected rejection, got {:?}", v),
            Err((_, rejection)) => rejection,
        }
    }

    #[test]
    fn test_valid_contact_carries_parent() {
        let validator = RecordValidator::default();
        let validated = validator
            .validate(contact(), ParentLink::Resolved("c1".to_string()))
            .unwrap();
        assert_eq!(validated.parent_id.as_deref(), Some("c1"));
    }

    #[test]
    fn test_required_fields_checked_first() {
        // 同時缺欄位又格式錯誤時，回報缺欄位
        let record = RawRecord::new(EntityType::Contact, "p1")
            .with_field("firstname", "   ")
            .with_field("lastname", "Doe")
            .with_field("email", "not-an-email");
        let validator = RecordValidator::default();
        let rejection = rejection(validator.validate(record, ParentLink::Unresolved("x".into())));

        assert_eq!(rejection.kind, ErrorKind::MissingRequiredField);
        assert!(rejection.detail.contains("firstname"));
    }

    #[test]
    fn test_length_checked_before_format() {
        let record = contact()
            .with_field("lastname", "x".repeat(81))
            .with_field("email", "bad");
        let rejection = rejection(
            RecordValidator::default().validate(record, ParentLink::Resolved("c1".into())),
        );
        assert_eq!(rejection.kind, ErrorKind::FieldTooLong);
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        let record = contact().with_field("firstname", "ü".repeat(40));
        assert!(RecordValidator::default()
            .validate(record, ParentLink::Resolved("c1".into()))
            .is_ok());
    }

    #[test]
    fn test_invalid_formats() {
        let validator = RecordValidator::default();
        let bad_email = contact().with_field("email", "jane@");
        assert_eq!(
            rejection(validator.validate(bad_email, ParentLink::Resolved("c1".into()))).kind,
            ErrorKind::InvalidFieldFormat
        );

        let bad_stage = deal().with_field("dealstage", "someday");
        assert_eq!(
            rejection(validator.validate(bad_stage, ParentLink::Resolved("c1".into()))).kind,
            ErrorKind::InvalidFieldFormat
        );

        let bad_amount = deal().with_field("amount", "a lot");
        assert_eq!(
            rejection(validator.validate(bad_amount, ParentLink::Resolved("c1".into()))).kind,
            ErrorKind::InvalidFieldFormat
        );

        let too_precise = deal().with_field("amount", "10.125");
        assert_eq!(
            rejection(validator.validate(too_precise, ParentLink::Resolved("c1".into()))).kind,
            ErrorKind::InvalidFieldFormat
        );

        let bad_date = deal().with_field("closedate", "next week");
        assert_eq!(
            rejection(validator.validate(bad_date, ParentLink::Resolved("c1".into()))).kind,
            ErrorKind::InvalidFieldFormat
        );
    }

    #[test]
    fn test_orphan_contact_is_rejected() {
        let rejection = rejection(
            RecordValidator::default()
                .validate(contact(), ParentLink::Unresolved("no associated company".into())),
        );
        assert_eq!(rejection.kind, ErrorKind::UnresolvableAssociation);
    }

    #[test]
    fn test_orphan_deal_follows_policy() {
        let unresolved = || ParentLink::Unresolved("no associated company".into());

        let kept = RecordValidator::new(OrphanPolicy::Blank)
            .validate(deal(), unresolved())
            .unwrap();
        assert_eq!(kept.parent_id, None);

        let rejection = rejection(RecordValidator::default().validate(deal(), unresolved()));
        assert_eq!(rejection.kind, ErrorKind::UnresolvableAssociation);
    }

    #[test]
    fn test_deal_of_rejected_company_is_rejected_under_any_policy() {
        for policy in [OrphanPolicy::Blank, OrphanPolicy::Reject] {
            let parent = ParentLink::Rejected("associated company c1 was not accepted".into());
            let rejection = rejection(RecordValidator::new(policy).validate(deal(), parent));
            assert_eq!(rejection.kind, ErrorKind::UnresolvableAssociation);
            assert!(rejection.detail.contains("c1"));
        }
    }

    #[test]
    fn test_unknown_deal_type_is_not_an_error() {
        let record = deal().with_field("dealtype", "renewal");
        assert!(RecordValidator::default()
            .validate(record, ParentLink::Resolved("c1".into()))
            .is_ok());
    }
}
