//! Field value conversions from HubSpot's vocabulary to Salesforce's.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

const SALESFORCE_DATETIME: &str = "%Y-%m-%d %H:%M:%S";

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid regex")
});

static AMOUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(-?)(\d+)(?:\.(\d{1,2}))?$").expect("valid regex"));

/// Salesforce currency fields hold 18 digits, 2 of them after the point.
pub const MAX_AMOUNT_INTEGER_DIGITS: usize = 16;

pub fn is_email(value: &str) -> bool {
    EMAIL.is_match(value.trim())
}

pub fn website_url(domain: &str) -> String {
    let domain = domain.trim();
    if domain.starts_with("https://") || domain.starts_with("http://") {
        domain.to_string()
    } else {
        format!("https://{}", domain)
    }
}

/// Normalize a currency amount to a plain decimal with two fraction digits.
///
/// Spaces, underscores and thousands separators are dropped first, so
/// `"1,250.5"` becomes `"1250.50"`. The digits are copied, never rounded:
/// more than two fraction digits or more than
/// [`MAX_AMOUNT_INTEGER_DIGITS`] integer digits return `None`.
pub fn normalize_amount(value: &str) -> Option<String> {
    let cleaned: String = value
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ',' && *c != '_')
        .collect();
    let caps = AMOUNT.captures(&cleaned)?;

    let integer = caps[2].trim_start_matches('0');
    let integer = if integer.is_empty() { "0" } else { integer };
    if integer.len() > MAX_AMOUNT_INTEGER_DIGITS {
        return None;
    }
    let fraction = caps.get(3).map_or("", |m| m.as_str());
    let fraction = format!("{:0<2}", fraction);

    // -0.00 寫成 0.00
    let negative = &caps[1] == "-" && (integer != "0" || fraction != "00");
    Some(format!(
        "{}{}.{}",
        if negative { "-" } else { "" },
        integer,
        fraction
    ))
}

/// Parse a HubSpot date property (`2020-01-01T12:00:00Z`,
/// `2020-01-01T12:00:00.000Z`, or `2020-01-01`).
pub fn parse_close_date(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc).naive_utc());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt);
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// 缺少結案日期時以執行日當天午夜代替
pub fn format_close_date(value: Option<&str>, run_date: NaiveDate) -> String {
    let datetime = value
        .and_then(parse_close_date)
        .or_else(|| run_date.and_hms_opt(0, 0, 0));
    datetime
        .map(|dt| dt.format(SALESFORCE_DATETIME).to_string())
        .unwrap_or_default()
}
