use once_cell::sync::Lazy;
use regex::Regex;

static LINE_BREAKS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\r\n]+").expect("valid regex"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostalAddress {
    pub street: String,
    pub zip: String,
    pub city: String,
}

/// Parse a free-text `"<street>, <zip> <city>"` address.
///
/// A line break counts as the comma separator. Anything that does not split
/// into exactly one street part and one zip/city part with at least two
/// tokens is treated as unparseable and yields `None`.
pub fn parse_address(address: &str) -> Option<PostalAddress> {
    let normalized = LINE_BREAKS.replace_all(address, ",");
    let normalized = WHITESPACE.replace_all(&normalized, " ");
    let normalized = normalized.trim();
    if normalized.is_empty() {
        return None;
    }

    let (street, zip_city) = match normalized.split(',').collect::<Vec<_>>().as_slice() {
        [street, zip_city] => (street.trim(), zip_city.trim()),
        _ => return None,
    };

    let mut parts: Vec<&str> = zip_city.split(' ').filter(|p| !p.is_empty()).collect();
    if parts.len() < 2 {
        return None;
    }

    // 第一段一定是郵遞區號，最後一段一定是城市
    let first = parts.remove(0);
    let last = parts.pop()?;
    let mut zip_parts = vec![first];
    let mut city_parts = Vec::new();

    for (idx, part) in parts.iter().enumerate() {
        if is_alphabetic(part) {
            city_parts.extend_from_slice(&parts[idx..]);
            break;
        }
        zip_parts.push(*part);
    }
    city_parts.push(last);

    Some(PostalAddress {
        street: street.to_string(),
        zip: zip_parts.join(" "),
        city: city_parts.join(" "),
    })
}

fn is_alphabetic(token: &str) -> bool {
    !token.is_empty() && token.chars().all(char::is_alphabetic)
}
