use chrono::NaiveDate;

/// Date formats the institutions actually use, tried in order.
const DATE_FORMATS: [&str; 7] = [
    "%d %B %Y",
    "%d %b %Y",
    "%Y-%m-%d",
    "%d/%m/%Y",
    "%m/%d/%Y",
    "%B %d, %Y",
    "%b %d, %Y",
];

/// Parse an institution-native date string into a calendar date.
/// Unparseable or empty input yields `None` (open-ended deadline), never an
/// error that would drop the record.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let cleaned = crate::normalize::clean(raw);
    if cleaned.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(&cleaned, fmt).ok())
}
