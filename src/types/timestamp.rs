use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};

//NOTE: Offset-less formats seen across the rails; these are read in the provider's local offset
const NAIVE_FORMATS: [&str; 5] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
];

/// Parses a provider timestamp into UTC.
///
/// RFC 3339 values keep their own offset. Naive values are interpreted in `local`.
/// Blank or unrecognised values yield `None` rather than an error.
pub fn parse_timestamp(value: &str, local: &FixedOffset) -> Option<DateTime<Utc>> {
    let value = value.trim();

    if value.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return to_utc(naive, local);
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .and_then(|naive| to_utc(naive, local))
}

/// The calendar day `timestamp` falls on in the given offset.
pub fn local_date(timestamp: &DateTime<Utc>, local: &FixedOffset) -> NaiveDate {
    timestamp.with_timezone(local).date_naive()
}

fn to_utc(naive: NaiveDateTime, local: &FixedOffset) -> Option<DateTime<Utc>> {
    local.from_local_datetime(&naive).single()
        .map(|parsed| parsed.with_timezone(&Utc))
}
