//! Date helper functions

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Parse a front-matter date string
///
/// Accepts plain dates (`2025-10-03`, `2025/10/03`), date-times with or
/// without `T`, and RFC 3339 timestamps (normalized to UTC). Returns `None`
/// for anything else.
pub fn parse_date(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc).naive_utc());
    }

    const DATETIME_FORMATS: [&str; 6] = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y/%m/%d %H:%M:%S",
        "%Y/%m/%d %H:%M",
    ];
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }

    for fmt in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }

    None
}

/// Format a date using a Moment.js-style format string
///
/// # Examples
/// ```ignore
/// format_date(&date, "MMM D, YYYY") // -> "Oct 3, 2025"
/// ```
pub fn format_date(date: &NaiveDateTime, format: &str) -> String {
    date.format(&moment_to_chrono_format(format)).to_string()
}

/// Format a raw front-matter date, passing unparsable input through untouched
pub fn display_date(raw: &str, format: &str) -> String {
    parse_date(raw)
        .map(|d| format_date(&d, format))
        .unwrap_or_else(|| raw.to_string())
}

/// Format in ISO 8601 / XML form, as used by Atom feeds
pub fn date_xml(date: &NaiveDateTime) -> String {
    date.and_utc().to_rfc3339()
}

/// Convert a Moment.js format to a chrono format
fn moment_to_chrono_format(format: &str) -> String {
    let replacements = [
        ("YYYY", "%Y"),
        ("YY", "%y"),
        ("MMMM", "%B"),
        ("MMM", "%b"),
        ("MM", "%m"),
        ("DDDD", "%j"),
        ("DD", "%d"),
        ("D", "%-d"),
        ("HH", "%H"),
        ("hh", "%I"),
        ("mm", "%M"),
        ("ss", "%S"),
        ("dddd", "%A"),
        ("ddd", "%a"),
        ("ZZ", "%z"),
    ];

    let mut result = format.to_string();
    for (from, to) in replacements {
        result = result.replace(from, to);
    }
    result
}
