//! Date parsing and reformatting for `date_format` steps.
//!
//! Input values are tried against a fixed list of accepted layouts (ISO 8601
//! first, then common spreadsheet and US/European forms). Output formats
//! are either chrono strftime strings or the `YYYY-MM-DD` token style used
//! by editors.

use std::fmt::Write as _;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};

/// Try to parse a date or date/time value.
///
/// Date-only values resolve to midnight. RFC 3339 values keep their local
/// wall-clock time; the offset is dropped.
pub fn parse_date_value(value: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.naive_local());
    }

    try_parse_datetime(trimmed).or_else(|| try_parse_date(trimmed).map(|d| d.and_time(NaiveTime::MIN)))
}

fn try_parse_datetime(value: &str) -> Option<NaiveDateTime> {
    let formats = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y/%m/%d %H:%M:%S",
        "%Y/%m/%d %H:%M",
        "%d-%b-%Y %H:%M:%S", // 15-Jan-2024 10:30:00
        "%d-%b-%Y %H:%M",
        "%m/%d/%Y %H:%M:%S", // US
        "%m/%d/%Y %H:%M",
        "%d.%m.%Y %H:%M:%S", // European
        "%d.%m.%Y %H:%M",
    ];

    formats
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
}

fn try_parse_date(value: &str) -> Option<NaiveDate> {
    let formats = [
        "%Y-%m-%d",
        "%Y/%m/%d",
        "%Y%m%d",
        "%d-%b-%Y",
        "%d %b %Y",
        "%d %B %Y",
        "%b %d, %Y",
        "%B %d, %Y",
        "%m/%d/%Y",
        "%d.%m.%Y",
    ];

    formats
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
}

/// Resolve an output date pattern to a chrono strftime string.
///
/// Patterns containing `%` are used as-is. Otherwise the editor tokens
/// `YYYY YY MMMM MMM MM M DD D HH hh mm ss A` are translated and every
/// other character is kept literally. Text inside `[...]` is never
/// translated, so `YYYY-MM-DD [Day] D` keeps the word `Day`; an unclosed
/// `[` is literal.
pub fn resolve_format(pattern: &str) -> String {
    if pattern.contains('%') {
        return pattern.to_string();
    }

    const TOKENS: [(&str, &str); 13] = [
        ("YYYY", "%Y"),
        ("MMMM", "%B"),
        ("MMM", "%b"),
        ("YY", "%y"),
        ("MM", "%m"),
        ("DD", "%d"),
        ("HH", "%H"),
        ("hh", "%I"),
        ("mm", "%M"),
        ("ss", "%S"),
        ("M", "%-m"),
        ("D", "%-d"),
        ("A", "%p"),
    ];

    let mut out = String::with_capacity(pattern.len() * 2);
    let mut rest = pattern;
    'outer: while !rest.is_empty() {
        if let Some((literal, tail)) = rest.strip_prefix('[').and_then(|r| r.split_once(']')) {
            out.push_str(literal);
            rest = tail;
            continue;
        }
        for (token, replacement) in TOKENS {
            if let Some(tail) = rest.strip_prefix(token) {
                out.push_str(replacement);
                rest = tail;
                continue 'outer;
            }
        }
        let mut chars = rest.chars();
        if let Some(c) = chars.next() {
            out.push(c);
        }
        rest = chars.as_str();
    }
    out
}

/// Format a date/time with a resolved strftime string.
///
/// Returns an error message for format strings chrono rejects, and for
/// specifiers that need data a naive date/time does not carry (e.g. `%z`).
pub fn format_date(value: &NaiveDateTime, format: &str) -> Result<String, String> {
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err("unsupported format specifier".to_string());
    }
    let mut out = String::new();
    write!(out, "{}", value.format_with_items(StrftimeItems::new(format)))
        .map_err(|_| "format requires timezone information".to_string())?;
    Ok(out)
}
