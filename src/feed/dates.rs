use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

use crate::feed::entry::Entry;

/// Entry fields that may carry a publication timestamp, most specific first.
pub const DATE_FIELDS: [&str; 11] = [
    "published",
    "pubDate",
    "updated",
    "created",
    "date",
    "dc:date",
    "dc:created",
    "dc:issued",
    "dc:modified",
    "issued",
    "modified",
];

static GMT_OFFSET_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:GMT|UTC)\s*([+-])\s*(\d{1,2})(?::?(\d{2}))?\b").unwrap()
});

static WEEKDAY_PREFIX_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[A-Za-z]{3,9},?\s+").unwrap());

const OFFSET_FORMATS: [&str; 6] = [
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S %z",
    "%Y-%m-%dT%H:%M%z",
    "%d %b %Y %H:%M:%S %z",
    "%a, %d %b %Y %H:%M %z",
];

const NAIVE_FORMATS: [&str; 6] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%d %b %Y %H:%M:%S",
];

/// First parseable timestamp among [`DATE_FIELDS`], in UTC.
pub fn published_at(entry: &Entry) -> Option<DateTime<Utc>> {
    DATE_FIELDS.iter().find_map(|field| {
        let raw = entry.field(field);
        if raw.trim().is_empty() {
            return None;
        }
        let parsed = parse_date(raw);
        if parsed.is_none() {
            debug!(field, raw, "Unparseable date field");
        }
        parsed
    })
}

/// Parse one timestamp string. Values without an offset are taken as UTC.
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let normalized = normalize_offset(raw.trim());
    let value = normalized.as_str();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(value) {
        return Some(dt.with_timezone(&Utc));
    }
    // A wrong weekday name makes the strict parser bail; the date itself is still usable.
    let without_weekday = WEEKDAY_PREFIX_REGEX.replace(value, "");
    if without_weekday != value
        && let Ok(dt) = DateTime::parse_from_rfc2822(&without_weekday)
            .or_else(|_| DateTime::parse_from_str(&without_weekday, "%d %b %Y %H:%M:%S %z"))
    {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(value, format) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    let naive = value.trim_end_matches('Z');
    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(naive, format) {
            return Some(dt.and_utc());
        }
    }

    NaiveDate::parse_from_str(naive, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Rewrite `GMT+7` / `UTC-05:30` style zones as numeric `+0700` / `-0530` offsets.
fn normalize_offset(raw: &str) -> String {
    GMT_OFFSET_REGEX
        .replace_all(raw, |caps: &regex::Captures<'_>| {
            let hours: u32 = caps[2].parse().unwrap_or(0);
            let minutes: u32 = caps.get(3).and_then(|m| m.as_str().parse().ok()).unwrap_or(0);
            format!("{}{:02}{:02}", &caps[1], hours, minutes)
        })
        .into_owned()
}
