//! Field parsers: raw strings to canonical typed values
//!
//! Every parser here is total: bad input yields `None` or an empty value,
//! never an error.

use chrono::{NaiveDate, NaiveDateTime};
use regex_utils::lists;

pub use crate::model::MilestoneStatus;

/// Date-only formats tried in order; the first successful parse wins
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%d/%m/%Y", "%Y/%m/%d", "%m-%d-%Y", "%d-%m-%Y"];

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Length of `YYYY-MM-DDTHH:MM:SS`
const DATETIME_PREFIX_LEN: usize = 19;

const SHORT_YEAR_FORMATS: &[&str] = &["%m/%d/%y", "%d/%m/%y", "%m-%d-%y", "%d-%m-%y"];

/// Parse a calendar date from one of the supported formats
///
/// Ambiguous day/month strings resolve US-first (`03/04/2025` is March 4);
/// a day above 12 only fits one of the two orders.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            if has_full_year(date) {
                return Some(date);
            }
        }
    }

    if let Some(date) = parse_datetime_prefix(value) {
        return Some(date);
    }

    SHORT_YEAR_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
}

/// Calendar day of a `YYYY-MM-DD[ T]HH:MM:SS` string; a fractional second
/// or UTC offset after the seconds field is ignored
fn parse_datetime_prefix(value: &str) -> Option<NaiveDate> {
    let head = value.get(..DATETIME_PREFIX_LEN)?;
    let tail = &value[DATETIME_PREFIX_LEN..];
    if !(tail.is_empty() || tail.starts_with(['.', '+', '-', 'Z', 'z', ' '])) {
        return None;
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(head, format).ok())
        .map(|datetime| datetime.date())
}

/// `%Y` happily accepts two-digit years; those belong to the `%y` formats
fn has_full_year(date: NaiveDate) -> bool {
    use chrono::Datelike;
    date.year() >= 1000
}

/// Parse an optional raw value, treating blank as absent
pub fn parse_optional_date(value: Option<&str>) -> Option<NaiveDate> {
    value.and_then(parse_date)
}

/// Split a dependency cell on `,` `;` `|` or newlines
///
/// Entries are trimmed and anything one character long or shorter is dropped.
pub fn parse_dependencies(value: &str) -> Vec<String> {
    lists::SEPARATOR
        .split(value.trim())
        .map(str::trim)
        .filter(|dep| dep.chars().count() > 1)
        .map(str::to_string)
        .collect()
}

/// Parse a status string with the `Upcoming` fallback
pub fn parse_status(value: Option<&str>) -> MilestoneStatus {
    value.map(MilestoneStatus::parse_or_default).unwrap_or_default()
}

/// Trim a value and map blank to `None`
pub fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
