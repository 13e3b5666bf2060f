//! Calendar helpers for issue dates.
//!
//! Dates reach the engine as text from the persistence layer. They are
//! normalized here, shifted by whole calendar months for each monthly copy,
//! and printed in the single supported locale (`dd/mm/yyyy`).

use crate::{Error, Result};
use chrono::{DateTime, Months, NaiveDate, NaiveDateTime};

/// Parse a stored date into a calendar date
///
/// Accepted forms:
/// - `YYYY-MM-DD`
/// - RFC 3339 timestamps (the date part in the timestamp's own offset)
/// - `YYYY-MM-DDTHH:MM:SS` without an offset
/// - `dd/mm/yyyy`
pub fn parse_date(field: &'static str, value: &str) -> Result<NaiveDate> {
    let trimmed = value.trim();

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(timestamp.date_naive());
    }
    if let Ok(timestamp) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S") {
        return Ok(timestamp.date());
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%d/%m/%Y") {
        return Ok(date);
    }

    Err(Error::invalid_date(field, value))
}

/// Add whole calendar months to a date
///
/// The day of month is clamped to the last valid day of the target month,
/// so Jan 31 + 1 month is the last day of February rather than early March.
pub fn add_calendar_months(date: NaiveDate, offset: u32) -> Result<NaiveDate> {
    date.checked_add_months(Months::new(offset))
        .ok_or_else(|| Error::invalid_date("issue_date", format!("{} + {} months", date, offset)))
}

/// Format a date the way it is printed on the prescription
pub fn format_display(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}
