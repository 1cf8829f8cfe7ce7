use chrono::{Duration, NaiveDate};

use crate::{TrackerError, TrackerResult};

pub const DATE_FORMAT: &'static str = "%m/%d/%Y";

/// The three phrasings the chapter list uses for a release date.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum DateShape {
    Absolute,
    HoursAgo,
    Yesterday,
}

pub fn classify(raw: &str) -> DateShape {
    // "MM/DD/YYYY" has a digit at index 3; the relative phrasings have a
    // letter or a space there
    if raw.chars().nth(3).map_or(false, |c| c.is_numeric()) {
        DateShape::Absolute
    } else if raw.chars().count() < 20 {
        DateShape::HoursAgo
    } else {
        // "Yesterday at HH:MM AM/PM", and anything else this long
        DateShape::Yesterday
    }
}

/// Turns a raw date string into a calendar date plus the MM/DD/YYYY string
/// that gets persisted and printed. The hour count of a relative date is
/// thrown away; only the calendar day matters.
pub fn resolve(raw: &str, today: NaiveDate) -> TrackerResult<(NaiveDate, String)> {
    match classify(raw) {
        DateShape::Absolute => {
            let date = NaiveDate::parse_from_str(raw, DATE_FORMAT)
                .map_err(|_| TrackerError::InvalidDate(raw.to_string()))?;
            // Keep the site's own string for files and printing
            Ok((date, raw.to_string()))
        },
        DateShape::HoursAgo => Ok((today, format_date(today))),
        DateShape::Yesterday => {
            let yesterday = today - Duration::days(1);
            Ok((yesterday, format_date(yesterday)))
        },
    }
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}
