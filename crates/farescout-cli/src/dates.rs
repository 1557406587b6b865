//! Date argument parsing for the CLI.

use chrono::NaiveDate;

/// Accepted input formats, tried in order.
const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%m/%d/%Y", "%m-%d-%Y", "%Y/%m/%d"];

/// Parses a date in any of the accepted formats.
///
/// # Errors
///
/// Returns a message naming the input when no format matches.
pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    let trimmed = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
        .ok_or_else(|| format!("invalid date \"{raw}\"; use YYYY-MM-DD or MM/DD/YYYY"))
}

/// Every date from `start` through `end`, inclusive.
///
/// # Errors
///
/// Returns an error when `start` is after `end`.
pub(crate) fn date_range(start: NaiveDate, end: NaiveDate) -> anyhow::Result<Vec<NaiveDate>> {
    if start > end {
        anyhow::bail!("range start {start} is after range end {end}");
    }
    Ok(start.iter_days().take_while(|d| *d <= end).collect())
}
