use chrono::NaiveDate;
use thiserror::Error;

use farescout_core::AirportCode;

/// Failure reported by a fetch capability instead of a response.
///
/// The scanner treats every variant the same way: no data for the
/// destination and no pacing penalty.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid booking URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("transport failure: {0}")]
    Failed(String),
}

/// Conditions that stop a scan before any request is made.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("no destinations supplied for {origin} on {date}")]
    NoDestinations { origin: AirportCode, date: NaiveDate },

    #[error("no {0} dates supplied")]
    NoDates(&'static str),
}
