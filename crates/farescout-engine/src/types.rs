//! Data model shared by the scanner, the compiler, and their consumers.

use std::collections::btree_map;
use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use farescout_core::AirportCode;

use crate::pacing::ScanDelayState;

/// Which way a scan searches relative to the configured origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Flights from the origin to each destination.
    Outbound,
    /// Flights from each destination back to the origin.
    Return,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Outbound => write!(f, "outbound"),
            Direction::Return => write!(f, "return"),
        }
    }
}

/// One directional search: where the flight departs, where it lands, and when.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RouteKey {
    pub from: AirportCode,
    pub to: AirportCode,
    pub date: NaiveDate,
}

impl RouteKey {
    /// Builds the key for `destination` as seen from `origin` in `direction`.
    #[must_use]
    pub fn for_direction(
        direction: Direction,
        origin: &AirportCode,
        destination: &AirportCode,
        date: NaiveDate,
    ) -> Self {
        let (from, to) = match direction {
            Direction::Outbound => (origin.clone(), destination.clone()),
            Direction::Return => (destination.clone(), origin.clone()),
        };
        Self { from, to, date }
    }
}

impl fmt::Display for RouteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{} {}", self.from, self.to, self.date)
    }
}

/// A single fare option extracted from a search page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Offer {
    pub price: Decimal,
    pub duration: String,
    pub stops: String,
    pub seats_remaining: Option<u32>,
    pub eligible: bool,
}

/// Eligible offers found for one destination on one date.
///
/// Only constructible from a non-empty offer list, so `best_price` and
/// `option_count` always agree with `offers`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DestinationFares {
    name: String,
    offers: Vec<Offer>,
    best_price: Decimal,
    option_count: usize,
}

impl DestinationFares {
    /// Returns `None` when `offers` is empty.
    #[must_use]
    pub fn from_offers(name: impl Into<String>, offers: Vec<Offer>) -> Option<Self> {
        let best_price = offers.iter().map(|o| o.price).min()?;
        let option_count = offers.len();
        Some(Self {
            name: name.into(),
            offers,
            best_price,
            option_count,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn offers(&self) -> &[Offer] {
        &self.offers
    }

    #[must_use]
    pub fn best_price(&self) -> Decimal {
        self.best_price
    }

    #[must_use]
    pub fn option_count(&self) -> usize {
        self.option_count
    }
}

/// Destinations with at least one eligible offer for a single scan.
///
/// A destination that yielded nothing is absent rather than present with an
/// empty list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ScanResult(BTreeMap<AirportCode, DestinationFares>);

impl ScanResult {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, code: AirportCode, fares: DestinationFares) {
        self.0.insert(code, fares);
    }

    #[must_use]
    pub fn get(&self, code: &AirportCode) -> Option<&DestinationFares> {
        self.0.get(code)
    }

    #[must_use]
    pub fn contains(&self, code: &AirportCode) -> bool {
        self.0.contains_key(code)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, AirportCode, DestinationFares> {
        self.0.iter()
    }
}

impl<'a> IntoIterator for &'a ScanResult {
    type Item = (&'a AirportCode, &'a DestinationFares);
    type IntoIter = btree_map::Iter<'a, AirportCode, DestinationFares>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<(AirportCode, DestinationFares)> for ScanResult {
    fn from_iter<T: IntoIterator<Item = (AirportCode, DestinationFares)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Why a response produced no usable offers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum NoDataReason {
    /// Bot-challenge page.
    Blocked,
    /// Body too short to be a real results page.
    Empty,
    /// No embedded payload located.
    NotFound,
    /// Payload located but could not be parsed.
    Malformed(String),
    /// Non-success status that is not a rate-limit signal.
    UnexpectedStatus(u16),
}

impl fmt::Display for NoDataReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoDataReason::Blocked => write!(f, "bot challenge"),
            NoDataReason::Empty => write!(f, "empty document"),
            NoDataReason::NotFound => write!(f, "no payload"),
            NoDataReason::Malformed(reason) => write!(f, "malformed payload: {reason}"),
            NoDataReason::UnexpectedStatus(status) => write!(f, "HTTP {status}"),
        }
    }
}

/// Classification of one destination within a scan pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum ScanOutcome {
    Found(DestinationFares),
    NoOffers,
    NoData(NoDataReason),
    RateLimited,
    TransientError(String),
}

impl ScanOutcome {
    /// `true` for outcomes that should slow the pass down.
    #[must_use]
    pub fn is_blocking_signal(&self) -> bool {
        matches!(
            self,
            ScanOutcome::RateLimited
                | ScanOutcome::NoData(NoDataReason::Blocked | NoDataReason::Empty)
        )
    }
}

/// Date-level status of a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DateStatus {
    Scanned,
    /// The program excludes this date; nothing was requested.
    Blackout,
    /// Stopped early by the cancellation signal; results are partial.
    Cancelled,
}

/// Everything a single scan pass produced.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub direction: Direction,
    pub origin: AirportCode,
    pub date: NaiveDate,
    pub status: DateStatus,
    pub result: ScanResult,
    /// Per-destination classification in scan order.
    pub outcomes: Vec<(AirportCode, ScanOutcome)>,
    #[serde(skip)]
    pub final_delay: ScanDelayState,
}

impl ScanReport {
    /// Number of destinations classified `RateLimited`.
    #[must_use]
    pub fn rate_limited_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, o)| matches!(o, ScanOutcome::RateLimited))
            .count()
    }
}

/// A compiled outbound + return pair for one destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Itinerary {
    pub destination_code: AirportCode,
    pub destination_name: String,
    pub outbound_date: NaiveDate,
    pub return_date: NaiveDate,
    pub trip_length_days: i64,
    pub outbound_price: Decimal,
    pub return_price: Decimal,
    pub total_price: Decimal,
    pub outbound_option_count: usize,
    pub return_option_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offer(price: i64) -> Offer {
        Offer {
            price: Decimal::new(price, 0),
            duration: "2h 10m".to_string(),
            stops: "Nonstop".to_string(),
            seats_remaining: None,
            eligible: true,
        }
    }

    fn code(s: &str) -> AirportCode {
        AirportCode::parse(s).unwrap()
    }

    #[test]
    fn destination_fares_tracks_minimum_and_count() {
        let fares =
            DestinationFares::from_offers("Denver", vec![offer(79), offer(59), offer(99)])
                .unwrap();
        assert_eq!(fares.best_price(), Decimal::new(59, 0));
        assert_eq!(fares.option_count(), 3);
        assert_eq!(fares.offers().len(), 3);
        assert_eq!(fares.name(), "Denver");
    }

    #[test]
    fn destination_fares_rejects_empty_offers() {
        assert!(DestinationFares::from_offers("Denver", vec![]).is_none());
    }

    #[test]
    fn route_key_flips_for_return() {
        let date = NaiveDate::from_ymd_opt(2025, 12, 18).unwrap();
        let out = RouteKey::for_direction(Direction::Outbound, &code("SFO"), &code("DEN"), date);
        let ret = RouteKey::for_direction(Direction::Return, &code("SFO"), &code("DEN"), date);
        assert_eq!(out.to_string(), "SFO->DEN 2025-12-18");
        assert_eq!(ret.to_string(), "DEN->SFO 2025-12-18");
    }

    #[test]
    fn scan_result_iterates_in_code_order() {
        let result: ScanResult = ["LAS", "ATL", "DEN"]
            .into_iter()
            .map(|c| {
                (
                    code(c),
                    DestinationFares::from_offers(c, vec![offer(50)]).unwrap(),
                )
            })
            .collect();
        let codes: Vec<&str> = result.iter().map(|(c, _)| c.as_str()).collect();
        assert_eq!(codes, ["ATL", "DEN", "LAS"]);
        assert!(result.contains(&code("DEN")));
        assert!(!result.contains(&code("MCO")));
    }

    #[test]
    fn blocking_signals() {
        assert!(ScanOutcome::RateLimited.is_blocking_signal());
        assert!(ScanOutcome::NoData(NoDataReason::Blocked).is_blocking_signal());
        assert!(ScanOutcome::NoData(NoDataReason::Empty).is_blocking_signal());
        assert!(!ScanOutcome::NoData(NoDataReason::NotFound).is_blocking_signal());
        assert!(!ScanOutcome::NoData(NoDataReason::Malformed("x".into())).is_blocking_signal());
        assert!(!ScanOutcome::NoOffers.is_blocking_signal());
        assert!(!ScanOutcome::TransientError("timeout".into()).is_blocking_signal());
    }
}
