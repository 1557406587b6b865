//! Round-trip discovery: outbound scans, return scans, then compilation.
//!
//! Every scan in a run shares one pacing state, handed from each pass to the
//! next, so a run that trips rate limiting early stays slow until the
//! upstream settles.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::Serialize;

use farescout_core::{AirportCode, AppConfig};

use crate::blackout::BlackoutCalendar;
use crate::compiler::compile;
use crate::error::ScanError;
use crate::fetch::{CancelFlag, FareFetcher};
use crate::pacing::ScanDelayState;
use crate::scanner::{RouteScanner, ScanRequest};
use crate::types::{DateStatus, Direction, Itinerary, ScanReport, ScanResult};

/// What a round-trip run should search.
#[derive(Debug, Clone)]
pub struct DiscoveryPlan {
    pub origin: AirportCode,
    /// Destination codes and display names in catalog order.
    pub destinations: Vec<(AirportCode, String)>,
    pub outbound_dates: Vec<NaiveDate>,
    pub return_dates: Vec<NaiveDate>,
}

/// Everything a round-trip run produced.
#[derive(Debug, Clone, Serialize)]
pub struct DiscoveryReport {
    pub outbound: BTreeMap<NaiveDate, ScanReport>,
    /// Empty when no destination had outbound fares.
    pub returns: BTreeMap<NaiveDate, ScanReport>,
    /// Ranked cheapest first.
    pub itineraries: Vec<Itinerary>,
    pub cancelled: bool,
}

impl DiscoveryReport {
    /// Dates skipped in either direction because of the blackout calendar.
    #[must_use]
    pub fn blackout_dates(&self) -> BTreeSet<NaiveDate> {
        self.outbound
            .values()
            .chain(self.returns.values())
            .filter(|r| r.status == DateStatus::Blackout)
            .map(|r| r.date)
            .collect()
    }
}

/// Drives scan passes across dates and directions.
#[derive(Debug, Clone)]
pub struct Discovery {
    scanner: RouteScanner,
    blackouts: BlackoutCalendar,
}

impl Discovery {
    #[must_use]
    pub fn new(scanner: RouteScanner, blackouts: BlackoutCalendar) -> Self {
        Self { scanner, blackouts }
    }

    #[must_use]
    pub fn from_config(config: &AppConfig, blackouts: BlackoutCalendar) -> Self {
        Self::new(RouteScanner::from_config(config), blackouts)
    }

    /// Runs the outbound phase, the return phase for destinations that had
    /// outbound fares, and compiles the results.
    ///
    /// Dates are scanned in ascending order; duplicates are scanned once.
    /// If `cancel` is raised the run stops at the next check and returns
    /// what it has, with `cancelled` set.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::NoDates`] when either date list is empty and
    /// [`ScanError::NoDestinations`] when the plan has no destinations.
    pub async fn run<F: FareFetcher>(
        &self,
        plan: &DiscoveryPlan,
        fetcher: &F,
        cancel: &CancelFlag,
    ) -> Result<DiscoveryReport, ScanError> {
        let outbound_dates = ordered_dates(&plan.outbound_dates, "outbound")?;
        let return_dates = ordered_dates(&plan.return_dates, "return")?;
        if plan.destinations.is_empty() {
            return Err(ScanError::NoDestinations {
                origin: plan.origin.clone(),
                date: outbound_dates[0],
            });
        }

        let delay = self.scanner.policy().initial_state();
        let (outbound, delay) = self
            .scan_phase(
                Direction::Outbound,
                &plan.origin,
                &plan.destinations,
                &outbound_dates,
                delay,
                fetcher,
                cancel,
            )
            .await?;

        let candidates: Vec<(AirportCode, String)> = plan
            .destinations
            .iter()
            .filter(|(code, _)| outbound.values().any(|r| r.result.contains(code)))
            .cloned()
            .collect();

        let returns = if cancel.is_cancelled() {
            BTreeMap::new()
        } else if candidates.is_empty() {
            tracing::info!(
                origin = %plan.origin,
                "no outbound fares found; skipping return scans"
            );
            BTreeMap::new()
        } else {
            tracing::info!(
                origin = %plan.origin,
                candidates = candidates.len(),
                dates = return_dates.len(),
                "scanning return legs"
            );
            self.scan_phase(
                Direction::Return,
                &plan.origin,
                &candidates,
                &return_dates,
                delay,
                fetcher,
                cancel,
            )
            .await?
            .0
        };

        let itineraries = compile(&results_by_date(&outbound), &results_by_date(&returns));
        let cancelled = cancel.is_cancelled();
        tracing::info!(
            origin = %plan.origin,
            outbound_dates = outbound.len(),
            return_dates = returns.len(),
            itineraries = itineraries.len(),
            cancelled,
            "discovery finished"
        );

        Ok(DiscoveryReport {
            outbound,
            returns,
            itineraries,
            cancelled,
        })
    }

    /// One-way search: one outbound scan per date with shared pacing.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::NoDates`] when `dates` is empty and
    /// [`ScanError::NoDestinations`] when `destinations` is empty.
    pub async fn scan_dates<F: FareFetcher>(
        &self,
        origin: &AirportCode,
        destinations: &[(AirportCode, String)],
        dates: &[NaiveDate],
        fetcher: &F,
        cancel: &CancelFlag,
    ) -> Result<BTreeMap<NaiveDate, ScanReport>, ScanError> {
        let dates = ordered_dates(dates, "scan")?;
        let (reports, _) = self
            .scan_phase(
                Direction::Outbound,
                origin,
                destinations,
                &dates,
                self.scanner.policy().initial_state(),
                fetcher,
                cancel,
            )
            .await?;
        Ok(reports)
    }

    #[allow(clippy::too_many_arguments)]
    async fn scan_phase<F: FareFetcher>(
        &self,
        direction: Direction,
        origin: &AirportCode,
        destinations: &[(AirportCode, String)],
        dates: &[NaiveDate],
        mut delay: ScanDelayState,
        fetcher: &F,
        cancel: &CancelFlag,
    ) -> Result<(BTreeMap<NaiveDate, ScanReport>, ScanDelayState), ScanError> {
        let mut reports = BTreeMap::new();
        for &date in dates {
            if cancel.is_cancelled() {
                tracing::warn!(%direction, %date, "run cancelled; remaining dates skipped");
                break;
            }
            let request = ScanRequest {
                direction,
                origin: origin.clone(),
                date,
                destinations: destinations.to_vec(),
            };
            let report = self
                .scanner
                .scan(&request, &self.blackouts, fetcher, delay, cancel)
                .await?;
            delay = report.final_delay;
            reports.insert(date, report);
        }
        Ok((reports, delay))
    }
}

fn ordered_dates(dates: &[NaiveDate], label: &'static str) -> Result<Vec<NaiveDate>, ScanError> {
    if dates.is_empty() {
        return Err(ScanError::NoDates(label));
    }
    let unique: BTreeSet<NaiveDate> = dates.iter().copied().collect();
    Ok(unique.into_iter().collect())
}

fn results_by_date(reports: &BTreeMap<NaiveDate, ScanReport>) -> BTreeMap<NaiveDate, ScanResult> {
    reports
        .iter()
        .map(|(date, report)| (*date, report.result.clone()))
        .collect()
}

#[cfg(test)]
#[path = "discovery_test.rs"]
mod tests;
