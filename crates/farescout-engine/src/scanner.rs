//! One directional scan: one origin, one date, many destinations.
//!
//! Destinations are fetched strictly one after another. Pacing state is a
//! single value that must see every response in order, and concurrent hits
//! on one upstream session are what trips its defenses. A destination is
//! never retried within a pass; repeated blocking instead slows the whole
//! pass down.

use chrono::NaiveDate;

use farescout_core::{AirportCode, AppConfig};

use crate::blackout::BlackoutCheck;
use crate::error::{ScanError, TransportError};
use crate::extract::{ExtractResult, PayloadExtractor};
use crate::fetch::{CancelFlag, FareFetcher, FetchResponse};
use crate::pacing::{PacingPolicy, ScanDelayState};
use crate::types::{
    DateStatus, DestinationFares, Direction, NoDataReason, Offer, RouteKey, ScanOutcome,
    ScanReport, ScanResult,
};

/// Statuses treated as rate limiting when no configuration is supplied.
pub const DEFAULT_RATE_LIMIT_STATUSES: [u16; 2] = [403, 429];

/// Input for a single scan pass.
#[derive(Debug, Clone)]
pub struct ScanRequest {
    pub direction: Direction,
    pub origin: AirportCode,
    pub date: NaiveDate,
    /// Destination codes and display names, scanned in this order.
    pub destinations: Vec<(AirportCode, String)>,
}

/// Runs scan passes with a fixed pacing policy and response classifier.
#[derive(Debug, Clone)]
pub struct RouteScanner {
    policy: PacingPolicy,
    extractor: PayloadExtractor,
    rate_limit_statuses: Vec<u16>,
}

impl Default for RouteScanner {
    fn default() -> Self {
        Self::new(
            PacingPolicy::default(),
            PayloadExtractor::default(),
            DEFAULT_RATE_LIMIT_STATUSES.to_vec(),
        )
    }
}

impl RouteScanner {
    #[must_use]
    pub fn new(
        policy: PacingPolicy,
        extractor: PayloadExtractor,
        rate_limit_statuses: Vec<u16>,
    ) -> Self {
        Self {
            policy,
            extractor,
            rate_limit_statuses,
        }
    }

    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            PacingPolicy::from_config(config),
            PayloadExtractor::new(config.min_content_bytes),
            config.rate_limit_statuses.clone(),
        )
    }

    #[must_use]
    pub fn policy(&self) -> &PacingPolicy {
        &self.policy
    }

    /// Scans every destination in `request` and returns what was found plus
    /// the pacing state to hand to the next pass.
    ///
    /// A blackout date returns immediately with [`DateStatus::Blackout`] and
    /// no requests. A raised `cancel` flag stops the pass before the next
    /// request and returns the partial report as [`DateStatus::Cancelled`].
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::NoDestinations`] when `request.destinations` is
    /// empty. Per-destination failures never surface as errors.
    pub async fn scan<F, B>(
        &self,
        request: &ScanRequest,
        blackout: &B,
        fetcher: &F,
        initial_delay: ScanDelayState,
        cancel: &CancelFlag,
    ) -> Result<ScanReport, ScanError>
    where
        F: FareFetcher,
        B: BlackoutCheck + ?Sized,
    {
        if request.destinations.is_empty() {
            return Err(ScanError::NoDestinations {
                origin: request.origin.clone(),
                date: request.date,
            });
        }

        let mut report = ScanReport {
            direction: request.direction,
            origin: request.origin.clone(),
            date: request.date,
            status: DateStatus::Scanned,
            result: ScanResult::new(),
            outcomes: Vec::with_capacity(request.destinations.len()),
            final_delay: initial_delay,
        };

        if blackout.is_blackout(request.date) {
            tracing::info!(
                origin = %request.origin,
                date = %request.date,
                direction = %request.direction,
                "blackout date; skipping scan"
            );
            report.status = DateStatus::Blackout;
            return Ok(report);
        }

        let total = request.destinations.len();
        let mut delay = initial_delay;

        for (idx, (code, name)) in request.destinations.iter().enumerate() {
            if cancel.is_cancelled() {
                tracing::warn!(
                    origin = %request.origin,
                    date = %request.date,
                    scanned = idx,
                    total,
                    "scan cancelled"
                );
                report.status = DateStatus::Cancelled;
                break;
            }

            let wait = delay.next_wait(self.policy.jitter);
            let route =
                RouteKey::for_direction(request.direction, &request.origin, code, request.date);
            tracing::debug!(
                route = %route,
                position = idx + 1,
                total,
                wait_ms = u64::try_from(wait.as_millis()).unwrap_or(u64::MAX),
                "waiting before request"
            );
            tokio::time::sleep(wait).await;

            let outcome = self.classify(fetcher.fetch(&route).await, name);

            if outcome.is_blocking_signal() {
                delay.back_off(self.policy.increment);
                tracing::warn!(
                    route = %route,
                    outcome = ?outcome,
                    delay_ms = u64::try_from(delay.current().as_millis()).unwrap_or(u64::MAX),
                    "upstream pushed back; slowing down"
                );
            } else {
                delay.recover(self.policy.decrement);
                log_outcome(&route, &outcome);
            }

            if let ScanOutcome::Found(fares) = &outcome {
                report.result.insert(code.clone(), fares.clone());
            }
            report.outcomes.push((code.clone(), outcome));
        }

        report.final_delay = delay;
        tracing::info!(
            origin = %report.origin,
            date = %report.date,
            direction = %report.direction,
            found = report.result.len(),
            scanned = report.outcomes.len(),
            rate_limited = report.rate_limited_count(),
            "scan finished"
        );
        Ok(report)
    }

    /// Maps one fetch result onto a terminal outcome.
    fn classify(
        &self,
        response: Result<FetchResponse, TransportError>,
        name: &str,
    ) -> ScanOutcome {
        let response = match response {
            Ok(response) => response,
            Err(e) => return ScanOutcome::TransientError(e.to_string()),
        };

        if self.rate_limit_statuses.contains(&response.status) {
            return ScanOutcome::RateLimited;
        }

        let extracted = self.extractor.extract(&response.body);

        if !(200..300).contains(&response.status) {
            // Challenge and stalled pages keep their meaning behind any status.
            return match extracted {
                ExtractResult::Blocked => ScanOutcome::NoData(NoDataReason::Blocked),
                ExtractResult::Empty => ScanOutcome::NoData(NoDataReason::Empty),
                _ => ScanOutcome::NoData(NoDataReason::UnexpectedStatus(response.status)),
            };
        }

        match extracted {
            ExtractResult::Blocked => ScanOutcome::NoData(NoDataReason::Blocked),
            ExtractResult::Empty => ScanOutcome::NoData(NoDataReason::Empty),
            ExtractResult::NotFound => ScanOutcome::NoData(NoDataReason::NotFound),
            ExtractResult::Malformed(reason) => {
                ScanOutcome::NoData(NoDataReason::Malformed(reason))
            }
            ExtractResult::Payload(offers) => {
                let eligible: Vec<Offer> = offers.into_iter().filter(|o| o.eligible).collect();
                DestinationFares::from_offers(name, eligible)
                    .map_or(ScanOutcome::NoOffers, ScanOutcome::Found)
            }
        }
    }
}

fn log_outcome(route: &RouteKey, outcome: &ScanOutcome) {
    match outcome {
        ScanOutcome::Found(fares) => tracing::debug!(
            route = %route,
            options = fares.option_count(),
            best_price = %fares.best_price(),
            "eligible fares found"
        ),
        ScanOutcome::NoOffers => tracing::debug!(route = %route, "no eligible fares"),
        ScanOutcome::NoData(NoDataReason::Malformed(reason)) => tracing::warn!(
            route = %route,
            reason = %reason,
            "payload located but unreadable"
        ),
        ScanOutcome::NoData(reason) => {
            tracing::debug!(route = %route, reason = %reason, "no data");
        }
        ScanOutcome::TransientError(error) => {
            tracing::warn!(route = %route, error = %error, "transport failure");
        }
        ScanOutcome::RateLimited => {}
    }
}

#[cfg(test)]
#[path = "scanner_test.rs"]
mod tests;
