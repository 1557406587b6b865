use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use rust_decimal::Decimal;

use super::*;
use crate::blackout::BlackoutCalendar;

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

#[derive(Clone)]
enum Scripted {
    Respond(u16, String),
    Fail,
    /// Responds, then raises the cancel flag.
    RespondThenCancel(u16, String, CancelFlag),
}

/// In-memory fetcher keyed by the non-origin airport of each route.
#[derive(Default)]
struct ScriptedFetcher {
    responses: HashMap<String, Scripted>,
    calls: Mutex<Vec<RouteKey>>,
}

impl ScriptedFetcher {
    fn with(mut self, code: &str, scripted: Scripted) -> Self {
        self.responses.insert(code.to_string(), scripted);
        self
    }

    fn calls(&self) -> Vec<RouteKey> {
        self.calls.lock().unwrap().clone()
    }
}

impl FareFetcher for ScriptedFetcher {
    async fn fetch(&self, route: &RouteKey) -> Result<FetchResponse, TransportError> {
        self.calls.lock().unwrap().push(route.clone());
        let key = if route.from.as_str() == "SFO" {
            route.to.as_str()
        } else {
            route.from.as_str()
        };
        match self.responses.get(key).cloned() {
            Some(Scripted::Respond(status, body)) => Ok(FetchResponse { status, body }),
            Some(Scripted::RespondThenCancel(status, body, flag)) => {
                flag.cancel();
                Ok(FetchResponse { status, body })
            }
            Some(Scripted::Fail) | None => Err(TransportError::Failed("timed out".to_string())),
        }
    }
}

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

fn fast_policy() -> PacingPolicy {
    PacingPolicy {
        floor: ms(0),
        ceiling: ms(20),
        increment: ms(10),
        decrement: ms(5),
        jitter: Duration::ZERO,
    }
}

fn scanner() -> RouteScanner {
    RouteScanner::new(
        fast_policy(),
        PayloadExtractor::default(),
        DEFAULT_RATE_LIMIT_STATUSES.to_vec(),
    )
}

fn code(s: &str) -> AirportCode {
    AirportCode::parse(s).unwrap()
}

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 12, 11).unwrap()
}

fn request(direction: Direction, codes: &[&str]) -> ScanRequest {
    ScanRequest {
        direction,
        origin: code("SFO"),
        date: date(),
        destinations: codes
            .iter()
            .map(|c| (code(c), format!("{c} city")))
            .collect(),
    }
}

fn results_page(flights_json: &str) -> String {
    format!(
        "<html><script>var data = {{\"journeys\":[{{\"flights\":{flights_json}}}]}};</script>{}</html>",
        "<p>padding</p>".repeat(1000)
    )
}

fn ok(flights_json: &str) -> Scripted {
    Scripted::Respond(200, results_page(flights_json))
}

const MIXED_FLIGHTS: &str = r#"[
    {"goWildFare": 79, "isGoWildFareEnabled": true, "stopsText": "Nonstop"},
    {"goWildFare": 19, "isGoWildFareEnabled": false},
    {"goWildFare": 59, "isGoWildFareEnabled": true, "stopsText": "1 Stop"}
]"#;

const INELIGIBLE_ONLY: &str = r#"[{"goWildFare": 49, "isGoWildFareEnabled": false}]"#;

fn no_blackouts() -> BlackoutCalendar {
    BlackoutCalendar::default()
}

async fn run(
    fetcher: &ScriptedFetcher,
    req: &ScanRequest,
    initial: ScanDelayState,
) -> ScanReport {
    scanner()
        .scan(req, &no_blackouts(), fetcher, initial, &CancelFlag::new())
        .await
        .expect("scan should succeed")
}

// ---------------------------------------------------------------------------
// Date-level behaviour
// ---------------------------------------------------------------------------

#[tokio::test]
async fn blackout_date_issues_no_requests() {
    let fetcher = ScriptedFetcher::default().with("DEN", ok(MIXED_FLIGHTS));
    let calendar = BlackoutCalendar::new([date()]);
    let report = scanner()
        .scan(
            &request(Direction::Outbound, &["DEN", "LAS"]),
            &calendar,
            &fetcher,
            fast_policy().initial_state(),
            &CancelFlag::new(),
        )
        .await
        .unwrap();

    assert_eq!(report.status, DateStatus::Blackout);
    assert!(report.result.is_empty());
    assert!(report.outcomes.is_empty());
    assert!(fetcher.calls().is_empty());
}

#[tokio::test]
async fn empty_destination_list_is_an_error() {
    let fetcher = ScriptedFetcher::default();
    let result = scanner()
        .scan(
            &request(Direction::Outbound, &[]),
            &no_blackouts(),
            &fetcher,
            fast_policy().initial_state(),
            &CancelFlag::new(),
        )
        .await;
    assert!(matches!(result, Err(ScanError::NoDestinations { .. })));
}

#[tokio::test]
async fn closure_blackout_check_is_accepted() {
    let fetcher = ScriptedFetcher::default();
    let always = |_: NaiveDate| true;
    let report = scanner()
        .scan(
            &request(Direction::Outbound, &["DEN"]),
            &always,
            &fetcher,
            fast_policy().initial_state(),
            &CancelFlag::new(),
        )
        .await
        .unwrap();
    assert_eq!(report.status, DateStatus::Blackout);
    assert!(fetcher.calls().is_empty());
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

#[tokio::test]
async fn eligible_offers_are_recorded_with_best_price() {
    let fetcher = ScriptedFetcher::default().with("DEN", ok(MIXED_FLIGHTS));
    let report = run(
        &fetcher,
        &request(Direction::Outbound, &["DEN"]),
        fast_policy().initial_state(),
    )
    .await;

    assert_eq!(report.status, DateStatus::Scanned);
    let fares = report.result.get(&code("DEN")).expect("DEN entry");
    assert_eq!(fares.name(), "DEN city");
    assert_eq!(fares.best_price(), Decimal::new(59, 0));
    assert_eq!(fares.option_count(), 2);
    assert!(fares.offers().iter().all(|o| o.eligible));
    assert!(matches!(report.outcomes[0].1, ScanOutcome::Found(_)));
}

#[tokio::test]
async fn payload_without_eligible_offers_is_absent() {
    let fetcher = ScriptedFetcher::default().with("DEN", ok(INELIGIBLE_ONLY));
    let report = run(
        &fetcher,
        &request(Direction::Outbound, &["DEN"]),
        fast_policy().initial_state(),
    )
    .await;
    assert!(report.result.is_empty());
    assert_eq!(report.outcomes[0].1, ScanOutcome::NoOffers);
}

#[tokio::test]
async fn forbidden_status_is_rate_limited_and_backs_off() {
    let fetcher = ScriptedFetcher::default().with("DEN", Scripted::Respond(403, String::new()));
    let initial = fast_policy().initial_state();
    let report = run(&fetcher, &request(Direction::Outbound, &["DEN"]), initial).await;

    assert_eq!(report.outcomes[0].1, ScanOutcome::RateLimited);
    assert!(report.result.is_empty());
    assert_eq!(
        report.final_delay.current(),
        initial.current() + fast_policy().increment
    );
    assert_eq!(report.rate_limited_count(), 1);
}

#[tokio::test]
async fn challenge_and_empty_pages_back_off_but_record_no_data() {
    let fetcher = ScriptedFetcher::default()
        .with("DEN", Scripted::Respond(200, "<div id=\"px-captcha\"></div>".to_string()))
        .with("LAS", Scripted::Respond(200, "<html></html>".to_string()));
    let report = run(
        &fetcher,
        &request(Direction::Outbound, &["DEN", "LAS"]),
        fast_policy().initial_state(),
    )
    .await;

    assert_eq!(report.outcomes[0].1, ScanOutcome::NoData(NoDataReason::Blocked));
    assert_eq!(report.outcomes[1].1, ScanOutcome::NoData(NoDataReason::Empty));
    assert_eq!(report.rate_limited_count(), 0);
    assert_eq!(report.final_delay.current(), ms(20));
}

#[tokio::test]
async fn not_found_and_malformed_do_not_back_off() {
    let no_payload = format!("<html>{}</html>", "<p>padding</p>".repeat(1000));
    let fetcher = ScriptedFetcher::default()
        .with("DEN", Scripted::Respond(200, no_payload))
        .with("LAS", ok("[1,]"));
    let initial = fast_policy().initial_state();
    let report = run(&fetcher, &request(Direction::Outbound, &["DEN", "LAS"]), initial).await;

    assert_eq!(report.outcomes[0].1, ScanOutcome::NoData(NoDataReason::NotFound));
    assert!(matches!(
        report.outcomes[1].1,
        ScanOutcome::NoData(NoDataReason::Malformed(_))
    ));
    assert_eq!(report.final_delay, initial);
}

#[tokio::test]
async fn transport_failure_is_transient_without_penalty() {
    let fetcher = ScriptedFetcher::default().with("DEN", Scripted::Fail);
    let initial = fast_policy().initial_state();
    let report = run(&fetcher, &request(Direction::Outbound, &["DEN"]), initial).await;

    assert!(matches!(
        report.outcomes[0].1,
        ScanOutcome::TransientError(ref msg) if msg.contains("timed out")
    ));
    assert!(report.result.is_empty());
    assert_eq!(report.final_delay, initial);
}

#[tokio::test]
async fn short_body_behind_error_status_is_empty_and_backs_off() {
    let fetcher = ScriptedFetcher::default()
        .with("DEN", Scripted::Respond(503, String::new()))
        .with("LAS", Scripted::Respond(500, "oops".into()));
    let initial = fast_policy().initial_state();
    let report = run(&fetcher, &request(Direction::Outbound, &["DEN", "LAS"]), initial).await;

    assert_eq!(report.outcomes[0].1, ScanOutcome::NoData(NoDataReason::Empty));
    assert_eq!(report.outcomes[1].1, ScanOutcome::NoData(NoDataReason::Empty));
    assert_eq!(
        report.final_delay.current(),
        initial.current() + fast_policy().increment * 2
    );
}

#[tokio::test]
async fn full_error_page_is_unexpected_status_without_penalty() {
    let error_page = format!(
        "<html><h1>Server error</h1>{}</html>",
        "<p>padding</p>".repeat(1000)
    );
    let fetcher = ScriptedFetcher::default().with("DEN", Scripted::Respond(500, error_page));
    let initial = fast_policy().initial_state();
    let report = run(&fetcher, &request(Direction::Outbound, &["DEN"]), initial).await;
    assert_eq!(
        report.outcomes[0].1,
        ScanOutcome::NoData(NoDataReason::UnexpectedStatus(500))
    );
    assert_eq!(report.final_delay, initial);
}

#[tokio::test]
async fn challenge_page_behind_error_status_still_backs_off() {
    let fetcher = ScriptedFetcher::default()
        .with("DEN", Scripted::Respond(503, "<div id=\"px-captcha\"></div>".to_string()));
    let report = run(
        &fetcher,
        &request(Direction::Outbound, &["DEN"]),
        fast_policy().initial_state(),
    )
    .await;
    assert_eq!(report.outcomes[0].1, ScanOutcome::NoData(NoDataReason::Blocked));
    assert_eq!(report.final_delay.current(), ms(10));
}

// ---------------------------------------------------------------------------
// Ordering, direction, pacing
// ---------------------------------------------------------------------------

#[tokio::test]
async fn destinations_are_fetched_in_caller_order() {
    let fetcher = ScriptedFetcher::default()
        .with("MCO", ok(MIXED_FLIGHTS))
        .with("ATL", ok(INELIGIBLE_ONLY))
        .with("DEN", ok(MIXED_FLIGHTS));
    let report = run(
        &fetcher,
        &request(Direction::Outbound, &["MCO", "ATL", "DEN"]),
        fast_policy().initial_state(),
    )
    .await;

    let called: Vec<String> = fetcher.calls().iter().map(|r| r.to.to_string()).collect();
    assert_eq!(called, ["MCO", "ATL", "DEN"]);
    let recorded: Vec<&str> = report.outcomes.iter().map(|(c, _)| c.as_str()).collect();
    assert_eq!(recorded, ["MCO", "ATL", "DEN"]);
    assert_eq!(report.result.len(), 2);
}

#[tokio::test]
async fn return_scan_flies_back_to_origin() {
    let fetcher = ScriptedFetcher::default().with("DEN", ok(MIXED_FLIGHTS));
    let report = run(
        &fetcher,
        &request(Direction::Return, &["DEN"]),
        fast_policy().initial_state(),
    )
    .await;

    let calls = fetcher.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].from.as_str(), "DEN");
    assert_eq!(calls[0].to.as_str(), "SFO");
    assert_eq!(calls[0].date, date());
    assert!(report.result.contains(&code("DEN")));
    assert_eq!(report.direction, Direction::Return);
}

#[tokio::test]
async fn delay_climbs_to_ceiling_then_decays() {
    let fetcher = ScriptedFetcher::default()
        .with("AAA", Scripted::Respond(429, String::new()))
        .with("BBB", Scripted::Respond(403, String::new()))
        .with("CCC", Scripted::Respond(429, String::new()))
        .with("DDD", ok(MIXED_FLIGHTS));
    let report = run(
        &fetcher,
        &request(Direction::Outbound, &["AAA", "BBB", "CCC", "DDD"]),
        fast_policy().initial_state(),
    )
    .await;

    // 0 -> 10 -> 20 -> 20 (capped) -> 15 after one clean response.
    assert_eq!(report.rate_limited_count(), 3);
    assert_eq!(report.final_delay.current(), ms(15));
    assert!(report.final_delay.current() <= report.final_delay.ceiling());
    assert!(report.final_delay.current() >= report.final_delay.floor());
}

#[tokio::test]
async fn carried_delay_decays_toward_floor() {
    let fetcher = ScriptedFetcher::default()
        .with("DEN", ok(MIXED_FLIGHTS))
        .with("LAS", ok(INELIGIBLE_ONLY))
        .with("MCO", ok(MIXED_FLIGHTS))
        .with("ATL", ok(MIXED_FLIGHTS))
        .with("SEA", ok(MIXED_FLIGHTS));
    let initial = ScanDelayState::new(ms(20), ms(0), ms(20));
    let report = run(
        &fetcher,
        &request(Direction::Outbound, &["DEN", "LAS", "MCO", "ATL", "SEA"]),
        initial,
    )
    .await;
    assert_eq!(report.final_delay.current(), ms(0));
}

// ---------------------------------------------------------------------------
// Cancellation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn cancelled_before_start_issues_no_requests() {
    let fetcher = ScriptedFetcher::default().with("DEN", ok(MIXED_FLIGHTS));
    let cancel = CancelFlag::new();
    cancel.cancel();
    let report = scanner()
        .scan(
            &request(Direction::Outbound, &["DEN"]),
            &no_blackouts(),
            &fetcher,
            fast_policy().initial_state(),
            &cancel,
        )
        .await
        .unwrap();
    assert_eq!(report.status, DateStatus::Cancelled);
    assert!(fetcher.calls().is_empty());
}

#[tokio::test]
async fn cancellation_mid_scan_keeps_partial_results() {
    let cancel = CancelFlag::new();
    let fetcher = ScriptedFetcher::default()
        .with("DEN", ok(MIXED_FLIGHTS))
        .with(
            "LAS",
            Scripted::RespondThenCancel(200, results_page(MIXED_FLIGHTS), cancel.clone()),
        )
        .with("MCO", ok(MIXED_FLIGHTS));
    let report = scanner()
        .scan(
            &request(Direction::Outbound, &["DEN", "LAS", "MCO"]),
            &no_blackouts(),
            &fetcher,
            fast_policy().initial_state(),
            &cancel,
        )
        .await
        .unwrap();

    assert_eq!(report.status, DateStatus::Cancelled);
    assert_eq!(fetcher.calls().len(), 2);
    assert_eq!(report.result.len(), 2);
    assert!(!report.result.contains(&code("MCO")));
}

#[test]
fn scanner_from_config_uses_configured_statuses() {
    let config = farescout_core::AppConfig {
        env: farescout_core::Environment::Test,
        log_level: "info".to_string(),
        program_path: "./config/program.yaml".into(),
        booking_base_url: "http://localhost".to_string(),
        home_url: "http://localhost/".to_string(),
        user_agent: "test".to_string(),
        request_timeout_secs: 5,
        delay_floor_secs: 1,
        delay_ceiling_secs: 2,
        delay_increment_secs: 1,
        delay_decrement_secs: 1,
        delay_jitter_secs: 0,
        min_content_bytes: 100,
        rate_limit_statuses: vec![418],
    };
    let scanner = RouteScanner::from_config(&config);
    assert_eq!(scanner.policy().floor, Duration::from_secs(1));
    let outcome = scanner.classify(
        Ok(FetchResponse {
            status: 418,
            body: String::new(),
        }),
        "Denver",
    );
    assert_eq!(outcome, ScanOutcome::RateLimited);
    let outcome = scanner.classify(
        Ok(FetchResponse {
            status: 403,
            body: "<html>".repeat(20),
        }),
        "Denver",
    );
    assert_eq!(outcome, ScanOutcome::NoData(NoDataReason::UnexpectedStatus(403)));
}
