//! Console rendering of scan and discovery reports.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use farescout_core::ProgramFile;
use farescout_engine::{
    group_by_destination, top_deals, DateStatus, DestinationFares, Direction, DiscoveryReport,
    Itinerary, ScanOutcome, ScanReport,
};

const RULE: &str = "============================================================";

fn fmt_price(price: Decimal) -> String {
    format!("${:.2}", price.round_dp(2))
}

fn fmt_day(date: NaiveDate) -> String {
    date.format("%Y-%m-%d (%A)").to_string()
}

fn heading(title: &str) {
    println!();
    println!("{RULE}");
    println!("{title}");
    println!("{RULE}");
}

pub(crate) fn print_catalog(program: &ProgramFile, popular_only: bool) {
    println!("{:<6}{:<8}NAME", "CODE", "POPULAR");
    for dest in program
        .destinations
        .iter()
        .filter(|d| !popular_only || d.popular)
    {
        let flag = if dest.popular { "yes" } else { "" };
        println!("{:<6}{:<8}{}", dest.code, flag, dest.name);
    }
    if !program.blackout_dates.is_empty() {
        println!();
        println!("Blackout dates ({}):", program.blackout_dates.len());
        let mut dates = program.blackout_dates.clone();
        dates.sort_unstable();
        for date in dates {
            println!("  {}", fmt_day(date));
        }
    }
}

/// Destinations with fares, cheapest first, ties by code.
fn ranked(report: &ScanReport) -> Vec<(&str, &DestinationFares)> {
    let mut rows: Vec<(&str, &DestinationFares)> = report
        .result
        .iter()
        .map(|(code, fares)| (code.as_str(), fares))
        .collect();
    rows.sort_by(|a, b| {
        a.1.best_price()
            .cmp(&b.1.best_price())
            .then_with(|| a.0.cmp(b.0))
    });
    rows
}

/// Counts of destinations that produced no usable answer.
fn failure_summary(report: &ScanReport) -> String {
    let mut no_data = 0usize;
    let mut transient = 0usize;
    for (_, outcome) in &report.outcomes {
        match outcome {
            ScanOutcome::NoData(_) => no_data += 1,
            ScanOutcome::TransientError(_) => transient += 1,
            _ => {}
        }
    }
    format!(
        "{} rate limited, {no_data} without data, {transient} transport failures",
        report.rate_limited_count()
    )
}

pub(crate) fn print_scan_report(report: &ScanReport) {
    let route = match report.direction {
        Direction::Outbound => format!("from {}", report.origin),
        Direction::Return => format!("back to {}", report.origin),
    };
    heading(&format!(
        "{} {route} on {}",
        report.direction.to_string().to_uppercase(),
        fmt_day(report.date)
    ));

    match report.status {
        DateStatus::Blackout => {
            println!("blackout date; not searched");
            return;
        }
        DateStatus::Cancelled => println!(
            "interrupted after {} destinations; results are partial",
            report.outcomes.len()
        ),
        DateStatus::Scanned => {}
    }

    if report.result.is_empty() {
        println!("no eligible fares found");
    } else {
        println!("{:<6}{:<26}{:>10}{:>9}", "CODE", "DESTINATION", "BEST", "OPTIONS");
        for (code, fares) in ranked(report) {
            println!(
                "{:<6}{:<26}{:>10}{:>9}",
                code,
                fares.name(),
                fmt_price(fares.best_price()),
                fares.option_count()
            );
        }
    }
    println!(
        "{} of {} destinations with fares ({})",
        report.result.len(),
        report.outcomes.len(),
        failure_summary(report)
    );
}

fn print_blackouts(dates: &[NaiveDate]) {
    if dates.is_empty() {
        return;
    }
    println!("Blackout dates ({}):", dates.len());
    for date in dates {
        println!("  {}: not searched", fmt_day(*date));
    }
}

/// Per-date tally, blackout dates listed first.
pub(crate) fn print_date_summary(title: &str, reports: &BTreeMap<NaiveDate, ScanReport>) {
    heading(title);
    let blackouts: Vec<NaiveDate> = reports
        .values()
        .filter(|r| r.status == DateStatus::Blackout)
        .map(|r| r.date)
        .collect();
    print_blackouts(&blackouts);
    print_date_counts(reports);
}

fn print_date_counts(reports: &BTreeMap<NaiveDate, ScanReport>) {
    for report in reports.values().filter(|r| r.status != DateStatus::Blackout) {
        println!(
            "  {}: {} destinations with fares",
            report.date,
            report.result.len()
        );
    }
}

fn print_deal(rank: usize, trip: &Itinerary) {
    println!(
        "{rank}. {} - {}",
        trip.destination_code, trip.destination_name
    );
    println!(
        "   {} -> {} ({} days)",
        trip.outbound_date, trip.return_date, trip.trip_length_days
    );
    println!(
        "   out {} + back {} = {}",
        fmt_price(trip.outbound_price),
        fmt_price(trip.return_price),
        fmt_price(trip.total_price)
    );
}

pub(crate) fn print_discovery(report: &DiscoveryReport, top_n: usize) {
    let blackouts: Vec<NaiveDate> = report.blackout_dates().into_iter().collect();
    if !blackouts.is_empty() {
        heading("BLACKOUT DATES");
        print_blackouts(&blackouts);
    }

    heading("OUTBOUND SUMMARY");
    print_date_counts(&report.outbound);
    if report.returns.is_empty() {
        println!();
        println!("no outbound fares found; return legs not searched");
    } else {
        heading("RETURN SUMMARY");
        print_date_counts(&report.returns);
    }

    if report.itineraries.is_empty() {
        heading("ROUND TRIPS");
        println!("no round-trip combinations found");
        return;
    }

    heading(&format!("TOP {top_n} DEALS BY TOTAL PRICE"));
    for (idx, trip) in top_deals(&report.itineraries, top_n).iter().enumerate() {
        print_deal(idx + 1, trip);
    }

    heading(&format!(
        "ALL OPTIONS ({} round trips)",
        report.itineraries.len()
    ));
    for (code, trips) in group_by_destination(&report.itineraries) {
        println!("{code} - {}", trips[0].destination_name);
        for trip in trips {
            println!(
                "   {} -> {}  out {} ({} options)  back {} ({} options)  total {}",
                trip.outbound_date,
                trip.return_date,
                fmt_price(trip.outbound_price),
                trip.outbound_option_count,
                fmt_price(trip.return_price),
                trip.return_option_count,
                fmt_price(trip.total_price)
            );
        }
    }

    if report.cancelled {
        println!();
        println!("run was interrupted; results are partial");
    }
}
