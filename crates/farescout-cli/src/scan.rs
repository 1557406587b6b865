//! `farescout scan`: one-way search over one or more dates.

use farescout_core::ProgramFile;
use farescout_engine::{BookingClient, CancelFlag, Discovery};

use crate::{catalog, dates, output, ScanArgs};

pub(crate) async fn run_scan(
    discovery: &Discovery,
    client: &BookingClient,
    program: &ProgramFile,
    args: &ScanArgs,
    cancel: &CancelFlag,
) -> anyhow::Result<()> {
    let search_dates = match (args.from, args.to) {
        (Some(from), Some(to)) => dates::date_range(from, to)?,
        _ => args.dates.clone(),
    };
    let destinations = catalog::select_destinations(program, &args.origin, &args.targets)?;

    tracing::info!(
        origin = %args.origin,
        dates = search_dates.len(),
        destinations = destinations.len(),
        "starting one-way scan"
    );

    let reports = discovery
        .scan_dates(&args.origin, &destinations, &search_dates, client, cancel)
        .await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(());
    }

    for report in reports.values() {
        output::print_scan_report(report);
    }
    if reports.len() > 1 {
        output::print_date_summary("SUMMARY ACROSS ALL DATES", &reports);
    }
    if cancel.is_cancelled() {
        println!();
        println!("run was interrupted; some dates were not searched");
    }
    Ok(())
}
