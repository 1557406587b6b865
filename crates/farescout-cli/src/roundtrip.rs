//! `farescout roundtrip`: outbound and return scans compiled into trips.

use farescout_core::ProgramFile;
use farescout_engine::{BookingClient, CancelFlag, Discovery, DiscoveryPlan};

use crate::{catalog, output, RoundtripArgs};

pub(crate) async fn run_roundtrip(
    discovery: &Discovery,
    client: &BookingClient,
    program: &ProgramFile,
    args: &RoundtripArgs,
    cancel: &CancelFlag,
) -> anyhow::Result<()> {
    let plan = DiscoveryPlan {
        origin: args.origin.clone(),
        destinations: catalog::select_destinations(program, &args.origin, &args.targets)?,
        outbound_dates: args.outbound.clone(),
        return_dates: args.returns.clone(),
    };

    tracing::info!(
        origin = %plan.origin,
        destinations = plan.destinations.len(),
        outbound_dates = plan.outbound_dates.len(),
        return_dates = plan.return_dates.len(),
        "starting round-trip discovery"
    );

    let report = discovery.run(&plan, client, cancel).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        output::print_discovery(&report, args.top);
    }
    Ok(())
}
