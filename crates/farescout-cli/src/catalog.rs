//! Turns destination arguments into the list a run scans.

use farescout_core::{AirportCode, ProgramFile};

use crate::DestinationArgs;

/// Resolves `--dest`/`--popular` against the program catalog.
///
/// Explicit codes keep the order given; codes missing from the catalog are
/// still searched under their bare code. The origin itself is always
/// dropped.
///
/// # Errors
///
/// Returns an error when nothing is left to search.
pub(crate) fn select_destinations(
    program: &ProgramFile,
    origin: &AirportCode,
    args: &DestinationArgs,
) -> anyhow::Result<Vec<(AirportCode, String)>> {
    let selected: Vec<(AirportCode, String)> = if args.popular {
        program
            .popular_destinations()
            .into_iter()
            .map(|d| (d.code.clone(), d.name.clone()))
            .collect()
    } else if args.destinations.is_empty() {
        program
            .destinations
            .iter()
            .map(|d| (d.code.clone(), d.name.clone()))
            .collect()
    } else {
        let mut picked: Vec<(AirportCode, String)> = Vec::new();
        for code in &args.destinations {
            if picked.iter().any(|(c, _)| c == code) {
                continue;
            }
            let name = program.destination_name(code).map_or_else(
                || {
                    tracing::warn!(code = %code, "destination not in catalog; searching anyway");
                    code.to_string()
                },
                str::to_owned,
            );
            picked.push((code.clone(), name));
        }
        picked
    };

    let selected: Vec<_> = selected.into_iter().filter(|(c, _)| c != origin).collect();
    if selected.is_empty() {
        anyhow::bail!("no destinations to search from {origin}");
    }
    Ok(selected)
}
