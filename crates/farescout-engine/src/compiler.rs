//! Cross-matches dated outbound and return results into round trips.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use farescout_core::AirportCode;

use crate::types::{Itinerary, ScanResult};

/// Builds every round trip whose destination has fares in both directions.
///
/// This is a full cross join: each outbound date with a fare for a
/// destination pairs with each return date that also has one. Trip length
/// may be zero or negative; filtering those is up to the caller. Results are
/// ordered by total price, then outbound date, return date, and destination
/// code, so identical input always yields identical output.
#[must_use]
pub fn compile(
    outbound_by_date: &BTreeMap<NaiveDate, ScanResult>,
    return_by_date: &BTreeMap<NaiveDate, ScanResult>,
) -> Vec<Itinerary> {
    let mut itineraries = Vec::new();

    for (&outbound_date, outbound) in outbound_by_date {
        for (code, out_fares) in outbound {
            for (&return_date, returns) in return_by_date {
                let Some(ret_fares) = returns.get(code) else {
                    continue;
                };
                itineraries.push(Itinerary {
                    destination_code: code.clone(),
                    destination_name: out_fares.name().to_owned(),
                    outbound_date,
                    return_date,
                    trip_length_days: (return_date - outbound_date).num_days(),
                    outbound_price: out_fares.best_price(),
                    return_price: ret_fares.best_price(),
                    total_price: out_fares.best_price() + ret_fares.best_price(),
                    outbound_option_count: out_fares.option_count(),
                    return_option_count: ret_fares.option_count(),
                });
            }
        }
    }

    itineraries.sort_by(|a, b| {
        a.total_price
            .cmp(&b.total_price)
            .then_with(|| a.outbound_date.cmp(&b.outbound_date))
            .then_with(|| a.return_date.cmp(&b.return_date))
            .then_with(|| a.destination_code.cmp(&b.destination_code))
    });
    itineraries
}

/// The `n` cheapest itineraries from an already ranked list.
#[must_use]
pub fn top_deals(itineraries: &[Itinerary], n: usize) -> &[Itinerary] {
    &itineraries[..n.min(itineraries.len())]
}

/// Groups ranked itineraries by destination, codes ascending, keeping each
/// group's price order.
#[must_use]
pub fn group_by_destination(itineraries: &[Itinerary]) -> BTreeMap<AirportCode, Vec<&Itinerary>> {
    let mut groups: BTreeMap<AirportCode, Vec<&Itinerary>> = BTreeMap::new();
    for itinerary in itineraries {
        groups
            .entry(itinerary.destination_code.clone())
            .or_default()
            .push(itinerary);
    }
    groups
}
