pub mod blackout;
pub mod client;
pub mod compiler;
pub mod discovery;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod pacing;
pub mod scanner;
pub mod types;

pub use blackout::{BlackoutCalendar, BlackoutCheck};
pub use client::BookingClient;
pub use compiler::{compile, group_by_destination, top_deals};
pub use discovery::{Discovery, DiscoveryPlan, DiscoveryReport};
pub use error::{ScanError, TransportError};
pub use extract::{extract, ExtractResult, PayloadExtractor};
pub use farescout_core::AirportCode;
pub use fetch::{CancelFlag, FareFetcher, FetchResponse};
pub use pacing::{PacingPolicy, ScanDelayState};
pub use scanner::{RouteScanner, ScanRequest};
pub use types::{
    DateStatus, DestinationFares, Direction, Itinerary, NoDataReason, Offer, RouteKey,
    ScanOutcome, ScanReport, ScanResult,
};
