//! The engine's only boundary: something that can fetch one search page.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::TransportError;
use crate::types::RouteKey;

/// Raw upstream response. Any status is passed through untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub body: String,
}

/// Fetches the results page for one route.
///
/// Implementations own their session (cookies, headers, timeouts). The
/// scanner never sees URLs; it only classifies what comes back.
pub trait FareFetcher {
    fn fetch(
        &self,
        route: &RouteKey,
    ) -> impl Future<Output = Result<FetchResponse, TransportError>> + Send;
}

/// Cooperative stop signal checked between requests.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
