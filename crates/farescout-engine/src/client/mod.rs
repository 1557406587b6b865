//! HTTP transport for the booking site's flight search page.

use std::time::Duration;

use reqwest::Client;

use farescout_core::AppConfig;

use crate::error::TransportError;
use crate::fetch::{FareFetcher, FetchResponse};
use crate::types::RouteKey;

const SEARCH_PATH: &str = "Flight/InternalSelect";

/// Date format the search page expects, e.g. `Dec 11, 2025`.
const SEARCH_DATE_FORMAT: &str = "%b %d, %Y";

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// Cookie-keeping session against the booking site.
///
/// Returns every HTTP status untouched; deciding what a 403 or a challenge
/// page means is the scanner's job. Only connection, timeout, and body-read
/// failures become [`TransportError`]s.
pub struct BookingClient {
    pub(crate) client: Client,
    pub(crate) base_url: String,
    pub(crate) home_url: String,
}

impl BookingClient {
    /// Creates a client with the given timeout and `User-Agent` and an empty
    /// cookie jar.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        base_url: &str,
        home_url: &str,
        user_agent: &str,
        timeout_secs: u64,
    ) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .cookie_store(true)
            .gzip(true)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
            home_url: home_url.to_owned(),
        })
    }

    /// # Errors
    ///
    /// See [`BookingClient::new`].
    pub fn from_config(config: &AppConfig) -> Result<Self, TransportError> {
        Self::new(
            &config.booking_base_url,
            &config.home_url,
            &config.user_agent,
            config.request_timeout_secs,
        )
    }

    /// Loads the home page once so the session carries the site's cookies.
    ///
    /// Failures are logged and otherwise ignored; searches still work
    /// without the cookies, just with a higher chance of being challenged.
    pub async fn warm_up(&self) {
        let result = self
            .client
            .get(&self.home_url)
            .header(reqwest::header::ACCEPT, ACCEPT_HTML)
            .header(reqwest::header::ACCEPT_LANGUAGE, "en-US,en;q=0.9")
            .send()
            .await;
        match result {
            Ok(response) => tracing::info!(
                url = %self.home_url,
                status = response.status().as_u16(),
                "session warmed up"
            ),
            Err(e) => tracing::warn!(
                url = %self.home_url,
                error = %e,
                "warm-up request failed; continuing without cookies"
            ),
        }
    }

    /// Builds the search URL for one route.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::InvalidUrl`] if the configured base URL
    /// cannot be parsed.
    pub(crate) fn search_url(&self, route: &RouteKey) -> Result<String, TransportError> {
        let base = format!("{}/{SEARCH_PATH}", self.base_url);
        let mut url = reqwest::Url::parse(&base).map_err(|e| TransportError::InvalidUrl {
            url: base.clone(),
            reason: e.to_string(),
        })?;

        url.query_pairs_mut()
            .append_pair("o1", route.from.as_str())
            .append_pair("d1", route.to.as_str())
            .append_pair("dd1", &route.date.format(SEARCH_DATE_FORMAT).to_string())
            .append_pair("ADT", "1")
            .append_pair("mon", "true")
            .append_pair("promo", "");

        Ok(url.to_string())
    }
}

impl FareFetcher for BookingClient {
    async fn fetch(&self, route: &RouteKey) -> Result<FetchResponse, TransportError> {
        let url = self.search_url(route)?;
        let response = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, ACCEPT_HTML)
            .header(reqwest::header::ACCEPT_LANGUAGE, "en-US,en;q=0.9")
            .header(reqwest::header::REFERER, &self.home_url)
            .header(reqwest::header::CACHE_CONTROL, "no-cache")
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        tracing::debug!(route = %route, status, bytes = body.len(), "search page fetched");
        Ok(FetchResponse { status, body })
    }
}

#[cfg(test)]
#[path = "../client_test.rs"]
mod tests;
