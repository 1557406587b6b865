//! Locates and parses the flight-offer JSON embedded in a booking results page.
//!
//! The payload is assigned inside a `<script>` block, HTML-entity encoded,
//! and surrounded by unrelated script statements, so it is cut out with a
//! brace-depth scan rather than parsed as a document.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;
use serde_json::Value;

use crate::types::Offer;

/// Pages shorter than this are stalled or blocked loads, not results pages.
pub const DEFAULT_MIN_CONTENT_LEN: usize = 10_000;

/// Lowercased markers of bot-challenge interstitials.
const CHALLENGE_MARKERS: [&str; 5] = [
    "px-captcha",
    "<title>access denied</title>",
    "attention required! | cloudflare",
    "/cdn-cgi/challenge-platform/",
    "cf-chl-",
];

/// Both must appear in the same script block for it to be a candidate.
const PAYLOAD_KEYWORDS: [&str; 2] = ["journeys", "flights"];

static SCRIPT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script\b[^>]*>(.*?)</script>").expect("valid regex"));

/// Outcome of inspecting one fetched document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractResult {
    /// Every offer in the first journey, eligible or not.
    Payload(Vec<Offer>),
    Blocked,
    Empty,
    NotFound,
    Malformed(String),
}

#[derive(Debug, Clone, Copy)]
pub struct PayloadExtractor {
    min_content_len: usize,
}

impl Default for PayloadExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_CONTENT_LEN)
    }
}

impl PayloadExtractor {
    #[must_use]
    pub fn new(min_content_len: usize) -> Self {
        Self { min_content_len }
    }

    #[must_use]
    pub fn min_content_len(&self) -> usize {
        self.min_content_len
    }

    /// Classifies `document` and, when it holds the offer payload, parses it.
    ///
    /// Challenge detection runs before anything else; challenge pages often
    /// carry stray braces that would otherwise surface as `Malformed`.
    #[must_use]
    pub fn extract(&self, document: &str) -> ExtractResult {
        if looks_like_bot_challenge(document) {
            return ExtractResult::Blocked;
        }
        if document.len() < self.min_content_len {
            return ExtractResult::Empty;
        }

        let mut last_failure: Option<String> = None;

        for cap in SCRIPT_RE.captures_iter(document) {
            let Some(region) = cap.get(1).map(|m| m.as_str()) else {
                continue;
            };
            if !PAYLOAD_KEYWORDS.iter().all(|k| region.contains(k)) {
                continue;
            }

            let decoded = decode_entities(region);
            let Some(start) = decoded.find('{') else {
                continue;
            };

            let Some(object) = extract_balanced_object(&decoded[start..]) else {
                last_failure = Some("unterminated object in payload script".to_owned());
                continue;
            };

            let value: Value = match serde_json::from_str(object) {
                Ok(v) => v,
                Err(e) => {
                    last_failure = Some(format!("invalid JSON: {e}"));
                    continue;
                }
            };

            match offers_from_payload(&value) {
                Ok(offers) => return ExtractResult::Payload(offers),
                Err(reason) => last_failure = Some(reason),
            }
        }

        match last_failure {
            Some(reason) => ExtractResult::Malformed(reason),
            None => ExtractResult::NotFound,
        }
    }
}

/// Extracts with the default content threshold.
#[must_use]
pub fn extract(document: &str) -> ExtractResult {
    PayloadExtractor::default().extract(document)
}

fn looks_like_bot_challenge(document: &str) -> bool {
    let lowered = document.to_ascii_lowercase();
    CHALLENGE_MARKERS.iter().any(|m| lowered.contains(m))
}

/// Decodes HTML entities in a script region.
///
/// Strict XML/numeric decoding is tried first; script code routinely holds a
/// bare `&` (`a && b`) which the strict decoder rejects, so the region is then
/// decoded reference by reference and anything unrecognised is kept as is.
fn decode_entities(region: &str) -> Cow<'_, str> {
    if !region.contains('&') {
        return Cow::Borrowed(region);
    }
    match quick_xml::escape::unescape(region) {
        Ok(decoded) => decoded,
        Err(_) => Cow::Owned(decode_entities_lenient(region)),
    }
}

fn decode_entities_lenient(region: &str) -> String {
    let mut out = String::with_capacity(region.len());
    let mut rest = region;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        if let Some((ch, consumed)) = decode_reference(tail) {
            out.push(ch);
            rest = &tail[consumed..];
        } else {
            out.push('&');
            rest = &tail[1..];
        }
    }
    out.push_str(rest);
    out
}

/// Decodes the `&name;`, `&#NN;` or `&#xNN;` reference at the start of `s`.
/// Returns the character and the number of bytes consumed.
fn decode_reference(s: &str) -> Option<(char, usize)> {
    let end = s.bytes().take(12).position(|b| b == b';')?;
    let name = &s[1..end];
    let ch = if let Some(hex) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
        char::from_u32(u32::from_str_radix(hex, 16).ok()?)?
    } else if let Some(dec) = name.strip_prefix('#') {
        char::from_u32(dec.parse().ok()?)?
    } else {
        match name {
            "quot" => '"',
            "apos" => '\'',
            "lt" => '<',
            "gt" => '>',
            "amp" => '&',
            "nbsp" => ' ',
            _ => return None,
        }
    };
    Some((ch, end + 1))
}

/// Returns the shortest prefix of `s` forming a complete `{…}` object.
///
/// Tracks brace depth while skipping over string literals and escape
/// sequences. `None` if `s` does not start with `{` or the object never
/// closes.
pub(crate) fn extract_balanced_object(s: &str) -> Option<&str> {
    if !s.starts_with('{') {
        return None;
    }
    let mut depth: i32 = 0;
    let mut in_string = false;
    let mut escape = false;
    for (i, c) in s.char_indices() {
        if escape {
            escape = false;
            continue;
        }
        if in_string {
            match c {
                '\\' => escape = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&s[..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Drills into `journeys[0].flights` and converts each flight.
fn offers_from_payload(payload: &Value) -> Result<Vec<Offer>, String> {
    let journeys = payload
        .get("journeys")
        .ok_or("payload has no `journeys` key")?
        .as_array()
        .ok_or("`journeys` is not an array")?;
    let first = journeys.first().ok_or("`journeys` is empty")?;

    let flights = match first.get("flights") {
        None => return Err("first journey has no `flights` key".to_owned()),
        Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(flights)) => flights,
        Some(_) => return Err("`flights` is not an array".to_owned()),
    };

    let mut offers = Vec::with_capacity(flights.len());
    for (idx, flight) in flights.iter().enumerate() {
        if let Some(offer) = offer_from_flight(idx, flight)? {
            offers.push(offer);
        }
    }
    Ok(offers)
}

/// `Ok(None)` for ineligible flights that carry no usable fare.
fn offer_from_flight(idx: usize, flight: &Value) -> Result<Option<Offer>, String> {
    let obj = flight
        .as_object()
        .ok_or_else(|| format!("flight {idx} is not an object"))?;

    let eligible = match obj.get("isGoWildFareEnabled") {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(other) => {
            return Err(format!(
                "flight {idx} has a non-boolean eligibility flag: {other}"
            ))
        }
    };

    let price = obj.get("goWildFare").and_then(parse_price);
    let price = match (price, eligible) {
        (Some(p), _) => p,
        (None, true) => return Err(format!("eligible flight {idx} has no usable fare")),
        (None, false) => return Ok(None),
    };

    Ok(Some(Offer {
        price,
        duration: display_field(obj.get("duration")),
        stops: display_field(obj.get("stopsText")),
        seats_remaining: obj.get("goWildFareSeatsRemaining").and_then(parse_seats),
        eligible,
    }))
}

fn parse_price(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => {
            let raw = n.to_string();
            raw.parse::<Decimal>()
                .ok()
                .or_else(|| Decimal::from_scientific(&raw).ok())
        }
        Value::String(s) => s
            .trim()
            .trim_start_matches('$')
            .replace(',', "")
            .parse::<Decimal>()
            .ok(),
        _ => None,
    }
}

fn parse_seats(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|v| u32::try_from(v).ok()),
        Value::String(s) => s.trim().parse::<u32>().ok(),
        _ => None,
    }
}

fn display_field(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.trim().to_owned(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

#[cfg(test)]
#[path = "extract_test.rs"]
mod tests;
