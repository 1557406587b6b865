use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A three-letter IATA airport code, always stored uppercase.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AirportCode(String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid airport code \"{0}\": expected three ASCII letters")]
pub struct AirportCodeError(pub String);

impl AirportCode {
    /// Parses and uppercases a code. Surrounding whitespace is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`AirportCodeError`] unless the trimmed input is exactly three
    /// ASCII letters.
    pub fn parse(raw: &str) -> Result<Self, AirportCodeError> {
        let trimmed = raw.trim();
        if trimmed.len() == 3 && trimmed.bytes().all(|b| b.is_ascii_alphabetic()) {
            Ok(Self(trimmed.to_ascii_uppercase()))
        } else {
            Err(AirportCodeError(raw.to_owned()))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AirportCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for AirportCode {
    type Err = AirportCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for AirportCode {
    type Error = AirportCodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<AirportCode> for String {
    fn from(code: AirportCode) -> Self {
        code.0
    }
}
