use std::collections::HashSet;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::airport::AirportCode;
use crate::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestinationConfig {
    pub code: AirportCode,
    pub name: String,
    /// Member of the short list searched by quick round-trip runs.
    #[serde(default)]
    pub popular: bool,
}

/// Fare-program data: the dates the pass excludes and the airports it serves.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProgramFile {
    #[serde(default)]
    pub blackout_dates: Vec<NaiveDate>,
    #[serde(default)]
    pub destinations: Vec<DestinationConfig>,
}

impl ProgramFile {
    #[must_use]
    pub fn destination_name(&self, code: &AirportCode) -> Option<&str> {
        self.destinations
            .iter()
            .find(|d| &d.code == code)
            .map(|d| d.name.as_str())
    }

    /// Destinations flagged `popular`, in file order.
    #[must_use]
    pub fn popular_destinations(&self) -> Vec<&DestinationConfig> {
        self.destinations.iter().filter(|d| d.popular).collect()
    }
}

/// Load and validate the program file from YAML.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_program(path: &Path) -> Result<ProgramFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ProgramFileIo {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_program(&content)
}

/// Parse and validate program YAML already in memory.
///
/// # Errors
///
/// Returns `ConfigError` if the YAML is malformed or fails validation.
pub fn parse_program(content: &str) -> Result<ProgramFile, ConfigError> {
    let program: ProgramFile = serde_yaml::from_str(content)?;
    validate_program(&program)?;
    Ok(program)
}

fn validate_program(program: &ProgramFile) -> Result<(), ConfigError> {
    let mut seen_codes = HashSet::new();

    for dest in &program.destinations {
        if dest.name.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "destination {} must have a non-empty name",
                dest.code
            )));
        }
        if !seen_codes.insert(dest.code.clone()) {
            return Err(ConfigError::Validation(format!(
                "duplicate destination code: {}",
                dest.code
            )));
        }
    }

    let mut seen_dates = HashSet::new();
    for date in &program.blackout_dates {
        if !seen_dates.insert(*date) {
            return Err(ConfigError::Validation(format!(
                "duplicate blackout date: {date}"
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "program_test.rs"]
mod tests;
