use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if values are present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if values are present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so it can be tested with a `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.trim()
            .parse::<u64>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.trim()
            .parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let env = parse_environment(&or_default("FARESCOUT_ENV", "development"))?;
    let log_level = or_default("FARESCOUT_LOG_LEVEL", "info");
    let program_path = PathBuf::from(or_default(
        "FARESCOUT_PROGRAM_PATH",
        "./config/program.yaml",
    ));
    let booking_base_url = or_default(
        "FARESCOUT_BOOKING_BASE_URL",
        "https://booking.flyfrontier.com",
    );
    let home_url = or_default("FARESCOUT_HOME_URL", "https://www.flyfrontier.com/");
    let user_agent = or_default("FARESCOUT_USER_AGENT", DEFAULT_USER_AGENT);

    let request_timeout_secs = parse_u64("FARESCOUT_REQUEST_TIMEOUT_SECS", "15")?;
    let delay_floor_secs = parse_u64("FARESCOUT_DELAY_FLOOR_SECS", "15")?;
    let delay_ceiling_secs = parse_u64("FARESCOUT_DELAY_CEILING_SECS", "60")?;
    let delay_increment_secs = parse_u64("FARESCOUT_DELAY_INCREMENT_SECS", "10")?;
    let delay_decrement_secs = parse_u64("FARESCOUT_DELAY_DECREMENT_SECS", "2")?;
    let delay_jitter_secs = parse_u64("FARESCOUT_DELAY_JITTER_SECS", "10")?;
    let min_content_bytes = parse_usize("FARESCOUT_MIN_CONTENT_BYTES", "10000")?;
    let rate_limit_statuses = parse_status_list(
        "FARESCOUT_RATE_LIMIT_STATUSES",
        &or_default("FARESCOUT_RATE_LIMIT_STATUSES", "403,429"),
    )?;

    if delay_floor_secs > delay_ceiling_secs {
        return Err(ConfigError::InvalidEnvVar {
            var: "FARESCOUT_DELAY_FLOOR_SECS".to_string(),
            reason: format!(
                "floor ({delay_floor_secs}s) must not exceed ceiling ({delay_ceiling_secs}s)"
            ),
        });
    }

    Ok(AppConfig {
        env,
        log_level,
        program_path,
        booking_base_url,
        home_url,
        user_agent,
        request_timeout_secs,
        delay_floor_secs,
        delay_ceiling_secs,
        delay_increment_secs,
        delay_decrement_secs,
        delay_jitter_secs,
        min_content_bytes,
        rate_limit_statuses,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "FARESCOUT_ENV".to_string(),
            reason: format!(
                "unknown environment \"{other}\"; expected development, test, or production"
            ),
        }),
    }
}

/// Parse a comma-separated list of HTTP status codes such as `"403,429"`.
fn parse_status_list(var: &str, raw: &str) -> Result<Vec<u16>, ConfigError> {
    let mut statuses = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let status = part.parse::<u16>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: format!("\"{part}\": {e}"),
        })?;
        if !(100..=599).contains(&status) {
            return Err(ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: format!("{status} is not an HTTP status code"),
            });
        }
        statuses.push(status);
    }
    if statuses.is_empty() {
        return Err(ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: "at least one status code is required".to_string(),
        });
    }
    Ok(statuses)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
