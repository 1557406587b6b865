use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Process-level settings for a discovery run.
///
/// Pacing values are whole seconds; the engine converts them into its own
/// pacing policy so tests can use sub-second values without going through
/// the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    pub program_path: PathBuf,
    pub booking_base_url: String,
    pub home_url: String,
    pub user_agent: String,
    pub request_timeout_secs: u64,
    pub delay_floor_secs: u64,
    pub delay_ceiling_secs: u64,
    pub delay_increment_secs: u64,
    pub delay_decrement_secs: u64,
    pub delay_jitter_secs: u64,
    pub min_content_bytes: usize,
    pub rate_limit_statuses: Vec<u16>,
}
