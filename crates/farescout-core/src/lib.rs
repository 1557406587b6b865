mod airport;
mod app_config;
mod config;
mod program;

pub use airport::{AirportCode, AirportCodeError};
pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use program::{load_program, parse_program, DestinationConfig, ProgramFile};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read program file {path}: {source}")]
    ProgramFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse program file: {0}")]
    ProgramFileParse(#[from] serde_yaml::Error),

    #[error("program validation failed: {0}")]
    Validation(String),
}
