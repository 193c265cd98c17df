use thiserror::Error;

/// Errors raised by the shared nodekit building blocks.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Unknown cast: {0}")]
    UnknownCast(String),

    #[error("Cannot cast {value} to {target}")]
    Cast { target: &'static str, value: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
