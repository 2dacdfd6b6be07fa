// Error types for reference-data loading and callsign resolution
//
// Per-record problems while normalizing provider data are NOT errors; they are
// collected as warnings on the normalized output. Everything here is surfaced
// to the immediate caller.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors raised by the resolution engine and its loaders
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LookupError {
    /// The tokenizer could not find a plausible base call
    #[error("malformed callsign: {input:?}")]
    MalformedCallsign { input: String },

    /// A well-formed callsign with no exception or prefix coverage
    #[error("no DXCC entity found for {callsign}")]
    NoMatch { callsign: String },

    /// A provider payload produced no usable records at all
    #[error("{provider} data is unusable: {reason}")]
    SourceDataInvalid { provider: String, reason: String },

    /// The generation behind a handle has been dropped
    #[error("reference data generation has been superseded")]
    StaleGeneration,

    /// A validity window whose start is not before its end
    #[error("invalid validity window: {from} is not before {to}")]
    InvalidWindow {
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    },

    #[error("failed to read {path:?}: {message}")]
    Io { path: PathBuf, message: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("cache error: {0}")]
    Cache(String),
}

impl LookupError {
    pub fn source_invalid(provider: &str, reason: impl Into<String>) -> Self {
        LookupError::SourceDataInvalid {
            provider: provider.to_string(),
            reason: reason.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, err: impl std::fmt::Display) -> Self {
        LookupError::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }

    /// Short machine-readable name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            LookupError::MalformedCallsign { .. } => "MalformedCallsign",
            LookupError::NoMatch { .. } => "NoMatch",
            LookupError::SourceDataInvalid { .. } => "SourceDataInvalid",
            LookupError::StaleGeneration => "StaleGeneration",
            LookupError::InvalidWindow { .. } => "InvalidWindow",
            LookupError::Io { .. } => "Io",
            LookupError::Config(_) => "Config",
            LookupError::Cache(_) => "Cache",
        }
    }
}

impl From<sqlx::Error> for LookupError {
    fn from(e: sqlx::Error) -> Self {
        LookupError::Cache(e.to_string())
    }
}

pub type Result<T, E = LookupError> = std::result::Result<T, E>;
