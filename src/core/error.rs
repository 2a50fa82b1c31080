//! Error types for the analyzer

use crate::core::domain::Domain;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using the analyzer's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Analyzer error types
///
/// Single-file parse failures are not errors; they surface as
/// [`IndexWarning`](crate::index::IndexWarning) entries on the index.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Scope resolution error: {message}")]
    ScopeResolution { message: String },

    #[error("Source root not readable: {path}: {message}")]
    RootUnreadable { path: PathBuf, message: String },

    #[error("Index error: {message}")]
    IndexError { message: String },

    #[error("Not found: {name}")]
    NotFound { name: String },

    #[error("Live service call {operation} failed ({domain}): {cause}")]
    ExternalService {
        domain: Domain,
        operation: String,
        cause: String,
    },

    #[error("Live service is not configured ({domain}); set UE_PLUGIN_HOST to enable it")]
    ServiceNotConfigured { domain: Domain },

    #[error("Invalid query: {message}")]
    InvalidQuery { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

impl Error {
    /// The domain a failure is attributable to, if any
    pub fn domain(&self) -> Option<Domain> {
        match self {
            Error::ExternalService { domain, .. } | Error::ServiceNotConfigured { domain } => {
                Some(*domain)
            }
            _ => None,
        }
    }

    pub fn external(domain: Domain, operation: impl Into<String>, cause: impl ToString) -> Self {
        Error::ExternalService {
            domain,
            operation: operation.into(),
            cause: cause.to_string(),
        }
    }
}
