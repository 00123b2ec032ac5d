//! Error types for the store audit

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AuditError>;

#[derive(Error, Debug)]
pub enum AuditError {
    #[error("Failed to {action} {}: {source}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Timed out after {timeout:?} waiting for a shared lock on {}", path.display())]
    Timeout { path: PathBuf, timeout: Duration },

    #[error("Invalid file format: {0}")]
    InvalidFormat(String),

    #[error("Only read-only access is supported")]
    WriteAccessUnsupported,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AuditError {
    pub(crate) fn io(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AuditError::Io {
            action,
            path: path.into(),
            source,
        }
    }

    /// Short machine-readable kind, used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            AuditError::Io { .. } => "io",
            AuditError::Timeout { .. } => "timeout",
            AuditError::InvalidFormat(_) => "format",
            AuditError::WriteAccessUnsupported => "unsupported",
            AuditError::Json(_) => "json",
        }
    }
}
