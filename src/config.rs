//! Command-line arguments and validated run configuration.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::store::{StoreOptions, DEFAULT_OPEN_TIMEOUT};

/// Print bucket, key and size statistics for a bolt store file
#[derive(Parser, Debug, Clone)]
#[command(
    name = "boltstat",
    version,
    about = "Print bucket, key and size statistics for a bolt store file",
    after_help = "EXAMPLES:\n    \
        boltstat channel.db\n    \
        boltstat --timeout 30 -v /var/lib/node/wallet.db"
)]
pub struct CliArgs {
    /// Store file to audit
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Seconds to wait for a shared lock on the file
    #[arg(long, default_value_t = DEFAULT_OPEN_TIMEOUT.as_secs_f64(), value_name = "SECS")]
    pub timeout: f64,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Errors found while validating [`CliArgs`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("Timeout must be a positive number of seconds, got {0}")]
    InvalidTimeout(f64),
}

/// Validated configuration for one audit run.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditConfig {
    pub path: PathBuf,
    pub timeout: Duration,
    pub verbose: bool,
}

impl AuditConfig {
    pub fn from_args(args: CliArgs) -> Result<Self, ConfigError> {
        if !(args.timeout.is_finite() && args.timeout > 0.0) {
            return Err(ConfigError::InvalidTimeout(args.timeout));
        }
        let timeout = Duration::try_from_secs_f64(args.timeout)
            .map_err(|_| ConfigError::InvalidTimeout(args.timeout))?;
        Ok(Self {
            path: args.path,
            timeout,
            verbose: args.verbose,
        })
    }

    /// Options for opening the store: always read-only.
    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            read_only: true,
            timeout: self.timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_defaults() {
        let args = CliArgs::try_parse_from(["boltstat", "wallet.db"]).unwrap();
        let config = AuditConfig::from_args(args).unwrap();
        assert_eq!(config.path, PathBuf::from("wallet.db"));
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert!(!config.verbose);
        assert!(config.store_options().read_only);
    }

    #[test]
    fn test_parse_timeout_and_verbose() {
        let args =
            CliArgs::try_parse_from(["boltstat", "--timeout", "0.5", "-v", "x.db"]).unwrap();
        let config = AuditConfig::from_args(args).unwrap();
        assert_eq!(config.timeout, Duration::from_millis(500));
        assert!(config.verbose);
    }

    #[test]
    fn test_missing_path_is_usage_error() {
        let err = CliArgs::try_parse_from(["boltstat"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_rejects_non_positive_timeout() {
        let args = CliArgs::try_parse_from(["boltstat", "--timeout", "0", "x.db"]).unwrap();
        assert_eq!(
            AuditConfig::from_args(args),
            Err(ConfigError::InvalidTimeout(0.0))
        );
    }

    #[test]
    fn test_rejects_overflowing_timeout() {
        let args = CliArgs::try_parse_from(["boltstat", "--timeout", "1e20", "x.db"]).unwrap();
        assert_eq!(
            AuditConfig::from_args(args),
            Err(ConfigError::InvalidTimeout(1e20))
        );
    }

    #[test]
    fn test_default_timeout_matches_store_default() {
        let args = CliArgs::try_parse_from(["boltstat", "x.db"]).unwrap();
        let config = AuditConfig::from_args(args).unwrap();
        assert_eq!(config.timeout, DEFAULT_OPEN_TIMEOUT);
        assert_eq!(config.store_options().timeout, StoreOptions::default().timeout);
    }
}
