//! Error types for portsweep.
//!
//! Uses `thiserror` for ergonomic error definitions. Connection failures of
//! individual attempts are not errors: they are delivered to the reporter as
//! results. Everything in [`ScanError`] means the scan cannot continue.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub use crate::types::{PortError, TargetError};

/// Fatal errors raised by the scan engine.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("socket creation failed (family={family}, type={socket_type}, proto={protocol}): {source}")]
    SocketCreate {
        family: i32,
        socket_type: i32,
        protocol: i32,
        #[source]
        source: io::Error,
    },

    #[error("failed to mark socket non-blocking: {0}")]
    NonBlocking(#[source] io::Error),

    #[error("readiness wait failed: {0}")]
    Poll(#[source] io::Error),

    #[error("failed to read pending socket error: {0}")]
    SocketError(#[source] io::Error),

    #[error("cannot describe destination address (family {0})")]
    Describe(i32),

    #[error("connection pool already holds {0} attempt(s)")]
    PoolFull(usize),

    #[error("invalid scan configuration: {0}")]
    InvalidConfig(String),
}

/// Result type alias for scan operations.
pub type ScanResult<T> = Result<T, ScanError>;

/// Errors loading the services database.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("failed to read services database {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Errors reading application settings.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not determine configuration directory")]
    DirectoryNotFound,

    #[error("failed to read {path}: {reason}")]
    ReadFailed { path: PathBuf, reason: String },

    #[error("invalid settings format: {0}")]
    InvalidFormat(String),

    #[error("invalid setting: {0}")]
    InvalidValue(String),
}

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Top-level error for the command-line front end.
#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Port(#[from] PortError),

    #[error(transparent)]
    Target(#[from] TargetError),

    #[error("output error: {0}")]
    Output(#[from] io::Error),
}

impl CliError {
    /// Process exit status for this error.
    ///
    /// Usage problems share clap's status 2; anything raised while scanning is 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Port(_) | Self::Config(ConfigError::InvalidValue(_)) => 2,
            _ => 1,
        }
    }
}

/// Result type alias for CLI operations.
pub type CliResult<T> = Result<T, CliError>;
