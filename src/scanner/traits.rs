//! Result reporting abstraction.
//!
//! The scanner hands every finalized attempt to a [`Reporter`]. Formatting,
//! filtering and printing are entirely the reporter's business.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;

/// Status of a scanned port, derived from the attempt's error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortStatus {
    /// The connection was established.
    Open,
    /// The target actively refused the connection.
    Closed,
    /// Any other failure (unreachable, timed out, ...).
    Filtered,
}

impl PortStatus {
    /// Classify an OS error code; zero means connected.
    pub fn from_error_code(code: i32) -> Self {
        match code {
            0 => Self::Open,
            libc::ECONNREFUSED => Self::Closed,
            _ => Self::Filtered,
        }
    }
}

impl fmt::Display for PortStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Closed => write!(f, "closed"),
            Self::Filtered => write!(f, "filtered"),
        }
    }
}

/// Outcome of one connection attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionReport {
    /// Numeric host address.
    pub host: String,
    /// Destination port.
    pub port: u16,
    /// Service name for the port, or the port number when unnamed.
    pub service: String,
    /// Protocol name (`tcp`).
    pub protocol: String,
    /// OS error code of the attempt; zero when the port accepted the connection.
    pub error_code: i32,
}

impl ConnectionReport {
    pub fn is_open(&self) -> bool {
        self.error_code == 0
    }

    pub fn status(&self) -> PortStatus {
        PortStatus::from_error_code(self.error_code)
    }

    /// The platform's description of the error code, if the attempt failed.
    pub fn error(&self) -> Option<io::Error> {
        (self.error_code != 0).then(|| io::Error::from_raw_os_error(self.error_code))
    }
}

/// Receives finalized connection attempts.
///
/// Called on the scanning thread, in completion order. Implementations must
/// not block for long: no other attempt makes progress meanwhile.
pub trait Reporter {
    fn report(&mut self, report: &ConnectionReport);
}

impl<F> Reporter for F
where
    F: FnMut(&ConnectionReport),
{
    fn report(&mut self, report: &ConnectionReport) {
        self(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(code: i32) -> ConnectionReport {
        ConnectionReport {
            host: "127.0.0.1".to_string(),
            port: 22,
            service: "ssh".to_string(),
            protocol: "tcp".to_string(),
            error_code: code,
        }
    }

    #[test]
    fn test_port_status_display() {
        assert_eq!(PortStatus::Open.to_string(), "open");
        assert_eq!(PortStatus::Closed.to_string(), "closed");
        assert_eq!(PortStatus::Filtered.to_string(), "filtered");
    }

    #[test]
    fn test_status_from_code() {
        assert_eq!(report(0).status(), PortStatus::Open);
        assert_eq!(report(libc::ECONNREFUSED).status(), PortStatus::Closed);
        assert_eq!(report(libc::ETIMEDOUT).status(), PortStatus::Filtered);
        assert_eq!(report(libc::EHOSTUNREACH).status(), PortStatus::Filtered);
    }

    #[test]
    fn test_error_description() {
        assert!(report(0).error().is_none());
        let err = report(libc::ECONNREFUSED).error().unwrap();
        assert_eq!(err.raw_os_error(), Some(libc::ECONNREFUSED));
    }

    #[test]
    fn test_closure_reporter() {
        let mut seen = Vec::new();
        {
            let mut reporter = |r: &ConnectionReport| seen.push(r.port);
            reporter.report(&report(0));
            reporter.report(&report(1));
        }
        assert_eq!(seen, vec![22, 22]);
    }
}
