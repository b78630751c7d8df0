//! # portsweep - A Poll-Driven TCP Connect Port Scanner
//!
//! portsweep probes a host, or a wildcard range of hosts, for open TCP ports
//! by issuing non-blocking `connect()` calls and waiting for them with a
//! single `poll()` loop. At most a fixed number of sockets are in flight at
//! any time.
//!
//! ## Features
//!
//! - **Bounded Concurrency**: A fixed-size pool of in-flight connects
//! - **Wildcard Targets**: `*` in a hostname expands to 1-253
//! - **Services Filter**: Optionally scan only ports named in `/etc/services`
//! - **Multiple Output Formats**: Plain text, JSON lines, and CSV
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use portsweep::scanner::{ConnectionReport, PortScanner, ScanOptions};
//! use portsweep::services::ServiceTable;
//! use portsweep::types::{Port, PortRange, ResolvedAddress};
//!
//! let range = PortRange::new(Port::new(1).unwrap(), Port::new(1024).unwrap()).unwrap();
//! let addresses = vec![ResolvedAddress::tcp("localhost", "127.0.0.1".parse().unwrap())];
//! let reporter = |r: &ConnectionReport| {
//!     if r.is_open() {
//!         println!("{}:{} open", r.host, r.port);
//!     }
//! };
//!
//! let mut scanner =
//!     PortScanner::new(addresses, ServiceTable::builtin(), ScanOptions::new(range), reporter)
//!         .unwrap();
//! scanner.run().unwrap();
//! let (_, stats) = scanner.teardown();
//! println!("{} open", stats.open);
//! ```
//!
//! ## Architecture
//!
//! - [`types`] - Ports, port ranges, target patterns and resolved addresses
//! - [`scanner`] - The connect pool, scan cursor and poll loop
//! - [`services`] - The services database used for names and filtering
//! - [`config`] - Settings file handling
//! - [`output`] - Reporters for plain, JSON and CSV output
//! - [`error`] - Error types

pub mod cli;
pub mod config;
pub mod error;
pub mod output;
pub mod scanner;
pub mod services;
pub mod types;

// Re-export commonly used types
pub use error::{CliError, ScanError};
pub use scanner::{ConnectionReport, PortScanner, PortStatus, Reporter, ScanOptions, ScanStats};
pub use services::ServiceTable;
pub use types::{Port, PortRange, ResolvedAddress, TargetSpec};
