//! Configuration management for portsweep.
//!
//! Provides XDG-compliant settings storage supplying defaults for the
//! command line.

mod settings;

pub use settings::{AppSettings, Paths};
