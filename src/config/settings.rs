//! Application settings and paths.
//!
//! Settings live in `settings.json` under the XDG config directory
//! (`~/.config/portsweep`). Every field is optional in the file; missing
//! fields take the built-in defaults. Command-line flags override both.

use crate::error::{ConfigError, ConfigResult};
use crate::output::OutputFormat;
use crate::scanner::{DEFAULT_MAX_SOCKETS, MAX_SOCKETS};
use crate::services::DEFAULT_SERVICES_PATH;
use crate::types::{Port, PortRange};
use directories::ProjectDirs;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Application directory paths following the XDG Base Directory Specification.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Configuration directory (~/.config/portsweep)
    pub config_dir: PathBuf,
}

impl Paths {
    /// Locate the configuration directory. Nothing is created on disk.
    pub fn new() -> ConfigResult<Self> {
        let project = ProjectDirs::from("com", "portsweep", "portsweep")
            .ok_or(ConfigError::DirectoryNotFound)?;

        Ok(Self {
            config_dir: project.config_dir().to_path_buf(),
        })
    }

    /// Get the path to the settings file.
    pub fn settings_file(&self) -> PathBuf {
        self.config_dir.join("settings.json")
    }
}

/// Application-wide settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// First port of the scanned range.
    pub first_port: u16,
    /// Last port of the scanned range.
    pub last_port: u16,
    /// Maximum number of concurrent connects.
    pub max_sockets: usize,
    /// Only scan ports listed in the services database.
    pub services_only: bool,
    /// Default output format.
    pub output_format: OutputFormat,
    /// Services database location.
    pub services_file: PathBuf,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            first_port: Port::MIN,
            last_port: Port::MAX,
            max_sockets: DEFAULT_MAX_SOCKETS,
            services_only: false,
            output_format: OutputFormat::Plain,
            services_file: PathBuf::from(DEFAULT_SERVICES_PATH),
        }
    }
}

impl AppSettings {
    /// Load settings from the default location, or defaults if there is no file.
    pub fn load() -> ConfigResult<Self> {
        let file = Paths::new()?.settings_file();

        if !file.exists() {
            debug!("no settings at {}, using defaults", file.display());
            return Ok(Self::default());
        }

        Self::load_from(&file)
    }

    /// Load settings from a specific file.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let settings: Self =
            serde_json::from_str(&content).map_err(|e| ConfigError::InvalidFormat(e.to_string()))?;
        debug!("loaded settings from {}", path.display());
        Ok(settings)
    }

    /// The configured port range.
    pub fn port_range(&self) -> ConfigResult<PortRange> {
        let first = Port::new(self.first_port)
            .ok_or_else(|| ConfigError::InvalidValue(format!("first_port {}", self.first_port)))?;
        let last = Port::new(self.last_port)
            .ok_or_else(|| ConfigError::InvalidValue(format!("last_port {}", self.last_port)))?;
        PortRange::new(first, last).map_err(|e| ConfigError::InvalidValue(e.to_string()))
    }

    /// Check every value is usable.
    pub fn validate(&self) -> ConfigResult<()> {
        self.port_range()?;
        if !(1..=MAX_SOCKETS).contains(&self.max_sockets) {
            return Err(ConfigError::InvalidValue(format!(
                "max_sockets must be between 1 and {}, got {}",
                MAX_SOCKETS, self.max_sockets
            )));
        }
        Ok(())
    }
}
