//! Command-line interface definitions for portsweep.
//!
//! Uses `clap` derive macros for declarative argument parsing. Flags override
//! the settings file, which overrides the built-in defaults.

use crate::config::AppSettings;
use crate::error::CliResult;
use crate::output::{self, OutputFormat, OutputReporter};
use crate::scanner::{PortScanner, ScanOptions, ScanStats, MAX_SOCKETS};
use crate::services::ServiceTable;
use crate::types::{DnsResolver, TargetSpec};
use clap::Parser;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Probe a host, or a wildcard range of hosts, for open TCP ports.
///
/// Every `*` in HOST is replaced by each of 1-253, so `192.168.1.*` scans a
/// whole /24 and `host*.example.com` scans host1 through host253.
#[derive(Parser, Debug)]
#[command(name = "portsweep")]
#[command(author = "HueCodes <huecodes@proton.me>")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "A poll-driven TCP connect port scanner", long_about = None)]
pub struct Args {
    /// Target hostname or address, `*` expands to 1-253
    #[arg(value_name = "HOST")]
    pub target: String,

    /// First port to scan
    #[arg(short = 'f', long = "first", value_name = "PORT",
          value_parser = clap::value_parser!(u16).range(1..))]
    pub first_port: Option<u16>,

    /// Last port to scan
    #[arg(short = 'l', long = "last", value_name = "PORT",
          value_parser = clap::value_parser!(u16).range(1..))]
    pub last_port: Option<u16>,

    /// Maximum number of sockets open at once (1-10000)
    #[arg(short = 'm', long = "max-sockets", value_name = "N",
          value_parser = clap::value_parser!(u16).range(1..=MAX_SOCKETS as i64))]
    pub max_sockets: Option<u16>,

    /// Only scan ports listed in the services database
    #[arg(short = 's', long)]
    pub services_only: bool,

    /// Report failed attempts and diagnostics
    #[arg(short, long)]
    pub verbose: bool,

    /// Output format for results
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormat>,

    /// Path to a settings file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Services database to read
    #[arg(long, value_name = "PATH", env = "PORTSWEEP_SERVICES")]
    pub services_file: Option<PathBuf>,
}

impl Args {
    /// Effective settings: file (or defaults) with flags applied on top.
    pub fn settings(&self) -> CliResult<AppSettings> {
        let mut settings = match &self.config {
            Some(path) => AppSettings::load_from(path)?,
            None => AppSettings::load()?,
        };

        if let Some(first) = self.first_port {
            settings.first_port = first;
        }
        if let Some(last) = self.last_port {
            settings.last_port = last;
        }
        if let Some(max) = self.max_sockets {
            settings.max_sockets = max as usize;
        }
        if self.services_only {
            settings.services_only = true;
        }
        if let Some(format) = self.output {
            settings.output_format = format;
        }
        if let Some(path) = &self.services_file {
            settings.services_file = path.clone();
        }

        settings.validate()?;
        Ok(settings)
    }
}

/// Scan options for validated settings.
pub fn scan_options(settings: &AppSettings, verbose: bool) -> CliResult<ScanOptions> {
    let mut options =
        ScanOptions::new(settings.port_range()?).with_max_sockets(settings.max_sockets);
    if settings.services_only {
        options = options.with_services_only();
    }
    if verbose {
        options = options.with_verbose();
    }
    Ok(options)
}

/// Install the log subscriber. `RUST_LOG` wins over the verbosity flag.
pub fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose { "warn,portsweep=debug" } else { "warn" })
    });
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Resolve the target and scan it to completion.
pub fn run(args: &Args) -> CliResult<ScanStats> {
    let settings = args.settings()?;
    let options = scan_options(&settings, args.verbose)?;
    let target = TargetSpec::parse(&args.target)?;
    debug!("target {} expands to {} host(s)", target, target.expanded_count());

    let services = ServiceTable::load(&settings.services_file);

    let resolver = DnsResolver::new()?;
    let addresses = target.resolve(&resolver);
    if addresses.is_empty() {
        output::print_warning(&format!("no addresses resolved for '{}'", target));
    }

    let reporter = OutputReporter::new(settings.output_format, args.verbose);
    let mut scanner = PortScanner::new(addresses, services, options, reporter)?;
    let outcome = scanner.run();
    let (mut reporter, stats) = scanner.teardown();
    reporter.finish()?;
    outcome?;

    if args.verbose && settings.output_format == OutputFormat::Plain {
        output::print_summary(&stats);
    }
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CliError, ConfigError};
    use std::io::Write;

    fn settings_file(json: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        file
    }

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("portsweep").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_flags() {
        let args = parse(&["-f", "20", "-l", "30", "-m", "5", "-s", "-v", "example.com"]);
        assert_eq!(args.target, "example.com");
        assert_eq!(args.first_port, Some(20));
        assert_eq!(args.last_port, Some(30));
        assert_eq!(args.max_sockets, Some(5));
        assert!(args.services_only);
        assert!(args.verbose);
    }

    #[test]
    fn test_rejects_bad_arguments() {
        let base = ["portsweep"];
        assert!(Args::try_parse_from(base).is_err());
        assert!(Args::try_parse_from(["portsweep", "-f", "0", "host"]).is_err());
        assert!(Args::try_parse_from(["portsweep", "-l", "65536", "host"]).is_err());
        assert!(Args::try_parse_from(["portsweep", "-m", "10001", "host"]).is_err());
        assert!(Args::try_parse_from(["portsweep", "-m", "0", "host"]).is_err());
        assert!(Args::try_parse_from(["portsweep", "a", "b"]).is_err());
    }

    #[test]
    fn test_flags_override_settings() {
        let file = settings_file(r#"{"first_port": 100, "last_port": 200, "max_sockets": 50}"#);
        let path = file.path().to_str().unwrap();
        let args = parse(&["--config", path, "-l", "150", "host"]);

        let settings = args.settings().unwrap();
        assert_eq!(settings.first_port, 100);
        assert_eq!(settings.last_port, 150);
        assert_eq!(settings.max_sockets, 50);

        let options = scan_options(&settings, false).unwrap();
        assert_eq!(options.range.len(), 51);
        assert!(!options.services_only);
    }

    #[test]
    fn test_reversed_range_is_usage_error() {
        let file = settings_file("{}");
        let path = file.path().to_str().unwrap();
        let args = parse(&["--config", path, "-f", "90", "-l", "80", "host"]);

        let err = args.settings().unwrap_err();
        assert!(matches!(err, CliError::Config(ConfigError::InvalidValue(_))));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_run_against_listener() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port().to_string();
        let file = settings_file(r#"{"output_format": "json"}"#);
        let path = file.path().to_str().unwrap();
        let args = parse(&["--config", path, "-f", &port, "-l", &port, "127.0.0.1"]);

        let stats = run(&args).unwrap();
        assert_eq!(stats.reported, 1);
        assert_eq!(stats.open, 1);
    }

    #[test]
    fn test_run_with_services_only_and_no_known_ports() {
        let services = settings_file("ssh 22/tcp\n");
        let config = settings_file(&format!(
            r#"{{"services_file": {:?}}}"#,
            services.path().to_str().unwrap()
        ));
        let path = config.path().to_str().unwrap();
        let args = parse(&["--config", path, "-s", "-f", "1000", "-l", "1100", "127.0.0.1"]);

        let stats = run(&args).unwrap();
        assert_eq!(stats.launched, 0);
        assert_eq!(stats.reported, 0);
    }
}
