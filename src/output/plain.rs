//! Plain text output formatting.
//!
//! Open ports go to standard output, one line each. Failed attempts are only
//! shown in verbose mode, on the error stream.

use super::describe_error;
use crate::scanner::{ConnectionReport, Reporter, ScanStats};
use console::style;
use std::io::{self, Write};

/// Human-readable reporter.
pub struct PlainReporter<W: Write, E: Write> {
    out: W,
    err: E,
    verbose: bool,
    error: Option<io::Error>,
}

impl<W: Write, E: Write> PlainReporter<W, E> {
    pub fn new(out: W, err: E, verbose: bool) -> Self {
        Self {
            out,
            err,
            verbose,
            error: None,
        }
    }

    /// Flush both streams, returning the first error seen while reporting.
    pub fn finish(&mut self) -> io::Result<()> {
        if let Some(e) = self.error.take() {
            return Err(e);
        }
        self.out.flush()?;
        self.err.flush()
    }

    pub fn into_inner(self) -> (W, E) {
        (self.out, self.err)
    }

    fn write_report(&mut self, report: &ConnectionReport) -> io::Result<()> {
        if report.is_open() {
            writeln!(
                self.out,
                "host={}, port={}({}), proto={}",
                report.host, report.port, report.service, report.protocol
            )
        } else if self.verbose {
            writeln!(
                self.err,
                "{} {}: host={}, port={}({}), proto={}",
                style("ERR:").red(),
                describe_error(report),
                report.host,
                report.port,
                report.service,
                report.protocol
            )
        } else {
            Ok(())
        }
    }
}

impl<W: Write, E: Write> Reporter for PlainReporter<W, E> {
    fn report(&mut self, report: &ConnectionReport) {
        if self.error.is_some() {
            return;
        }
        if let Err(e) = self.write_report(report) {
            self.error = Some(e);
        }
    }
}

/// Print the end-of-scan summary to the error stream.
pub fn print_summary(stats: &ScanStats) {
    eprintln!(
        "{} {} attempt(s) over {} address(es) in {:.2}s: {} open, {} closed, {} filtered",
        style("Done:").cyan().bold(),
        stats.reported,
        stats.addresses,
        stats.duration_ms as f64 / 1000.0,
        style(stats.open).green().bold(),
        style(stats.closed).red(),
        style(stats.filtered).yellow()
    );
    if stats.skipped_addresses > 0 {
        eprintln!(
            "{} {} address(es) skipped as unsupported",
            style("•").dim(),
            stats.skipped_addresses
        );
    }
}

/// Print an error message.
pub fn print_error(msg: &str) {
    eprintln!("{} {}", style("Error:").red().bold(), msg);
}

/// Print a warning message.
pub fn print_warning(msg: &str) {
    eprintln!("{} {}", style("Warning:").yellow().bold(), msg);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(port: u16, service: &str, code: i32) -> ConnectionReport {
        ConnectionReport {
            host: "127.0.0.1".to_string(),
            port,
            service: service.to_string(),
            protocol: "tcp".to_string(),
            error_code: code,
        }
    }

    #[test]
    fn test_open_port_line() {
        let mut reporter = PlainReporter::new(Vec::new(), Vec::new(), false);
        reporter.report(&report(22, "ssh", 0));
        reporter.report(&report(23, "telnet", libc::ECONNREFUSED));
        reporter.finish().unwrap();

        let (out, err) = reporter.into_inner();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "host=127.0.0.1, port=22(ssh), proto=tcp\n"
        );
        assert!(err.is_empty());
    }

    #[test]
    fn test_verbose_shows_failures() {
        let mut reporter = PlainReporter::new(Vec::new(), Vec::new(), true);
        reporter.report(&report(23, "telnet", libc::ECONNREFUSED));
        reporter.finish().unwrap();

        let (out, err) = reporter.into_inner();
        assert!(out.is_empty());
        let err = String::from_utf8(err).unwrap();
        assert!(err.contains("ERR:"));
        assert!(err.contains("host=127.0.0.1, port=23(telnet), proto=tcp"));
        let refused = describe_error(&report(23, "telnet", libc::ECONNREFUSED));
        assert!(err.contains(&format!("{}: host=127.0.0.1", refused)));
        assert!(!err.contains("os error"));
    }
}
