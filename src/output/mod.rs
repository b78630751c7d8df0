//! Output formatting module.
//!
//! Reporters that turn connection reports into plain text, JSON lines or CSV.
//! All of them write as results arrive; nothing is buffered until the end.

mod csv_format;
mod json_format;
mod plain;

pub use csv_format::CsvReporter;
pub use json_format::JsonReporter;
pub use plain::{print_error, print_summary, print_warning, PlainReporter};

use crate::scanner::{ConnectionReport, Reporter};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{self, Stderr, Stdout};

/// Output format for results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable plain text
    #[default]
    Plain,
    /// One JSON object per line
    Json,
    /// CSV with a header row
    Csv,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain => write!(f, "plain"),
            Self::Json => write!(f, "json"),
            Self::Csv => write!(f, "csv"),
        }
    }
}

/// Reporter writing to the process's standard streams in the chosen format.
pub enum OutputReporter {
    Plain(PlainReporter<Stdout, Stderr>),
    Json(JsonReporter<Stdout>),
    Csv(CsvReporter<Stdout>),
}

impl OutputReporter {
    pub fn new(format: OutputFormat, verbose: bool) -> Self {
        match format {
            OutputFormat::Plain => Self::Plain(PlainReporter::new(io::stdout(), io::stderr(), verbose)),
            OutputFormat::Json => Self::Json(JsonReporter::new(io::stdout())),
            OutputFormat::Csv => Self::Csv(CsvReporter::new(io::stdout())),
        }
    }

    /// Flush output and surface the first write error, if any.
    pub fn finish(&mut self) -> io::Result<()> {
        match self {
            Self::Plain(r) => r.finish(),
            Self::Json(r) => r.finish(),
            Self::Csv(r) => r.finish(),
        }
    }
}

impl Reporter for OutputReporter {
    fn report(&mut self, report: &ConnectionReport) {
        match self {
            Self::Plain(r) => r.report(report),
            Self::Json(r) => r.report(report),
            Self::Csv(r) => r.report(report),
        }
    }
}

/// Describe a failed attempt's error code the way the platform does.
///
/// This is the `strerror` text alone, without the `(os error N)` suffix
/// that `io::Error` appends.
pub(crate) fn describe_error(report: &ConnectionReport) -> String {
    let Some(e) = report.error() else {
        return String::new();
    };
    let text = e.to_string();
    let suffix = format!(" (os error {})", report.error_code);
    match text.strip_suffix(&suffix) {
        Some(description) => description.to_string(),
        None => text,
    }
}
