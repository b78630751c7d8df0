//! JSON output formatting, one object per line.

use super::describe_error;
use crate::scanner::{ConnectionReport, PortStatus, Reporter};
use serde::Serialize;
use std::io::{self, Write};

#[derive(Serialize)]
struct JsonRecord<'a> {
    host: &'a str,
    port: u16,
    service: &'a str,
    protocol: &'a str,
    status: PortStatus,
    error_code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Writes every attempt as a JSON line.
pub struct JsonReporter<W: Write> {
    out: W,
    error: Option<io::Error>,
}

impl<W: Write> JsonReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out, error: None }
    }

    pub fn finish(&mut self) -> io::Result<()> {
        if let Some(e) = self.error.take() {
            return Err(e);
        }
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_report(&mut self, report: &ConnectionReport) -> io::Result<()> {
        let record = JsonRecord {
            host: &report.host,
            port: report.port,
            service: &report.service,
            protocol: &report.protocol,
            status: report.status(),
            error_code: report.error_code,
            error: (!report.is_open()).then(|| describe_error(report)),
        };
        serde_json::to_writer(&mut self.out, &record)?;
        writeln!(self.out)
    }
}

impl<W: Write> Reporter for JsonReporter<W> {
    fn report(&mut self, report: &ConnectionReport) {
        if self.error.is_some() {
            return;
        }
        if let Err(e) = self.write_report(report) {
            self.error = Some(e);
        }
    }
}
