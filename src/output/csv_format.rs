//! CSV output formatting.

use super::describe_error;
use crate::scanner::{ConnectionReport, PortStatus, Reporter};
use serde::Serialize;
use std::io::{self, Write};

#[derive(Serialize)]
struct CsvRecord<'a> {
    host: &'a str,
    port: u16,
    service: &'a str,
    protocol: &'a str,
    status: PortStatus,
    error_code: i32,
    error: String,
}

/// Writes every attempt as a CSV row; the header comes with the first row.
pub struct CsvReporter<W: Write> {
    writer: csv::Writer<W>,
    error: Option<csv::Error>,
}

impl<W: Write> CsvReporter<W> {
    pub fn new(out: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(out),
            error: None,
        }
    }

    pub fn finish(&mut self) -> io::Result<()> {
        if let Some(e) = self.error.take() {
            return Err(io::Error::new(io::ErrorKind::Other, e));
        }
        self.writer.flush()
    }

    pub fn into_inner(self) -> io::Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))
    }
}

impl<W: Write> Reporter for CsvReporter<W> {
    fn report(&mut self, report: &ConnectionReport) {
        if self.error.is_some() {
            return;
        }
        let record = CsvRecord {
            host: &report.host,
            port: report.port,
            service: &report.service,
            protocol: &report.protocol,
            status: report.status(),
            error_code: report.error_code,
            error: describe_error(report),
        };
        if let Err(e) = self.writer.serialize(record) {
            self.error = Some(e);
        }
    }
}
