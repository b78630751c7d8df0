//! Scan engine.
//!
//! Multiplexes the whole address × port space onto a bounded pool of
//! non-blocking sockets driven by a single `poll(2)` loop. Everything runs
//! on the caller's thread; the only place it blocks is the readiness wait.
//!
//! The owner drives the engine by calling [`PortScanner::advance`] until it
//! returns `false`, then [`PortScanner::teardown`]:
//!
//! ```rust,ignore
//! let mut scanner = PortScanner::new(addresses, services, options, reporter)?;
//! while scanner.advance()? {}
//! let (reporter, stats) = scanner.teardown();
//! ```

pub mod connect;
pub mod cursor;
pub mod pool;
pub mod poll;
pub mod traits;

use crate::error::{ScanError, ScanResult};
use crate::services::{protocol_name, ServiceTable};
use crate::types::{PortRange, ResolvedAddress};
use serde::Serialize;
use socket2::SockAddr;
use std::io;
use std::net::SocketAddr;
use std::time::Instant;
use tracing::{debug, info, trace, warn};

pub use connect::Launch;
pub use cursor::ScanCursor;
pub use pool::{InFlightAttempt, Pool};
pub use traits::{ConnectionReport, PortStatus, Reporter};

/// Default cap on concurrently outstanding connects.
pub const DEFAULT_MAX_SOCKETS: usize = 30;
/// Largest accepted cap on concurrently outstanding connects.
pub const MAX_SOCKETS: usize = 10000;

/// Options for a scan.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Ports tried for every address.
    pub range: PortRange,
    /// Maximum number of in-flight connects.
    pub max_sockets: usize,
    /// Only try ports listed in the service table.
    pub services_only: bool,
    /// Surface per-attempt diagnostics.
    pub verbose: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self::new(PortRange::full())
    }
}

impl ScanOptions {
    pub fn new(range: PortRange) -> Self {
        Self {
            range,
            max_sockets: DEFAULT_MAX_SOCKETS,
            services_only: false,
            verbose: false,
        }
    }

    pub fn with_max_sockets(mut self, max_sockets: usize) -> Self {
        self.max_sockets = max_sockets;
        self
    }

    pub fn with_services_only(mut self) -> Self {
        self.services_only = true;
        self
    }

    pub fn with_verbose(mut self) -> Self {
        self.verbose = true;
        self
    }

    pub fn validate(&self) -> ScanResult<()> {
        if !(1..=MAX_SOCKETS).contains(&self.max_sockets) {
            return Err(ScanError::InvalidConfig(format!(
                "max sockets must be between 1 and {}, got {}",
                MAX_SOCKETS, self.max_sockets
            )));
        }
        Ok(())
    }
}

/// Running counters for a scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanStats {
    /// Resolved addresses in the scan.
    pub addresses: usize,
    /// Connection attempts issued.
    pub launched: usize,
    /// Attempts handed to the reporter.
    pub reported: usize,
    pub open: usize,
    pub closed: usize,
    pub filtered: usize,
    /// Attempts still pending at teardown, released without a report.
    pub abandoned: usize,
    /// Addresses skipped for an unsupported family or protocol.
    pub skipped_addresses: usize,
    /// Highest number of attempts in flight at once.
    pub peak_in_flight: usize,
    pub duration_ms: u64,
}

impl ScanStats {
    fn record(&mut self, report: &ConnectionReport) {
        self.reported += 1;
        match report.status() {
            PortStatus::Open => self.open += 1,
            PortStatus::Closed => self.closed += 1,
            PortStatus::Filtered => self.filtered += 1,
        }
    }
}

/// The scan engine.
pub struct PortScanner<R: Reporter> {
    options: ScanOptions,
    addresses: Vec<ResolvedAddress>,
    services: ServiceTable,
    cursor: ScanCursor,
    pool: Pool,
    reporter: R,
    stats: ScanStats,
    started: Instant,
}

impl<R: Reporter> PortScanner<R> {
    /// Create a scanner over `addresses`.
    ///
    /// `services` names the ports in reports and, with `services_only`, decides
    /// which ports are tried at all.
    pub fn new(
        addresses: Vec<ResolvedAddress>,
        services: ServiceTable,
        options: ScanOptions,
        reporter: R,
    ) -> ScanResult<Self> {
        options.validate()?;

        let filter = options.services_only.then_some(&services);
        let cursor = ScanCursor::new(options.range, addresses.len(), filter);
        let pool = Pool::with_capacity(options.max_sockets);
        let stats = ScanStats {
            addresses: addresses.len(),
            ..ScanStats::default()
        };

        info!(
            "scanning {} address(es), ports {}, {} socket(s){}",
            addresses.len(),
            options.range,
            options.max_sockets,
            if options.services_only { ", known services only" } else { "" }
        );

        Ok(Self {
            options,
            addresses,
            services,
            cursor,
            pool,
            reporter,
            stats,
            started: Instant::now(),
        })
    }

    /// Launch new attempts until the pool is full or the cursor runs out.
    pub fn top_up_pool(&mut self) -> ScanResult<()> {
        while !self.pool.is_full() && !self.cursor.is_terminal() {
            self.launch_next()?;
        }
        Ok(())
    }

    /// Run one round: top up, wait, finalize everything that is ready.
    ///
    /// Returns `false` once every attempt has been launched and finalized.
    pub fn advance(&mut self) -> ScanResult<bool> {
        self.top_up_pool()?;
        if self.pool.is_empty() {
            return Ok(!self.cursor.is_terminal());
        }

        let mut fds = self.pool.poll_set();
        match poll::wait(&mut fds) {
            Ok(ready) => trace!("{} of {} socket(s) ready", ready, fds.len()),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {
                debug!("readiness wait interrupted");
                return Ok(true);
            }
            Err(e) => return Err(ScanError::Poll(e)),
        }

        // Highest index first: a swap-removal only ever moves an entry that
        // has already been looked at.
        for index in (0..fds.len()).rev() {
            if !poll::is_ready(&fds[index]) {
                continue;
            }
            let attempt = self.pool.swap_remove(index);
            let code = connect::pending_error(&attempt.socket)?;
            self.finalize(attempt, code)?;
        }
        Ok(true)
    }

    /// Drive the scan to completion.
    pub fn run(&mut self) -> ScanResult<()> {
        while self.advance()? {}
        Ok(())
    }

    /// Release everything still in flight without reporting it.
    pub fn teardown(mut self) -> (R, ScanStats) {
        for attempt in self.pool.drain() {
            debug!("abandoning pending attempt to {:?}", attempt.dest.as_socket());
            self.stats.abandoned += 1;
        }
        self.addresses.clear();
        self.stats.duration_ms = self.started.elapsed().as_millis() as u64;
        info!(
            "scan finished: {} reported ({} open), {} abandoned in {}ms",
            self.stats.reported, self.stats.open, self.stats.abandoned, self.stats.duration_ms
        );
        (self.reporter, self.stats)
    }

    /// Attempts currently in flight.
    pub fn in_flight(&self) -> usize {
        self.pool.len()
    }

    /// True once nothing is in flight and nothing is left to launch.
    pub fn is_done(&self) -> bool {
        self.pool.is_empty() && self.cursor.is_terminal()
    }

    pub fn stats(&self) -> &ScanStats {
        &self.stats
    }

    fn launch_next(&mut self) -> ScanResult<()> {
        let Some((index, port)) = self.cursor.current() else {
            return Ok(());
        };
        let target = &self.addresses[index];

        let Some(dest) = target.with_port(port) else {
            warn!("unsupported address family {} for {}", target.family(), target);
            self.stats.skipped_addresses += 1;
            let filter = self.options.services_only.then_some(&self.services);
            self.cursor.next_address(filter);
            return Ok(());
        };

        let attempt = match connect::launch(target, &dest)? {
            Launch::Unsupported(e) => {
                if self.options.verbose {
                    info!(
                        "no support for address family={}, type={}, proto={} ({}): {}",
                        i32::from(target.domain()),
                        i32::from(target.socket_type()),
                        i32::from(target.protocol()),
                        target,
                        e
                    );
                } else {
                    debug!("skipping {}: {}", target, e);
                }
                self.stats.skipped_addresses += 1;
                let filter = self.options.services_only.then_some(&self.services);
                self.cursor.next_address(filter);
                return Ok(());
            }
            Launch::Connected(socket) => {
                self.stats.launched += 1;
                self.finalize(InFlightAttempt::new(socket, index, dest), 0)?;
                None
            }
            Launch::Failed(socket, code) => {
                self.stats.launched += 1;
                self.finalize(InFlightAttempt::new(socket, index, dest), code)?;
                None
            }
            Launch::Pending(socket) => {
                self.stats.launched += 1;
                Some(InFlightAttempt::new(socket, index, dest))
            }
        };

        if let Some(attempt) = attempt {
            trace!("connect to port {} in progress", port);
            self.pool
                .push(attempt)
                .map_err(|_| ScanError::PoolFull(self.options.max_sockets))?;
            self.stats.peak_in_flight = self.stats.peak_in_flight.max(self.pool.len());
        }

        let filter = self.options.services_only.then_some(&self.services);
        self.cursor.advance_port(filter);
        Ok(())
    }

    fn finalize(&mut self, attempt: InFlightAttempt, error_code: i32) -> ScanResult<()> {
        let target = &self.addresses[attempt.address];
        let report = describe(target, &attempt.dest, &self.services, error_code)?;
        trace!(
            "{}:{} finalized with code {}",
            report.host,
            report.port,
            report.error_code
        );
        self.reporter.report(&report);
        self.stats.record(&report);
        drop(attempt);
        Ok(())
    }
}

/// Re-describe a destination for the reporter.
fn describe(
    target: &ResolvedAddress,
    dest: &SockAddr,
    services: &ServiceTable,
    error_code: i32,
) -> ScanResult<ConnectionReport> {
    let sa = dest
        .as_socket()
        .ok_or(ScanError::Describe(dest.family() as i32))?;
    let host = match sa {
        SocketAddr::V6(v6) if v6.scope_id() != 0 => format!("{}%{}", v6.ip(), v6.scope_id()),
        _ => sa.ip().to_string(),
    };
    let port = sa.port();

    Ok(ConnectionReport {
        host,
        port,
        service: services.describe(port).into_owned(),
        protocol: protocol_name(target.protocol()).into_owned(),
        error_code,
    })
}
