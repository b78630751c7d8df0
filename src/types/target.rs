//! Target patterns, wildcard expansion and address resolution.
//!
//! A target is a hostname or address that may contain the wildcard marker
//! `*`. Each marker is replaced by every value in `1..=253`, so
//! `10.0.0.*` expands to 253 hosts. Expansion happens up front and produces a
//! flat list of names; only then is each name resolved. The resolved
//! addresses are concatenated, in expansion order, into the sequence the scan
//! engine walks.

use socket2::{Domain, Protocol, SockAddr, Type};
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use tracing::{debug, warn};
use trust_dns_resolver::config::{LookupIpStrategy, ResolverConfig, ResolverOpts};
use trust_dns_resolver::{system_conf, Resolver};

/// Error type for target parsing and resolution.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TargetError {
    #[error("invalid target format: {0}")]
    InvalidFormat(String),
    #[error("cannot resolve address '{0}': {1}")]
    DnsResolutionFailed(String, String),
    #[error("no addresses found for '{0}'")]
    NoAddressesFound(String),
    #[error("wildcard pattern expands to too many hosts: {0} (max: {1})")]
    TooManyHosts(u64, u64),
    #[error("failed to initialize resolver: {0}")]
    ResolverInit(String),
}

/// One concrete destination produced by resolution.
///
/// Carries everything needed to open a socket towards it. The port inside
/// `addr` is meaningless; the engine substitutes its own for every attempt.
#[derive(Debug, Clone)]
pub struct ResolvedAddress {
    hostname: String,
    domain: Domain,
    socket_type: Type,
    protocol: Protocol,
    addr: SockAddr,
}

impl ResolvedAddress {
    /// A TCP stream destination for an IP address.
    pub fn tcp(hostname: impl Into<String>, ip: IpAddr) -> Self {
        let addr = SocketAddr::new(ip, 0);
        Self {
            hostname: hostname.into(),
            domain: Domain::for_address(addr),
            socket_type: Type::STREAM,
            protocol: Protocol::TCP,
            addr: SockAddr::from(addr),
        }
    }

    /// A destination with an explicit family, socket type and protocol.
    pub fn from_parts(
        hostname: impl Into<String>,
        domain: Domain,
        socket_type: Type,
        protocol: Protocol,
        addr: SockAddr,
    ) -> Self {
        Self {
            hostname: hostname.into(),
            domain,
            socket_type,
            protocol,
            addr,
        }
    }

    /// The hostname this address was resolved from.
    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn domain(&self) -> Domain {
        self.domain
    }

    pub fn socket_type(&self) -> Type {
        self.socket_type
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    /// Raw address family of the stored destination.
    pub fn family(&self) -> i32 {
        self.addr.family() as i32
    }

    /// Copy of the destination with `port` substituted.
    ///
    /// Returns `None` for anything other than IPv4 or IPv6, which have no
    /// notion of a port.
    pub fn with_port(&self, port: u16) -> Option<SockAddr> {
        self.addr.as_socket().map(|mut sa| {
            sa.set_port(port);
            SockAddr::from(sa)
        })
    }
}

impl fmt::Display for ResolvedAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.addr.as_socket() {
            Some(sa) if self.hostname != sa.ip().to_string() => {
                write!(f, "{} ({})", self.hostname, sa.ip())
            }
            Some(sa) => write!(f, "{}", sa.ip()),
            None => write!(f, "{} (family {})", self.hostname, self.family()),
        }
    }
}

/// Resolves one concrete hostname into IP addresses.
pub trait Resolve {
    fn lookup(&self, host: &str) -> Result<Vec<IpAddr>, TargetError>;
}

impl<F> Resolve for F
where
    F: Fn(&str) -> Result<Vec<IpAddr>, TargetError>,
{
    fn lookup(&self, host: &str) -> Result<Vec<IpAddr>, TargetError> {
        self(host)
    }
}

/// System DNS resolver.
///
/// IP literals are returned as-is without touching the network.
pub struct DnsResolver {
    resolver: Resolver,
}

impl DnsResolver {
    /// Build a resolver from the system configuration, falling back to the
    /// library defaults when it cannot be read.
    pub fn new() -> Result<Self, TargetError> {
        let (config, mut opts) = system_conf::read_system_conf().unwrap_or_else(|e| {
            debug!("using default resolver configuration: {}", e);
            (ResolverConfig::default(), ResolverOpts::default())
        });
        opts.ip_strategy = LookupIpStrategy::Ipv4AndIpv6;

        let resolver =
            Resolver::new(config, opts).map_err(|e| TargetError::ResolverInit(e.to_string()))?;
        Ok(Self { resolver })
    }
}

impl Resolve for DnsResolver {
    fn lookup(&self, host: &str) -> Result<Vec<IpAddr>, TargetError> {
        if let Ok(ip) = host.parse::<IpAddr>() {
            return Ok(vec![ip]);
        }

        let response = self
            .resolver
            .lookup_ip(host)
            .map_err(|e| TargetError::DnsResolutionFailed(host.to_string(), e.to_string()))?;

        let ips: Vec<IpAddr> = response.iter().collect();
        if ips.is_empty() {
            return Err(TargetError::NoAddressesFound(host.to_string()));
        }
        Ok(ips)
    }
}

/// A target pattern, possibly containing wildcards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSpec {
    pattern: String,
}

impl TargetSpec {
    /// Wildcard marker.
    pub const WILDCARD: char = '*';
    /// Values substituted for each wildcard.
    pub const WILDCARD_VALUES: std::ops::RangeInclusive<u32> = 1..=253;
    /// Maximum number of hostnames a pattern may expand to.
    pub const MAX_EXPANDED_HOSTS: u64 = 65536;

    /// Parse a target pattern.
    pub fn parse(s: &str) -> Result<Self, TargetError> {
        let s = s.trim();
        if s.is_empty() || s.chars().any(char::is_whitespace) {
            return Err(TargetError::InvalidFormat(s.to_string()));
        }

        let spec = Self {
            pattern: s.to_string(),
        };
        let count = spec.expanded_count();
        if count > Self::MAX_EXPANDED_HOSTS {
            return Err(TargetError::TooManyHosts(count, Self::MAX_EXPANDED_HOSTS));
        }
        Ok(spec)
    }

    /// Number of wildcard markers in the pattern.
    pub fn wildcards(&self) -> usize {
        self.pattern.matches(Self::WILDCARD).count()
    }

    /// Number of hostnames the pattern expands to.
    pub fn expanded_count(&self) -> u64 {
        let per_wildcard = Self::WILDCARD_VALUES.count() as u64;
        (0..self.wildcards()).fold(1u64, |acc, _| acc.saturating_mul(per_wildcard))
    }

    /// Expand every wildcard, left to right, into a flat list of hostnames.
    pub fn expand(&self) -> Vec<String> {
        let mut names = vec![self.pattern.clone()];
        for _ in 0..self.wildcards() {
            names = names
                .iter()
                .flat_map(|name| {
                    let idx = name.find(Self::WILDCARD).unwrap_or(name.len());
                    let (head, tail) = (&name[..idx], &name[idx + 1..]);
                    Self::WILDCARD_VALUES.map(move |v| format!("{}{}{}", head, v, tail))
                })
                .collect();
        }
        names
    }

    /// Expand and resolve the pattern into the ordered address sequence.
    ///
    /// Hostnames that fail to resolve are reported and skipped; the result may
    /// be empty.
    pub fn resolve<R: Resolve + ?Sized>(&self, resolver: &R) -> Vec<ResolvedAddress> {
        let mut addresses = Vec::new();
        for host in self.expand() {
            match resolver.lookup(&host) {
                Ok(ips) => {
                    debug!("{} resolved to {} address(es)", host, ips.len());
                    addresses.extend(ips.into_iter().map(|ip| ResolvedAddress::tcp(&host, ip)));
                }
                Err(e) => warn!("{}", e),
            }
        }
        addresses
    }
}

impl FromStr for TargetSpec {
    type Err = TargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for TargetSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.pattern)
    }
}
