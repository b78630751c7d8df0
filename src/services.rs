//! Service names and the known-port table.
//!
//! The table is read from the system services database (`/etc/services`) once,
//! by whoever builds the scanner, and is read-only afterwards. When the
//! database cannot be read a built-in list of well-known TCP services is used
//! instead.

use crate::error::ServiceError;
use socket2::Protocol;
use std::borrow::Cow;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Default location of the services database.
pub const DEFAULT_SERVICES_PATH: &str = "/etc/services";

const PORT_SLOTS: usize = u16::MAX as usize + 1;

/// Well-known TCP services used when no database is available.
const BUILTIN_SERVICES: &[(u16, &str)] = &[
    (7, "echo"),
    (9, "discard"),
    (13, "daytime"),
    (20, "ftp-data"),
    (21, "ftp"),
    (22, "ssh"),
    (23, "telnet"),
    (25, "smtp"),
    (37, "time"),
    (43, "whois"),
    (53, "domain"),
    (79, "finger"),
    (80, "http"),
    (88, "kerberos"),
    (110, "pop3"),
    (111, "sunrpc"),
    (113, "auth"),
    (119, "nntp"),
    (123, "ntp"),
    (135, "epmap"),
    (139, "netbios-ssn"),
    (143, "imap2"),
    (179, "bgp"),
    (389, "ldap"),
    (443, "https"),
    (445, "microsoft-ds"),
    (465, "submissions"),
    (513, "login"),
    (514, "shell"),
    (515, "printer"),
    (543, "klogin"),
    (544, "kshell"),
    (554, "rtsp"),
    (587, "submission"),
    (631, "ipp"),
    (636, "ldaps"),
    (873, "rsync"),
    (993, "imaps"),
    (995, "pop3s"),
    (1080, "socks"),
    (1433, "ms-sql-s"),
    (1521, "ncube-lm"),
    (1723, "pptp"),
    (2049, "nfs"),
    (3306, "mysql"),
    (3389, "ms-wbt-server"),
    (5432, "postgresql"),
    (5672, "amqp"),
    (5900, "rfb"),
    (6379, "redis"),
    (8080, "http-alt"),
    (9418, "git"),
    (11211, "memcache"),
    (27017, "mongodb"),
];

/// Known service ports plus the TCP service name of each.
#[derive(Debug, Clone)]
pub struct ServiceTable {
    known: Vec<bool>,
    names: HashMap<u16, String>,
}

impl Default for ServiceTable {
    fn default() -> Self {
        Self {
            known: vec![false; PORT_SLOTS],
            names: HashMap::new(),
        }
    }
}

impl ServiceTable {
    /// Load a services database, falling back to the built-in list when it
    /// cannot be read.
    pub fn load(path: impl AsRef<Path>) -> Self {
        match Self::from_file(path) {
            Ok(table) => table,
            Err(e) => {
                warn!("{}; using built-in service list", e);
                Self::builtin()
            }
        }
    }

    /// Load a services database in `/etc/services` format.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ServiceError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ServiceError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let table = Self::parse(&content);
        debug!("loaded {} known ports from {}", table.len(), path.display());
        Ok(table)
    }

    /// The built-in well-known service list.
    pub fn builtin() -> Self {
        let mut table = Self::default();
        for &(port, name) in BUILTIN_SERVICES {
            table.insert(port, "tcp", name);
        }
        table
    }

    /// Parse services database text.
    ///
    /// Each entry is `name port/protocol [aliases...]`, with `#` starting a
    /// comment. Malformed lines are skipped. Every protocol marks its port as
    /// known; only TCP entries provide names, the first one winning.
    pub fn parse(content: &str) -> Self {
        let mut table = Self::default();
        for line in content.lines() {
            let line = line.split('#').next().unwrap_or_default();
            let mut fields = line.split_whitespace();
            let (Some(name), Some(port_proto)) = (fields.next(), fields.next()) else {
                continue;
            };
            let Some((port, proto)) = port_proto.split_once('/') else {
                continue;
            };
            if let Ok(port) = port.parse::<u16>() {
                table.insert(port, proto, name);
            }
        }
        table
    }

    fn insert(&mut self, port: u16, proto: &str, name: &str) {
        self.known[port as usize] = true;
        if proto.eq_ignore_ascii_case("tcp") {
            self.names.entry(port).or_insert_with(|| name.to_string());
        }
    }

    /// Whether `port` is registered for any protocol.
    #[inline]
    pub fn is_known_port(&self, port: u16) -> bool {
        self.known[port as usize]
    }

    /// TCP service name for `port`, if registered.
    pub fn name(&self, port: u16) -> Option<&str> {
        self.names.get(&port).map(String::as_str)
    }

    /// Service name for `port`, or the port number itself.
    pub fn describe(&self, port: u16) -> Cow<'_, str> {
        match self.name(port) {
            Some(name) => Cow::Borrowed(name),
            None => Cow::Owned(port.to_string()),
        }
    }

    /// Number of known ports.
    pub fn len(&self) -> usize {
        self.known.iter().filter(|&&k| k).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Name of an IP protocol number, or the number itself.
pub fn protocol_name(protocol: Protocol) -> Cow<'static, str> {
    match i32::from(protocol) {
        0 => Cow::Borrowed("ip"),
        libc::IPPROTO_ICMP => Cow::Borrowed("icmp"),
        libc::IPPROTO_TCP => Cow::Borrowed("tcp"),
        libc::IPPROTO_UDP => Cow::Borrowed("udp"),
        libc::IPPROTO_ICMPV6 => Cow::Borrowed("ipv6-icmp"),
        132 => Cow::Borrowed("sctp"),
        n => Cow::Owned(n.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = "\
# Network services, Internet style
tcpmux\t\t1/tcp\t\t\t\t# TCP port service multiplexer
ssh\t\t22/tcp\t\t\t\t# SSH Remote Login Protocol
http\t\t80/tcp\t\twww\t\t# WorldWideWeb HTTP
www-alt\t\t80/tcp
syslog\t\t514/udp
bogus line
broken\t\tabc/tcp
";

    #[test]
    fn test_parse_services() {
        let table = ServiceTable::parse(SAMPLE);
        assert!(table.is_known_port(1));
        assert!(table.is_known_port(22));
        assert!(table.is_known_port(80));
        assert!(table.is_known_port(514));
        assert!(!table.is_known_port(81));
        assert_eq!(table.len(), 4);
    }

    #[test]
    fn test_first_tcp_name_wins() {
        let table = ServiceTable::parse(SAMPLE);
        assert_eq!(table.name(80), Some("http"));
        assert_eq!(table.name(22), Some("ssh"));
        // UDP entries mark the port known but carry no TCP name.
        assert_eq!(table.name(514), None);
        assert_eq!(table.describe(514), "514");
    }

    #[test]
    fn test_builtin_table() {
        let table = ServiceTable::builtin();
        assert_eq!(table.name(22), Some("ssh"));
        assert_eq!(table.name(443), Some("https"));
        assert!(!table.is_known_port(12345));
        assert_eq!(table.describe(12345), "12345");
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let table = ServiceTable::from_file(file.path()).unwrap();
        assert_eq!(table.name(1), Some("tcpmux"));
    }

    #[test]
    fn test_from_missing_file() {
        let result = ServiceTable::from_file("/nonexistent/portsweep/services");
        assert!(matches!(result, Err(ServiceError::Read { .. })));

        let fallback = ServiceTable::load("/nonexistent/portsweep/services");
        assert_eq!(fallback.len(), ServiceTable::builtin().len());
    }

    #[test]
    fn test_protocol_names() {
        assert_eq!(protocol_name(Protocol::TCP), "tcp");
        assert_eq!(protocol_name(Protocol::UDP), "udp");
        assert_eq!(protocol_name(Protocol::from(253)), "253");
    }
}
