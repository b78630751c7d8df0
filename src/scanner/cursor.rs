//! Position of the scan in the address × port space.

use crate::services::ServiceTable;
use crate::types::PortRange;

/// Walks every eligible port of every resolved address, address-major.
///
/// A port is eligible when it lies in the range and, if a filter is given,
/// the filter knows it. The cursor always rests on an eligible port of an
/// existing address, or is terminal.
#[derive(Debug, Clone)]
pub struct ScanCursor {
    range: PortRange,
    addresses: usize,
    address: usize,
    port: u16,
}

impl ScanCursor {
    /// Position on the first eligible port of the first address.
    pub fn new(range: PortRange, addresses: usize, filter: Option<&ServiceTable>) -> Self {
        let mut cursor = Self {
            range,
            addresses,
            address: 0,
            port: range.first().as_u16(),
        };
        match cursor.first_eligible(range.first().as_u16() as u32, filter) {
            Some(port) => cursor.port = port,
            None => cursor.address = addresses,
        }
        cursor
    }

    /// Current `(address index, port)`, or `None` once terminal.
    pub fn current(&self) -> Option<(usize, u16)> {
        (!self.is_terminal()).then_some((self.address, self.port))
    }

    pub fn is_terminal(&self) -> bool {
        self.address >= self.addresses
    }

    /// Move to the next eligible port, rolling over to the next address.
    pub fn advance_port(&mut self, filter: Option<&ServiceTable>) {
        if self.is_terminal() {
            return;
        }
        let from = self.port as u32 + 1;
        match self.first_eligible(from, filter) {
            Some(port) => self.port = port,
            None => self.next_address(filter),
        }
    }

    /// Abandon the current address and start over on the next one.
    pub fn next_address(&mut self, filter: Option<&ServiceTable>) {
        if self.is_terminal() {
            return;
        }
        self.address += 1;
        if self.is_terminal() {
            return;
        }
        match self.first_eligible(self.range.first().as_u16() as u32, filter) {
            Some(port) => self.port = port,
            None => self.address = self.addresses,
        }
    }

    fn first_eligible(&self, from: u32, filter: Option<&ServiceTable>) -> Option<u16> {
        let last = self.range.last().as_u16() as u32;
        (from..=last)
            .map(|p| p as u16)
            .find(|&p| filter.map_or(true, |table| table.is_known_port(p)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Port;

    fn range(first: u16, last: u16) -> PortRange {
        PortRange::new(Port::new(first).unwrap(), Port::new(last).unwrap()).unwrap()
    }

    fn walk(mut cursor: ScanCursor, filter: Option<&ServiceTable>) -> Vec<(usize, u16)> {
        let mut visited = Vec::new();
        while let Some(pos) = cursor.current() {
            visited.push(pos);
            cursor.advance_port(filter);
        }
        visited
    }

    #[test]
    fn test_walks_cross_product() {
        let cursor = ScanCursor::new(range(80, 82), 2, None);
        assert_eq!(
            walk(cursor, None),
            vec![(0, 80), (0, 81), (0, 82), (1, 80), (1, 81), (1, 82)]
        );
    }

    #[test]
    fn test_no_addresses_is_terminal() {
        let cursor = ScanCursor::new(range(1, 10), 0, None);
        assert!(cursor.is_terminal());
        assert_eq!(cursor.current(), None);
    }

    #[test]
    fn test_last_port_does_not_overflow() {
        let cursor = ScanCursor::new(range(65534, 65535), 1, None);
        assert_eq!(walk(cursor, None), vec![(0, 65534), (0, 65535)]);
    }

    #[test]
    fn test_services_filter() {
        let table = ServiceTable::parse("ssh 22/tcp\nsmtp 25/tcp\nhttp 80/tcp\n");
        let cursor = ScanCursor::new(range(20, 30), 2, Some(&table));
        assert_eq!(
            walk(cursor, Some(&table)),
            vec![(0, 22), (0, 25), (1, 22), (1, 25)]
        );
    }

    #[test]
    fn test_services_filter_without_matches() {
        let table = ServiceTable::parse("ssh 22/tcp\n");
        let cursor = ScanCursor::new(range(1000, 2000), 3, Some(&table));
        assert!(cursor.is_terminal());
    }

    #[test]
    fn test_next_address_abandons_ports() {
        let mut cursor = ScanCursor::new(range(1, 100), 2, None);
        cursor.advance_port(None);
        assert_eq!(cursor.current(), Some((0, 2)));
        cursor.next_address(None);
        assert_eq!(cursor.current(), Some((1, 1)));
        cursor.next_address(None);
        assert!(cursor.is_terminal());
        cursor.advance_port(None);
        assert!(cursor.is_terminal());
    }
}
