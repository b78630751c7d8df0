//! Bounded table of in-flight connection attempts.
//!
//! Each slot owns its socket together with the connection info, so the
//! two can never drift apart. The poll set is derived from the slots in
//! index order on every wait; index `i` of the poll set is slot `i`.
//! Removal swaps the last slot into the hole, so slot order is unspecified.

use super::poll;
use socket2::{SockAddr, Socket};
use std::os::unix::io::AsRawFd;

/// One outstanding non-blocking connect.
#[derive(Debug)]
pub struct InFlightAttempt {
    pub(crate) socket: Socket,
    /// Index of the targeted address in the scanner's address sequence.
    pub(crate) address: usize,
    /// Per-attempt copy of the destination with the port substituted.
    pub(crate) dest: SockAddr,
}

impl InFlightAttempt {
    pub fn new(socket: Socket, address: usize, dest: SockAddr) -> Self {
        Self {
            socket,
            address,
            dest,
        }
    }

    pub fn address(&self) -> usize {
        self.address
    }

    pub fn dest(&self) -> &SockAddr {
        &self.dest
    }

    pub fn fd(&self) -> libc::c_int {
        self.socket.as_raw_fd()
    }
}

/// Fixed-capacity collection of in-flight attempts.
#[derive(Debug)]
pub struct Pool {
    attempts: Vec<InFlightAttempt>,
    capacity: usize,
}

impl Pool {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            attempts: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.attempts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attempts.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.attempts.len() >= self.capacity
    }

    /// Add an attempt. Handing it back means the pool is full.
    pub fn push(&mut self, attempt: InFlightAttempt) -> Result<(), InFlightAttempt> {
        if self.is_full() {
            return Err(attempt);
        }
        self.attempts.push(attempt);
        Ok(())
    }

    /// Take slot `index` out, moving the last slot into its place.
    pub fn swap_remove(&mut self, index: usize) -> InFlightAttempt {
        self.attempts.swap_remove(index)
    }

    pub fn get(&self, index: usize) -> Option<&InFlightAttempt> {
        self.attempts.get(index)
    }

    /// Poll entries for every slot, in slot order.
    pub fn poll_set(&self) -> Vec<libc::pollfd> {
        self.attempts.iter().map(|a| poll::watch(a.fd())).collect()
    }

    /// Remove every attempt.
    pub fn drain(&mut self) -> impl Iterator<Item = InFlightAttempt> + '_ {
        self.attempts.drain(..)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use socket2::{Domain, Protocol, Type};
    use std::net::{IpAddr, Ipv4Addr, SocketAddr};

    fn attempt(port: u16) -> InFlightAttempt {
        let socket = Socket::new(Domain::IPV4, Type::STREAM, Some(Protocol::TCP)).unwrap();
        let dest = SockAddr::from(SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), port));
        InFlightAttempt::new(socket, port as usize, dest)
    }

    fn assert_in_lockstep(pool: &Pool) {
        let set = pool.poll_set();
        assert_eq!(set.len(), pool.len());
        for (i, entry) in set.iter().enumerate() {
            let slot = pool.get(i).unwrap();
            assert_eq!(entry.fd, slot.fd());
            assert_eq!(slot.dest().as_socket().unwrap().port() as usize, slot.address());
        }
    }

    #[test]
    fn test_capacity_enforced() {
        let mut pool = Pool::with_capacity(2);
        assert!(pool.push(attempt(1)).is_ok());
        assert!(pool.push(attempt(2)).is_ok());
        assert!(pool.is_full());
        let rejected = pool.push(attempt(3)).unwrap_err();
        assert_eq!(rejected.address(), 3);
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn test_swap_remove_keeps_pairs_together() {
        let mut pool = Pool::with_capacity(5);
        for port in 1..=5 {
            pool.push(attempt(port)).unwrap();
        }
        assert_in_lockstep(&pool);

        let removed = pool.swap_remove(1);
        assert_eq!(removed.address(), 2);
        assert_eq!(pool.get(1).unwrap().address(), 5);
        assert_in_lockstep(&pool);

        let removed = pool.swap_remove(0);
        assert_eq!(removed.address(), 1);
        assert_in_lockstep(&pool);

        let removed = pool.swap_remove(pool.len() - 1);
        assert_eq!(removed.dest().as_socket().unwrap().port() as usize, removed.address());
        assert_in_lockstep(&pool);
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn test_drain_empties_pool() {
        let mut pool = Pool::with_capacity(3);
        for port in 1..=3 {
            pool.push(attempt(port)).unwrap();
        }
        assert_eq!(pool.drain().count(), 3);
        assert!(pool.is_empty());
    }
}
