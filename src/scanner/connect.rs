//! Non-blocking TCP connect.
//!
//! Opens a socket for a resolved address, marks it non-blocking and issues
//! `connect(2)`. The attempt either resolves on the spot or is left pending
//! for the poll loop to pick up.

use crate::error::{ScanError, ScanResult};
use crate::types::ResolvedAddress;
use socket2::{SockAddr, Socket};
use std::io;

/// What happened when an attempt was launched.
#[derive(Debug)]
pub enum Launch {
    /// Connected immediately.
    Connected(Socket),
    /// Connection in progress; wait for write readiness.
    Pending(Socket),
    /// Failed immediately with the given OS error code.
    Failed(Socket, i32),
    /// The kernel cannot create a socket of this family/type/protocol.
    Unsupported(io::Error),
}

/// Launch a connection attempt towards `dest`.
///
/// Only socket creation or flag failures that do not mean "unsupported" are
/// returned as errors; connection failures are outcomes.
pub fn launch(target: &ResolvedAddress, dest: &SockAddr) -> ScanResult<Launch> {
    let socket = match Socket::new(target.domain(), target.socket_type(), Some(target.protocol())) {
        Ok(socket) => socket,
        Err(e) if is_unsupported(&e) => return Ok(Launch::Unsupported(e)),
        Err(source) => {
            return Err(ScanError::SocketCreate {
                family: target.domain().into(),
                socket_type: target.socket_type().into(),
                protocol: target.protocol().into(),
                source,
            })
        }
    };

    socket.set_nonblocking(true).map_err(ScanError::NonBlocking)?;

    match socket.connect(dest) {
        Ok(()) => Ok(Launch::Connected(socket)),
        Err(e) if is_in_progress(&e) => Ok(Launch::Pending(socket)),
        Err(e) => {
            let code = e.raw_os_error().unwrap_or(libc::EIO);
            Ok(Launch::Failed(socket, code))
        }
    }
}

/// Read and clear the socket's pending error (`SO_ERROR`); zero means connected.
pub fn pending_error(socket: &Socket) -> ScanResult<i32> {
    let pending = socket.take_error().map_err(ScanError::SocketError)?;
    Ok(pending.map_or(0, |e| e.raw_os_error().unwrap_or(libc::EIO)))
}

fn is_unsupported(e: &io::Error) -> bool {
    matches!(
        e.raw_os_error(),
        Some(libc::EAFNOSUPPORT) | Some(libc::EPROTONOSUPPORT) | Some(libc::ESOCKTNOSUPPORT)
    )
}

fn is_in_progress(e: &io::Error) -> bool {
    e.kind() == io::ErrorKind::WouldBlock
        || matches!(e.raw_os_error(), Some(libc::EINPROGRESS) | Some(libc::EAGAIN))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::poll;
    use socket2::{Domain, Protocol, Type};
    use std::net::{IpAddr, Ipv4Addr, SocketAddr, TcpListener};
    use std::os::unix::io::AsRawFd;

    #[test]
    fn test_unsupported_protocol() {
        let any = SockAddr::from(SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0));
        let target =
            ResolvedAddress::from_parts("udp-stream", Domain::IPV4, Type::STREAM, Protocol::UDP, any);
        let dest = target.with_port(9).unwrap();
        assert!(matches!(launch(&target, &dest), Ok(Launch::Unsupported(_))));
    }

    #[test]
    fn test_connect_to_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let target = ResolvedAddress::tcp("localhost", IpAddr::V4(Ipv4Addr::LOCALHOST));
        let dest = target.with_port(port).unwrap();

        match launch(&target, &dest).unwrap() {
            Launch::Connected(_) => {}
            Launch::Pending(socket) => {
                let mut fds = [poll::watch(socket.as_raw_fd())];
                poll::wait(&mut fds).unwrap();
                assert_eq!(pending_error(&socket).unwrap(), 0);
            }
            other => panic!("unexpected launch outcome: {:?}", other),
        }
    }

    #[test]
    fn test_in_progress_detection() {
        assert!(is_in_progress(&io::Error::from_raw_os_error(libc::EINPROGRESS)));
        assert!(is_in_progress(&io::Error::from_raw_os_error(libc::EAGAIN)));
        assert!(!is_in_progress(&io::Error::from_raw_os_error(libc::ECONNREFUSED)));
    }
}
