//! Readiness wait over the in-flight sockets, via `poll(2)`.

use std::io;

/// Events that mark a pending connect as finished.
const READY: libc::c_short = libc::POLLOUT | libc::POLLERR | libc::POLLHUP;

/// Poll entry watching `fd` for connect completion.
pub fn watch(fd: libc::c_int) -> libc::pollfd {
    libc::pollfd {
        fd,
        events: libc::POLLOUT,
        revents: 0,
    }
}

/// Block, without timeout, until at least one entry is ready.
///
/// Returns the number of ready entries. An interrupted wait surfaces as
/// `ErrorKind::Interrupted`.
pub fn wait(fds: &mut [libc::pollfd]) -> io::Result<usize> {
    let rc = unsafe { libc::poll(fds.as_mut_ptr(), fds.len() as libc::nfds_t, -1) };
    if rc < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(rc as usize)
    }
}

/// Whether the connect watched by `fd` has finished, successfully or not.
#[inline]
pub fn is_ready(fd: &libc::pollfd) -> bool {
    fd.revents & READY != 0
}
