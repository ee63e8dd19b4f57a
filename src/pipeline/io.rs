//! Interruption-safe reads and writes on pipes.

use std::io::{self, Read, Write};

#[cfg(unix)]
use std::os::fd::{AsFd, AsRawFd};

/// How long a single readiness poll waits.
#[cfg(unix)]
const POLL_INTERVAL_MS: libc::c_int = 100;

/// Number of empty polls after which a pipe is considered idle.
#[cfg(unix)]
const POLL_ATTEMPTS: usize = 6;

/// Reads until `buf` is full or the source reaches end of file.
///
/// Interrupted reads are retried; any other error is returned as is. Returns
/// the number of bytes read.
///
/// With `can_be_pipe` set, a source that is not standard input is first
/// asked how many bytes are queued. If nothing is queued it is polled for up
/// to 600ms, and if it stays idle `Ok(0)` is returned instead of blocking:
/// another process may hold the write end open without ever writing. The
/// read is then limited to the queued byte count.
#[cfg(unix)]
pub fn read_full<R: Read + AsFd>(src: &mut R, buf: &mut [u8], can_be_pipe: bool) -> io::Result<usize> {
    let fd = src.as_fd().as_raw_fd();
    let mut want = buf.len();

    if can_be_pipe && fd != libc::STDIN_FILENO {
        let mut queued = queued_bytes(fd);
        if queued.is_none_or(|n| n == 0) {
            if !wait_readable(fd) {
                log::trace!("fd {} idle, not reading", fd);
                return Ok(0);
            }
            queued = queued_bytes(fd);
        }
        if let Some(n) = queued.filter(|&n| n > 0 && n < want) {
            want = n;
        }
    }

    let buf = &mut buf[..want];
    let mut filled = 0;
    while filled < buf.len() {
        match src.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    log::trace!("read {} of {} bytes from fd {}", filled, want, fd);
    Ok(filled)
}

/// Returns the number of bytes waiting in the descriptor's queue.
#[cfg(unix)]
fn queued_bytes(fd: libc::c_int) -> Option<usize> {
    let mut count: libc::c_int = 0;
    // SAFETY: FIONREAD writes one c_int through the pointer.
    let rc = unsafe { libc::ioctl(fd, libc::FIONREAD, &mut count as *mut libc::c_int) };
    if rc == -1 {
        return None;
    }
    usize::try_from(count).ok()
}

/// Polls `fd` for readability, giving up after [`POLL_ATTEMPTS`] timeouts.
#[cfg(unix)]
fn wait_readable(fd: libc::c_int) -> bool {
    let mut attempts = 0;
    loop {
        let mut pfd = libc::pollfd {
            fd,
            events: libc::POLLIN,
            revents: 0,
        };
        // SAFETY: `pfd` is a single valid pollfd for the duration of the call.
        let rc = unsafe { libc::poll(&mut pfd, 1, POLL_INTERVAL_MS) };
        attempts += 1;
        match rc {
            -1 => {
                let err = io::Error::last_os_error();
                if matches!(
                    err.kind(),
                    io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock
                ) {
                    continue;
                }
                // Let the read itself report the problem.
                return true;
            }
            0 if attempts >= POLL_ATTEMPTS => return false,
            0 => continue,
            _ => return true,
        }
    }
}

/// Writes all of `buf`, retrying interrupted writes.
///
/// A write that accepts zero bytes is reported as
/// [`io::ErrorKind::WriteZero`]. Broken pipes and other errors are never
/// retried.
///
/// This performs no allocation, so it is safe to call in a forked child.
pub fn write_full<W: Write>(dst: &mut W, buf: &[u8]) -> io::Result<usize> {
    let mut written = 0;
    while written < buf.len() {
        match dst.write(&buf[written..]) {
            Ok(0) => return Err(io::ErrorKind::WriteZero.into()),
            Ok(n) => written += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(written)
}
