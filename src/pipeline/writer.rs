//! Writer helper process.
//!
//! When the compressed input only exists in memory it has to be pushed into
//! the decompressor's stdin while the parent drains its stdout. Doing both
//! from one process deadlocks as soon as both pipes fill, so a forked helper
//! owns the writing side.
//!
//! Between `fork` and `_exit` the helper only closes descriptors, calls
//! `write(2)` and exits. It never allocates or touches locks, which keeps it
//! safe in a multithreaded parent.

use std::fs::File;
use std::io;
use std::mem::ManuallyDrop;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd, RawFd};

use super::io::write_full;

/// Descriptor the stdin write end is moved to in the helper.
const HELPER_FD: RawFd = 3;

/// A forked helper writing one buffer into a pipe.
#[derive(Debug)]
pub(crate) struct WriterProcess {
    pid: libc::pid_t,
    reaped: bool,
}

impl WriterProcess {
    /// Forks a helper that writes `data` to `pipe` and exits.
    ///
    /// The parent's copy of `pipe` is closed on return so that the reader
    /// sees end of file once the helper is done.
    pub(crate) fn spawn(pipe: OwnedFd, data: &[u8]) -> io::Result<Self> {
        let fd = pipe.as_raw_fd();
        let open_max = open_max();

        // SAFETY: the child branch below only performs async-signal-safe
        // operations before `_exit`.
        let pid = unsafe { libc::fork() };
        match pid {
            -1 => Err(io::Error::last_os_error()),
            0 => {
                // SAFETY: we are the single-threaded forked child.
                unsafe { run_child(fd, data, open_max) }
            }
            pid => {
                log::debug!("writer helper {} feeding {} bytes", pid, data.len());
                drop(pipe);
                Ok(Self { pid, reaped: false })
            }
        }
    }

    /// Waits for the helper to exit.
    ///
    /// Returns `Ok(false)` if it did not exit cleanly, which happens when
    /// the decompressor stopped reading early.
    pub(crate) fn wait(&mut self) -> io::Result<bool> {
        if self.reaped {
            return Ok(true);
        }
        let mut status = 0;
        loop {
            // SAFETY: `status` is a valid out pointer.
            let rc = unsafe { libc::waitpid(self.pid, &mut status, 0) };
            if rc != -1 {
                break;
            }
            let err = io::Error::last_os_error();
            if err.kind() != io::ErrorKind::Interrupted {
                self.reaped = true;
                return Err(err);
            }
        }
        self.reaped = true;
        let clean = libc::WIFEXITED(status) && libc::WEXITSTATUS(status) == 0;
        if !clean {
            log::debug!("writer helper {} ended with status {:#x}", self.pid, status);
        }
        Ok(clean)
    }
}

impl Drop for WriterProcess {
    fn drop(&mut self) {
        if !self.reaped {
            if let Err(e) = self.wait() {
                log::warn!("cannot reap writer helper {}: {}", self.pid, e);
            }
        }
    }
}

fn open_max() -> RawFd {
    // SAFETY: sysconf has no memory-safety preconditions.
    let max = unsafe { libc::sysconf(libc::_SC_OPEN_MAX) };
    if max <= 0 {
        1024
    } else {
        RawFd::try_from(max).unwrap_or(RawFd::MAX)
    }
}

/// Body of the forked helper. Never returns.
///
/// # Safety
///
/// Must only be called in the child immediately after `fork`.
unsafe fn run_child(fd: RawFd, data: &[u8], open_max: RawFd) -> ! {
    // Keep only the pipe: inherited read ends of other callers' pipes would
    // otherwise stay open for as long as this helper runs.
    unsafe {
        if fd != HELPER_FD && libc::dup2(fd, HELPER_FD) == -1 {
            libc::_exit(1);
        }
        close_from(HELPER_FD + 1, open_max);

        let mut pipe = ManuallyDrop::new(File::from_raw_fd(HELPER_FD));
        let code = match write_full(&mut *pipe, data) {
            Ok(_) => 0,
            Err(_) => 1,
        };
        libc::_exit(code)
    }
}

/// Closes every descriptor from `low` upwards.
unsafe fn close_from(low: RawFd, open_max: RawFd) {
    if unsafe { close_range(low) } {
        return;
    }
    for fd in low..open_max {
        unsafe {
            libc::close(fd);
        }
    }
}

#[cfg(target_os = "linux")]
unsafe fn close_range(low: RawFd) -> bool {
    let low = libc::c_uint::try_from(low).unwrap_or(libc::c_uint::MAX);
    unsafe { libc::syscall(libc::SYS_close_range, low, libc::c_uint::MAX, 0) == 0 }
}

#[cfg(not(target_os = "linux"))]
unsafe fn close_range(_low: RawFd) -> bool {
    false
}
