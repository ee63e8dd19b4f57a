//! Scoped SIGPIPE suppression.
//!
//! Closing a decompressor's stdout early makes its next write fail with a
//! broken pipe. The calling process must survive the same condition on its
//! side, for example when the writer helper or the parent touches a pipe
//! whose reader has died, so SIGPIPE is ignored while any guard is alive.
//!
//! The disposition is process-wide state. Guards are reference counted: the
//! first guard saves the current disposition and installs `SIG_IGN`, the
//! last guard puts the saved one back.

use std::mem;
use std::sync::{Mutex, MutexGuard};

struct State {
    holders: usize,
    saved: Option<libc::sigaction>,
}

static STATE: Mutex<State> = Mutex::new(State {
    holders: 0,
    saved: None,
});

fn lock_state() -> MutexGuard<'static, State> {
    STATE.lock().unwrap_or_else(|poisoned| {
        log::warn!("SIGPIPE state mutex was poisoned, recovering");
        poisoned.into_inner()
    })
}

/// Keeps SIGPIPE ignored for as long as it is alive.
///
/// # Example
///
/// ```rust
/// use zmagic::pipeline::SigpipeGuard;
///
/// {
///     let _guard = SigpipeGuard::acquire();
///     // Broken pipes now surface as `EPIPE` errors.
/// }
/// // The previous disposition is back.
/// ```
#[derive(Debug)]
#[must_use = "SIGPIPE is restored as soon as the guard is dropped"]
pub struct SigpipeGuard {
    _private: (),
}

impl SigpipeGuard {
    /// Ignores SIGPIPE until the returned guard, and every other live
    /// guard, is dropped.
    pub fn acquire() -> Self {
        let mut state = lock_state();
        if state.holders == 0 {
            state.saved = ignore_sigpipe();
        }
        state.holders += 1;
        Self { _private: () }
    }

    /// Returns the number of live guards.
    pub fn holders() -> usize {
        lock_state().holders
    }
}

impl Drop for SigpipeGuard {
    fn drop(&mut self) {
        let mut state = lock_state();
        state.holders = state.holders.saturating_sub(1);
        if state.holders > 0 {
            return;
        }
        if let Some(saved) = state.saved.take() {
            if saved.sa_sigaction != libc::SIG_IGN {
                restore_sigpipe(&saved);
            }
        }
    }
}

/// Installs `SIG_IGN` and returns the previous action.
fn ignore_sigpipe() -> Option<libc::sigaction> {
    // SAFETY: sigaction is plain old data; all-zero is a valid empty action.
    let mut ignore: libc::sigaction = unsafe { mem::zeroed() };
    ignore.sa_sigaction = libc::SIG_IGN;
    let mut previous: libc::sigaction = unsafe { mem::zeroed() };

    // SAFETY: both pointers refer to live sigaction values.
    let rc = unsafe { libc::sigaction(libc::SIGPIPE, &ignore, &mut previous) };
    if rc == -1 {
        log::warn!(
            "cannot ignore SIGPIPE: {}",
            std::io::Error::last_os_error()
        );
        return None;
    }
    Some(previous)
}

fn restore_sigpipe(saved: &libc::sigaction) {
    // SAFETY: `saved` was filled in by a previous sigaction call.
    let rc = unsafe { libc::sigaction(libc::SIGPIPE, saved, std::ptr::null_mut()) };
    if rc == -1 {
        log::warn!(
            "cannot restore SIGPIPE disposition: {}",
            std::io::Error::last_os_error()
        );
    }
}

/// Returns the current SIGPIPE handler address.
#[cfg(test)]
pub(crate) fn current_disposition() -> libc::sighandler_t {
    // SAFETY: querying with a null new action only writes `current`.
    let mut current: libc::sigaction = unsafe { mem::zeroed() };
    unsafe { libc::sigaction(libc::SIGPIPE, std::ptr::null(), &mut current) };
    current.sa_sigaction
}
