//! External decompressor pipeline.
//!
//! Methods without a compiled-in decoder are decompressed by running the
//! method's fixed command line with the compressed bytes on stdin. One decode
//! uses up to three processes:
//!
//! ```text
//!   caller ──reads── stdout/stderr ──┐
//!                                    decompressor (argv)
//!   writer helper ──stdin pipe───────┘
//! ```
//!
//! The writer helper only exists when the input is an in-memory buffer; a
//! seekable source file is handed to the decompressor as its stdin instead.
//! The caller only ever reads, bounded by the byte ceiling, and closes stdout
//! as soon as the ceiling is reached.

pub mod io;

#[cfg(unix)]
mod child;
#[cfg(unix)]
mod signal;
#[cfg(unix)]
mod writer;

#[cfg(unix)]
pub use signal::SigpipeGuard;

pub use io::write_full;
#[cfg(unix)]
pub use io::read_full;

use std::fs::File;

use crate::options::DecompressOptions;
use crate::{Error, Result};

/// Decompresses `data` by running `argv`, filling at most `out.len()` bytes.
///
/// If `source` is a seekable file holding the same bytes, the decompressor
/// reads it directly from offset 0 and no writer helper is needed.
///
/// A non-zero exit status of the decompressor is logged but does not turn a
/// successful read into an error.
///
/// # Errors
///
/// Returns [`Error::Spawn`] if the program cannot be launched,
/// [`Error::ChildDiagnostic`] if it reports a problem on stderr, and the
/// other subprocess variants for pipe and wait failures. All processes and
/// descriptors are released before returning, whatever the outcome.
#[cfg(unix)]
pub fn run(
    argv: &[&str],
    data: &[u8],
    source: Option<&File>,
    out: &mut [u8],
    options: &DecompressOptions,
) -> Result<usize> {
    let input = child::ChildInput::new(data, source);
    let mut handle = child::ChildProcessHandle::spawn(argv, input, options)?;
    let collected = handle.collect(out, options.stderr_limit);
    let finished = handle.finish();
    let n = collected?;
    finished?;
    Ok(n)
}

/// Subprocess decoding is not available on this platform.
#[cfg(not(unix))]
pub fn run(
    _argv: &[&str],
    _data: &[u8],
    _source: Option<&File>,
    _out: &mut [u8],
    _options: &DecompressOptions,
) -> Result<usize> {
    Err(Error::ForkUnsupported)
}

/// Reads up to `limit` bytes of input from a stream that may be a pipe or
/// socket.
///
/// An idle pipe yields whatever was already queued (possibly nothing)
/// rather than blocking; see [`read_full`].
#[cfg(unix)]
pub fn read_input<R>(src: &mut R, limit: usize) -> Result<Vec<u8>>
where
    R: std::io::Read + std::os::fd::AsFd,
{
    let mut buf = Vec::new();
    buf.try_reserve_exact(limit)?;
    buf.resize(limit, 0);
    let n = read_full(src, &mut buf, true).map_err(Error::Io)?;
    buf.truncate(n);
    Ok(buf)
}
