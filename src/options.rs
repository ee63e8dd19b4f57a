//! Decompression options.

use std::ffi::OsString;

/// Default byte ceiling: 7 MiB, the amount of data file(1) inspects.
pub const DEFAULT_MAX_BYTES: usize = 7 * 1024 * 1024;

/// Default bound on captured decompressor stderr.
pub const DEFAULT_STDERR_LIMIT: usize = 8 * 1024;

/// Options controlling a decode pass.
///
/// # Example
///
/// ```rust
/// use zmagic::DecompressOptions;
///
/// let options = DecompressOptions::new()
///     .max_bytes(64 * 1024)
///     .allow_fork(false);
/// assert_eq!(options.max_bytes, 64 * 1024);
/// assert!(!options.allow_fork);
/// ```
#[derive(Debug, Clone)]
pub struct DecompressOptions {
    /// Maximum number of decompressed bytes ever produced or buffered.
    pub max_bytes: usize,
    /// Whether external decompressors may be launched.
    ///
    /// When false only builtin decoders run; methods that need a subprocess
    /// report [`Error::ForkDisabled`](crate::Error::ForkDisabled).
    pub allow_fork: bool,
    /// Replacement `PATH` used to resolve the decompressor's `argv[0]`.
    pub search_path: Option<OsString>,
    /// Maximum number of stderr bytes captured from a decompressor.
    pub stderr_limit: usize,
    /// Render diagnostics as MIME tokens instead of free text.
    pub mime: bool,
}

impl Default for DecompressOptions {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_BYTES,
            allow_fork: true,
            search_path: None,
            stderr_limit: DEFAULT_STDERR_LIMIT,
            mime: false,
        }
    }
}

impl DecompressOptions {
    /// Creates options with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the byte ceiling.
    pub fn max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// Allows or forbids external decompressors.
    pub fn allow_fork(mut self, allow: bool) -> Self {
        self.allow_fork = allow;
        self
    }

    /// Resolves external decompressors against `path` instead of the
    /// inherited `PATH`.
    pub fn search_path(mut self, path: impl Into<OsString>) -> Self {
        self.search_path = Some(path.into());
        self
    }

    /// Sets the bound on captured decompressor stderr.
    pub fn stderr_limit(mut self, limit: usize) -> Self {
        self.stderr_limit = limit;
        self
    }

    /// Selects MIME-style diagnostics.
    pub fn mime(mut self, mime: bool) -> Self {
        self.mime = mime;
        self
    }
}
