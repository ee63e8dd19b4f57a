//! Detection and decompression dispatch.
//!
//! [`Decompressor`] ties the pieces together: it matches a buffer against
//! the method registry, picks the builtin decoder or the external command
//! for each matching method, and turns whatever happens into an [`Outcome`].
//!
//! # Example
//!
//! ```rust
//! use std::io::Write;
//! use zmagic::{DecodeRequest, DecompressOptions, Decompressor, Outcome};
//!
//! # fn main() -> std::io::Result<()> {
//! let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
//! encoder.write_all(b"hello world")?;
//! let compressed = encoder.finish()?;
//!
//! let decompressor = Decompressor::new(DecompressOptions::new().max_bytes(1024));
//! let detection = decompressor
//!     .decompress(&DecodeRequest::new(&compressed))
//!     .expect("gzip magic is recognized");
//!
//! match &detection.outcome {
//!     Outcome::Data(data) => assert_eq!(data.as_bytes(), b"hello world"),
//!     other => panic!("unexpected outcome: {other:?}"),
//! }
//! # Ok(())
//! # }
//! ```

use std::fs::File;

use crate::codec::{Method, MethodId, Strategy};
use crate::diagnostic::format_decompression_error;
use crate::format::matching_methods;
use crate::options::DecompressOptions;
use crate::pipeline;
use crate::{Error, Result};

#[cfg(unix)]
use crate::pipeline::SigpipeGuard;

/// Input of a decode attempt.
#[derive(Debug, Clone, Copy)]
pub struct DecodeRequest<'a> {
    /// The compressed bytes, or at least their beginning.
    pub data: &'a [u8],
    /// An open, seekable file holding the same bytes.
    ///
    /// When present, external decompressors read it directly from offset 0
    /// instead of being fed `data` through a pipe. Builtin decoders always
    /// use `data`.
    pub source: Option<&'a File>,
}

impl<'a> DecodeRequest<'a> {
    /// Creates a request over an in-memory buffer.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, source: None }
    }

    /// Attaches the file the buffer was read from.
    pub fn with_source(mut self, source: &'a File) -> Self {
        self.source = Some(source);
        self
    }
}

/// Decompressed bytes.
///
/// The underlying buffer always carries one extra NUL byte after the data,
/// so it can be handed to consumers that expect C strings.
#[derive(Clone, PartialEq, Eq)]
pub struct Decompressed {
    buf: Vec<u8>,
}

impl Decompressed {
    /// Takes `buf[..len]` and terminates it with a NUL.
    ///
    /// `buf` must already have room for the terminator.
    fn terminate(mut buf: Vec<u8>, len: usize) -> Self {
        buf.truncate(len);
        buf.push(0);
        Self { buf }
    }

    /// Returns the data without the terminator.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len()]
    }

    /// Returns the data including the trailing NUL.
    pub fn as_bytes_with_nul(&self) -> &[u8] {
        &self.buf
    }

    /// Returns the number of data bytes.
    pub fn len(&self) -> usize {
        self.buf.len() - 1
    }

    /// Returns true if nothing was produced.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the data without the terminator.
    pub fn into_vec(mut self) -> Vec<u8> {
        self.buf.pop();
        self.buf
    }
}

impl std::fmt::Debug for Decompressed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Decompressed")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

impl AsRef<[u8]> for Decompressed {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

/// Result of one decode attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Decompression succeeded; at most the byte ceiling was produced.
    Data(Decompressed),
    /// Decompression was attempted and failed. The message is meant to be
    /// shown to a user.
    ErrData(String),
    /// Too little input to attempt decompression; treat the input as
    /// uncompressed.
    NoData,
}

impl Outcome {
    /// Returns true for [`Outcome::Data`].
    pub fn is_data(&self) -> bool {
        matches!(self, Outcome::Data(_))
    }

    /// Returns true for [`Outcome::NoData`].
    pub fn is_no_data(&self) -> bool {
        matches!(self, Outcome::NoData)
    }

    /// Returns the decompressed bytes, if any.
    pub fn data(&self) -> Option<&Decompressed> {
        match self {
            Outcome::Data(data) => Some(data),
            _ => None,
        }
    }

    /// Returns the failure message for [`Outcome::ErrData`].
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Outcome::ErrData(message) => Some(message),
            _ => None,
        }
    }
}

impl From<Error> for Outcome {
    fn from(err: Error) -> Self {
        if err.is_no_data() {
            Outcome::NoData
        } else {
            Outcome::ErrData(err.to_string())
        }
    }
}

impl From<Result<Decompressed>> for Outcome {
    fn from(result: Result<Decompressed>) -> Self {
        match result {
            Ok(data) => Outcome::Data(data),
            Err(err) => err.into(),
        }
    }
}

/// The method a buffer was recognized as, and what decoding it gave.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    /// The registry entry that produced `outcome`.
    pub method: MethodId,
    /// What decoding produced.
    pub outcome: Outcome,
}

impl Detection {
    /// Formats a failed decode for display.
    ///
    /// Returns `None` unless the outcome is [`Outcome::ErrData`].
    pub fn describe_error(&self, mime: bool) -> Option<String> {
        let message = self.outcome.error_message()?;
        Some(format_decompression_error(self.method.name(), message, mime))
    }
}

/// Detects compressed input and decompresses a bounded prefix of it.
#[derive(Debug, Clone, Default)]
pub struct Decompressor {
    options: DecompressOptions,
}

impl Decompressor {
    /// Creates a decompressor with the given options.
    pub fn new(options: DecompressOptions) -> Self {
        Self { options }
    }

    /// Returns the options in effect.
    pub fn options(&self) -> &DecompressOptions {
        &self.options
    }

    /// Detects the compression method of `request.data` and decodes it.
    ///
    /// Every method whose signature matches is tried in registry order.
    /// [`Outcome::NoData`] moves on to the next matching method; data or an
    /// error ends the pass. Returns `None` if no signature matches, and
    /// otherwise the last method tried with its outcome.
    ///
    /// SIGPIPE is ignored from the first match until the pass ends.
    pub fn decompress(&self, request: &DecodeRequest<'_>) -> Option<Detection> {
        #[cfg(unix)]
        let mut sigpipe: Option<SigpipeGuard> = None;
        let mut last = None;

        for (id, method) in matching_methods(request.data) {
            #[cfg(unix)]
            if sigpipe.is_none() {
                sigpipe = Some(SigpipeGuard::acquire());
            }

            let outcome = Outcome::from(self.run(method, request));
            log::debug!("{} ({}) gave {}", method.description, id, describe(&outcome));
            let done = !outcome.is_no_data();
            last = Some(Detection {
                method: id,
                outcome,
            });
            if done {
                break;
            }
        }
        last
    }

    /// Decodes `request.data` with one specific method, skipping detection.
    ///
    /// Input shorter than the method's signature yields
    /// [`Outcome::NoData`].
    pub fn decompress_with(&self, method: MethodId, request: &DecodeRequest<'_>) -> Outcome {
        let Some(entry) = method.get() else {
            return Outcome::ErrData(format!("Unknown method index {}", method.0));
        };
        #[cfg(unix)]
        let _sigpipe = SigpipeGuard::acquire();
        Outcome::from(self.run(entry, request))
    }

    /// Formats a failed detection using the configured diagnostic style.
    ///
    /// See [`Detection::describe_error`].
    pub fn describe_error(&self, detection: &Detection) -> Option<String> {
        detection.describe_error(self.options.mime)
    }

    fn run(&self, method: &Method, request: &DecodeRequest<'_>) -> Result<Decompressed> {
        if request.data.len() < method.signature.len() {
            return Err(Error::Truncated);
        }

        let strategy = method.strategy().ok_or_else(|| Error::Unsupported {
            method: method.name(),
        })?;
        if matches!(strategy, Strategy::External(_)) && !self.options.allow_fork {
            return Err(Error::ForkDisabled);
        }

        let max = self.options.max_bytes;
        let mut buf = Vec::new();
        buf.try_reserve_exact(max.saturating_add(1))?;
        buf.resize(max, 0);

        let n = match strategy {
            Strategy::Builtin(builtin) => builtin.decode(request.data, &mut buf)?,
            Strategy::External(argv) => {
                pipeline::run(argv, request.data, request.source, &mut buf, &self.options)?
            }
        };
        Ok(Decompressed::terminate(buf, n))
    }
}

fn describe(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Data(data) => format!("{} bytes", data.len()),
        Outcome::ErrData(message) => format!("error: {}", message),
        Outcome::NoData => "no data".to_string(),
    }
}
