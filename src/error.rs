//! Error types for decompression operations.
//!
//! This module provides the [`Error`] enum which represents every failure a
//! decode attempt can run into, along with a convenient [`Result<T>`] alias.
//!
//! # Error Handling
//!
//! Errors never escape the dispatcher as process-fatal conditions. Internal
//! code propagates them with `?`, and [`Decompressor`] turns them into an
//! [`Outcome`] at the boundary:
//!
//! - [`Error::Truncated`] becomes [`Outcome::NoData`]: the input was not
//!   really this format, so the caller should treat it as plain data.
//! - Everything else becomes [`Outcome::ErrData`] carrying the error's
//!   `Display` text, which is written to be shown to a user.
//!
//! ```rust
//! use zmagic::{Error, Outcome};
//!
//! let outcome = Outcome::from(Error::ForkDisabled);
//! assert_eq!(
//!     outcome.error_message(),
//!     Some("Fork is required to uncompress, but disabled")
//! );
//!
//! let outcome = Outcome::from(Error::Truncated);
//! assert!(outcome.is_no_data());
//! ```
//!
//! [`Decompressor`]: crate::Decompressor
//! [`Outcome`]: crate::Outcome
//! [`Outcome::NoData`]: crate::Outcome::NoData
//! [`Outcome::ErrData`]: crate::Outcome::ErrData

use std::collections::TryReserveError;
use std::io;

/// The main error type for decompression operations.
///
/// # Error Categories
///
/// | Category | Variants | Typical Cause |
/// |----------|----------|---------------|
/// | Resources | [`Io`][Self::Io], [`NoBuffer`][Self::NoBuffer], [`Spawn`][Self::Spawn], [`Writer`][Self::Writer] | OS refused a buffer, pipe or process |
/// | Input | [`Truncated`][Self::Truncated] | Container header cut short |
/// | Codec | [`Codec`][Self::Codec] | Corrupt or unsupported stream |
/// | Subprocess | [`ReadStdout`][Self::ReadStdout], [`ReadStderr`][Self::ReadStderr], [`Wait`][Self::Wait], [`ChildDiagnostic`][Self::ChildDiagnostic] | External decompressor failed |
/// | Policy | [`ForkDisabled`][Self::ForkDisabled], [`Unsupported`][Self::Unsupported] | Method cannot run in this configuration |
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// An I/O error that does not fit a more specific variant.
    #[error("{0}")]
    Io(#[from] io::Error),

    /// The output buffer for the byte ceiling could not be allocated.
    #[error("No buffer, {0}")]
    NoBuffer(#[from] TryReserveError),

    /// The container header ends before the compressed payload starts.
    ///
    /// This is reported as "no data" rather than as a failure: the bytes
    /// matched a signature but do not actually form this format.
    #[error("File too short")]
    Truncated,

    /// The codec rejected the stream.
    ///
    /// `message` carries the codec's own diagnostic.
    #[error("{message}")]
    Codec {
        /// Short codec name, such as `"bzlib"`.
        codec: &'static str,
        /// Codec-native error text.
        message: String,
    },

    /// The method needs an external decompressor but forking is disabled.
    #[error("Fork is required to uncompress, but disabled")]
    ForkDisabled,

    /// The method needs an external decompressor but this platform cannot
    /// launch one.
    #[error("Fork is not supported on this platform")]
    ForkUnsupported,

    /// The external decompressor could not be launched.
    #[error("Cannot spawn `{program}', {source}")]
    Spawn {
        /// `argv[0]` of the decompressor.
        program: String,
        /// The underlying OS error.
        source: io::Error,
    },

    /// The writer helper that feeds the decompressor could not be started.
    #[error("Write to child failed, {0}")]
    Writer(io::Error),

    /// Reading the decompressor's standard output failed.
    #[error("Read stdout failed, {0}")]
    ReadStdout(io::Error),

    /// Reading the decompressor's standard error failed.
    #[error("Read stderr failed, {0}")]
    ReadStderr(io::Error),

    /// Waiting for a child process failed.
    #[error("Wait failed, {0}")]
    Wait(io::Error),

    /// The decompressor wrote a diagnostic to its standard error.
    ///
    /// The text has already been normalized to a single capitalized line.
    #[error("{0}")]
    ChildDiagnostic(String),

    /// The method has neither a builtin decoder nor an external command.
    #[error("No decompressor available for {method}")]
    Unsupported {
        /// Diagnostic name of the method.
        method: &'static str,
    },
}

impl Error {
    /// Returns true if this error means "not actually this format".
    pub fn is_no_data(&self) -> bool {
        matches!(self, Error::Truncated)
    }

    /// Returns true if this error came from the external decompressor path.
    pub fn is_subprocess_error(&self) -> bool {
        matches!(
            self,
            Error::ForkDisabled
                | Error::ForkUnsupported
                | Error::Spawn { .. }
                | Error::Writer(_)
                | Error::ReadStdout(_)
                | Error::ReadStderr(_)
                | Error::Wait(_)
                | Error::ChildDiagnostic(_)
        )
    }

    /// Returns the codec name for codec failures.
    pub fn codec(&self) -> Option<&'static str> {
        match self {
            Error::Codec { codec, .. } => Some(codec),
            _ => None,
        }
    }

    pub(crate) fn codec_error(codec: &'static str, message: impl Into<String>) -> Self {
        Error::Codec {
            codec,
            message: message.into(),
        }
    }
}

/// A specialized Result type for decompression operations.
pub type Result<T> = std::result::Result<T, Error>;
