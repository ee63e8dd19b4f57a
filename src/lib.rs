//! # zmagic
//!
//! Compressed-stream detection and bounded decompression.
//!
//! Given a buffer (and optionally the open file it came from), this crate
//! recognizes whether it is one of the common compressed containers (gzip,
//! compress, bzip2, xz, raw LZMA, lzip, lrzip, LZ4, Zstandard, zlib, pack,
//! freeze, SCO LZH, PKZIP) and produces at most a caller-chosen number of
//! decompressed bytes for further inspection.
//!
//! Decoding uses an in-process codec when one is compiled in, and otherwise
//! pipes the input through the format's usual command line tool
//! (`gzip -cd`, `xz -cd`, ...). Neither path can hang on, leak descriptors
//! over, or crash on malformed input: every failure becomes an
//! [`Outcome`] value.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::fs::File;
//! use std::io::Read;
//! use zmagic::{DecodeRequest, DecompressOptions, Decompressor, Outcome};
//!
//! fn main() -> std::io::Result<()> {
//!     let mut file = File::open("notes.txt.gz")?;
//!     let mut head = Vec::new();
//!     (&file).take(1 << 20).read_to_end(&mut head)?;
//!
//!     let decompressor = Decompressor::new(DecompressOptions::new().max_bytes(64 * 1024));
//!     let request = DecodeRequest::new(&head).with_source(&file);
//!
//!     match decompressor.decompress(&request) {
//!         Some(detection) => match &detection.outcome {
//!             Outcome::Data(data) => println!("{}: {} bytes", detection.method, data.len()),
//!             Outcome::ErrData(_) => {
//!                 println!("{}", detection.describe_error(false).unwrap_or_default())
//!             }
//!             Outcome::NoData => println!("not really compressed"),
//!         },
//!         None => println!("not compressed"),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `deflate` | Yes | Builtin gzip and zlib decoding |
//! | `bzip2` | Yes | Builtin bzip2 decoding |
//! | `xz` | Yes | Builtin xz decoding via liblzma |
//! | `lzma` | Yes | Builtin raw LZMA and lzip decoding |
//! | `zstd` | Yes | Builtin Zstandard decoding |
//! | `lz4` | No | Builtin LZ4 frame decoding |
//!
//! Methods whose builtin decoder is disabled fall back to their external
//! command.
//!
//! ## Outcomes
//!
//! | Outcome | Meaning | What a caller usually does |
//! |---------|---------|----------------------------|
//! | [`Outcome::Data`] | Decompressed bytes, NUL-terminated | Analyze them in turn |
//! | [`Outcome::ErrData`] | Decoding failed with a diagnostic | Show the diagnostic |
//! | [`Outcome::NoData`] | Input too short for this format | Treat as uncompressed |
//!
//! ## Subprocesses and signals
//!
//! External decompressors are only launched when
//! [`DecompressOptions::allow_fork`] is set. While they run SIGPIPE is
//! ignored process-wide and restored afterwards; see
//! [`pipeline::SigpipeGuard`].

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod codec;
pub mod decompress;
pub mod diagnostic;
pub mod error;
pub mod format;
pub mod options;
pub mod pipeline;

pub use codec::{Method, MethodId, METHODS};
pub use decompress::{DecodeRequest, Decompressed, Decompressor, Detection, Outcome};
pub use error::{Error, Result};
pub use format::detect;
pub use options::DecompressOptions;
