//! Method registry and builtin decoder dispatch.
//!
//! Every compression container this crate understands is described by one
//! [`Method`] in the static [`METHODS`] table. A method pairs a signature
//! (fixed magic bytes or a predicate over the first bytes) with the external
//! command that can decompress it and, when the codec is compiled in, an
//! in-process [`Builtin`] decoder that is preferred over the subprocess.
//!
//! Table order is significant: detection returns matches in table order, so
//! an entry listed earlier wins over a later entry for the same magic.

#[cfg(feature = "deflate")]
pub mod deflate;

#[cfg(feature = "bzip2")]
pub mod bzip2;

#[cfg(feature = "xz")]
pub mod xz;

#[cfg(feature = "lzma")]
pub mod lzma;

#[cfg(feature = "zstd")]
pub mod zstd;

#[cfg(feature = "lz4")]
pub mod lz4;

use std::io::{self, Read};

use crate::format::detect::{is_lzma, is_zlib};
use crate::{Error, Result};

/// How a method recognizes its input.
#[derive(Clone, Copy)]
pub enum Signature {
    /// The input starts with these exact bytes.
    Magic(&'static [u8]),
    /// `matches` returns true on the first `len` bytes of the input.
    Predicate {
        /// Number of bytes the predicate inspects.
        len: usize,
        /// The matcher.
        matches: fn(&[u8]) -> bool,
    },
}

impl Signature {
    /// Minimum number of input bytes needed to evaluate this signature.
    pub fn len(&self) -> usize {
        match self {
            Signature::Magic(magic) => magic.len(),
            Signature::Predicate { len, .. } => *len,
        }
    }

    /// Returns true if the signature inspects no bytes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true if `prefix` carries this signature.
    ///
    /// Inputs shorter than [`len`](Self::len) never match.
    pub fn matches(&self, prefix: &[u8]) -> bool {
        if prefix.len() < self.len() {
            return false;
        }
        match self {
            Signature::Magic(magic) => prefix.starts_with(magic),
            Signature::Predicate { len, matches } => matches(&prefix[..*len]),
        }
    }
}

impl std::fmt::Debug for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Signature::Magic(magic) => f.debug_tuple("Magic").field(magic).finish(),
            Signature::Predicate { len, .. } => f
                .debug_struct("Predicate")
                .field("len", len)
                .finish_non_exhaustive(),
        }
    }
}

/// In-process decoders.
///
/// A variant exists regardless of the enabled features; [`is_available`]
/// reports whether its codec is compiled into this build.
///
/// [`is_available`]: Builtin::is_available
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    /// gzip container around a raw deflate stream.
    Gzip,
    /// zlib-wrapped deflate stream.
    Zlib,
    /// bzip2 stream.
    Bzip2,
    /// `.xz` stream.
    Xz,
    /// Raw `.lzma` stream with the 13-byte header.
    Lzma,
    /// lzip member.
    Lzip,
    /// Zstandard frame.
    Zstd,
    /// LZ4 frame.
    Lz4,
}

impl Builtin {
    /// Returns true if this decoder is compiled in.
    pub fn is_available(self) -> bool {
        match self {
            Builtin::Gzip | Builtin::Zlib => cfg!(feature = "deflate"),
            Builtin::Bzip2 => cfg!(feature = "bzip2"),
            Builtin::Xz => cfg!(feature = "xz"),
            Builtin::Lzma | Builtin::Lzip => cfg!(feature = "lzma"),
            Builtin::Zstd => cfg!(feature = "zstd"),
            Builtin::Lz4 => cfg!(feature = "lz4"),
        }
    }

    /// Returns the library-style name used in diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            Builtin::Gzip | Builtin::Zlib => "zlib",
            Builtin::Bzip2 => "bzlib",
            Builtin::Xz | Builtin::Lzma => "xzlib",
            Builtin::Lzip => "lzlib",
            Builtin::Zstd => "zstd",
            Builtin::Lz4 => "lz4",
        }
    }

    /// Decodes `input` into `out`, returning the number of bytes produced.
    ///
    /// The whole compressed input must be resident. Decoding stops when
    /// `out` is full; a stream that is cut short after producing output is
    /// not an error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Truncated`] when a container header is incomplete,
    /// [`Error::Codec`] when the codec rejects the stream, and
    /// [`Error::Unsupported`] when the codec is not compiled in.
    pub fn decode(self, input: &[u8], out: &mut [u8]) -> Result<usize> {
        log::debug!(
            "builtin {} decompression of {} bytes",
            self.name(),
            input.len()
        );
        match self {
            #[cfg(feature = "deflate")]
            Builtin::Gzip => deflate::decode_gzip(input, out),
            #[cfg(feature = "deflate")]
            Builtin::Zlib => deflate::decode_zlib(input, out),
            #[cfg(feature = "bzip2")]
            Builtin::Bzip2 => bzip2::decode(input, out),
            #[cfg(feature = "xz")]
            Builtin::Xz => xz::decode(input, out),
            #[cfg(feature = "lzma")]
            Builtin::Lzma => lzma::decode_lzma(input, out),
            #[cfg(feature = "lzma")]
            Builtin::Lzip => lzma::decode_lzip(input, out),
            #[cfg(feature = "zstd")]
            Builtin::Zstd => zstd::decode(input, out),
            #[cfg(feature = "lz4")]
            Builtin::Lz4 => lz4::decode(input, out),
            #[allow(unreachable_patterns)]
            _ => Err(Error::Unsupported {
                method: self.name(),
            }),
        }
    }
}

/// One registry entry: a container format and how to decode it.
#[derive(Debug, Clone, Copy)]
pub struct Method {
    /// Short human-readable description of the container.
    pub description: &'static str,
    /// How the input is recognized.
    pub signature: Signature,
    /// External command line; input arrives on stdin only.
    pub argv: &'static [&'static str],
    /// In-process decoder, if one exists for this format.
    pub builtin: Option<Builtin>,
}

/// How a method will actually be decoded in this build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Decode in-process.
    Builtin(Builtin),
    /// Pipe through an external decompressor.
    External(&'static [&'static str]),
}

impl Method {
    /// Resolves the strategy: a compiled-in builtin decoder wins over the
    /// external command.
    pub fn strategy(&self) -> Option<Strategy> {
        match self.builtin {
            Some(builtin) if builtin.is_available() => Some(Strategy::Builtin(builtin)),
            _ if !self.argv.is_empty() => Some(Strategy::External(self.argv)),
            _ => None,
        }
    }

    /// Returns the name used in diagnostics: the builtin library name when
    /// the builtin decoder is used, otherwise the external program.
    pub fn name(&self) -> &'static str {
        match self.strategy() {
            Some(Strategy::Builtin(builtin)) => builtin.name(),
            _ => self.argv.first().copied().unwrap_or("unknown"),
        }
    }
}

/// Index of a [`Method`] in [`METHODS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MethodId(pub usize);

impl MethodId {
    /// Returns the registry entry.
    ///
    /// # Panics
    ///
    /// Panics if the index is not in the table. Ids handed out by this crate
    /// are always valid.
    pub fn method(self) -> &'static Method {
        &METHODS[self.0]
    }

    /// Returns the registry entry, or `None` for an out-of-range index.
    pub fn get(self) -> Option<&'static Method> {
        METHODS.get(self.0)
    }

    /// Shorthand for `self.method().name()`.
    pub fn name(self) -> &'static str {
        self.method().name()
    }
}

impl std::fmt::Display for MethodId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// External command lines.
pub mod argv {
    /// `gzip -cd`, also used for the older formats gzip understands.
    pub const GZIP: &[&str] = &["gzip", "-cd"];
    /// `uncompress -c`.
    pub const UNCOMPRESS: &[&str] = &["uncompress", "-c"];
    /// `bzip2 -cd`.
    pub const BZIP2: &[&str] = &["bzip2", "-cd"];
    /// `lzip -cd`.
    pub const LZIP: &[&str] = &["lzip", "-cd"];
    /// `xz -cd`, also used for raw LZMA.
    pub const XZ: &[&str] = &["xz", "-cd"];
    /// `lrzip -qdf -`.
    pub const LRZIP: &[&str] = &["lrzip", "-qdf", "-"];
    /// `lz4 -cd`.
    pub const LZ4: &[&str] = &["lz4", "-cd"];
    /// `zstd -cd`.
    pub const ZSTD: &[&str] = &["zstd", "-cd"];
    /// Python one-liner for bare zlib streams.
    pub const ZLIB: &[&str] = &[
        "python3",
        "-c",
        "import sys, zlib; sys.stdout.buffer.write(zlib.decompress(sys.stdin.buffer.read()))",
    ];
}

/// Registry indices with a meaning outside the table.
pub mod id {
    use super::MethodId;

    /// compress(1) output, decoded with gzip.
    pub const COMPRESS: MethodId = MethodId(0);
    /// compress(1) output, decoded with uncompress.
    pub const UNCOMPRESS: MethodId = MethodId(1);
    /// gzip.
    pub const GZIP: MethodId = MethodId(2);
    /// freeze.
    pub const FROZEN: MethodId = MethodId(3);
    /// SCO LZH.
    pub const SCO_LZH: MethodId = MethodId(4);
    /// pack(1).
    pub const PACKED: MethodId = MethodId(5);
    /// PKZIP, first member only.
    pub const PKZIP: MethodId = MethodId(6);
    /// bzip2.
    pub const BZIP2: MethodId = MethodId(7);
    /// lzip.
    pub const LZIP: MethodId = MethodId(8);
    /// xz.
    pub const XZ: MethodId = MethodId(9);
    /// lrzip.
    pub const LRZIP: MethodId = MethodId(10);
    /// LZ4 frame.
    pub const LZ4: MethodId = MethodId(11);
    /// Zstandard.
    pub const ZSTD: MethodId = MethodId(12);
    /// Raw LZMA.
    pub const LZMA: MethodId = MethodId(13);
    /// Bare zlib.
    pub const ZLIB: MethodId = MethodId(14);
}

/// Longest prefix any signature inspects.
pub const MAX_SIGNATURE_LEN: usize = 13;

/// The method registry, in priority order.
pub static METHODS: &[Method] = &[
    Method {
        description: "compress'd",
        signature: Signature::Magic(b"\x1f\x9d"),
        argv: argv::GZIP,
        builtin: None,
    },
    // uncompress can get stuck, so gzip is tried first for the same magic.
    Method {
        description: "compress'd",
        signature: Signature::Magic(b"\x1f\x9d"),
        argv: argv::UNCOMPRESS,
        builtin: None,
    },
    Method {
        description: "gzip",
        signature: Signature::Magic(b"\x1f\x8b"),
        argv: argv::GZIP,
        builtin: Some(Builtin::Gzip),
    },
    Method {
        description: "frozen",
        signature: Signature::Magic(b"\x1f\x9e"),
        argv: argv::GZIP,
        builtin: None,
    },
    Method {
        description: "SCO LZH",
        signature: Signature::Magic(b"\x1f\xa0"),
        argv: argv::GZIP,
        builtin: None,
    },
    // pack(1) itself does not read standard input.
    Method {
        description: "packed",
        signature: Signature::Magic(b"\x1f\x1e"),
        argv: argv::GZIP,
        builtin: None,
    },
    Method {
        description: "PKZIP",
        signature: Signature::Magic(b"PK\x03\x04"),
        argv: argv::GZIP,
        builtin: None,
    },
    Method {
        description: "bzip2",
        signature: Signature::Magic(b"BZh"),
        argv: argv::BZIP2,
        builtin: Some(Builtin::Bzip2),
    },
    Method {
        description: "lzip",
        signature: Signature::Magic(b"LZIP"),
        argv: argv::LZIP,
        builtin: Some(Builtin::Lzip),
    },
    Method {
        description: "XZ",
        signature: Signature::Magic(b"\xfd7zXZ\x00"),
        argv: argv::XZ,
        builtin: Some(Builtin::Xz),
    },
    Method {
        description: "LRZIP",
        signature: Signature::Magic(b"LRZI"),
        argv: argv::LRZIP,
        builtin: None,
    },
    Method {
        description: "LZ4",
        signature: Signature::Magic(b"\x04\x22\x4d\x18"),
        argv: argv::LZ4,
        builtin: Some(Builtin::Lz4),
    },
    Method {
        description: "Zstandard",
        signature: Signature::Magic(b"\x28\xb5\x2f\xfd"),
        argv: argv::ZSTD,
        builtin: Some(Builtin::Zstd),
    },
    Method {
        description: "LZMA",
        signature: Signature::Predicate {
            len: 13,
            matches: is_lzma,
        },
        argv: argv::XZ,
        builtin: Some(Builtin::Lzma),
    },
    Method {
        description: "zlib",
        signature: Signature::Predicate {
            len: 2,
            matches: is_zlib,
        },
        argv: argv::ZLIB,
        builtin: Some(Builtin::Zlib),
    },
];

/// Reads from a streaming decoder until `out` is full or the stream ends.
///
/// A stream that ends early after producing output (truncated input) is
/// reported as a short success, matching the single-shot codec adapters.
#[allow(dead_code)]
pub(crate) fn read_bounded<R: Read>(
    mut reader: R,
    out: &mut [u8],
    codec: &'static str,
) -> Result<usize> {
    let mut filled = 0;
    while filled < out.len() {
        match reader.read(&mut out[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof && filled > 0 => {
                log::debug!("{} stream truncated after {} bytes", codec, filled);
                break;
            }
            Err(e) => return Err(Error::codec_error(codec, format!("{} error: {}", codec, e))),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_order() {
        assert_eq!(id::COMPRESS.method().argv, argv::GZIP);
        assert_eq!(id::UNCOMPRESS.method().argv, argv::UNCOMPRESS);
        assert_eq!(id::GZIP.method().builtin, Some(Builtin::Gzip));
        assert_eq!(id::BZIP2.method().builtin, Some(Builtin::Bzip2));
        assert_eq!(id::LZIP.method().builtin, Some(Builtin::Lzip));
        assert_eq!(id::XZ.method().builtin, Some(Builtin::Xz));
        assert_eq!(id::LRZIP.method().argv, argv::LRZIP);
        assert_eq!(id::ZSTD.method().builtin, Some(Builtin::Zstd));
        assert_eq!(id::LZMA.method().builtin, Some(Builtin::Lzma));
        assert_eq!(id::ZLIB.method().builtin, Some(Builtin::Zlib));
        assert_eq!(METHODS.len(), 15);
    }

    #[test]
    fn test_max_signature_len() {
        let longest = METHODS.iter().map(|m| m.signature.len()).max().unwrap();
        assert_eq!(longest, MAX_SIGNATURE_LEN);
    }

    #[test]
    fn test_every_method_has_argv() {
        for method in METHODS {
            assert!(!method.argv.is_empty(), "{}", method.description);
            assert!(method.strategy().is_some());
        }
    }

    #[test]
    fn test_method_names_for_external_only() {
        assert_eq!(id::COMPRESS.name(), "gzip");
        assert_eq!(id::UNCOMPRESS.name(), "uncompress");
        assert_eq!(id::LRZIP.name(), "lrzip");
        assert_eq!(id::PKZIP.name(), "gzip");
    }

    #[cfg(feature = "deflate")]
    #[test]
    fn test_builtin_preferred_when_available() {
        assert_eq!(
            id::GZIP.method().strategy(),
            Some(Strategy::Builtin(Builtin::Gzip))
        );
        assert_eq!(id::GZIP.name(), "zlib");
        assert_eq!(id::ZLIB.name(), "zlib");
    }

    #[cfg(not(feature = "lz4"))]
    #[test]
    fn test_external_fallback_without_feature() {
        assert_eq!(
            id::LZ4.method().strategy(),
            Some(Strategy::External(argv::LZ4))
        );
        assert_eq!(id::LZ4.name(), "lz4");
    }

    #[test]
    fn test_signature_requires_full_length() {
        let sig = Signature::Magic(b"BZh");
        assert!(sig.matches(b"BZh91AY"));
        assert!(!sig.matches(b"BZ"));
        assert!(!sig.matches(b""));
    }

    #[test]
    fn test_method_id_get_out_of_range() {
        assert!(MethodId(METHODS.len()).get().is_none());
        assert!(MethodId(0).get().is_some());
    }

    #[test]
    fn test_read_bounded_stops_at_capacity() {
        let data = vec![7u8; 100];
        let mut out = [0u8; 10];
        let n = read_bounded(&data[..], &mut out, "test").unwrap();
        assert_eq!(n, 10);
        assert_eq!(out, [7u8; 10]);
    }

    #[test]
    fn test_read_bounded_short_stream() {
        let data = b"abc";
        let mut out = [0u8; 10];
        let n = read_bounded(&data[..], &mut out, "test").unwrap();
        assert_eq!(n, 3);
    }
}
