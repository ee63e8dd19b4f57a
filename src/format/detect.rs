//! Signature matching against the method registry.
//!
//! This module identifies which compression method, if any, produced a
//! buffer by examining its magic bytes. Most formats have a fixed magic;
//! raw LZMA and bare zlib streams have none and are recognized by
//! predicates over their headers.

use crate::codec::{METHODS, MAX_SIGNATURE_LEN, Method, MethodId};

/// Returns the first method whose signature matches `prefix`.
///
/// Methods are tried in registry order, so when several entries share a
/// magic the earliest one wins.
///
/// # Example
///
/// ```rust
/// use zmagic::codec::id;
/// use zmagic::format::detect;
///
/// assert_eq!(detect(b"\x1f\x8b\x08\x00"), Some(id::GZIP));
/// assert_eq!(detect(b"BZh91AY&SY"), Some(id::BZIP2));
/// assert_eq!(detect(b"plain text"), None);
/// ```
pub fn detect(prefix: &[u8]) -> Option<MethodId> {
    matching_methods(prefix).next().map(|(id, _)| id)
}

/// Iterates over every method matching `prefix`, in priority order.
///
/// Only the first [`MAX_SIGNATURE_LEN`] bytes of `prefix` are inspected.
pub fn matching_methods(prefix: &[u8]) -> impl Iterator<Item = (MethodId, &'static Method)> {
    let prefix = &prefix[..prefix.len().min(MAX_SIGNATURE_LEN)];
    METHODS
        .iter()
        .enumerate()
        .filter(move |(_, method)| method.signature.matches(prefix))
        .map(|(index, method)| (MethodId(index), method))
}

/// Recognizes a raw `.lzma` stream.
///
/// The properties byte must be the common `0x5d` (lc=3, lp=0, pb=2), the
/// dictionary size must have its two low bytes clear, and the top byte of
/// the 64-bit uncompressed size must be 0 or, for "unknown size", `0xff`.
pub fn is_lzma(header: &[u8]) -> bool {
    if header.len() < 13 {
        return false;
    }
    if header[0] != 0x5d || header[1] != 0 || header[2] != 0 {
        return false;
    }
    header[12] == 0 || header[12] == 0xff
}

/// Recognizes a bare zlib stream.
///
/// The compression method nibble must be 8 (deflate) with a window of at
/// most 32 KiB, and the header read as a big-endian `u16` must be a multiple
/// of 31.
pub fn is_zlib(header: &[u8]) -> bool {
    if header.len() < 2 {
        return false;
    }
    let cmf = header[0];
    if cmf & 0x0f != 8 || cmf & 0x80 != 0 {
        return false;
    }
    u16::from_be_bytes([cmf, header[1]]) % 31 == 0
}
