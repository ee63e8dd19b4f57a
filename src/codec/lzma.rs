//! LZMA codec: raw `.lzma` streams and lzip members.
//!
//! Both formats carry a plain LZMA stream behind a small header. The `.lzma`
//! header spells out the properties byte, dictionary size and uncompressed
//! size; lzip fixes the properties (lc=3, lp=0, pb=2), encodes the
//! dictionary size in one byte and always terminates the stream with an
//! end marker followed by a 20-byte trailer. An lzip file is a sequence of
//! such members whose outputs are concatenated.

use lzma_rust2::LzmaReader;

use crate::{Error, Result};

use super::read_bounded;

/// Size of the `.lzma` header: properties, dictionary size, uncompressed size.
pub const LZMA_HEADER_LEN: usize = 13;

/// Size of the lzip member header: magic, version, coded dictionary size.
pub const LZIP_HEADER_LEN: usize = 6;

/// Size of the lzip member trailer: CRC32, data size, member size.
pub const LZIP_TRAILER_LEN: usize = 20;

const LZIP_MAGIC: &[u8] = b"LZIP";

/// Properties byte for lc=3, lp=0, pb=2.
const LZIP_PROPS: u8 = 0x5D;

/// Smallest dictionary handed to the decoder.
const MIN_DICT_SIZE: u32 = 4096;

/// Smallest and largest dictionary sizes lzip allows (4 KiB, 512 MiB).
const LZIP_MIN_DICT_LOG: u32 = 12;
const LZIP_MAX_DICT_LOG: u32 = 29;

/// Decodes a raw `.lzma` stream into `out`.
pub fn decode_lzma(input: &[u8], out: &mut [u8]) -> Result<usize> {
    if input.len() < LZMA_HEADER_LEN {
        return Err(Error::Truncated);
    }
    let (header, payload) = input.split_at(LZMA_HEADER_LEN);
    let dict_size = u32::from_le_bytes([header[1], header[2], header[3], header[4]]);
    let mut size = [0u8; 8];
    size.copy_from_slice(&header[5..13]);

    let reader = LzmaReader::new_with_props(
        payload,
        u64::from_le_bytes(size),
        header[0],
        window_size(dict_size, out.len()),
        None,
    )
    .map_err(|e| Error::codec_error("xzlib", format!("unxz error: {}", e)))?;
    read_bounded(reader, out, "xzlib")
}

/// Caps the dictionary at the output size.
///
/// No match distance can reach further back than the output produced so
/// far, so a window the size of `out` decodes exactly like the declared
/// one while never allocating more than the byte ceiling.
fn window_size(dict_size: u32, out_len: usize) -> u32 {
    let needed = u32::try_from(out_len).unwrap_or(u32::MAX).max(MIN_DICT_SIZE);
    dict_size.clamp(MIN_DICT_SIZE, needed)
}

/// Decodes the dictionary size byte of an lzip header.
///
/// The low five bits give a power of two; the top three bits subtract that
/// many sixteenths of it.
pub fn lzip_dict_size(coded: u8) -> Option<u32> {
    let log = u32::from(coded & 0x1F);
    if !(LZIP_MIN_DICT_LOG..=LZIP_MAX_DICT_LOG).contains(&log) {
        return None;
    }
    let base = 1u32 << log;
    let fraction = (base / 16) * u32::from(coded >> 5);
    Some(base - fraction)
}

/// Decodes lzip members into `out` until the input or the output runs out.
///
/// Every member that ends before the ceiling has its trailer checked (CRC32,
/// data size and member size). Input that stops inside a later member's
/// header or trailer keeps the output decoded so far, as does trailing data
/// that is not an lzip member.
pub fn decode_lzip(input: &[u8], out: &mut [u8]) -> Result<usize> {
    if input.len() < LZIP_HEADER_LEN {
        return Err(Error::Truncated);
    }
    let mut rest = input;
    let mut filled = 0;
    loop {
        let (n, next) = decode_member(rest, &mut out[filled..])?;
        filled += n;
        match next {
            Some(next) if filled < out.len() && next.len() >= LZIP_HEADER_LEN => {
                if !next.starts_with(LZIP_MAGIC) {
                    log::debug!("ignoring {} bytes of trailing data after lzip", next.len());
                    return Ok(filled);
                }
                rest = next;
            }
            _ => return Ok(filled),
        }
    }
}

/// Decodes one member at the start of `input`.
///
/// Returns the bytes produced and, when the member ended and its trailer is
/// present, the input following it.
fn decode_member<'a>(input: &'a [u8], out: &mut [u8]) -> Result<(usize, Option<&'a [u8]>)> {
    let version = input[4];
    if version != 1 {
        return Err(lzlib_error(format!("version {} not supported", version)));
    }
    let dict_size =
        lzip_dict_size(input[5]).ok_or_else(|| lzlib_error("invalid dictionary size"))?;

    let payload = &input[LZIP_HEADER_LEN..];
    let mut reader = LzmaReader::new_with_props(
        payload,
        u64::MAX,
        LZIP_PROPS,
        window_size(dict_size, out.len()),
        None,
    )
    .map_err(lzlib_error)?;
    let n = read_bounded(&mut reader, out, "lzlib")?;
    if n == out.len() {
        return Ok((n, None));
    }

    // The range decoder reads its input a byte at a time, so what is left
    // starts right after the end marker.
    let remaining = reader.into_inner();
    let consumed = LZIP_HEADER_LEN + (payload.len() - remaining.len());
    let Some(trailer) = remaining.get(..LZIP_TRAILER_LEN) else {
        return Ok((n, None));
    };
    verify_trailer(trailer, &out[..n], consumed + LZIP_TRAILER_LEN)?;
    Ok((n, Some(&remaining[LZIP_TRAILER_LEN..])))
}

/// Checks a member trailer against the member's decoded data and size.
fn verify_trailer(trailer: &[u8], data: &[u8], member_len: usize) -> Result<()> {
    let field = |range: std::ops::Range<usize>| {
        let mut bytes = [0u8; 8];
        bytes[..range.len()].copy_from_slice(&trailer[range]);
        u64::from_le_bytes(bytes)
    };

    let expected = field(0..4) as u32;
    let actual = crc32fast::hash(data);
    if expected != actual {
        return Err(lzlib_error(format!(
            "CRC mismatch; expected {:#010x}, got {:#010x}",
            expected, actual
        )));
    }

    let data_size = field(4..12);
    if data_size != data.len() as u64 {
        return Err(lzlib_error(format!(
            "data size mismatch; trailer says {}, decoded {}",
            data_size,
            data.len()
        )));
    }

    let member_size = field(12..20);
    if member_size != member_len as u64 {
        return Err(lzlib_error(format!(
            "member size mismatch; trailer says {}, member is {}",
            member_size, member_len
        )));
    }
    Ok(())
}

fn lzlib_error(message: impl std::fmt::Display) -> Error {
    Error::codec_error("lzlib", format!("lzlib error: {}", message))
}
