//! Deflate codec: gzip containers and bare zlib streams.
//!
//! Both are decoded with a single `inflate` call over the whole input into
//! the caller's buffer. For gzip the header is parsed here to find where the
//! raw deflate payload starts.

use flate2::{Decompress, FlushDecompress};

use crate::{Error, Result};

const CODEC: &str = "zlib";

/// Fixed part of the gzip member header.
const GZIP_HEADER_LEN: usize = 10;

/// gzip header flag bits.
mod flag {
    pub const FHCRC: u8 = 1 << 1;
    pub const FEXTRA: u8 = 1 << 2;
    pub const FNAME: u8 = 1 << 3;
    pub const FCOMMENT: u8 = 1 << 4;
}

/// Returns the offset of the deflate payload inside a gzip member.
///
/// Skips the optional extra field, original file name, comment and header
/// CRC according to the flag byte.
///
/// # Errors
///
/// Returns [`Error::Truncated`] if the header runs past the end of `data`
/// or leaves no payload.
pub fn gzip_payload_offset(data: &[u8]) -> Result<usize> {
    if data.len() < 4 {
        return Err(Error::Truncated);
    }
    let flags = data[3];
    let mut start = GZIP_HEADER_LEN;

    if flags & flag::FEXTRA != 0 {
        if start + 1 >= data.len() {
            return Err(Error::Truncated);
        }
        let xlen = u16::from_le_bytes([data[start], data[start + 1]]) as usize;
        start += 2 + xlen;
    }
    if flags & flag::FNAME != 0 {
        start = skip_cstr(data, start);
    }
    if flags & flag::FCOMMENT != 0 {
        start = skip_cstr(data, start);
    }
    if flags & flag::FHCRC != 0 {
        start += 2;
    }

    if start >= data.len() {
        return Err(Error::Truncated);
    }
    Ok(start)
}

/// Returns the position just past the NUL ending the string at `start`.
fn skip_cstr(data: &[u8], start: usize) -> usize {
    match data.get(start..).and_then(|rest| rest.iter().position(|&b| b == 0)) {
        Some(nul) => start + nul + 1,
        None => data.len().max(start) + 1,
    }
}

/// Decodes a gzip member into `out`.
pub fn decode_gzip(input: &[u8], out: &mut [u8]) -> Result<usize> {
    let start = gzip_payload_offset(input)?;
    inflate(Decompress::new(false), &input[start..], out)
}

/// Decodes a zlib stream into `out`.
pub fn decode_zlib(input: &[u8], out: &mut [u8]) -> Result<usize> {
    inflate(Decompress::new(true), input, out)
}

fn inflate(mut stream: Decompress, input: &[u8], out: &mut [u8]) -> Result<usize> {
    stream
        .decompress(input, out, FlushDecompress::Sync)
        .map_err(|e| Error::codec_error(CODEC, e.to_string()))?;
    Ok(stream.total_out() as usize)
}
