//! Zstandard codec.
//!
//! Frames are decoded through the streaming reader so that decoding stops
//! as soon as the output buffer is full, however large the frame's content
//! size claims to be.

use zstd::stream::Decoder;

use crate::{Error, Result};

use super::read_bounded;

const CODEC: &str = "zstd";

/// Decodes Zstandard frames into `out`.
pub fn decode(input: &[u8], out: &mut [u8]) -> Result<usize> {
    let decoder = Decoder::with_buffer(input)
        .map_err(|e| Error::codec_error(CODEC, format!("zstd error: {}", e)))?;
    read_bounded(decoder, out, CODEC)
}
