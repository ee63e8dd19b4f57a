//! XZ codec backed by liblzma's auto-detecting decoder.

use xz2::stream::{Action, Stream};

use crate::{Error, Result};

const CODEC: &str = "xzlib";

/// Decodes an `.xz` (or `.lzma`) stream into `out`.
///
/// The auto decoder accepts both container types, so this also serves as a
/// fallback for raw LZMA input.
pub fn decode(input: &[u8], out: &mut [u8]) -> Result<usize> {
    let mut stream = Stream::new_auto_decoder(u64::MAX, 0)
        .map_err(|e| Error::codec_error(CODEC, format!("unxz error: {}", e)))?;
    stream
        .process(input, out, Action::Run)
        .map_err(|e| Error::codec_error(CODEC, format!("unxz error: {}", e)))?;
    Ok(stream.total_out() as usize)
}
