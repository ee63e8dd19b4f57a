//! BZip2 codec.

use bzip2::{Decompress, Error as BzError};

use crate::{Error, Result};

const CODEC: &str = "bzlib";

/// Decodes a bzip2 stream into `out` with a single decompress call.
///
/// Running out of output space is not an error; the stream simply stops
/// where `out` is full.
pub fn decode(input: &[u8], out: &mut [u8]) -> Result<usize> {
    let mut stream = Decompress::new(false);
    stream
        .decompress(input, out)
        .map_err(|e| Error::codec_error(CODEC, format!("bunzip error: {}", describe(&e))))?;
    Ok(stream.total_out() as usize)
}

fn describe(error: &BzError) -> &'static str {
    match error {
        BzError::DataMagic => "not a bzip2 file",
        BzError::Data => "data integrity error",
        BzError::Sequence => "sequence error",
        BzError::Param => "parameter error",
        #[allow(unreachable_patterns)]
        _ => "decompression error",
    }
}
