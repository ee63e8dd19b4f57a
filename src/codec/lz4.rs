//! LZ4 frame codec.

use lz4_flex::frame::FrameDecoder;

use crate::Result;

use super::read_bounded;

/// Decodes LZ4 frames into `out`.
pub fn decode(input: &[u8], out: &mut [u8]) -> Result<usize> {
    read_bounded(FrameDecoder::new(input), out, "lz4")
}
