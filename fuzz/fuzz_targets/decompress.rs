//! Fuzz target for detection and builtin decoding of arbitrary bytes.
//!
//! Forking is disabled, so only the in-process codecs run. The goal is to
//! find panics, hangs, or output beyond the byte ceiling.
//!
//! Run with: cargo +nightly fuzz run decompress

#![no_main]

use libfuzzer_sys::fuzz_target;
use zmagic::{DecodeRequest, DecompressOptions, Decompressor, Outcome};

fuzz_target!(|data: &[u8]| {
    // First byte picks the ceiling so small buffers are exercised too.
    let Some((&ceiling, data)) = data.split_first() else {
        return;
    };
    let max_bytes = usize::from(ceiling) * 256;
    let decompressor =
        Decompressor::new(DecompressOptions::new().max_bytes(max_bytes).allow_fork(false));

    if let Some(detection) = decompressor.decompress(&DecodeRequest::new(data)) {
        if let Outcome::Data(out) = &detection.outcome {
            assert!(out.len() <= max_bytes);
        }
        let _ = detection.describe_error(true);
        let _ = detection.describe_error(false);
    }
});
