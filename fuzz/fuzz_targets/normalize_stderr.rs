//! Fuzz target for the decompressor stderr normalizer.
//!
//! Run with: cargo +nightly fuzz run normalize_stderr

#![no_main]

use libfuzzer_sys::fuzz_target;
use zmagic::diagnostic::{format_decompression_error, normalize_stderr};

fuzz_target!(|data: &[u8]| {
    let message = normalize_stderr(data);
    assert!(!message.contains('\n'));
    let token = format_decompression_error("fuzz", &message, true);
    assert!(token.is_ascii());
});
