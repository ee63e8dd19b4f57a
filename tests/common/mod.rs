//! Shared test utilities for integration tests.
//!
//! Fixture builders produce compressed data in memory with the same codec
//! crates the library decodes with; the tool helpers let subprocess tests
//! skip themselves when an external decompressor is not installed.
//!
//! Note: `#![allow(dead_code)]` is required because each integration test file
//! compiles as a separate crate and may only use a subset of these helpers.

#![allow(dead_code)]

use std::io::Write;
use std::process::{Command, Stdio};

/// Plaintext used by most round-trip tests.
pub fn sample_text() -> Vec<u8> {
    b"The quick brown fox jumps over the lazy dog.\n".repeat(200)
}

/// Returns true if `program` can be found on `PATH`.
pub fn tool_available(program: &str) -> bool {
    std::env::var_os("PATH")
        .map(|paths| std::env::split_paths(&paths).any(|dir| dir.join(program).is_file()))
        .unwrap_or(false)
}

/// Returns true if `program` is missing, after noting that the test is
/// skipped.
pub fn skip_without(program: &str) -> bool {
    if tool_available(program) {
        return false;
    }
    eprintln!("skipping: `{}` not found on PATH", program);
    true
}

/// Compresses `data` by piping it through an external tool.
///
/// Returns `None` if the tool is missing or fails.
pub fn compress_with_tool(argv: &[&str], data: &[u8]) -> Option<Vec<u8>> {
    let (program, args) = argv.split_first()?;
    if !tool_available(program) {
        return None;
    }
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .ok()?;

    let mut stdin = child.stdin.take()?;
    let input = data.to_vec();
    let feeder = std::thread::spawn(move || stdin.write_all(&input));

    let output = child.wait_with_output().ok()?;
    feeder.join().ok()?.ok()?;
    output.status.success().then_some(output.stdout)
}

#[cfg(feature = "deflate")]
pub fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

#[cfg(feature = "deflate")]
pub fn zlib(data: &[u8]) -> Vec<u8> {
    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

#[cfg(feature = "bzip2")]
pub fn bzip2(data: &[u8]) -> Vec<u8> {
    let mut encoder = bzip2::write::BzEncoder::new(Vec::new(), bzip2::Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

#[cfg(feature = "xz")]
pub fn xz(data: &[u8]) -> Vec<u8> {
    let mut encoder = xz2::write::XzEncoder::new(Vec::new(), 6);
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

#[cfg(feature = "zstd")]
pub fn zstd(data: &[u8]) -> Vec<u8> {
    zstd::encode_all(data, 3).unwrap()
}

#[cfg(feature = "lz4")]
pub fn lz4(data: &[u8]) -> Vec<u8> {
    let mut encoder = lz4_flex::frame::FrameEncoder::new(Vec::new());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// Raw LZMA stream with an end marker, no header.
#[cfg(feature = "lzma")]
fn raw_lzma(data: &[u8], dict_size: u32) -> Vec<u8> {
    let mut opts = lzma_rust2::LzmaOptions::with_preset(6);
    opts.dict_size = dict_size;
    let mut compressed = Vec::new();
    {
        let mut writer =
            lzma_rust2::LzmaWriter::new_no_header(&mut compressed, &opts, true).unwrap();
        writer.write_all(data).unwrap();
        writer.finish().unwrap();
    }
    compressed
}

/// `.lzma` file: 13-byte header with unknown size, then the stream.
#[cfg(feature = "lzma")]
pub fn lzma_alone(data: &[u8]) -> Vec<u8> {
    let dict_size = 1u32 << 20;
    let mut out = vec![0x5D];
    out.extend_from_slice(&dict_size.to_le_bytes());
    out.extend_from_slice(&u64::MAX.to_le_bytes());
    out.extend_from_slice(&raw_lzma(data, dict_size));
    out
}

/// Single-member lzip file.
#[cfg(feature = "lzma")]
pub fn lzip(data: &[u8]) -> Vec<u8> {
    let mut out = b"LZIP\x01".to_vec();
    out.push(20); // 1 MiB dictionary
    out.extend_from_slice(&raw_lzma(data, 1 << 20));
    out.extend_from_slice(&crc32fast::hash(data).to_le_bytes());
    out.extend_from_slice(&(data.len() as u64).to_le_bytes());
    let member_size = (out.len() + 8) as u64;
    out.extend_from_slice(&member_size.to_le_bytes());
    out
}

/// Number of descriptors this process has open.
#[cfg(target_os = "linux")]
pub fn open_fd_count() -> usize {
    std::fs::read_dir("/proc/self/fd").unwrap().count()
}
