//! External decompressor round trips.
//!
//! Each test compresses a plaintext with a real tool and pipes it back
//! through the matching decompression command line. Tests skip themselves
//! when the tool is not installed.
#![cfg(unix)]

mod common;

use std::io::Write;
use std::time::{Duration, Instant};

use zmagic::codec::{argv, id};
use zmagic::pipeline::{self, SigpipeGuard};
use zmagic::{DecodeRequest, DecompressOptions, Decompressor, Error, Outcome};

fn round_trip(compress: &[&str], decompress: &[&str]) {
    let plain = common::sample_text();
    let Some(compressed) = common::compress_with_tool(compress, &plain) else {
        eprintln!("skipping: cannot run {:?}", compress);
        return;
    };
    if common::skip_without(decompress[0]) {
        return;
    }
    let _guard = SigpipeGuard::acquire();
    let options = DecompressOptions::default();

    // Whole plaintext.
    let mut out = vec![0u8; plain.len() + 16];
    let n = pipeline::run(decompress, &compressed, None, &mut out, &options).unwrap();
    assert_eq!(&out[..n], &plain[..], "{:?}", decompress);

    // Truncated to the ceiling.
    let mut out = vec![0u8; 100];
    let n = pipeline::run(decompress, &compressed, None, &mut out, &options).unwrap();
    assert_eq!(&out[..n], &plain[..100], "{:?}", decompress);
}

#[test]
fn gzip_round_trip() {
    round_trip(&["gzip", "-c"], argv::GZIP);
}

#[test]
fn bzip2_round_trip() {
    round_trip(&["bzip2", "-c"], argv::BZIP2);
}

#[test]
fn xz_round_trip() {
    round_trip(&["xz", "-c"], argv::XZ);
}

#[test]
fn raw_lzma_round_trip_via_xz() {
    round_trip(&["xz", "--format=lzma", "-c"], argv::XZ);
}

#[test]
fn zstd_round_trip() {
    round_trip(&["zstd", "-q", "-c"], argv::ZSTD);
}

#[test]
fn lz4_round_trip() {
    round_trip(&["lz4", "-q", "-c"], argv::LZ4);
}

#[test]
fn lzip_round_trip() {
    round_trip(&["lzip", "-c"], argv::LZIP);
}

#[test]
fn zlib_round_trip_via_python() {
    let script = "import sys, zlib; sys.stdout.buffer.write(zlib.compress(sys.stdin.buffer.read()))";
    round_trip(&["python3", "-c", script], argv::ZLIB);
}

#[test]
fn compress_magic_goes_through_gzip() {
    let plain = common::sample_text();
    let Some(compressed) = common::compress_with_tool(&["compress", "-c"], &plain) else {
        eprintln!("skipping: compress not available");
        return;
    };
    if common::skip_without("gzip") {
        return;
    }
    let decompressor = Decompressor::new(DecompressOptions::new().max_bytes(plain.len()));
    let detection = decompressor.decompress(&DecodeRequest::new(&compressed)).unwrap();
    assert_eq!(detection.method, id::COMPRESS);
    assert_eq!(detection.outcome.data().unwrap().as_bytes(), &plain[..]);
}

#[test]
fn gzip_diagnostic_becomes_err_data() {
    if common::skip_without("gzip") {
        return;
    }
    // compress(1) header claiming 31-bit codes, which gzip refuses.
    let decompressor = Decompressor::default();
    let detection = decompressor
        .decompress(&DecodeRequest::new(b"\x1f\x9d\x9f\x00\x01\x02\x03"))
        .unwrap();
    assert_eq!(detection.method, id::COMPRESS);
    let message = detection.outcome.error_message().expect("ErrData");
    assert!(!message.is_empty());
    assert!(!message.contains('\n'));
    assert!(!message.starts_with(|c: char| c.is_ascii_lowercase()));
}

#[test]
fn unbounded_child_is_stopped_at_ceiling() {
    if common::skip_without("head") {
        return;
    }
    let _guard = SigpipeGuard::acquire();
    let argv = ["head", "-c", "10485760", "/dev/zero"];
    let mut out = vec![0xAAu8; 1024];

    let start = Instant::now();
    let n = pipeline::run(&argv, b"", None, &mut out, &DecompressOptions::default()).unwrap();
    // `run` reaps the child before returning, so it has terminated.
    assert_eq!(n, 1024);
    assert!(out.iter().all(|&b| b == 0));
    assert!(start.elapsed() < Duration::from_secs(30));
}

#[test]
fn endless_child_is_stopped_at_ceiling() {
    if common::skip_without("yes") {
        return;
    }
    let _guard = SigpipeGuard::acquire();
    let mut out = vec![0u8; 1024];
    let n = pipeline::run(&["yes", "compressed"], b"", None, &mut out, &DecompressOptions::default())
        .unwrap();
    assert_eq!(n, 1024);
}

#[test]
fn seekable_source_is_read_from_start() {
    let plain = common::sample_text();
    let Some(compressed) = common::compress_with_tool(&["gzip", "-c"], &plain) else {
        eprintln!("skipping: gzip not available");
        return;
    };
    let mut file = tempfile::tempfile().unwrap();
    file.write_all(&compressed).unwrap();
    // The file position is at the end; the decompressor must still see it all.

    let _guard = SigpipeGuard::acquire();
    let mut out = vec![0u8; plain.len()];
    let n = pipeline::run(
        argv::GZIP,
        &compressed[..4],
        Some(&file),
        &mut out,
        &DecompressOptions::default(),
    )
    .unwrap();
    assert_eq!(&out[..n], &plain[..]);
}

#[test]
fn missing_tool_is_err_data_not_panic() {
    let options = DecompressOptions::new().search_path("/nonexistent-zmagic-path");
    let decompressor = Decompressor::new(options);
    let outcome = decompressor.decompress_with(id::LRZIP, &DecodeRequest::new(b"LRZI\x00\x06data"));
    match outcome {
        Outcome::ErrData(message) => {
            assert!(message.starts_with("Cannot spawn `lrzip'"), "{message}")
        }
        other => panic!("unexpected outcome {:?}", other),
    }
}

#[test]
fn spawn_error_is_subprocess_error() {
    let mut out = [0u8; 8];
    let err = pipeline::run(
        &["zmagic-missing-tool"],
        b"",
        None,
        &mut out,
        &DecompressOptions::default(),
    )
    .unwrap_err();
    assert!(err.is_subprocess_error());
    assert!(matches!(err, Error::Spawn { .. }));
}

#[test]
fn concurrent_callers_each_get_their_output() {
    if common::skip_without("gzip") {
        return;
    }
    let _guard = SigpipeGuard::acquire();
    let handles: Vec<_> = (0..8)
        .map(|i| {
            std::thread::spawn(move || {
                let plain = vec![b'a' + i as u8; 512 * 1024];
                let compressed = common::compress_with_tool(&["gzip", "-c"], &plain).unwrap();
                let mut out = vec![0u8; 4096];
                let options = DecompressOptions::default();
                let n = pipeline::run(argv::GZIP, &compressed, None, &mut out, &options).unwrap();
                assert_eq!(n, 4096);
                assert!(out.iter().all(|&b| b == b'a' + i as u8));
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
}
