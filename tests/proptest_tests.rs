//! Property-based tests using proptest.
//!
//! These tests verify detection and decoding invariants on randomly
//! generated inputs. Forking is disabled throughout, so only builtin
//! decoders run.

use proptest::prelude::*;
use zmagic::codec::{Signature, id};
use zmagic::format::matching_methods;
use zmagic::{DecodeRequest, DecompressOptions, Decompressor, METHODS, MethodId, Outcome};

/// Fixed magics from the registry, paired with their index.
fn magics() -> Vec<(usize, &'static [u8])> {
    METHODS
        .iter()
        .enumerate()
        .filter_map(|(i, m)| match m.signature {
            Signature::Magic(magic) => Some((i, magic)),
            Signature::Predicate { .. } => None,
        })
        .collect()
}

/// Strategy for a registry magic followed by arbitrary bytes.
fn magic_with_tail() -> impl Strategy<Value = (usize, Vec<u8>)> {
    let magics = magics();
    (0..magics.len(), proptest::collection::vec(any::<u8>(), 0..512)).prop_map(
        move |(pick, tail)| {
            let (index, magic) = magics[pick];
            let mut data = magic.to_vec();
            data.extend_from_slice(&tail);
            (index, data)
        },
    )
}

/// Strategy for a header that only a predicate or a header parser accepts,
/// followed by arbitrary bytes: raw LZMA, zlib, or an lzip member header.
fn predicate_header_with_tail() -> impl Strategy<Value = (MethodId, Vec<u8>)> {
    let lzma = (any::<[u8; 2]>(), any::<[u8; 7]>(), any::<bool>()).prop_map(|(dict, size, known)| {
        let mut header = vec![0x5D, 0x00, 0x00, dict[0], dict[1]];
        header.extend_from_slice(&size);
        header.push(if known { 0x00 } else { 0xFF });
        (id::LZMA, header)
    });
    let zlib = prop::sample::select(vec![0x01u8, 0x5E, 0x9C, 0xDA])
        .prop_map(|flg| (id::ZLIB, vec![0x78, flg]));
    let lzip = any::<u8>().prop_map(|dict| (id::LZIP, vec![b'L', b'Z', b'I', b'P', 0x01, dict]));

    (
        prop_oneof![lzma, zlib, lzip],
        proptest::collection::vec(any::<u8>(), 0..512),
    )
        .prop_map(|((method, mut data), tail)| {
            data.extend_from_slice(&tail);
            (method, data)
        })
}

fn builtin_only(max_bytes: usize) -> Decompressor {
    Decompressor::new(DecompressOptions::new().max_bytes(max_bytes).allow_fork(false))
}

proptest! {
    /// A fixed magic is detected as the earliest registry entry carrying it.
    #[test]
    fn magic_detected_in_priority_order((index, data) in magic_with_tail()) {
        let first = zmagic::detect(&data).unwrap();
        let magic = match METHODS[index].signature {
            Signature::Magic(magic) => magic,
            Signature::Predicate { .. } => unreachable!(),
        };
        let earliest = METHODS
            .iter()
            .position(|m| matches!(m.signature, Signature::Magic(other) if other == magic))
            .unwrap();
        prop_assert_eq!(first, MethodId(earliest));
        // Nothing earlier than the owner of the magic matches.
        for (id, _) in matching_methods(&data) {
            prop_assert!(id.0 >= earliest);
        }
    }

    /// Decoding arbitrary data never panics and never exceeds the ceiling.
    #[test]
    fn arbitrary_input_is_handled(
        data in proptest::collection::vec(any::<u8>(), 0..1024),
        max_bytes in 0usize..4096,
    ) {
        if let Some(detection) = builtin_only(max_bytes).decompress(&DecodeRequest::new(&data)) {
            if let Outcome::Data(out) = &detection.outcome {
                prop_assert!(out.len() <= max_bytes);
                prop_assert_eq!(out.as_bytes_with_nul().last(), Some(&0));
            }
        }
    }

    /// Magic plus garbage never panics either; this reaches the codecs.
    #[test]
    fn garbage_after_magic_is_handled(
        (_index, data) in magic_with_tail(),
        max_bytes in 1usize..2048,
    ) {
        let detection = builtin_only(max_bytes).decompress(&DecodeRequest::new(&data));
        prop_assert!(detection.is_some());
        let detection = detection.unwrap();
        if let Outcome::Data(out) = &detection.outcome {
            prop_assert!(out.len() <= max_bytes);
        }
    }

    /// Garbage behind a raw LZMA, zlib or lzip header is handled by the
    /// builtin decoders without panicking or exceeding the ceiling.
    #[test]
    fn garbage_after_predicate_header_is_handled(
        (method, data) in predicate_header_with_tail(),
        max_bytes in 0usize..4096,
    ) {
        let detection = builtin_only(max_bytes).decompress(&DecodeRequest::new(&data));
        prop_assert!(detection.is_some());
        let detection = detection.unwrap();
        prop_assert_eq!(detection.method, method);
        if let Outcome::Data(out) = &detection.outcome {
            prop_assert!(out.len() <= max_bytes);
            prop_assert_eq!(out.as_bytes_with_nul().last(), Some(&0));
        }
    }

    /// Input shorter than a method's signature is never an error.
    #[test]
    fn short_input_is_no_data(index in 0..METHODS.len(), fill in any::<u8>()) {
        let len = METHODS[index].signature.len();
        let data = vec![fill; len.saturating_sub(1)];
        let outcome = builtin_only(64).decompress_with(MethodId(index), &DecodeRequest::new(&data));
        prop_assert_eq!(outcome, Outcome::NoData);
    }
}
