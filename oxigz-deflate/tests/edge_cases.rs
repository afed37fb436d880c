//! Edge case tests for DEFLATE decompression.

use flate2::Compression;
use flate2::write::DeflateEncoder;
use oxigz_core::{BitReader, ErrorKind};
use oxigz_deflate::{Inflater, inflate};
use std::io::{Cursor, Write};

fn deflate(input: &[u8], level: u32) -> Vec<u8> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::new(level));
    encoder.write_all(input).unwrap();
    encoder.finish().unwrap()
}

#[test]
fn test_empty_input() {
    let compressed = deflate(b"", 6);
    assert!(inflate(&compressed).unwrap().is_empty());
}

#[test]
fn test_single_byte() {
    let compressed = deflate(b"A", 6);
    assert_eq!(inflate(&compressed).unwrap(), b"A");
}

#[test]
fn test_all_same_byte() {
    let input = vec![255u8; 5000];
    let compressed = deflate(&input, 6);
    assert!(compressed.len() < input.len() / 20);
    assert_eq!(inflate(&compressed).unwrap(), input);
}

#[test]
fn test_max_match_length() {
    let input = vec![42u8; 258 * 10];
    let compressed = deflate(&input, 9);
    assert_eq!(inflate(&compressed).unwrap(), input);
}

#[test]
fn test_incompressible_data() {
    let mut seed = 12345u64;
    let input: Vec<u8> = (0..70_000)
        .map(|_| {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1);
            (seed >> 56) as u8
        })
        .collect();

    let compressed = deflate(&input, 6);
    assert_eq!(inflate(&compressed).unwrap(), input);
}

#[test]
fn test_long_distance_matches() {
    // Repeats a 30 KB block so matches reach near the full window
    let mut seed = 7u64;
    let block: Vec<u8> = (0..30_000)
        .map(|_| {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1);
            b'a' + ((seed >> 40) % 26) as u8
        })
        .collect();
    let mut input = block.clone();
    input.extend_from_slice(&block);
    input.extend_from_slice(&block);

    let compressed = deflate(&input, 9);
    assert!(compressed.len() < input.len() / 2);
    assert_eq!(inflate(&compressed).unwrap(), input);
}

#[test]
fn test_one_byte_at_a_time() {
    let input = b"The quick brown fox jumps over the lazy dog. ".repeat(200);
    let compressed = deflate(&input, 6);

    let mut reader = BitReader::new(Cursor::new(&compressed[..]));
    let mut inflater = Inflater::new();
    let mut output = Vec::new();
    let mut byte = [0u8; 1];
    while inflater.inflate_into(&mut reader, &mut byte).unwrap() == 1 {
        output.push(byte[0]);
    }

    assert_eq!(output, input);
    assert_eq!(inflater.inflate_into(&mut reader, &mut byte).unwrap(), 0);
}

#[test]
fn test_garbage_is_rejected() {
    // Dynamic block header announcing more literal codes than exist
    let err = inflate(&[0xFD, 0xFF, 0xFF, 0xFF]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CorruptData);
}
