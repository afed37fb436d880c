//! DEFLATE decompression (inflate).
//!
//! This module implements RFC 1951 decompression for all three block types:
//! - Type 0: Stored (uncompressed)
//! - Type 1: Fixed Huffman codes
//! - Type 2: Dynamic Huffman codes
//!
//! Unlike a one-shot decoder, [`Inflater`] can stop after any number of output
//! bytes and continue later, even in the middle of a stored block or a
//! back-reference. Together with [`BitReader::state`] a clone of the inflater
//! is a complete resume point.
//!
//! # Example
//!
//! ```rust
//! use oxigz_core::BitReader;
//! use oxigz_deflate::Inflater;
//! use std::io::Cursor;
//!
//! // Stored block holding "Hello"
//! let data = [0x01, 0x05, 0x00, 0xFA, 0xFF, b'H', b'e', b'l', b'l', b'o'];
//! let mut reader = BitReader::new(Cursor::new(&data[..]));
//! let mut inflater = Inflater::new();
//!
//! let mut out = [0u8; 3];
//! assert_eq!(inflater.inflate_into(&mut reader, &mut out).unwrap(), 3);
//! assert_eq!(&out, b"Hel");
//! assert_eq!(inflater.inflate_into(&mut reader, &mut out).unwrap(), 2);
//! assert_eq!(&out[..2], b"lo");
//! assert!(inflater.is_finished());
//! ```

use crate::huffman::{END_OF_BLOCK, HuffmanTree};
use crate::tables::{
    CODE_LENGTH_ORDER, DISTANCE_EXTRA_BITS, LENGTH_EXTRA_BITS, decode_distance, decode_length,
    fixed_distance_tree, fixed_litlen_tree,
};
use oxigz_core::error::{OxiGzError, Result};
use oxigz_core::{BitReader, RingBuffer};
use std::io::Read;
use std::sync::Arc;

/// Huffman tables of the current block.
#[derive(Debug, Clone)]
enum BlockTables {
    Fixed,
    Dynamic(Arc<DynamicTables>),
}

#[derive(Debug)]
struct DynamicTables {
    litlen: HuffmanTree,
    distance: HuffmanTree,
}

impl BlockTables {
    fn litlen(&self) -> &HuffmanTree {
        match self {
            Self::Fixed => fixed_litlen_tree(),
            Self::Dynamic(tables) => &tables.litlen,
        }
    }

    fn distance(&self) -> &HuffmanTree {
        match self {
            Self::Fixed => fixed_distance_tree(),
            Self::Dynamic(tables) => &tables.distance,
        }
    }
}

/// A back-reference that did not fit in the caller's buffer.
#[derive(Debug, Clone, Copy)]
struct PendingMatch {
    distance: usize,
    remaining: usize,
}

/// Where the decoder stands inside the block structure.
#[derive(Debug, Clone)]
enum BlockState {
    /// Next bits are a block header.
    Header,
    /// Inside a stored block.
    Stored { remaining: u16 },
    /// Inside a Huffman coded block.
    Huffman {
        tables: BlockTables,
        pending: Option<PendingMatch>,
    },
    /// The final block has ended.
    Done,
}

/// Resumable DEFLATE decompressor.
///
/// Output is produced in caller-sized chunks by [`Inflater::inflate_into`].
/// Cloning is cheap apart from the 32 KiB history window; dynamic Huffman
/// tables are shared between clones.
#[derive(Debug, Clone)]
pub struct Inflater {
    /// History window for back-references.
    window: RingBuffer,
    state: BlockState,
    /// Whether the current block is marked final.
    final_block: bool,
    /// Total bytes produced so far.
    total_out: u64,
}

impl Inflater {
    /// Create a new DEFLATE decompressor.
    pub fn new() -> Self {
        Self {
            window: RingBuffer::deflate(),
            state: BlockState::Header,
            final_block: false,
            total_out: 0,
        }
    }

    /// Whether the end of the final block has been decoded.
    pub fn is_finished(&self) -> bool {
        matches!(self.state, BlockState::Done)
    }

    /// Total number of bytes produced since the stream start.
    pub fn total_out(&self) -> u64 {
        self.total_out
    }

    /// Decompress up to `out.len()` bytes.
    ///
    /// Returns the number of bytes written. A return value smaller than
    /// `out.len()` means the stream has ended; after that every call returns
    /// 0. The reader is never read beyond the end of the final block except
    /// for the bits already buffered in the [`BitReader`].
    pub fn inflate_into<R: Read>(
        &mut self,
        reader: &mut BitReader<R>,
        out: &mut [u8],
    ) -> Result<usize> {
        let mut produced = 0;

        while produced < out.len() {
            match &mut self.state {
                BlockState::Done => break,
                BlockState::Header => {
                    self.state = self.read_block_header(reader)?;
                }
                BlockState::Stored { remaining } => {
                    let n = (*remaining as usize).min(out.len() - produced);
                    let chunk = &mut out[produced..produced + n];
                    reader.read_bytes(chunk)?;
                    self.window.write_bytes(chunk);
                    *remaining -= n as u16;
                    produced += n;

                    if *remaining == 0 {
                        self.end_block();
                    }
                }
                BlockState::Huffman { tables, pending } => {
                    let (n, end_of_block) =
                        decode_huffman(&mut self.window, tables, pending, reader, &mut out[produced..])?;
                    produced += n;

                    if end_of_block {
                        self.end_block();
                    }
                }
            }
        }

        self.total_out += produced as u64;
        Ok(produced)
    }

    /// Decompress everything that remains into a vector.
    pub fn inflate_to_end<R: Read>(&mut self, reader: &mut BitReader<R>) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        let mut buf = vec![0u8; 32 * 1024];

        loop {
            let n = self.inflate_into(reader, &mut buf)?;
            output.extend_from_slice(&buf[..n]);
            if n < buf.len() {
                return Ok(output);
            }
        }
    }

    fn end_block(&mut self) {
        self.state = if self.final_block {
            BlockState::Done
        } else {
            BlockState::Header
        };
    }

    fn read_block_header<R: Read>(&mut self, reader: &mut BitReader<R>) -> Result<BlockState> {
        self.final_block = reader.read_bit()?;
        let btype = reader.read_bits(2)?;

        match btype {
            0 => self.read_stored_header(reader),
            1 => Ok(BlockState::Huffman {
                tables: BlockTables::Fixed,
                pending: None,
            }),
            2 => Ok(BlockState::Huffman {
                tables: BlockTables::Dynamic(Arc::new(read_dynamic_tables(reader)?)),
                pending: None,
            }),
            _ => Err(OxiGzError::corrupted(
                reader.bit_position() / 8,
                "Reserved block type 3",
            )),
        }
    }

    fn read_stored_header<R: Read>(&mut self, reader: &mut BitReader<R>) -> Result<BlockState> {
        reader.align_to_byte();

        let len = reader.read_bits(16)? as u16;
        let nlen = reader.read_bits(16)? as u16;

        if len != !nlen {
            return Err(OxiGzError::corrupted(
                reader.bit_position() / 8,
                format!("LEN/NLEN mismatch: {} vs {}", len, !nlen),
            ));
        }

        if len == 0 {
            return Ok(if self.final_block {
                BlockState::Done
            } else {
                BlockState::Header
            });
        }

        Ok(BlockState::Stored { remaining: len })
    }
}

impl Default for Inflater {
    fn default() -> Self {
        Self::new()
    }
}

/// Read the code length sequences of a dynamic block and build its trees.
fn read_dynamic_tables<R: Read>(reader: &mut BitReader<R>) -> Result<DynamicTables> {
    let hlit = reader.read_bits(5)? as usize + 257;
    let hdist = reader.read_bits(5)? as usize + 1;
    let hclen = reader.read_bits(4)? as usize + 4;

    if hlit > 286 || hdist > 30 {
        return Err(OxiGzError::corrupted(
            reader.bit_position() / 8,
            format!("Too many codes: {} literal/length, {} distance", hlit, hdist),
        ));
    }

    let mut code_length_lengths = [0u8; 19];
    for &slot in CODE_LENGTH_ORDER.iter().take(hclen) {
        code_length_lengths[slot] = reader.read_bits(3)? as u8;
    }
    let code_length_tree = build_tree(&code_length_lengths, reader)?;

    let mut all_lengths = vec![0u8; hlit + hdist];
    let mut i = 0;

    while i < all_lengths.len() {
        let code = code_length_tree.decode(reader)?;

        let (value, repeat) = match code {
            0..=15 => (code as u8, 1),
            16 => {
                if i == 0 {
                    return Err(OxiGzError::corrupted(
                        reader.bit_position() / 8,
                        "Code 16 at start of lengths",
                    ));
                }
                (all_lengths[i - 1], reader.read_bits(2)? as usize + 3)
            }
            17 => (0, reader.read_bits(3)? as usize + 3),
            18 => (0, reader.read_bits(7)? as usize + 11),
            _ => return Err(OxiGzError::invalid_huffman(reader.bit_position())),
        };

        if i + repeat > all_lengths.len() {
            return Err(OxiGzError::corrupted(
                reader.bit_position() / 8,
                "Code length overflow",
            ));
        }
        all_lengths[i..i + repeat].fill(value);
        i += repeat;
    }

    if all_lengths[END_OF_BLOCK as usize] == 0 {
        return Err(OxiGzError::corrupted(
            reader.bit_position() / 8,
            "Missing end-of-block code",
        ));
    }

    Ok(DynamicTables {
        litlen: build_tree(&all_lengths[..hlit], reader)?,
        distance: build_tree(&all_lengths[hlit..], reader)?,
    })
}

/// Build a tree of a dynamic block; errors carry the reader's byte offset.
fn build_tree<R: Read>(lengths: &[u8], reader: &BitReader<R>) -> Result<HuffmanTree> {
    HuffmanTree::from_code_lengths(lengths).map_err(|err| match err {
        OxiGzError::CorruptedData { message, .. } => {
            OxiGzError::corrupted(reader.bit_position() / 8, message)
        }
        other => other,
    })
}

/// Decode Huffman symbols into `out` until it is full or the block ends.
///
/// Returns the bytes written and whether the end-of-block code was read.
fn decode_huffman<R: Read>(
    window: &mut RingBuffer,
    tables: &BlockTables,
    pending: &mut Option<PendingMatch>,
    reader: &mut BitReader<R>,
    out: &mut [u8],
) -> Result<(usize, bool)> {
    let mut produced = 0;

    if let Some(mut m) = pending.take() {
        let n = m.remaining.min(out.len());
        window.copy_from_history(m.distance, &mut out[..n])?;
        produced += n;
        m.remaining -= n;
        if m.remaining > 0 {
            *pending = Some(m);
            return Ok((produced, false));
        }
    }

    let litlen_tree = tables.litlen();
    let dist_tree = tables.distance();

    while produced < out.len() {
        let code = litlen_tree.decode(reader)?;

        if code < 256 {
            out[produced] = code as u8;
            window.write_byte(code as u8);
            produced += 1;
        } else if code == END_OF_BLOCK {
            return Ok((produced, true));
        } else if code <= 285 {
            let extra_bits = LENGTH_EXTRA_BITS[(code - 257) as usize];
            let extra = reader.read_bits(extra_bits)? as u16;
            let length = decode_length(code, extra) as usize;

            let dist_code = dist_tree.decode(reader)?;
            if dist_code >= 30 {
                return Err(OxiGzError::corrupted(
                    reader.bit_position() / 8,
                    format!("Invalid distance code: {}", dist_code),
                ));
            }
            let dist_extra = reader.read_bits(DISTANCE_EXTRA_BITS[dist_code as usize])? as u16;
            let distance = decode_distance(dist_code, dist_extra) as usize;

            let n = length.min(out.len() - produced);
            window.copy_from_history(distance, &mut out[produced..produced + n])?;
            produced += n;

            if n < length {
                *pending = Some(PendingMatch {
                    distance,
                    remaining: length - n,
                });
            }
        } else {
            return Err(OxiGzError::corrupted(
                reader.bit_position() / 8,
                format!("Invalid literal/length code: {}", code),
            ));
        }
    }

    Ok((produced, false))
}

/// Decompress DEFLATE data.
pub fn inflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut reader = BitReader::new(std::io::Cursor::new(data));
    Inflater::new().inflate_to_end(&mut reader)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::DeflateEncoder;
    use oxigz_core::ErrorKind;
    use std::io::{Cursor, Write};

    fn deflate_with(data: &[u8], level: u32) -> Vec<u8> {
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::new(level));
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    fn sample_text(len: usize) -> Vec<u8> {
        let words = [&b"alpha "[..], b"beta ", b"gamma ", b"delta\n", b"epsilon "];
        let mut seed = 42u64;
        let mut data = Vec::with_capacity(len);
        while data.len() < len {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1);
            data.extend_from_slice(words[(seed >> 33) as usize % words.len()]);
        }
        data.truncate(len);
        data
    }

    #[test]
    fn test_inflate_stored() {
        let compressed = vec![
            0x01, // BFINAL=1, BTYPE=00
            0x05, 0x00, // LEN=5
            0xFA, 0xFF, // NLEN
            b'H', b'e', b'l', b'l', b'o',
        ];

        assert_eq!(inflate(&compressed).unwrap(), b"Hello");
    }

    #[test]
    fn test_inflate_empty() {
        let compressed = vec![0x01, 0x00, 0x00, 0xFF, 0xFF];
        assert!(inflate(&compressed).unwrap().is_empty());
    }

    #[test]
    fn test_inflate_all_levels() {
        let data = sample_text(100_000);
        for level in [0, 1, 6, 9] {
            let compressed = deflate_with(&data, level);
            assert_eq!(inflate(&compressed).unwrap(), data, "level {}", level);
        }
    }

    #[test]
    fn test_small_output_chunks() {
        let data = sample_text(20_000);
        let compressed = deflate_with(&data, 6);

        for chunk in [1usize, 7, 258, 4096] {
            let mut reader = BitReader::new(Cursor::new(&compressed[..]));
            let mut inflater = Inflater::new();
            let mut output = Vec::new();
            let mut buf = vec![0u8; chunk];
            loop {
                let n = inflater.inflate_into(&mut reader, &mut buf).unwrap();
                output.extend_from_slice(&buf[..n]);
                if n < chunk {
                    break;
                }
            }
            assert_eq!(output, data, "chunk size {}", chunk);
            assert!(inflater.is_finished());
            assert_eq!(inflater.total_out(), data.len() as u64);
        }
    }

    #[test]
    fn test_resume_from_clone() {
        let data = sample_text(60_000);
        let compressed = deflate_with(&data, 9);

        let mut reader = BitReader::new(Cursor::new(&compressed[..]));
        let mut inflater = Inflater::new();
        let mut head = vec![0u8; 25_001];
        assert_eq!(inflater.inflate_into(&mut reader, &mut head).unwrap(), head.len());

        let saved = inflater.clone();
        let bits = reader.state();
        let position = reader.get_ref().position();

        let first = inflater.inflate_to_end(&mut reader).unwrap();

        let mut cursor = Cursor::new(&compressed[..]);
        cursor.set_position(position);
        let mut resumed_reader = BitReader::resume(cursor, bits);
        let mut resumed = saved;
        let second = resumed.inflate_to_end(&mut resumed_reader).unwrap();

        assert_eq!(first, second);
        assert_eq!(&first[..], &data[head.len()..]);
    }

    #[test]
    fn test_end_of_stream_is_detected() {
        let data = sample_text(5_000);
        let mut compressed = deflate_with(&data, 6);
        let deflate_len = compressed.len();
        compressed.extend_from_slice(&[0xAA; 16]);

        let mut reader = BitReader::new(Cursor::new(&compressed[..]));
        let mut inflater = Inflater::new();
        assert_eq!(inflater.inflate_to_end(&mut reader).unwrap(), data);

        reader.align_to_byte();
        let consumed = reader.get_ref().position() as usize - reader.buffered_bytes();
        assert_eq!(consumed, deflate_len);
    }

    #[test]
    fn test_reserved_block_type() {
        let err = inflate(&[0x07, 0x00]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CorruptData);
    }

    #[test]
    fn test_stored_length_mismatch() {
        let err = inflate(&[0x01, 0x05, 0x00, 0x00, 0x00, b'H']).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CorruptData);
    }

    #[test]
    fn test_distance_before_output_start() {
        // Fixed block: length code 257 followed by distance code 0 with no history
        let err = inflate(&[0x03, 0x02, 0x00]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CorruptData);
    }

    #[test]
    fn test_bad_table_reports_offset() {
        // 16-byte stored block, then a dynamic block whose code length code is over-subscribed
        let mut data = vec![0x00, 0x10, 0x00, 0xEF, 0xFF];
        data.extend_from_slice(&[b'x'; 16]);
        data.extend_from_slice(&[0x05, 0x00, 0x92, 0x04]);

        let err = inflate(&data).unwrap_err();
        assert!(
            matches!(err, OxiGzError::CorruptedData { offset, .. } if offset >= 21),
            "{}",
            err
        );
        assert!(err.to_string().contains("Over-subscribed"));
    }

    #[test]
    fn test_truncated_stream() {
        let data = sample_text(10_000);
        let compressed = deflate_with(&data, 6);
        let err = inflate(&compressed[..compressed.len() / 2]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TruncatedInput);
    }
}
