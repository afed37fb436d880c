//! Huffman decoding for DEFLATE.
//!
//! DEFLATE uses canonical Huffman codes, where codes of the same length are
//! assigned consecutive values in lexicographic order (RFC 1951 3.2.2).
//!
//! # Alphabets
//!
//! - **Literal/Length**: 0-285 (0-255 literals, 256 EOB, 257-285 lengths)
//! - **Distance**: 0-29 (back-reference distances)
//! - **Code Length**: 0-18 (for encoding dynamic Huffman trees)

use oxigz_core::BitReader;
use oxigz_core::error::{OxiGzError, Result};
use std::io::Read;

/// Maximum code length in DEFLATE (15 bits).
pub const MAX_CODE_LENGTH: usize = 15;

/// End of block symbol.
pub const END_OF_BLOCK: u16 = 256;

/// A Huffman decoding table.
///
/// Codes up to `FAST_BITS` long resolve with one table lookup; longer codes
/// fall back to a canonical bit-by-bit walk.
#[derive(Debug, Clone)]
pub struct HuffmanTree {
    /// Direct lookup table: (symbol, code_length); length 0 means "slow path".
    fast_table: Vec<(u16, u8)>,
    /// Number of bits for fast lookup.
    fast_bits: u8,
    /// Maximum code length in this tree.
    max_code_length: u8,
    /// Symbols sorted by (code length, code).
    symbols: Vec<u16>,
    /// First canonical code of each length.
    base_codes: [u32; MAX_CODE_LENGTH + 1],
    /// Index into `symbols` of the first symbol of each length.
    symbol_offsets: [u16; MAX_CODE_LENGTH + 2],
}

impl HuffmanTree {
    /// Number of bits for fast lookup table.
    const FAST_BITS: u8 = 9;

    /// Build a Huffman tree from code lengths.
    ///
    /// `code_lengths[i]` is the bit length of symbol `i`; 0 means unused.
    /// A tree without any symbol is accepted but fails on every decode.
    pub fn from_code_lengths(code_lengths: &[u8]) -> Result<Self> {
        if code_lengths.is_empty() {
            return Err(OxiGzError::corrupted(0, "Empty Huffman code lengths"));
        }

        let mut bl_count = [0u32; MAX_CODE_LENGTH + 1];
        let mut max_length = 0u8;

        for &len in code_lengths {
            if len > 0 {
                if len as usize > MAX_CODE_LENGTH {
                    return Err(OxiGzError::corrupted(
                        0,
                        format!("Code length {} exceeds maximum {}", len, MAX_CODE_LENGTH),
                    ));
                }
                bl_count[len as usize] += 1;
                max_length = max_length.max(len);
            }
        }

        if max_length == 0 {
            return Ok(Self {
                fast_table: Vec::new(),
                fast_bits: 0,
                max_code_length: 0,
                symbols: Vec::new(),
                base_codes: [0; MAX_CODE_LENGTH + 1],
                symbol_offsets: [0; MAX_CODE_LENGTH + 2],
            });
        }

        // First code of each length (RFC 1951 3.2.2 step 2)
        let mut next_code = [0u32; MAX_CODE_LENGTH + 1];
        let mut code = 0u32;
        for bits in 1..=max_length as usize {
            code = (code + bl_count[bits - 1]) << 1;
            next_code[bits] = code;
        }

        if code + bl_count[max_length as usize] > 1u32 << max_length {
            return Err(OxiGzError::corrupted(0, "Over-subscribed Huffman tree"));
        }

        let total_codes: u32 = bl_count.iter().sum();
        let mut symbols = vec![0u16; total_codes as usize];
        let mut symbol_offsets = [0u16; MAX_CODE_LENGTH + 2];
        let mut base_codes = [0u32; MAX_CODE_LENGTH + 1];

        let mut offset = 0u16;
        for bits in 1..=MAX_CODE_LENGTH {
            symbol_offsets[bits] = offset;
            base_codes[bits] = next_code[bits];
            offset += bl_count[bits] as u16;
        }
        symbol_offsets[MAX_CODE_LENGTH + 1] = offset;

        let fast_bits = Self::FAST_BITS.min(max_length);
        let fast_table_size = 1usize << fast_bits;
        let mut fast_table = vec![(0u16, 0u8); fast_table_size];

        let mut current_code = next_code;
        for (symbol, &len) in code_lengths.iter().enumerate() {
            if len == 0 {
                continue;
            }
            let len = len as usize;
            let code = current_code[len];
            current_code[len] += 1;

            let idx = symbol_offsets[len] as usize + (code - base_codes[len]) as usize;
            symbols[idx] = symbol as u16;

            if len <= fast_bits as usize {
                // Codes are stored MSB-first but read LSB-first
                let reversed = Self::reverse_bits(code as u16, len as u8) as usize;
                let fill_count = 1usize << (fast_bits as usize - len);
                for i in 0..fill_count {
                    fast_table[reversed | (i << len)] = (symbol as u16, len as u8);
                }
            }
        }

        Ok(Self {
            fast_table,
            fast_bits,
            max_code_length: max_length,
            symbols,
            base_codes,
            symbol_offsets,
        })
    }

    fn reverse_bits(mut code: u16, length: u8) -> u16 {
        let mut reversed = 0u16;
        for _ in 0..length {
            reversed = (reversed << 1) | (code & 1);
            code >>= 1;
        }
        reversed
    }

    /// Decode a symbol from the bit stream.
    #[inline]
    pub fn decode<R: Read>(&self, reader: &mut BitReader<R>) -> Result<u16> {
        if self.max_code_length == 0 {
            return Err(OxiGzError::invalid_huffman(reader.bit_position()));
        }

        // Near the end of the stream fewer than fast_bits may remain
        if let Ok(bits) = reader.peek_bits(self.fast_bits) {
            let (symbol, len) = self.fast_table[bits as usize];
            if len > 0 {
                reader.skip_bits(len)?;
                return Ok(symbol);
            }
        }

        self.decode_slow(reader)
    }

    fn decode_slow<R: Read>(&self, reader: &mut BitReader<R>) -> Result<u16> {
        let mut code = 0u32;

        for len in 1..=self.max_code_length as usize {
            code = (code << 1) | reader.read_bits(1)?;

            let count = (self.symbol_offsets[len + 1] - self.symbol_offsets[len]) as u32;
            if count > 0 && code >= self.base_codes[len] && code - self.base_codes[len] < count {
                let idx = self.symbol_offsets[len] as usize + (code - self.base_codes[len]) as usize;
                return Ok(self.symbols[idx]);
            }
        }

        Err(OxiGzError::invalid_huffman(reader.bit_position()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_huffman_tree_simple() {
        // A=0, B=10, C=11; LSB-first packing of A B C A = 0b0001_1010
        let tree = HuffmanTree::from_code_lengths(&[1, 2, 2]).unwrap();
        let mut reader = BitReader::new(Cursor::new(vec![0b0001_1010u8]));

        assert_eq!(tree.decode(&mut reader).unwrap(), 0);
        assert_eq!(tree.decode(&mut reader).unwrap(), 1);
        assert_eq!(tree.decode(&mut reader).unwrap(), 2);
        assert_eq!(tree.decode(&mut reader).unwrap(), 0);
    }

    #[test]
    fn test_long_codes_use_slow_path() {
        // Lengths 1..=11 plus a second 11-bit code form a complete tree
        let mut lengths: Vec<u8> = (1..=11).collect();
        lengths.push(11);
        let tree = HuffmanTree::from_code_lengths(&lengths).unwrap();

        // Symbol 9 has the 10-bit canonical code 1111111110
        let mut value = 0u32;
        for bit in [1, 1, 1, 1, 1, 1, 1, 1, 1, 0] {
            value = (value >> 1) | (bit << 9);
        }
        let bytes = value.to_le_bytes().to_vec();
        let mut reader = BitReader::new(Cursor::new(bytes));
        assert_eq!(tree.decode(&mut reader).unwrap(), 9);
    }

    #[test]
    fn test_empty_tree_rejects_decode() {
        let tree = HuffmanTree::from_code_lengths(&[0, 0, 0, 0]).unwrap();
        let mut reader = BitReader::new(Cursor::new(vec![0u8]));
        assert!(tree.decode(&mut reader).is_err());
    }

    #[test]
    fn test_oversubscribed_tree() {
        assert!(HuffmanTree::from_code_lengths(&[1, 1, 1]).is_err());
    }

    #[test]
    fn test_single_symbol() {
        let tree = HuffmanTree::from_code_lengths(&[1, 0, 0, 0]).unwrap();
        let mut reader = BitReader::new(Cursor::new(vec![0u8]));
        assert_eq!(tree.decode(&mut reader).unwrap(), 0);
    }

    #[test]
    fn test_reverse_bits() {
        assert_eq!(HuffmanTree::reverse_bits(0b101, 3), 0b101);
        assert_eq!(HuffmanTree::reverse_bits(0b1100, 4), 0b0011);
        assert_eq!(HuffmanTree::reverse_bits(0b10101010, 8), 0b01010101);
    }
}
