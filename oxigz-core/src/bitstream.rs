//! Bit-level reading for DEFLATE streams.
//!
//! [`BitReader`] reads LSB-first bit fields from any `Read` implementation.
//! Its whole state besides the wrapped reader is captured by [`BitState`], so
//! a decoder can be suspended and later resumed over a fresh reader that
//! starts where the old one stopped.
//!
//! # Example
//!
//! ```
//! use oxigz_core::bitstream::BitReader;
//! use std::io::Cursor;
//!
//! let mut reader = BitReader::new(Cursor::new(vec![0b1100_0101]));
//! assert_eq!(reader.read_bits(3).unwrap(), 0b101);
//! assert_eq!(reader.read_bits(5).unwrap(), 0b11000);
//! ```

use crate::error::{OxiGzError, Result};
use std::io::{ErrorKind, Read};

/// Buffered bits of a suspended [`BitReader`].
///
/// The bits were already pulled from the underlying reader, so a resumed
/// reader must continue from the position the old reader had reached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BitState {
    /// Bit buffer (LSB-first).
    pub buffer: u64,
    /// Number of valid bits in buffer.
    pub bits_in_buffer: u8,
    /// Total bits consumed.
    pub total_bits_read: u64,
}

/// A bit-level reader that wraps any `Read` implementation.
///
/// Uses a 64-bit buffer and refills it a few bytes at a time.
#[derive(Debug)]
pub struct BitReader<R: Read> {
    /// Underlying reader.
    reader: R,
    /// Bit buffer (LSB-first).
    buffer: u64,
    /// Number of valid bits in buffer.
    bits_in_buffer: u8,
    /// Total bits read (for error reporting).
    total_bits_read: u64,
}

impl<R: Read> BitReader<R> {
    /// Create a new `BitReader` wrapping the given reader.
    pub fn new(reader: R) -> Self {
        Self::resume(reader, BitState::default())
    }

    /// Resume reading with bits saved by [`BitReader::state`].
    pub fn resume(reader: R, state: BitState) -> Self {
        Self {
            reader,
            buffer: state.buffer,
            bits_in_buffer: state.bits_in_buffer,
            total_bits_read: state.total_bits_read,
        }
    }

    /// Snapshot the buffered bits.
    pub fn state(&self) -> BitState {
        BitState {
            buffer: self.buffer,
            bits_in_buffer: self.bits_in_buffer,
            total_bits_read: self.total_bits_read,
        }
    }

    /// Get a reference to the underlying reader.
    pub fn get_ref(&self) -> &R {
        &self.reader
    }

    /// Get the current bit position (for error reporting).
    pub fn bit_position(&self) -> u64 {
        self.total_bits_read
    }

    /// Number of whole bytes pulled from the reader but not yet consumed.
    ///
    /// After [`BitReader::align_to_byte`] this is exactly how far the
    /// underlying reader is ahead of the logical read position.
    pub fn buffered_bytes(&self) -> usize {
        (self.bits_in_buffer / 8) as usize
    }

    /// Ensure at least `count` bits are available in the buffer.
    #[inline]
    fn fill_buffer(&mut self, count: u8) -> Result<()> {
        debug_assert!(count <= 56, "Cannot fill more than 56 bits at once");

        while self.bits_in_buffer < count {
            let bits_needed = count - self.bits_in_buffer;
            let bytes_needed = bits_needed.div_ceil(8) as usize;

            let mut temp_buf = [0u8; 8];
            let n = match self.reader.read(&mut temp_buf[..bytes_needed]) {
                Ok(0) => {
                    return Err(OxiGzError::truncated(format!(
                        "compressed stream ended at bit {} while {} more bits were needed",
                        self.total_bits_read, bits_needed
                    )));
                }
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };

            for byte in temp_buf.iter().take(n) {
                self.buffer |= (*byte as u64) << self.bits_in_buffer;
                self.bits_in_buffer += 8;
            }
        }

        Ok(())
    }

    /// Read up to 32 bits from the stream, first bit in the LSB position.
    #[inline]
    pub fn read_bits(&mut self, count: u8) -> Result<u32> {
        debug_assert!(count <= 32, "Cannot read more than 32 bits at once");

        if count == 0 {
            return Ok(0);
        }

        self.fill_buffer(count)?;

        let mask = (1u64 << count).wrapping_sub(1);
        let result = (self.buffer & mask) as u32;

        self.buffer >>= count;
        self.bits_in_buffer -= count;
        self.total_bits_read += count as u64;

        Ok(result)
    }

    /// Peek at up to 32 bits without consuming them.
    #[inline]
    pub fn peek_bits(&mut self, count: u8) -> Result<u32> {
        debug_assert!(count <= 32, "Cannot peek more than 32 bits at once");

        if count == 0 {
            return Ok(0);
        }

        self.fill_buffer(count)?;

        let mask = (1u64 << count) - 1;
        Ok((self.buffer & mask) as u32)
    }

    /// Skip bits that were already peeked.
    pub fn skip_bits(&mut self, count: u8) -> Result<()> {
        if count == 0 {
            return Ok(());
        }

        self.fill_buffer(count)?;

        self.buffer >>= count;
        self.bits_in_buffer -= count;
        self.total_bits_read += count as u64;

        Ok(())
    }

    /// Read a single bit.
    pub fn read_bit(&mut self) -> Result<bool> {
        Ok(self.read_bits(1)? != 0)
    }

    /// Align to the next byte boundary by discarding partial bits.
    pub fn align_to_byte(&mut self) {
        let remainder = self.bits_in_buffer % 8;
        if remainder > 0 {
            self.buffer >>= remainder;
            self.bits_in_buffer -= remainder;
            self.total_bits_read += remainder as u64;
        }
    }

    /// Read bytes directly. The reader must be byte-aligned.
    pub fn read_bytes(&mut self, buf: &mut [u8]) -> Result<()> {
        debug_assert!(self.bits_in_buffer % 8 == 0, "read_bytes on unaligned reader");

        let mut offset = 0;
        while self.bits_in_buffer >= 8 && offset < buf.len() {
            buf[offset] = (self.buffer & 0xFF) as u8;
            self.buffer >>= 8;
            self.bits_in_buffer -= 8;
            self.total_bits_read += 8;
            offset += 1;
        }

        if offset < buf.len() {
            self.reader.read_exact(&mut buf[offset..]).map_err(|e| {
                if e.kind() == ErrorKind::UnexpectedEof {
                    OxiGzError::truncated(format!(
                        "stored block ended after bit {}",
                        self.total_bits_read
                    ))
                } else {
                    e.into()
                }
            })?;
            self.total_bits_read += (buf.len() - offset) as u64 * 8;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// Reader that hands out one byte per call.
    struct Trickle(Vec<u8>, usize);

    impl Read for Trickle {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.1 >= self.0.len() || buf.is_empty() {
                return Ok(0);
            }
            buf[0] = self.0[self.1];
            self.1 += 1;
            Ok(1)
        }
    }

    #[test]
    fn test_bitreader_basic() {
        // 0b10110101 = 0xB5
        let mut reader = BitReader::new(Cursor::new(vec![0xB5]));

        let bits: Vec<u32> = (0..8).map(|_| reader.read_bits(1).unwrap()).collect();
        assert_eq!(bits, vec![1, 0, 1, 0, 1, 1, 0, 1]);
    }

    #[test]
    fn test_bitreader_multi_byte() {
        let mut reader = BitReader::new(Cursor::new(vec![0xFF, 0x00]));

        assert_eq!(reader.read_bits(4).unwrap(), 0xF);
        assert_eq!(reader.read_bits(8).unwrap(), 0x0F);
        assert_eq!(reader.read_bits(4).unwrap(), 0x0);
    }

    #[test]
    fn test_short_reads_are_retried() {
        let mut reader = BitReader::new(Trickle(vec![0x34, 0x12, 0xCD, 0xAB], 0));
        assert_eq!(reader.read_bits(32).unwrap(), 0xABCD1234);
    }

    #[test]
    fn test_bitreader_peek() {
        let mut reader = BitReader::new(Cursor::new(vec![0xAB]));

        assert_eq!(reader.peek_bits(4).unwrap(), 0xB);
        assert_eq!(reader.peek_bits(4).unwrap(), 0xB);
        assert_eq!(reader.read_bits(4).unwrap(), 0xB);
        assert_eq!(reader.peek_bits(4).unwrap(), 0xA);
    }

    #[test]
    fn test_eof_is_truncation() {
        let mut reader = BitReader::new(Cursor::new(vec![0xAB]));
        reader.read_bits(4).unwrap();
        let err = reader.read_bits(8).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::TruncatedInput);
    }

    #[test]
    fn test_align_to_byte() {
        let mut reader = BitReader::new(Cursor::new(vec![0xFF, 0xAA]));

        reader.read_bits(3).unwrap();
        reader.align_to_byte();
        assert_eq!(reader.read_bits(8).unwrap(), 0xAA);
    }

    #[test]
    fn test_read_bytes() {
        let mut reader = BitReader::new(Cursor::new(vec![0x12, 0x34, 0x56, 0x78]));

        let mut buf = [0u8; 2];
        reader.read_bytes(&mut buf).unwrap();
        assert_eq!(buf, [0x12, 0x34]);

        reader.read_bytes(&mut buf).unwrap();
        assert_eq!(buf, [0x56, 0x78]);
    }

    #[test]
    fn test_suspend_and_resume() {
        let data = vec![0x12, 0x34, 0x56, 0x78, 0x9A];
        let mut reader = BitReader::new(Cursor::new(data.clone()));
        assert_eq!(reader.read_bits(4).unwrap(), 0x2);
        reader.peek_bits(16).unwrap();

        let state = reader.state();
        let position = reader.get_ref().position();
        assert_eq!(state.total_bits_read, 4);

        let mut cursor = Cursor::new(data);
        cursor.set_position(position);
        let mut resumed = BitReader::resume(cursor, state);
        assert_eq!(resumed.read_bits(12).unwrap(), 0x341);
        assert_eq!(resumed.read_bits(8).unwrap(), 0x56);
        assert_eq!(resumed.read_bits(8).unwrap(), 0x78);
    }

    #[test]
    fn test_buffered_bytes_after_align() {
        let mut reader = BitReader::new(Cursor::new(vec![0x01, 0x02, 0x03, 0x04]));
        reader.read_bits(3).unwrap();
        reader.peek_bits(20).unwrap();
        reader.align_to_byte();
        let pulled = reader.get_ref().position() as usize;
        assert_eq!(pulled - reader.buffered_bytes(), 1);
    }
}
