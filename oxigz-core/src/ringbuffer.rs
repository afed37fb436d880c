//! Ring buffer (sliding window) holding DEFLATE decompression history.
//!
//! The window keeps the most recent 32 KiB of output so back-references can
//! be resolved without keeping the whole member in memory. It is `Clone`, and
//! a clone is what a decompression checkpoint stores.

use crate::error::{OxiGzError, Result};

/// Window size for DEFLATE (32 KB).
pub const DEFLATE_WINDOW_SIZE: usize = 32768;

/// A ring buffer (circular buffer) for maintaining decompression history.
#[derive(Debug, Clone)]
pub struct RingBuffer {
    /// The underlying buffer.
    buffer: Vec<u8>,
    /// Current write position (next byte will be written here).
    position: usize,
    /// Number of bytes written (up to capacity).
    size: usize,
    /// Mask for efficient modulo (capacity - 1).
    mask: usize,
}

impl RingBuffer {
    /// Create a new ring buffer with the specified capacity.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is not a power of 2 or is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(
            capacity.is_power_of_two(),
            "Capacity must be a power of 2, got {}",
            capacity
        );

        Self {
            buffer: vec![0; capacity],
            position: 0,
            size: 0,
            mask: capacity - 1,
        }
    }

    /// Create a new ring buffer for DEFLATE decompression (32 KB).
    pub fn deflate() -> Self {
        Self::new(DEFLATE_WINDOW_SIZE)
    }

    /// Get the number of bytes of history currently available.
    pub fn len(&self) -> usize {
        self.size
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Write a single byte to the buffer.
    #[inline]
    pub fn write_byte(&mut self, byte: u8) {
        self.buffer[self.position] = byte;
        self.position = (self.position + 1) & self.mask;
        if self.size < self.buffer.len() {
            self.size += 1;
        }
    }

    /// Write multiple bytes to the buffer.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.write_byte(byte);
        }
    }

    /// Copy `output.len()` bytes of a back-reference into `output` and the window.
    ///
    /// Overlapping copies (length greater than distance) repeat the pattern as
    /// LZ77 requires. A partially served match can be continued by calling
    /// again with the same distance.
    pub fn copy_from_history(&mut self, distance: usize, output: &mut [u8]) -> Result<()> {
        if distance == 0 || distance > self.size {
            return Err(OxiGzError::invalid_distance(distance, self.size));
        }

        let mut src_pos = self.position.wrapping_sub(distance) & self.mask;
        for out in output.iter_mut() {
            let byte = self.buffer[src_pos];
            *out = byte;
            self.write_byte(byte);
            src_pos = (src_pos + 1) & self.mask;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ringbuffer_basic() {
        let mut rb = RingBuffer::new(8);
        assert!(rb.is_empty());
        rb.write_bytes(b"abc");
        assert_eq!(rb.len(), 3);

        let mut out = [0u8; 2];
        rb.copy_from_history(2, &mut out).unwrap();
        assert_eq!(&out, b"bc");
    }

    #[test]
    fn test_ringbuffer_wrap() {
        let mut rb = RingBuffer::new(4);
        rb.write_bytes(b"abcdef");
        assert_eq!(rb.len(), 4);

        let mut out = [0u8; 4];
        rb.copy_from_history(4, &mut out).unwrap();
        assert_eq!(&out, b"cdef");
        let mut out = [0u8; 1];
        assert!(rb.copy_from_history(5, &mut out).is_err());
    }

    #[test]
    fn test_ringbuffer_copy_overlap() {
        let mut rb = RingBuffer::new(16);
        rb.write_bytes(b"ab");

        let mut out = [0u8; 5];
        rb.copy_from_history(2, &mut out).unwrap();
        assert_eq!(&out, b"ababa");

        let mut tail = [0u8; 7];
        rb.copy_from_history(7, &mut tail).unwrap();
        assert_eq!(&tail, b"abababa");
    }

    #[test]
    fn test_ringbuffer_split_copy() {
        let mut whole = RingBuffer::new(16);
        whole.write_bytes(b"xyz");
        let mut expected = [0u8; 7];
        whole.copy_from_history(3, &mut expected).unwrap();

        let mut split = RingBuffer::new(16);
        split.write_bytes(b"xyz");
        let mut first = [0u8; 4];
        let mut second = [0u8; 3];
        split.copy_from_history(3, &mut first).unwrap();
        split.copy_from_history(3, &mut second).unwrap();

        assert_eq!(&expected[..4], &first);
        assert_eq!(&expected[4..], &second);
    }

    #[test]
    fn test_ringbuffer_invalid_distance() {
        let mut rb = RingBuffer::deflate();
        rb.write_bytes(b"abc");
        let mut out = [0u8; 1];
        assert!(rb.copy_from_history(4, &mut out).is_err());
        assert!(rb.copy_from_history(0, &mut out).is_err());
    }

    #[test]
    #[should_panic]
    fn test_non_power_of_two_panics() {
        let _ = RingBuffer::new(100);
    }
}
