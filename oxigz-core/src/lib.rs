//! # OxiGz Core
//!
//! Core components for the OxiGz seekable GZIP reader.
//!
//! - [`bitstream`]: LSB-first bit reader with suspend/resume support
//! - [`ringbuffer`]: 32 KiB history window for DEFLATE back-references
//! - [`crc`]: CRC-32 for member trailers and header CRCs
//! - [`source`]: random-access byte sources
//! - [`error`]: Error types
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ L4: Tools                                               │
//! │     oxigz CLI                                           │
//! ├─────────────────────────────────────────────────────────┤
//! │ L3: Container                                           │
//! │     member index, seekable stream, GzipFile             │
//! ├─────────────────────────────────────────────────────────┤
//! │ L2: Codec                                               │
//! │     resumable Inflate (Huffman + LZ77)                  │
//! ├─────────────────────────────────────────────────────────┤
//! │ L1: BitStream (this crate)                              │
//! │     BitReader, RingBuffer, CRC, ByteSource              │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use oxigz_core::bitstream::BitReader;
//! use oxigz_core::crc::Crc32;
//! use std::io::Cursor;
//!
//! let mut reader = BitReader::new(Cursor::new(vec![0xAB, 0xCD]));
//! let bits = reader.read_bits(12).unwrap();
//! assert_eq!(bits, 0xDAB);
//!
//! let crc = Crc32::compute(b"Hello, World!");
//! assert_eq!(crc, 0xEC4AC3D0);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod bitstream;
pub mod crc;
pub mod error;
#[cfg(feature = "mmap")]
pub mod mmap;
pub mod ringbuffer;
pub mod source;

// Re-exports for convenience
pub use bitstream::{BitReader, BitState};
pub use crc::Crc32;
pub use error::{ErrorKind, OxiGzError, Result};
#[cfg(feature = "mmap")]
pub use mmap::MmapSource;
pub use ringbuffer::RingBuffer;
pub use source::{ByteSource, FileSource, MemorySource, ReadSeekSource, SourceReader};
