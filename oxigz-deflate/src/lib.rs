//! # OxiGz Deflate
//!
//! Pure Rust DEFLATE decompression (RFC 1951) built for random access.
//!
//! The decoder is resumable: it produces output in caller-sized pieces, can
//! stop inside any block or back-reference, and its whole state (history
//! window, current block tables, pending match) can be cloned to create a
//! checkpoint.
//!
//! ## Features
//!
//! - Stored (uncompressed) blocks
//! - Fixed Huffman codes
//! - Dynamic Huffman codes
//! - Bounded output per call, exact end-of-stream detection
//!
//! ## Example
//!
//! ```rust
//! use oxigz_deflate::inflate;
//!
//! // Fixed Huffman block holding "a"
//! let decompressed = inflate(&[0x4B, 0x04, 0x00]).unwrap();
//! assert_eq!(&decompressed, b"a");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod huffman;
pub mod inflate;
pub mod tables;

// Re-exports
pub use huffman::HuffmanTree;
pub use inflate::{Inflater, inflate};
