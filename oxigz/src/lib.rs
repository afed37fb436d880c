//! # OxiGz
//!
//! Random-access reader for single and multi-member GZIP files (RFC 1952).
//!
//! A GZIP file may hold several members back to back; their uncompressed data
//! forms one logical stream. [`GzipFile`] indexes every member when it is
//! opened and then reads that stream at arbitrary offsets, resuming
//! decompression from cached checkpoints instead of starting over.
//!
//! ## Components
//!
//! - [`header`]: member header and trailer parsing, signature checks
//! - [`index`]: member discovery and trailer validation
//! - [`member`]: member metadata and the member table
//! - [`stream`]: logical-offset reads with checkpoint reuse
//! - [`file`]: the open/read/seek/close handle
//!
//! ## Example
//!
//! ```rust
//! use oxigz::{GzipFile, MemorySource, OpenMode};
//!
//! // Two members, "AA" and "BB", each stored uncompressed
//! let member = |text: &[u8; 2], crc: u32| {
//!     let mut bytes = vec![0x1F, 0x8B, 8, 0, 0, 0, 0, 0, 0, 3];
//!     bytes.extend_from_slice(&[0x01, 0x02, 0x00, 0xFD, 0xFF]);
//!     bytes.extend_from_slice(text);
//!     bytes.extend_from_slice(&crc.to_le_bytes());
//!     bytes.extend_from_slice(&2u32.to_le_bytes());
//!     bytes
//! };
//! let mut data = member(b"AA", oxigz::Crc32::compute(b"AA"));
//! data.extend(member(b"BB", oxigz::Crc32::compute(b"BB")));
//!
//! let mut file = GzipFile::new();
//! file.open_source(MemorySource::new(data), OpenMode::Read)?;
//! assert_eq!(file.number_of_members()?, 2);
//! assert_eq!(file.read_at(4, 0)?, b"AABB");
//! assert_eq!(file.read_at(10, 1)?, b"ABB");
//! file.close()?;
//! # Ok::<(), oxigz::OxiGzError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

mod checkpoint;
pub mod codepage;
pub mod file;
pub mod header;
pub mod index;
pub mod member;
pub mod options;
pub mod stream;

// Re-exports
pub use file::{GzipFile, OpenMode, Whence};
pub use header::{MemberHeader, MemberTrailer, check_file_signature, check_source_signature};
pub use index::index_members;
pub use member::{Member, MemberIntegrity, MemberTable, OperatingSystem};
pub use options::ReaderOptions;
pub use stream::SeekableStream;

pub use oxigz_core::error::{ErrorKind, OxiGzError, Result};
#[cfg(feature = "mmap")]
pub use oxigz_core::MmapSource;
pub use oxigz_core::{ByteSource, Crc32, FileSource, MemorySource, ReadSeekSource};
