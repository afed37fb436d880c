//! Error types for OxiGz operations.
//!
//! Every failure is reported as an [`OxiGzError`]. The detailed variants carry
//! enough context for diagnostics, while [`OxiGzError::kind`] folds them into
//! the small set of categories callers usually branch on.

use std::io;
use thiserror::Error;

/// Broad error category of an [`OxiGzError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A parameter value is not acceptable (negative length, bad mode, ...).
    InvalidArgument,
    /// The handle is already bound to a source.
    AlreadyOpen,
    /// The operation requires an open handle.
    NotOpen,
    /// The container structure is malformed (bad magic, method, flags).
    Format,
    /// The source ended before a required field or payload was complete.
    TruncatedInput,
    /// The DEFLATE bit stream is invalid or the trailer does not match.
    CorruptData,
    /// A member index is out of bounds.
    OutOfRange,
    /// A seek would move the offset before the start of the stream.
    Seek,
    /// The underlying byte source failed.
    Io,
}

/// The main error type for OxiGz operations.
#[derive(Debug, Error)]
pub enum OxiGzError {
    /// I/O error from the underlying byte source.
    #[error("I/O error: {0}")]
    Io(io::Error),

    /// Invalid argument passed by the caller.
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Description of the bad argument.
        message: String,
    },

    /// The handle is already open.
    #[error("File already open")]
    AlreadyOpen,

    /// The handle is not open.
    #[error("File not open")]
    NotOpen,

    /// Invalid magic number in member header.
    #[error("Invalid magic number at offset {offset}: expected {expected:02x?}, found {found:02x?}")]
    InvalidMagic {
        /// Absolute offset of the member header.
        offset: u64,
        /// Expected magic bytes.
        expected: Vec<u8>,
        /// Actual magic bytes found.
        found: Vec<u8>,
    },

    /// Unsupported compression method.
    #[error("Unsupported compression method: {method}")]
    UnsupportedMethod {
        /// The compression method identifier.
        method: u8,
    },

    /// Malformed member header.
    #[error("Invalid header: {message}")]
    InvalidHeader {
        /// Description of the header error.
        message: String,
    },

    /// Input ended before a required structure was complete.
    #[error("Truncated input: {message}")]
    Truncated {
        /// What was being read when the input ran out.
        message: String,
    },

    /// Corrupted compressed data.
    #[error("Corrupted data at offset {offset}: {message}")]
    CorruptedData {
        /// Byte offset where corruption was detected.
        offset: u64,
        /// Description of the corruption.
        message: String,
    },

    /// Invalid Huffman code encountered during decompression.
    #[error("Invalid Huffman code at bit position {bit_position}")]
    InvalidHuffmanCode {
        /// Bit position where the invalid code was found.
        bit_position: u64,
    },

    /// Back-reference pointing before the start of the output.
    #[error("Invalid back-reference distance: {distance} exceeds history size {history_size}")]
    InvalidDistance {
        /// The invalid distance value.
        distance: usize,
        /// Current history buffer size.
        history_size: usize,
    },

    /// CRC-32 in a member trailer does not match the decoded data.
    #[error("CRC mismatch in member {member}: expected {expected:#010x}, computed {computed:#010x}")]
    CrcMismatch {
        /// Member index.
        member: usize,
        /// CRC value stored in the trailer.
        expected: u32,
        /// CRC value computed over the decoded data.
        computed: u32,
    },

    /// Uncompressed size in a member trailer does not match the decoded data.
    #[error("Size mismatch in member {member}: trailer declares {expected}, decoded {actual} bytes")]
    SizeMismatch {
        /// Member index.
        member: usize,
        /// Size modulo 2^32 stored in the trailer.
        expected: u32,
        /// Number of bytes actually decoded.
        actual: u64,
    },

    /// Member index out of bounds.
    #[error("Member index {index} out of range (number of members: {count})")]
    OutOfRange {
        /// Requested index.
        index: usize,
        /// Number of members available.
        count: usize,
    },

    /// Seek to a negative offset.
    #[error("Invalid seek: resulting offset {offset} is negative")]
    Seek {
        /// The resulting (negative) offset.
        offset: i128,
    },
}

/// Result type alias for OxiGz operations.
pub type Result<T> = std::result::Result<T, OxiGzError>;

impl From<io::Error> for OxiGzError {
    fn from(err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            Self::Truncated {
                message: err.to_string(),
            }
        } else {
            Self::Io(err)
        }
    }
}

impl From<OxiGzError> for io::Error {
    fn from(err: OxiGzError) -> Self {
        if let OxiGzError::Io(inner) = err {
            return inner;
        }
        let kind = match err.kind() {
            ErrorKind::InvalidArgument | ErrorKind::Seek | ErrorKind::OutOfRange => {
                io::ErrorKind::InvalidInput
            }
            ErrorKind::Format | ErrorKind::CorruptData => io::ErrorKind::InvalidData,
            ErrorKind::TruncatedInput => io::ErrorKind::UnexpectedEof,
            ErrorKind::NotOpen | ErrorKind::AlreadyOpen | ErrorKind::Io => io::ErrorKind::Other,
        };
        io::Error::new(kind, err)
    }
}

impl OxiGzError {
    /// Get the broad category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io(_) => ErrorKind::Io,
            Self::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            Self::AlreadyOpen => ErrorKind::AlreadyOpen,
            Self::NotOpen => ErrorKind::NotOpen,
            Self::InvalidMagic { .. } | Self::UnsupportedMethod { .. } | Self::InvalidHeader { .. } => {
                ErrorKind::Format
            }
            Self::Truncated { .. } => ErrorKind::TruncatedInput,
            Self::CorruptedData { .. }
            | Self::InvalidHuffmanCode { .. }
            | Self::InvalidDistance { .. }
            | Self::CrcMismatch { .. }
            | Self::SizeMismatch { .. } => ErrorKind::CorruptData,
            Self::OutOfRange { .. } => ErrorKind::OutOfRange,
            Self::Seek { .. } => ErrorKind::Seek,
        }
    }

    /// Create an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create an invalid magic error.
    pub fn invalid_magic(offset: u64, expected: impl Into<Vec<u8>>, found: impl Into<Vec<u8>>) -> Self {
        Self::InvalidMagic {
            offset,
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Create an unsupported method error.
    pub fn unsupported_method(method: u8) -> Self {
        Self::UnsupportedMethod { method }
    }

    /// Create an invalid header error.
    pub fn invalid_header(message: impl Into<String>) -> Self {
        Self::InvalidHeader {
            message: message.into(),
        }
    }

    /// Create a truncated input error.
    pub fn truncated(message: impl Into<String>) -> Self {
        Self::Truncated {
            message: message.into(),
        }
    }

    /// Create a corrupted data error.
    pub fn corrupted(offset: u64, message: impl Into<String>) -> Self {
        Self::CorruptedData {
            offset,
            message: message.into(),
        }
    }

    /// Create an invalid Huffman code error.
    pub fn invalid_huffman(bit_position: u64) -> Self {
        Self::InvalidHuffmanCode { bit_position }
    }

    /// Create an invalid distance error.
    pub fn invalid_distance(distance: usize, history_size: usize) -> Self {
        Self::InvalidDistance {
            distance,
            history_size,
        }
    }

    /// Create a CRC mismatch error.
    pub fn crc_mismatch(member: usize, expected: u32, computed: u32) -> Self {
        Self::CrcMismatch {
            member,
            expected,
            computed,
        }
    }

    /// Create a size mismatch error.
    pub fn size_mismatch(member: usize, expected: u32, actual: u64) -> Self {
        Self::SizeMismatch {
            member,
            expected,
            actual,
        }
    }

    /// Create an out of range error.
    pub fn out_of_range(index: usize, count: usize) -> Self {
        Self::OutOfRange { index, count }
    }

    /// Create a seek error.
    pub fn seek(offset: i128) -> Self {
        Self::Seek { offset }
    }
}
