//! Reader configuration.

use crate::codepage::default_codepage;
use encoding_rs::Encoding;

/// Default distance between decompression checkpoints (1 MiB).
pub const DEFAULT_CHECKPOINT_INTERVAL: u64 = 1024 * 1024;

/// Default number of cached checkpoints.
pub const DEFAULT_MAX_CHECKPOINTS: usize = 64;

/// Options controlling how a [`GzipFile`](crate::GzipFile) is indexed and read.
///
/// # Example
///
/// ```rust
/// use oxigz::ReaderOptions;
///
/// let options = ReaderOptions::new()
///     .with_checkpoint_interval(256 * 1024)
///     .with_verify_checksums(false);
/// assert_eq!(options.checkpoint_interval, 256 * 1024);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ReaderOptions {
    /// Uncompressed bytes between checkpoints inside a member; 0 disables them.
    pub checkpoint_interval: u64,
    /// Maximum number of checkpoints kept.
    pub max_checkpoints: usize,
    /// Fail `open` when a trailer CRC-32 or size does not match.
    pub verify_checksums: bool,
    /// Check the optional header CRC16.
    pub verify_header_crc: bool,
    /// Encoding of member names and comments.
    pub codepage: &'static Encoding,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            checkpoint_interval: DEFAULT_CHECKPOINT_INTERVAL,
            max_checkpoints: DEFAULT_MAX_CHECKPOINTS,
            verify_checksums: true,
            verify_header_crc: false,
            codepage: default_codepage(),
        }
    }
}

impl ReaderOptions {
    /// Default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the checkpoint interval.
    pub fn with_checkpoint_interval(mut self, interval: u64) -> Self {
        self.checkpoint_interval = interval;
        self
    }

    /// Set the checkpoint cache size.
    pub fn with_max_checkpoints(mut self, max: usize) -> Self {
        self.max_checkpoints = max;
        self
    }

    /// Enable or disable strict trailer validation.
    pub fn with_verify_checksums(mut self, verify: bool) -> Self {
        self.verify_checksums = verify;
        self
    }

    /// Enable or disable header CRC16 validation.
    pub fn with_verify_header_crc(mut self, verify: bool) -> Self {
        self.verify_header_crc = verify;
        self
    }

    /// Set the codepage for names and comments.
    pub fn with_codepage(mut self, codepage: &'static Encoding) -> Self {
        self.codepage = codepage;
        self
    }

    pub(crate) fn checkpoints_enabled(&self) -> bool {
        self.checkpoint_interval > 0 && self.max_checkpoints > 0
    }
}
