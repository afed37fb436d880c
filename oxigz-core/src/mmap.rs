//! Memory-mapped byte source.
//!
//! [`MmapSource`] maps a file read-only and serves [`ByteSource`] reads
//! straight from the mapping. For large files with scattered reads this lets
//! the operating system page data in on demand.
//!
//! # Example
//!
//! ```no_run
//! use oxigz_core::mmap::MmapSource;
//! use oxigz_core::source::ByteSource;
//!
//! let mut source = MmapSource::open("logs.gz")?;
//! println!("{} bytes mapped", source.size()?);
//! # Ok::<(), std::io::Error>(())
//! ```
//!
//! # Safety
//!
//! A mapping reflects later modifications of the file by other processes.
//! The mapping is read-only; callers must not truncate the file while it is
//! mapped.

use crate::source::ByteSource;
use memmap2::Mmap;
use std::fs::File;
use std::io;
use std::path::Path;
use std::sync::Arc;

/// A read-only memory-mapped file.
///
/// Clones share the same mapping.
#[derive(Debug, Clone)]
pub struct MmapSource {
    mmap: Arc<Mmap>,
}

impl MmapSource {
    /// Open and map a file.
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = File::open(path.as_ref())?;
        Self::from_file(&file)
    }

    /// Map an already open file.
    pub fn from_file(file: &File) -> io::Result<Self> {
        // SAFETY: the mapping is read-only; the caller is responsible for not
        // truncating the file while it is mapped.
        let mmap = unsafe { Mmap::map(file)? };
        Ok(Self {
            mmap: Arc::new(mmap),
        })
    }

    /// Get the mapped bytes.
    pub fn as_slice(&self) -> &[u8] {
        &self.mmap
    }
}

impl ByteSource for MmapSource {
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        let data = self.as_slice();
        if offset >= data.len() as u64 {
            return Ok(0);
        }
        let start = offset as usize;
        let n = buf.len().min(data.len() - start);
        buf[..n].copy_from_slice(&data[start..start + n]);
        Ok(n)
    }

    fn size(&mut self) -> io::Result<u64> {
        Ok(self.mmap.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_mmap_source_reads() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"mapped content").unwrap();
        tmp.flush().unwrap();

        let mut source = MmapSource::open(tmp.path()).unwrap();
        assert_eq!(source.size().unwrap(), 14);

        let mut buf = [0u8; 7];
        source.read_exact_at(7, &mut buf).unwrap();
        assert_eq!(&buf, b"content");
        assert_eq!(source.read_at(14, &mut buf).unwrap(), 0);
    }
}
