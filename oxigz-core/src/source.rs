//! Random-access byte sources.
//!
//! A [`ByteSource`] is anything that can read bytes at an absolute offset and
//! report its total size. The container layer depends only on this trait, so
//! files on disk, in-memory buffers, arbitrary `Read + Seek` objects and
//! memory maps are interchangeable.
//!
//! [`SourceReader`] turns a window of a source into a buffered [`Read`] that
//! knows its absolute position, which is what header parsing and the bit
//! reader consume.
//!
//! # Example
//!
//! ```
//! use oxigz_core::source::{ByteSource, MemorySource, SourceReader};
//! use std::io::Read;
//!
//! let mut source = MemorySource::new(b"0123456789".to_vec());
//! assert_eq!(source.size().unwrap(), 10);
//!
//! let mut reader = SourceReader::new(&mut source, 2, 6);
//! let mut text = String::new();
//! reader.read_to_string(&mut text).unwrap();
//! assert_eq!(text, "2345");
//! assert_eq!(reader.position(), 6);
//! ```

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

/// A finite, randomly readable provider of bytes.
pub trait ByteSource {
    /// Read bytes starting at `offset` into `buf`.
    ///
    /// Returns the number of bytes read; 0 means `offset` is at or past the
    /// end of the source. Short reads are allowed.
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<usize>;

    /// Total size of the source in bytes.
    fn size(&mut self) -> io::Result<u64>;

    /// Fill `buf` completely from `offset`, failing with `UnexpectedEof` if the
    /// source ends first.
    fn read_exact_at(&mut self, mut offset: u64, mut buf: &mut [u8]) -> io::Result<()> {
        while !buf.is_empty() {
            match self.read_at(offset, buf) {
                Ok(0) => {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        format!("source ended at offset {}", offset),
                    ));
                }
                Ok(n) => {
                    offset += n as u64;
                    buf = &mut buf[n..];
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        (**self).read_at(offset, buf)
    }

    fn size(&mut self) -> io::Result<u64> {
        (**self).size()
    }
}

impl<S: ByteSource + ?Sized> ByteSource for Box<S> {
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        (**self).read_at(offset, buf)
    }

    fn size(&mut self) -> io::Result<u64> {
        (**self).size()
    }
}

/// A byte source backed by an in-memory buffer.
#[derive(Debug, Clone)]
pub struct MemorySource<T: AsRef<[u8]>> {
    data: T,
}

impl<T: AsRef<[u8]>> MemorySource<T> {
    /// Wrap a buffer.
    pub fn new(data: T) -> Self {
        Self { data }
    }

    /// Unwrap the buffer.
    pub fn into_inner(self) -> T {
        self.data
    }
}

impl<T: AsRef<[u8]>> ByteSource for MemorySource<T> {
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        let data = self.data.as_ref();
        if offset >= data.len() as u64 {
            return Ok(0);
        }
        let start = offset as usize;
        let n = buf.len().min(data.len() - start);
        buf[..n].copy_from_slice(&data[start..start + n]);
        Ok(n)
    }

    fn size(&mut self) -> io::Result<u64> {
        Ok(self.data.as_ref().len() as u64)
    }
}

/// A byte source over any seekable reader, such as a caller's file object.
#[derive(Debug)]
pub struct ReadSeekSource<R: Read + Seek> {
    inner: R,
}

impl<R: Read + Seek> ReadSeekSource<R> {
    /// Wrap a seekable reader.
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Get a reference to the wrapped reader.
    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    /// Unwrap the reader.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read + Seek> ByteSource for ReadSeekSource<R> {
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.seek(SeekFrom::Start(offset))?;
        self.inner.read(buf)
    }

    fn size(&mut self) -> io::Result<u64> {
        self.inner.seek(SeekFrom::End(0))
    }
}

/// A byte source reading a file on disk.
#[derive(Debug)]
pub struct FileSource {
    file: File,
    size: u64,
}

impl FileSource {
    /// Open a file read-only.
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = File::open(path.as_ref())?;
        Self::from_file(file)
    }

    /// Use an already open file.
    pub fn from_file(file: File) -> io::Result<Self> {
        let size = file.metadata()?.len();
        Ok(Self { file, size })
    }
}

impl ByteSource for FileSource {
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        if offset >= self.size {
            return Ok(0);
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::FileExt;
            self.file.read_at(buf, offset)
        }

        #[cfg(windows)]
        {
            use std::os::windows::fs::FileExt;
            self.file.seek_read(buf, offset)
        }

        #[cfg(not(any(unix, windows)))]
        {
            self.file.seek(SeekFrom::Start(offset))?;
            self.file.read(buf)
        }
    }

    fn size(&mut self) -> io::Result<u64> {
        Ok(self.size)
    }
}

/// Default read-ahead of a [`SourceReader`].
const READ_AHEAD: usize = 16 * 1024;

/// Buffered sequential reader over the window `[position, limit)` of a source.
pub struct SourceReader<'a> {
    source: &'a mut dyn ByteSource,
    /// Absolute offset of the next byte handed out.
    position: u64,
    /// Absolute offset the reader never reaches.
    limit: u64,
    buf: Vec<u8>,
    buf_pos: usize,
    buf_len: usize,
}

impl<'a> SourceReader<'a> {
    /// Create a reader over `[start, limit)` of `source`.
    pub fn new(source: &'a mut dyn ByteSource, start: u64, limit: u64) -> Self {
        Self {
            source,
            position: start,
            limit: limit.max(start),
            buf: vec![0; READ_AHEAD],
            buf_pos: 0,
            buf_len: 0,
        }
    }

    /// Absolute offset of the next byte [`Read::read`] would return.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Absolute end of the readable window.
    pub fn limit(&self) -> u64 {
        self.limit
    }

    fn refill(&mut self) -> io::Result<()> {
        let remaining = self.limit - self.position;
        let want = (self.buf.len() as u64).min(remaining) as usize;
        self.buf_pos = 0;
        self.buf_len = 0;
        if want == 0 {
            return Ok(());
        }
        loop {
            match self.source.read_at(self.position, &mut self.buf[..want]) {
                Ok(n) => {
                    self.buf_len = n;
                    return Ok(());
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
    }
}

impl Read for SourceReader<'_> {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        if out.is_empty() {
            return Ok(0);
        }
        if self.buf_pos >= self.buf_len {
            self.refill()?;
            if self.buf_len == 0 {
                return Ok(0);
            }
        }
        let n = out.len().min(self.buf_len - self.buf_pos);
        out[..n].copy_from_slice(&self.buf[self.buf_pos..self.buf_pos + n]);
        self.buf_pos += n;
        self.position += n as u64;
        Ok(n)
    }
}
