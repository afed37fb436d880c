//! The top-level file handle.

use crate::index::index_members;
use crate::member::Member;
use crate::options::ReaderOptions;
use crate::stream::SeekableStream;
use encoding_rs::Encoding;
use log::debug;
use oxigz_core::error::{OxiGzError, Result};
use oxigz_core::{ByteSource, FileSource};
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;
use std::str::FromStr;

/// Access mode requested when opening.
///
/// Only [`OpenMode::Read`] is supported; the other modes exist so that
/// callers passing mode strings get a precise error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OpenMode {
    /// Read-only access.
    #[default]
    Read,
    /// Write access.
    Write,
    /// Read and write access.
    ReadWrite,
}

impl FromStr for OpenMode {
    type Err = OxiGzError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "r" | "rb" => Ok(Self::Read),
            "w" | "wb" | "a" | "ab" => Ok(Self::Write),
            "r+" | "rb+" | "r+b" | "w+" | "wb+" | "w+b" => Ok(Self::ReadWrite),
            _ => Err(OxiGzError::invalid_argument(format!(
                "unsupported mode string: {:?}",
                s
            ))),
        }
    }
}

/// Reference point of a seek.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Whence {
    /// Relative to the start of the stream.
    FromStart,
    /// Relative to the current offset.
    FromCurrent,
    /// Relative to the end of the stream.
    FromEnd,
}

impl TryFrom<i32> for Whence {
    type Error = OxiGzError;

    fn try_from(value: i32) -> Result<Self> {
        match value {
            0 => Ok(Self::FromStart),
            1 => Ok(Self::FromCurrent),
            2 => Ok(Self::FromEnd),
            other => Err(OxiGzError::invalid_argument(format!(
                "unsupported whence: {}",
                other
            ))),
        }
    }
}

/// State that only exists while a file is open.
struct OpenFile<'a> {
    source: Box<dyn ByteSource + 'a>,
    stream: SeekableStream,
    offset: u64,
}

/// A random-access reader over a single or multi-member GZIP file.
///
/// All members are indexed when the file is opened. Afterwards the
/// concatenated uncompressed data of every member can be read at any offset.
///
/// The lifetime ties the handle to a byte source lent by the caller; files
/// opened by path use `GzipFile<'static>`.
///
/// # Example
///
/// ```no_run
/// use oxigz::{GzipFile, OpenMode, Whence};
///
/// let mut file = GzipFile::new();
/// file.open("logs.gz", OpenMode::Read)?;
///
/// println!("{} members", file.number_of_members()?);
/// file.seek(-100, Whence::FromEnd)?;
/// let tail = file.read(None)?;
/// println!("{}", String::from_utf8_lossy(&tail));
///
/// file.close()?;
/// # Ok::<(), oxigz::OxiGzError>(())
/// ```
pub struct GzipFile<'a> {
    options: ReaderOptions,
    open: Option<OpenFile<'a>>,
}

impl<'a> GzipFile<'a> {
    /// Create a closed handle with default options.
    pub fn new() -> Self {
        Self::with_options(ReaderOptions::default())
    }

    /// Create a closed handle with the given options.
    pub fn with_options(options: ReaderOptions) -> Self {
        Self {
            options,
            open: None,
        }
    }

    /// Options of this handle.
    pub fn options(&self) -> &ReaderOptions {
        &self.options
    }

    /// Open a file on disk.
    pub fn open<P: AsRef<Path>>(&mut self, path: P, mode: OpenMode) -> Result<()> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(OxiGzError::invalid_argument("empty path"));
        }
        check_mode(mode)?;
        if self.open.is_some() {
            return Err(OxiGzError::AlreadyOpen);
        }

        debug!("opening {}", path.display());
        let source = FileSource::open(path)?;
        self.bind(Box::new(source))
    }

    /// Open a caller-supplied byte source.
    ///
    /// Pass `&mut source` to keep ownership: the handle never closes a lent
    /// source, it only stops using it on [`GzipFile::close`].
    pub fn open_source<S: ByteSource + 'a>(&mut self, source: S, mode: OpenMode) -> Result<()> {
        check_mode(mode)?;
        if self.open.is_some() {
            return Err(OxiGzError::AlreadyOpen);
        }

        self.bind(Box::new(source))
    }

    fn bind(&mut self, mut source: Box<dyn ByteSource + 'a>) -> Result<()> {
        let table = index_members(source.as_mut(), &self.options)?;
        debug!(
            "opened: {} members, {} uncompressed bytes",
            table.len(),
            table.total_size()
        );

        self.open = Some(OpenFile {
            source,
            stream: SeekableStream::new(table, &self.options),
            offset: 0,
        });
        Ok(())
    }

    /// Close the handle, releasing the source and all derived state.
    pub fn close(&mut self) -> Result<()> {
        match self.open.take() {
            Some(_) => {
                debug!("closed");
                Ok(())
            }
            None => Err(OxiGzError::NotOpen),
        }
    }

    /// Whether a source is bound.
    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    fn state(&self) -> Result<&OpenFile<'a>> {
        self.open.as_ref().ok_or(OxiGzError::NotOpen)
    }

    fn state_mut(&mut self) -> Result<&mut OpenFile<'a>> {
        self.open.as_mut().ok_or(OxiGzError::NotOpen)
    }

    /// Read up to `size` bytes at the current offset, or everything up to the
    /// end of the stream when `size` is `None`.
    ///
    /// The offset advances by the number of bytes returned. At or past the
    /// end of the stream the result is empty.
    pub fn read(&mut self, size: Option<i64>) -> Result<Vec<u8>> {
        let state = self.state_mut()?;
        let remaining = state.stream.size().saturating_sub(state.offset);
        let length = match size {
            Some(size) => non_negative(size, "read size")?.min(remaining),
            None => remaining,
        };

        let mut data = vec![0u8; length as usize];
        let n = state
            .stream
            .read_at(state.source.as_mut(), state.offset, &mut data)?;
        data.truncate(n);
        state.offset += n as u64;
        Ok(data)
    }

    /// Read up to `size` bytes at `offset` without moving the current offset.
    pub fn read_at(&mut self, size: i64, offset: i64) -> Result<Vec<u8>> {
        let state = self.state_mut()?;
        let size = non_negative(size, "read size")?;
        let offset = non_negative(offset, "read offset")?;

        let length = size.min(state.stream.size().saturating_sub(offset));
        let mut data = vec![0u8; length as usize];
        let n = state
            .stream
            .read_at(state.source.as_mut(), offset, &mut data)?;
        data.truncate(n);
        Ok(data)
    }

    /// Read into `buf` at the current offset and advance it.
    pub fn read_buffer(&mut self, buf: &mut [u8]) -> Result<usize> {
        let state = self.state_mut()?;
        let n = state
            .stream
            .read_at(state.source.as_mut(), state.offset, buf)?;
        state.offset += n as u64;
        Ok(n)
    }

    /// Read into `buf` at `offset` without moving the current offset.
    pub fn read_buffer_at_offset(&mut self, buf: &mut [u8], offset: u64) -> Result<usize> {
        let state = self.state_mut()?;
        state.stream.read_at(state.source.as_mut(), offset, buf)
    }

    /// Move the current offset and return the new one.
    ///
    /// Offsets past the end are allowed; negative results are a
    /// [`OxiGzError::Seek`] error and leave the offset unchanged.
    pub fn seek(&mut self, delta: i64, whence: Whence) -> Result<u64> {
        let state = self.state_mut()?;
        let base: i128 = match whence {
            Whence::FromStart => 0,
            Whence::FromCurrent => state.offset as i128,
            Whence::FromEnd => state.stream.size() as i128,
        };

        let target = base + delta as i128;
        if target < 0 {
            return Err(OxiGzError::seek(target));
        }
        state.offset = u64::try_from(target).map_err(|_| OxiGzError::seek(target))?;
        Ok(state.offset)
    }

    /// Current offset in the uncompressed stream.
    pub fn offset(&self) -> Result<u64> {
        Ok(self.state()?.offset)
    }

    /// Total uncompressed size of all members.
    pub fn uncompressed_data_size(&self) -> Result<u64> {
        Ok(self.state()?.stream.size())
    }

    /// Number of members.
    pub fn number_of_members(&self) -> Result<usize> {
        Ok(self.state()?.stream.members().len())
    }

    /// Member by index.
    pub fn member(&self, index: usize) -> Result<&Member> {
        let members = self.state()?.stream.members();
        members
            .get(index)
            .ok_or_else(|| OxiGzError::out_of_range(index, members.len()))
    }

    /// All members in file order.
    pub fn members(&self) -> Result<&[Member]> {
        Ok(self.state()?.stream.members().as_slice())
    }

    /// Change the codepage used for member names and comments.
    ///
    /// Applies to the open file and to files opened later.
    pub fn set_codepage(&mut self, codepage: &'static Encoding) {
        self.options.codepage = codepage;
        if let Some(state) = self.open.as_mut() {
            state.stream.members_mut().set_codepage(codepage);
        }
    }
}

impl Default for GzipFile<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for GzipFile<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut debug = f.debug_struct("GzipFile");
        debug.field("options", &self.options);
        match &self.open {
            Some(state) => debug
                .field("members", &state.stream.members().len())
                .field("size", &state.stream.size())
                .field("offset", &state.offset),
            None => debug.field("open", &false),
        };
        debug.finish()
    }
}

impl Read for GzipFile<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(self.read_buffer(buf)?)
    }
}

impl Seek for GzipFile<'_> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let (delta, whence) = match pos {
            SeekFrom::Start(offset) => {
                let offset = i64::try_from(offset)
                    .map_err(|_| OxiGzError::invalid_argument("seek offset too large"))?;
                (offset, Whence::FromStart)
            }
            SeekFrom::Current(delta) => (delta, Whence::FromCurrent),
            SeekFrom::End(delta) => (delta, Whence::FromEnd),
        };
        Ok(GzipFile::seek(self, delta, whence)?)
    }
}

fn check_mode(mode: OpenMode) -> Result<()> {
    match mode {
        OpenMode::Read => Ok(()),
        other => Err(OxiGzError::invalid_argument(format!(
            "unsupported access mode: {:?}",
            other
        ))),
    }
}

fn non_negative(value: i64, what: &str) -> Result<u64> {
    u64::try_from(value).map_err(|_| {
        OxiGzError::invalid_argument(format!("{} must not be negative: {}", what, value))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use oxigz_core::{ErrorKind, MemorySource};
    use std::io::Write;

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    fn open(bytes: Vec<u8>) -> GzipFile<'static> {
        let mut file = GzipFile::new();
        file.open_source(MemorySource::new(bytes), OpenMode::Read)
            .unwrap();
        file
    }

    #[test]
    fn test_open_mode_strings() {
        assert_eq!("r".parse::<OpenMode>().unwrap(), OpenMode::Read);
        assert_eq!("rb".parse::<OpenMode>().unwrap(), OpenMode::Read);
        assert_eq!("w".parse::<OpenMode>().unwrap(), OpenMode::Write);
        assert_eq!("r+".parse::<OpenMode>().unwrap(), OpenMode::ReadWrite);
        assert_eq!(
            "x".parse::<OpenMode>().unwrap_err().kind(),
            ErrorKind::InvalidArgument
        );
    }

    #[test]
    fn test_whence_from_int() {
        assert_eq!(Whence::try_from(0).unwrap(), Whence::FromStart);
        assert_eq!(Whence::try_from(2).unwrap(), Whence::FromEnd);
        assert_eq!(
            Whence::try_from(3).unwrap_err().kind(),
            ErrorKind::InvalidArgument
        );
    }

    #[test]
    fn test_write_mode_rejected() {
        let mut file = GzipFile::new();
        let err = file
            .open_source(MemorySource::new(gzip(b"x")), OpenMode::Write)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(!file.is_open());
    }

    #[test]
    fn test_failed_open_leaves_handle_closed() {
        let mut file = GzipFile::new();
        let err = file
            .open_source(MemorySource::new(b"not gzip".to_vec()), OpenMode::Read)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
        assert!(!file.is_open());
        assert_eq!(file.close().unwrap_err().kind(), ErrorKind::NotOpen);
    }

    #[test]
    fn test_seek_and_offset() {
        let mut file = open(gzip(b"0123456789"));
        assert_eq!(file.seek(4, Whence::FromStart).unwrap(), 4);
        assert_eq!(file.seek(2, Whence::FromCurrent).unwrap(), 6);
        assert_eq!(file.seek(-1, Whence::FromEnd).unwrap(), 9);
        assert_eq!(file.read(None).unwrap(), b"9");
        assert_eq!(file.offset().unwrap(), 10);

        let err = file.seek(-11, Whence::FromCurrent).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Seek);
        assert_eq!(file.offset().unwrap(), 10);
    }

    #[test]
    fn test_read_at_keeps_offset() {
        let mut file = open(gzip(b"abcdef"));
        assert_eq!(file.read_at(3, 2).unwrap(), b"cde");
        assert_eq!(file.offset().unwrap(), 0);

        let mut buf = [0u8; 4];
        assert_eq!(file.read_buffer_at_offset(&mut buf, 4).unwrap(), 2);
        assert_eq!(&buf[..2], b"ef");
        assert_eq!(file.offset().unwrap(), 0);
    }

    #[test]
    fn test_io_traits() {
        let mut file = open(gzip(b"hello, reader"));
        Seek::seek(&mut file, SeekFrom::Start(7)).unwrap();
        let mut text = String::new();
        file.read_to_string(&mut text).unwrap();
        assert_eq!(text, "reader");

        let err = Seek::seek(&mut file, SeekFrom::Current(-100)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn test_set_codepage() {
        let mut encoder = flate2::GzBuilder::new()
            .filename(vec![b'f', 0xF6, b'.', b't', b'x', b't'])
            .write(Vec::new(), Compression::default());
        encoder.write_all(b"data").unwrap();
        let mut file = open(encoder.finish().unwrap());

        assert_eq!(file.member(0).unwrap().name().as_deref(), Some("f\u{f6}.txt"));

        file.set_codepage(encoding_rs::UTF_8);
        assert_eq!(
            file.member(0).unwrap().name().as_deref(),
            Some("f\u{fffd}.txt")
        );
    }
}
