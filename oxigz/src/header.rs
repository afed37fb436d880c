//! GZIP member header and trailer parsing (RFC 1952 2.3).

use crate::member::OperatingSystem;
use oxigz_core::error::{OxiGzError, Result};
use oxigz_core::{ByteSource, Crc32, FileSource, SourceReader};
use std::io::{self, Read};
use std::path::Path;

/// GZIP magic bytes.
pub const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];

/// GZIP compression method: DEFLATE.
pub const CM_DEFLATE: u8 = 8;

/// Size of the fixed part of a member header.
pub const FIXED_HEADER_SIZE: usize = 10;

/// Size of a member trailer (CRC-32 + ISIZE).
pub const TRAILER_SIZE: u64 = 8;

/// GZIP header flags.
pub mod flags {
    /// Text file.
    pub const FTEXT: u8 = 0x01;
    /// Header CRC present.
    pub const FHCRC: u8 = 0x02;
    /// Extra field present.
    pub const FEXTRA: u8 = 0x04;
    /// Original filename present.
    pub const FNAME: u8 = 0x08;
    /// Comment present.
    pub const FCOMMENT: u8 = 0x10;
    /// Bits that must be zero.
    pub const RESERVED: u8 = 0xE0;
}

/// A decoded member header.
///
/// Names and comments are kept as raw bytes; decoding them is a codepage
/// decision made when they are displayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberHeader {
    /// Compression method (always 8 for DEFLATE).
    pub method: u8,
    /// Flags.
    pub flags: u8,
    /// Modification time (Unix timestamp, 0 = unknown).
    pub mtime: u32,
    /// Extra flags.
    pub xfl: u8,
    /// Operating system the member was created on.
    pub os: OperatingSystem,
    /// Extra field payload (if FEXTRA flag set).
    pub extra: Option<Vec<u8>>,
    /// Original filename without terminator (if FNAME flag set).
    pub name: Option<Vec<u8>>,
    /// Comment without terminator (if FCOMMENT flag set).
    pub comment: Option<Vec<u8>>,
    /// Header CRC16 (if FHCRC flag set).
    pub header_crc: Option<u16>,
    /// Total encoded size of the header in bytes.
    pub header_len: u64,
}

impl MemberHeader {
    /// Parse the header of the member starting at `offset` in `source`.
    pub fn parse(source: &mut dyn ByteSource, offset: u64, verify_crc: bool) -> Result<Self> {
        let size = source.size()?;
        let mut reader = SourceReader::new(source, offset, size);
        Self::read(&mut reader, offset, verify_crc)
    }

    /// Read a header from a reader positioned at the member start.
    ///
    /// `offset` is only used in error messages.
    pub fn read<R: Read>(reader: &mut R, offset: u64, verify_crc: bool) -> Result<Self> {
        let mut raw = Vec::with_capacity(64);

        let mut fixed = [0u8; FIXED_HEADER_SIZE];
        let n = read_up_to(reader, &mut fixed)?;
        let seen = n.min(GZIP_MAGIC.len());
        if n == 0 || fixed[..seen] != GZIP_MAGIC[..seen] {
            return Err(OxiGzError::invalid_magic(offset, GZIP_MAGIC, &fixed[..seen]));
        }
        if n < FIXED_HEADER_SIZE {
            return Err(OxiGzError::truncated(format!(
                "member header at offset {} is {} bytes, need {}",
                offset, n, FIXED_HEADER_SIZE
            )));
        }
        raw.extend_from_slice(&fixed);

        let method = fixed[2];
        if method != CM_DEFLATE {
            return Err(OxiGzError::unsupported_method(method));
        }

        let flags = fixed[3];
        if flags & flags::RESERVED != 0 {
            return Err(OxiGzError::invalid_header(format!(
                "reserved flag bits set: {:#04x}",
                flags & flags::RESERVED
            )));
        }

        let mtime = u32::from_le_bytes([fixed[4], fixed[5], fixed[6], fixed[7]]);
        let xfl = fixed[8];
        let os = OperatingSystem::from(fixed[9]);

        let mut extra = None;
        let mut name = None;
        let mut comment = None;
        let mut header_crc = None;

        if flags & flags::FEXTRA != 0 {
            let mut xlen = [0u8; 2];
            read_field(reader, &mut xlen, "extra field length", offset)?;
            raw.extend_from_slice(&xlen);

            let mut payload = vec![0u8; u16::from_le_bytes(xlen) as usize];
            read_field(reader, &mut payload, "extra field", offset)?;
            raw.extend_from_slice(&payload);
            extra = Some(payload);
        }

        if flags & flags::FNAME != 0 {
            let value = read_null_terminated(reader, "name", offset)?;
            raw.extend_from_slice(&value);
            raw.push(0);
            name = Some(value);
        }

        if flags & flags::FCOMMENT != 0 {
            let value = read_null_terminated(reader, "comment", offset)?;
            raw.extend_from_slice(&value);
            raw.push(0);
            comment = Some(value);
        }

        let mut header_len = raw.len() as u64;

        if flags & flags::FHCRC != 0 {
            let mut crc = [0u8; 2];
            read_field(reader, &mut crc, "header CRC", offset)?;
            let stored = u16::from_le_bytes(crc);
            header_len += 2;

            if verify_crc {
                let computed = Crc32::header_crc16(&raw);
                if computed != stored {
                    return Err(OxiGzError::invalid_header(format!(
                        "header CRC mismatch at offset {}: stored {:#06x}, computed {:#06x}",
                        offset, stored, computed
                    )));
                }
            }
            header_crc = Some(stored);
        }

        Ok(Self {
            method,
            flags,
            mtime,
            xfl,
            os,
            extra,
            name,
            comment,
            header_crc,
            header_len,
        })
    }
}

/// A member trailer: CRC-32 and size modulo 2^32 of the uncompressed data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemberTrailer {
    /// CRC-32 of the uncompressed data.
    pub crc32: u32,
    /// Uncompressed size modulo 2^32.
    pub isize: u32,
}

impl MemberTrailer {
    /// Read the trailer stored at `offset`.
    pub fn read(source: &mut dyn ByteSource, offset: u64) -> Result<Self> {
        let mut buf = [0u8; TRAILER_SIZE as usize];
        source.read_exact_at(offset, &mut buf).map_err(|e| {
            if e.kind() == io::ErrorKind::UnexpectedEof {
                OxiGzError::truncated(format!("member trailer at offset {} is incomplete", offset))
            } else {
                OxiGzError::Io(e)
            }
        })?;

        Ok(Self {
            crc32: u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]),
            isize: u32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]),
        })
    }
}

/// Whether `source` starts with a GZIP signature: the magic and the DEFLATE method.
///
/// Sources shorter than the signature, including empty ones, are not GZIP
/// files. Only I/O failures are errors.
pub fn check_source_signature(source: &mut dyn ByteSource) -> Result<bool> {
    let size = source.size()?;
    let mut signature = [0u8; 3];
    let n = read_up_to(&mut SourceReader::new(source, 0, size), &mut signature)?;

    Ok(n == signature.len() && signature[..2] == GZIP_MAGIC && signature[2] == CM_DEFLATE)
}

/// Whether the file at `path` starts with a GZIP signature.
pub fn check_file_signature<P: AsRef<Path>>(path: P) -> Result<bool> {
    let path = path.as_ref();
    if path.as_os_str().is_empty() {
        return Err(OxiGzError::invalid_argument("empty path"));
    }
    check_source_signature(&mut FileSource::open(path)?)
}

/// Read as many bytes as are available, up to `buf.len()`.
fn read_up_to<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(OxiGzError::Io(e)),
        }
    }
    Ok(filled)
}

fn read_field<R: Read>(reader: &mut R, buf: &mut [u8], what: &str, offset: u64) -> Result<()> {
    reader.read_exact(buf).map_err(|e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            OxiGzError::truncated(format!(
                "member header at offset {} ends inside the {}",
                offset, what
            ))
        } else {
            OxiGzError::Io(e)
        }
    })
}

fn read_null_terminated<R: Read>(reader: &mut R, what: &str, offset: u64) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    let mut buf = [0u8; 1];

    loop {
        read_field(reader, &mut buf, what, offset)?;
        if buf[0] == 0 {
            return Ok(bytes);
        }
        bytes.push(buf[0]);
    }
}
