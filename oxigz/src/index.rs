//! Member discovery.
//!
//! The indexer walks the source from offset 0, decoding every member once to
//! find where its compressed data ends and to check the trailer. The result is
//! an immutable [`MemberTable`].

use crate::header::{MemberHeader, MemberTrailer, TRAILER_SIZE};
use crate::member::{Member, MemberIntegrity, MemberTable};
use crate::options::ReaderOptions;
use log::{debug, warn};
use oxigz_core::error::{OxiGzError, Result};
use oxigz_core::{BitReader, ByteSource, Crc32, SourceReader};
use oxigz_deflate::Inflater;

const DECODE_BUFFER_SIZE: usize = 64 * 1024;

/// What decoding a member's payload revealed.
struct DecodedPayload {
    trailer_offset: u64,
    crc32: u32,
    size: u64,
}

/// Build the member table of `source`.
///
/// An empty source yields an empty table. Bytes after the last member that
/// do not form a complete member are an error.
pub fn index_members(source: &mut dyn ByteSource, options: &ReaderOptions) -> Result<MemberTable> {
    let source_size = source.size()?;
    let mut members = Vec::new();
    let mut offset = 0u64;
    let mut logical_start = 0u64;

    while offset < source_size {
        let index = members.len();
        let header = MemberHeader::parse(source, offset, options.verify_header_crc)?;
        let data_offset = offset + header.header_len;

        let payload = decode_payload(source, data_offset, source_size)?;
        let trailer = MemberTrailer::read(source, payload.trailer_offset)?;
        let integrity = check_trailer(index, &trailer, &payload, options)?;

        debug!(
            "member {}: header at {}, {} compressed bytes, {} uncompressed bytes",
            index,
            offset,
            payload.trailer_offset - data_offset,
            payload.size
        );

        members.push(Member {
            index,
            start_offset: offset,
            header,
            trailer_offset: payload.trailer_offset,
            crc32: trailer.crc32,
            declared_size: trailer.isize,
            uncompressed_size: payload.size,
            logical_start,
            integrity,
            codepage: options.codepage,
        });

        logical_start += payload.size;
        offset = payload.trailer_offset + TRAILER_SIZE;
    }

    debug!(
        "indexed {} members, {} uncompressed bytes",
        members.len(),
        logical_start
    );

    Ok(MemberTable::new(members))
}

/// Decode a whole DEFLATE payload starting at `data_offset`.
fn decode_payload(
    source: &mut dyn ByteSource,
    data_offset: u64,
    source_size: u64,
) -> Result<DecodedPayload> {
    // The trailer must still fit after the payload
    let limit = source_size.saturating_sub(TRAILER_SIZE).max(data_offset);
    let mut reader = BitReader::new(SourceReader::new(source, data_offset, limit));
    let mut inflater = Inflater::new();
    let mut crc = Crc32::new();
    let mut buf = vec![0u8; DECODE_BUFFER_SIZE];

    loop {
        let n = inflater.inflate_into(&mut reader, &mut buf)?;
        crc.update(&buf[..n]);
        if n < buf.len() {
            break;
        }
    }

    reader.align_to_byte();
    let trailer_offset = reader.get_ref().position() - reader.buffered_bytes() as u64;

    Ok(DecodedPayload {
        trailer_offset,
        crc32: crc.finalize(),
        size: inflater.total_out(),
    })
}

fn check_trailer(
    index: usize,
    trailer: &MemberTrailer,
    payload: &DecodedPayload,
    options: &ReaderOptions,
) -> Result<MemberIntegrity> {
    let integrity = if trailer.crc32 != payload.crc32 {
        MemberIntegrity::CrcMismatch {
            expected: trailer.crc32,
            computed: payload.crc32,
        }
    } else if trailer.isize != payload.size as u32 {
        MemberIntegrity::SizeMismatch {
            expected: trailer.isize,
            actual: payload.size,
        }
    } else {
        return Ok(MemberIntegrity::Verified);
    };

    if options.verify_checksums {
        return Err(match integrity {
            MemberIntegrity::CrcMismatch { expected, computed } => {
                OxiGzError::crc_mismatch(index, expected, computed)
            }
            MemberIntegrity::SizeMismatch { expected, actual } => {
                OxiGzError::size_mismatch(index, expected, actual)
            }
            MemberIntegrity::Verified => unreachable!(),
        });
    }

    warn!("member {}: {:?}, keeping decoded data", index, integrity);
    Ok(integrity)
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

    fn index(bytes: Vec<u8>, options: &ReaderOptions) -> Result<MemberTable> {
        index_members(&mut MemorySource::new(bytes), options)
    }

    #[test]
    fn test_empty_source() {
        let table = index(Vec::new(), &ReaderOptions::default()).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.total_size(), 0);
    }

    #[test]
    fn test_member_boundaries() {
        let first = gzip(b"first member");
        let second = gzip(b"");
        let third = gzip(b"third");
        let mut bytes = first.clone();
        bytes.extend_from_slice(&second);
        bytes.extend_from_slice(&third);
        let total = bytes.len() as u64;

        let table = index(bytes, &ReaderOptions::default()).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.total_size(), 17);

        let m0 = table.get(0).unwrap();
        assert_eq!(m0.start_offset(), 0);
        assert_eq!(m0.end_offset(), first.len() as u64);
        assert_eq!(m0.logical_range(), 0..12);
        assert_eq!(
            m0.trailer_offset(),
            m0.start_offset() + m0.header_size() + m0.compressed_size()
        );

        let m1 = table.get(1).unwrap();
        assert_eq!(m1.start_offset(), first.len() as u64);
        assert_eq!(m1.uncompressed_size(), 0);

        let m2 = table.get(2).unwrap();
        assert_eq!(m2.logical_range(), 12..17);
        assert_eq!(m2.end_offset(), total);
        assert!(m2.integrity().is_verified());
    }

    #[test]
    fn test_trailing_garbage() {
        let mut bytes = gzip(b"payload");
        bytes.extend_from_slice(b"junk");
        let err = index(bytes, &ReaderOptions::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);

        let mut bytes = gzip(b"payload");
        bytes.extend_from_slice(&[0x1F, 0x8B, 0x08]);
        let err = index(bytes, &ReaderOptions::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TruncatedInput);
    }

    #[test]
    fn test_truncated_member() {
        let bytes = gzip(&b"some text that will be cut short ".repeat(50));
        let err = index(bytes[..bytes.len() - 3].to_vec(), &ReaderOptions::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TruncatedInput);
    }

    #[test]
    fn test_crc_mismatch_strict_and_lenient() {
        let mut bytes = gzip(b"checksummed");
        let crc_at = bytes.len() - 8;
        bytes[crc_at] ^= 0xFF;

        let err = index(bytes.clone(), &ReaderOptions::default()).unwrap_err();
        assert!(matches!(err, OxiGzError::CrcMismatch { member: 0, .. }));
        assert_eq!(err.kind(), ErrorKind::CorruptData);

        let lenient = ReaderOptions::default().with_verify_checksums(false);
        let table = index(bytes, &lenient).unwrap();
        let member = table.get(0).unwrap();
        assert!(matches!(
            member.integrity(),
            MemberIntegrity::CrcMismatch { .. }
        ));
        assert_eq!(member.uncompressed_size(), 11);
    }

    #[test]
    fn test_size_mismatch() {
        let mut bytes = gzip(b"sized");
        let size_at = bytes.len() - 4;
        bytes[size_at] = 99;

        let err = index(bytes, &ReaderOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            OxiGzError::SizeMismatch {
                expected: 99,
                actual: 5,
                ..
            }
        ));
    }
}
