//! Cat command implementation.

use crate::utils::open_gzip;
use oxigz::GzipFile;
use std::io::{self, Write};
use std::path::Path;

const CHUNK_SIZE: usize = 256 * 1024;

pub fn cmd_cat(
    path: &Path,
    codepage: Option<&str>,
    offset: u64,
    length: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut file = open_gzip(path, codepage)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_range(&mut file, offset, length, &mut out)?;
    out.flush()?;

    file.close()?;
    Ok(())
}

/// Copy `length` bytes (or everything) from logical `offset` to `out`.
fn write_range<W: Write>(
    file: &mut GzipFile<'_>,
    offset: u64,
    length: Option<u64>,
    out: &mut W,
) -> Result<u64, Box<dyn std::error::Error>> {
    let end = match length {
        Some(length) => offset.saturating_add(length),
        None => file.uncompressed_data_size()?,
    };

    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut position = offset;

    while position < end {
        let want = ((end - position) as usize).min(buf.len());
        let n = file.read_buffer_at_offset(&mut buf[..want], position)?;
        if n == 0 {
            break;
        }
        out.write_all(&buf[..n])?;
        position += n as u64;
    }

    Ok(position.saturating_sub(offset))
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;

    fn temp_gzip(members: &[&[u8]]) -> tempfile::NamedTempFile {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        for data in members {
            let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(data).unwrap();
            tmp.write_all(&encoder.finish().unwrap()).unwrap();
        }
        tmp.flush().unwrap();
        tmp
    }

    #[test]
    fn test_write_range() {
        let tmp = temp_gzip(&[b"hello ", b"world"]);
        let mut file = open_gzip(tmp.path(), None).unwrap();

        let mut out = Vec::new();
        assert_eq!(write_range(&mut file, 3, Some(5), &mut out).unwrap(), 5);
        assert_eq!(out, b"lo wo");

        out.clear();
        assert_eq!(write_range(&mut file, 6, None, &mut out).unwrap(), 5);
        assert_eq!(out, b"world");

        out.clear();
        assert_eq!(write_range(&mut file, 100, Some(10), &mut out).unwrap(), 0);
        assert!(out.is_empty());
    }

    #[test]
    fn test_codepage_flag_is_applied() {
        let tmp = temp_gzip(&[b"data"]);
        assert!(cmd_cat(tmp.path(), Some("no-such-codepage"), 0, None).is_err());
    }
}
