//! Extract command implementation.

use crate::utils::{create_progress_bar, open_gzip};
use filetime::FileTime;
use log::debug;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

const CHUNK_SIZE: usize = 256 * 1024;

pub fn cmd_extract(
    path: &Path,
    output_dir: &Path,
    codepage: Option<&str>,
    progress: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut file = open_gzip(path, codepage)?;
    let total = file.uncompressed_data_size()?;

    let (name, mtime) = match file.members()?.first() {
        Some(member) => (member.name(), member.modification_time()),
        None => (None, 0),
    };
    let output_path = output_dir.join(output_name(path, name.as_deref()));
    debug!("extracting {} bytes to {}", total, output_path.display());

    std::fs::create_dir_all(output_dir)?;
    let mut out = BufWriter::new(File::create(&output_path)?);
    let pb = create_progress_bar(total, progress);
    let mut buf = vec![0u8; CHUNK_SIZE];

    loop {
        let n = file.read_buffer(&mut buf)?;
        if n == 0 {
            break;
        }
        out.write_all(&buf[..n])?;
        pb.inc(n as u64);
    }
    out.flush()?;
    drop(out);
    pb.finish_and_clear();

    if mtime > 0 {
        let time = FileTime::from_unix_time(mtime as i64, 0);
        filetime::set_file_mtime(&output_path, time)?;
    }

    file.close()?;
    println!("Extracted: {}", output_path.display());
    Ok(())
}

/// Output file name: the stored name without directories, or the input's
/// name without its `.gz` extension.
fn output_name(input: &Path, stored: Option<&str>) -> PathBuf {
    let stored = stored
        .and_then(|name| name.rsplit(['/', '\\']).next())
        .filter(|name| !name.is_empty() && *name != "." && *name != "..");

    if let Some(name) = stored {
        return PathBuf::from(name);
    }

    match input.file_stem() {
        Some(stem) if input.extension().is_some() => PathBuf::from(stem),
        _ => PathBuf::from(format!(
            "{}.out",
            input.file_name().map_or("output".into(), |n| n.to_string_lossy())
        )),
    }
}
