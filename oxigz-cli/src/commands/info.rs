//! Info command implementation.

use crate::utils::{format_timestamp, open_gzip};
use oxigz::{Member, MemberIntegrity};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// JSON serializable member data.
#[derive(Debug, Serialize, Deserialize)]
struct MemberJson {
    index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    comment: Option<String>,
    mtime: u32,
    operating_system: String,
    offset: u64,
    header_size: u64,
    compressed_size: u64,
    uncompressed_size: u64,
    logical_offset: u64,
    crc32: u32,
    verified: bool,
}

impl MemberJson {
    fn from_member(member: &Member) -> Self {
        Self {
            index: member.index(),
            name: member.name(),
            comment: member.comments(),
            mtime: member.modification_time(),
            operating_system: member.operating_system().to_string(),
            offset: member.start_offset(),
            header_size: member.header_size(),
            compressed_size: member.compressed_size(),
            uncompressed_size: member.uncompressed_size(),
            logical_offset: member.logical_start(),
            crc32: member.crc32(),
            verified: member.integrity().is_verified(),
        }
    }
}

/// JSON output for the info command.
#[derive(Debug, Serialize, Deserialize)]
struct FileInfoJson {
    file: String,
    size: u64,
    uncompressed_size: u64,
    members: Vec<MemberJson>,
}

pub fn cmd_info(
    path: &Path,
    codepage: Option<&str>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let file = open_gzip(path, codepage)?;
    let metadata = std::fs::metadata(path)?;
    let members = file.members()?;
    let uncompressed_size = file.uncompressed_data_size()?;

    if json {
        let info = FileInfoJson {
            file: path.display().to_string(),
            size: metadata.len(),
            uncompressed_size,
            members: members.iter().map(MemberJson::from_member).collect(),
        };
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("GZIP File Information");
    println!("=====================");
    println!("File: {}", path.display());
    println!("Size: {} bytes", metadata.len());
    println!("Uncompressed data size: {} bytes", uncompressed_size);
    println!("Number of members: {}", members.len());

    for member in members {
        println!();
        println!("Member: {}", member.index() + 1);
        if let Some(name) = member.name() {
            println!("  Name: {}", name);
        }
        if let Some(comment) = member.comments() {
            println!("  Comment: {}", comment);
        }
        println!(
            "  Modification time: {}",
            format_timestamp(member.modification_time())
        );
        println!("  Operating system: {}", member.operating_system());
        println!(
            "  Offset: {} (header {} bytes, data {} bytes)",
            member.start_offset(),
            member.header_size(),
            member.compressed_size()
        );
        println!("  Uncompressed size: {} bytes", member.uncompressed_size());
        println!("  CRC-32: {:#010x}", member.crc32());
        match member.integrity() {
            MemberIntegrity::Verified => {}
            MemberIntegrity::CrcMismatch { computed, .. } => {
                println!("  Warning: CRC-32 mismatch, data has {:#010x}", computed);
            }
            MemberIntegrity::SizeMismatch { actual, .. } => {
                println!("  Warning: size mismatch, data has {} bytes", actual);
            }
        }
    }

    Ok(())
}
