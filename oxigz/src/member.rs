//! Member metadata and the member table.

use crate::codepage;
use crate::header::{MemberHeader, TRAILER_SIZE, flags};
use encoding_rs::Encoding;
use std::fmt;
use std::ops::Range;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Operating system a member was created on (RFC 1952 OS field).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatingSystem {
    /// FAT filesystem (MS-DOS, OS/2, NT/Win32).
    Fat,
    /// Amiga.
    Amiga,
    /// VMS (or OpenVMS).
    Vms,
    /// Unix.
    Unix,
    /// VM/CMS.
    VmCms,
    /// Atari TOS.
    AtariTos,
    /// HPFS filesystem (OS/2, NT).
    Hpfs,
    /// Macintosh.
    Macintosh,
    /// Z-System.
    ZSystem,
    /// CP/M.
    CpM,
    /// TOPS-20.
    Tops20,
    /// NTFS filesystem (NT).
    Ntfs,
    /// QDOS.
    Qdos,
    /// Acorn RISCOS.
    AcornRiscos,
    /// Unknown (255).
    Unknown,
    /// Any code not defined by RFC 1952.
    Other(u8),
}

impl OperatingSystem {
    /// Raw OS code as stored in the header.
    pub fn code(self) -> u8 {
        match self {
            Self::Fat => 0,
            Self::Amiga => 1,
            Self::Vms => 2,
            Self::Unix => 3,
            Self::VmCms => 4,
            Self::AtariTos => 5,
            Self::Hpfs => 6,
            Self::Macintosh => 7,
            Self::ZSystem => 8,
            Self::CpM => 9,
            Self::Tops20 => 10,
            Self::Ntfs => 11,
            Self::Qdos => 12,
            Self::AcornRiscos => 13,
            Self::Unknown => 255,
            Self::Other(code) => code,
        }
    }

    /// Human readable name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Fat => "FAT",
            Self::Amiga => "Amiga",
            Self::Vms => "VMS",
            Self::Unix => "Unix",
            Self::VmCms => "VM/CMS",
            Self::AtariTos => "Atari TOS",
            Self::Hpfs => "HPFS",
            Self::Macintosh => "Macintosh",
            Self::ZSystem => "Z-System",
            Self::CpM => "CP/M",
            Self::Tops20 => "TOPS-20",
            Self::Ntfs => "NTFS",
            Self::Qdos => "QDOS",
            Self::AcornRiscos => "Acorn RISCOS",
            Self::Unknown => "Unknown",
            Self::Other(_) => "Undefined",
        }
    }
}

impl From<u8> for OperatingSystem {
    fn from(code: u8) -> Self {
        match code {
            0 => Self::Fat,
            1 => Self::Amiga,
            2 => Self::Vms,
            3 => Self::Unix,
            4 => Self::VmCms,
            5 => Self::AtariTos,
            6 => Self::Hpfs,
            7 => Self::Macintosh,
            8 => Self::ZSystem,
            9 => Self::CpM,
            10 => Self::Tops20,
            11 => Self::Ntfs,
            12 => Self::Qdos,
            13 => Self::AcornRiscos,
            255 => Self::Unknown,
            other => Self::Other(other),
        }
    }
}

impl fmt::Display for OperatingSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Other(code) => write!(f, "Undefined ({})", code),
            _ => f.write_str(self.name()),
        }
    }
}

/// Result of checking a member trailer against its decoded data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberIntegrity {
    /// CRC-32 and size both match.
    Verified,
    /// The stored CRC-32 differs from the decoded data.
    CrcMismatch {
        /// CRC-32 stored in the trailer.
        expected: u32,
        /// CRC-32 of the decoded data.
        computed: u32,
    },
    /// The stored size differs from the decoded length modulo 2^32.
    SizeMismatch {
        /// Size stored in the trailer.
        expected: u32,
        /// Decoded length.
        actual: u64,
    },
}

impl MemberIntegrity {
    /// Whether the trailer matched.
    pub fn is_verified(&self) -> bool {
        matches!(self, Self::Verified)
    }
}

/// One gzip member: its location in the source, its header metadata and
/// the logical range its data occupies in the concatenated stream.
#[derive(Debug, Clone)]
pub struct Member {
    pub(crate) index: usize,
    pub(crate) start_offset: u64,
    pub(crate) header: MemberHeader,
    pub(crate) trailer_offset: u64,
    pub(crate) crc32: u32,
    pub(crate) declared_size: u32,
    pub(crate) uncompressed_size: u64,
    pub(crate) logical_start: u64,
    pub(crate) integrity: MemberIntegrity,
    pub(crate) codepage: &'static Encoding,
}

impl Member {
    /// Position of this member in the file.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Decoded header.
    pub fn header(&self) -> &MemberHeader {
        &self.header
    }

    /// Absolute offset of the member header.
    pub fn start_offset(&self) -> u64 {
        self.start_offset
    }

    /// Size of the header in bytes.
    pub fn header_size(&self) -> u64 {
        self.header.header_len
    }

    /// Absolute offset of the compressed payload.
    pub fn compressed_data_offset(&self) -> u64 {
        self.start_offset + self.header.header_len
    }

    /// Size of the compressed payload in bytes.
    pub fn compressed_size(&self) -> u64 {
        self.trailer_offset - self.compressed_data_offset()
    }

    /// Absolute offset of the trailer.
    pub fn trailer_offset(&self) -> u64 {
        self.trailer_offset
    }

    /// Absolute offset just past the trailer.
    pub fn end_offset(&self) -> u64 {
        self.trailer_offset + TRAILER_SIZE
    }

    /// CRC-32 stored in the trailer.
    pub fn crc32(&self) -> u32 {
        self.crc32
    }

    /// Uncompressed size stored in the trailer (modulo 2^32).
    pub fn declared_uncompressed_size(&self) -> u32 {
        self.declared_size
    }

    /// Number of bytes the member actually decodes to.
    pub fn uncompressed_size(&self) -> u64 {
        self.uncompressed_size
    }

    /// Logical offset of the first byte of this member's data.
    pub fn logical_start(&self) -> u64 {
        self.logical_start
    }

    /// Logical offset just past this member's data.
    pub fn logical_end(&self) -> u64 {
        self.logical_start + self.uncompressed_size
    }

    /// `[logical_start, logical_end)`.
    pub fn logical_range(&self) -> Range<u64> {
        self.logical_start..self.logical_end()
    }

    /// Trailer validation result.
    pub fn integrity(&self) -> MemberIntegrity {
        self.integrity
    }

    /// Modification time in seconds since the epoch (0 = unknown).
    pub fn modification_time(&self) -> u32 {
        self.header.mtime
    }

    /// Modification time, or `None` when unknown.
    pub fn modification_time_as_system_time(&self) -> Option<SystemTime> {
        match self.header.mtime {
            0 => None,
            secs => Some(UNIX_EPOCH + Duration::from_secs(secs as u64)),
        }
    }

    /// Operating system the member was created on.
    pub fn operating_system(&self) -> OperatingSystem {
        self.header.os
    }

    /// Original file name decoded with the active codepage.
    pub fn name(&self) -> Option<String> {
        self.header
            .name
            .as_deref()
            .map(|bytes| codepage::decode(bytes, self.codepage))
    }

    /// Original file name as stored.
    pub fn name_bytes(&self) -> Option<&[u8]> {
        self.header.name.as_deref()
    }

    /// Comment decoded with the active codepage.
    pub fn comments(&self) -> Option<String> {
        self.header
            .comment
            .as_deref()
            .map(|bytes| codepage::decode(bytes, self.codepage))
    }

    /// Comment as stored.
    pub fn comment_bytes(&self) -> Option<&[u8]> {
        self.header.comment.as_deref()
    }

    /// Extra field payload.
    pub fn extra_field(&self) -> Option<&[u8]> {
        self.header.extra.as_deref()
    }

    /// Header CRC16, if present.
    pub fn header_crc(&self) -> Option<u16> {
        self.header.header_crc
    }

    /// Header flags byte.
    pub fn flags(&self) -> u8 {
        self.header.flags
    }

    /// Extra flags byte.
    pub fn extra_flags(&self) -> u8 {
        self.header.xfl
    }

    /// Whether the FTEXT flag is set.
    pub fn is_text(&self) -> bool {
        self.header.flags & flags::FTEXT != 0
    }

    /// Codepage used to decode name and comment.
    pub fn codepage(&self) -> &'static Encoding {
        self.codepage
    }
}

/// Ordered members with their cumulative logical ranges.
#[derive(Debug, Clone, Default)]
pub struct MemberTable {
    members: Vec<Member>,
}

impl MemberTable {
    pub(crate) fn new(members: Vec<Member>) -> Self {
        Self { members }
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether there are no members.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Member by index.
    pub fn get(&self, index: usize) -> Option<&Member> {
        self.members.get(index)
    }

    /// All members in file order.
    pub fn as_slice(&self) -> &[Member] {
        &self.members
    }

    /// Iterate over the members.
    pub fn iter(&self) -> std::slice::Iter<'_, Member> {
        self.members.iter()
    }

    /// Sum of all members' uncompressed sizes.
    pub fn total_size(&self) -> u64 {
        self.members.last().map_or(0, Member::logical_end)
    }

    /// Index of the member whose logical range contains `offset`.
    ///
    /// Members without data never contain an offset.
    pub fn find(&self, offset: u64) -> Option<usize> {
        let index = self
            .members
            .partition_point(|member| member.logical_end() <= offset);
        (index < self.members.len()).then_some(index)
    }

    pub(crate) fn set_codepage(&mut self, codepage: &'static Encoding) {
        for member in &mut self.members {
            member.codepage = codepage;
        }
    }
}

impl<'a> IntoIterator for &'a MemberTable {
    type Item = &'a Member;
    type IntoIter = std::slice::Iter<'a, Member>;

    fn into_iter(self) -> Self::IntoIter {
        self.members.iter()
    }
}
