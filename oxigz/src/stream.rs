//! Random access to the logical (decompressed) stream.
//!
//! [`SeekableStream`] maps logical offsets onto members and decodes from the
//! best known starting point: the live decoder left behind by the previous
//! read, the nearest cached checkpoint, or the start of the member. Output
//! that crosses a member boundary continues with the next member.

use crate::checkpoint::{Checkpoint, CheckpointCache};
use crate::member::{Member, MemberTable};
use crate::options::ReaderOptions;
use oxigz_core::error::{OxiGzError, Result};
use oxigz_core::{BitReader, ByteSource, SourceReader};

const SKIP_BUFFER_SIZE: usize = 32 * 1024;

/// Logical-offset reader over an indexed multi-member file.
#[derive(Debug)]
pub struct SeekableStream {
    table: MemberTable,
    checkpoints: CheckpointCache,
    /// Decoder state right after the last read.
    live: Option<Checkpoint>,
    checkpoint_interval: u64,
    scratch: Vec<u8>,
}

impl SeekableStream {
    /// Create a stream over an indexed member table.
    pub fn new(table: MemberTable, options: &ReaderOptions) -> Self {
        let (interval, capacity) = if options.checkpoints_enabled() {
            (options.checkpoint_interval, options.max_checkpoints)
        } else {
            (0, 0)
        };

        Self {
            table,
            checkpoints: CheckpointCache::new(capacity),
            live: None,
            checkpoint_interval: interval,
            scratch: Vec::new(),
        }
    }

    /// The member table.
    pub fn members(&self) -> &MemberTable {
        &self.table
    }

    pub(crate) fn members_mut(&mut self) -> &mut MemberTable {
        &mut self.table
    }

    /// Total size of the logical stream.
    pub fn size(&self) -> u64 {
        self.table.total_size()
    }

    /// Number of checkpoints currently cached.
    pub fn checkpoint_count(&self) -> usize {
        self.checkpoints.len()
    }

    /// Drop all cached decoder state.
    pub fn clear_cache(&mut self) {
        self.checkpoints.clear();
        self.live = None;
    }

    /// Read up to `buf.len()` bytes starting at logical `offset`.
    ///
    /// Returns fewer bytes only at the end of the stream, and 0 when `offset`
    /// is at or past it.
    pub fn read_at(
        &mut self,
        source: &mut dyn ByteSource,
        offset: u64,
        buf: &mut [u8],
    ) -> Result<usize> {
        let total = self.size();
        if offset >= total || buf.is_empty() {
            return Ok(0);
        }

        let want = (buf.len() as u64).min(total - offset) as usize;
        let mut done = 0;

        while done < want {
            let position = offset + done as u64;
            let index = self.table.find(position).ok_or_else(|| {
                OxiGzError::corrupted(position, "logical offset outside the member table")
            })?;
            let mut state = self.start_state(index, position);

            let member = &self.table.as_slice()[index];
            let mut decoder = MemberDecoder {
                member,
                checkpoints: &mut self.checkpoints,
                interval: self.checkpoint_interval,
            };

            if state.logical_offset < position {
                if self.scratch.is_empty() {
                    self.scratch.resize(SKIP_BUFFER_SIZE, 0);
                }
                while state.logical_offset < position {
                    let n = (position - state.logical_offset).min(self.scratch.len() as u64);
                    decoder.decode_exact(source, &mut state, &mut self.scratch[..n as usize])?;
                }
            }

            let n = (member.logical_end() - position).min((want - done) as u64) as usize;
            decoder.decode_exact(source, &mut state, &mut buf[done..done + n])?;
            done += n;
            self.live = Some(state);
        }

        Ok(want)
    }

    /// Pick the decoder state closest to `position` inside member `index`.
    fn start_state(&mut self, index: usize, position: u64) -> Checkpoint {
        let live = match self.live.take() {
            Some(live) if live.member == index && live.logical_offset == position => return live,
            Some(live) if live.member == index && live.logical_offset < position => Some(live),
            _ => None,
        };

        let cached = self.checkpoints.nearest(index, position).cloned();
        let member = &self.table.as_slice()[index];

        [live, cached]
            .into_iter()
            .flatten()
            .max_by_key(|checkpoint| checkpoint.logical_offset)
            .unwrap_or_else(|| {
                Checkpoint::member_start(
                    index,
                    member.logical_start(),
                    member.compressed_data_offset(),
                )
            })
    }
}

/// Decodes one member, leaving checkpoints behind at interval boundaries.
struct MemberDecoder<'a> {
    member: &'a Member,
    checkpoints: &'a mut CheckpointCache,
    interval: u64,
}

impl MemberDecoder<'_> {
    /// Decode exactly `out.len()` bytes from `state` and advance it.
    fn decode_exact(
        &mut self,
        source: &mut dyn ByteSource,
        state: &mut Checkpoint,
        out: &mut [u8],
    ) -> Result<()> {
        let limit = self.member.trailer_offset();
        let mut reader = BitReader::resume(
            SourceReader::new(source, state.input_offset, limit),
            state.bits,
        );
        let mut filled = 0;

        while filled < out.len() {
            let logical = state.logical_offset + filled as u64;
            let end = match self.next_boundary(logical) {
                Some(boundary) => {
                    let until_boundary = (boundary - logical).min((out.len() - filled) as u64);
                    filled + until_boundary as usize
                }
                None => out.len(),
            };

            let n = state.inflater.inflate_into(&mut reader, &mut out[filled..end])?;
            if n < end - filled {
                return Err(OxiGzError::corrupted(
                    limit,
                    format!(
                        "member {} ended after {} of {} indexed bytes",
                        self.member.index(),
                        state.inflater.total_out(),
                        self.member.uncompressed_size()
                    ),
                ));
            }
            filled += n;

            let logical = state.logical_offset + filled as u64;
            if self.next_boundary(logical - 1) == Some(logical)
                && logical < self.member.logical_end()
                && !self.checkpoints.contains(logical)
            {
                self.checkpoints.insert(Checkpoint {
                    member: state.member,
                    logical_offset: logical,
                    input_offset: reader.get_ref().position(),
                    bits: reader.state(),
                    inflater: state.inflater.clone(),
                });
            }
        }

        state.logical_offset += filled as u64;
        state.input_offset = reader.get_ref().position();
        state.bits = reader.state();
        Ok(())
    }

    /// First checkpoint boundary strictly after `logical`, if checkpoints are on.
    fn next_boundary(&self, logical: u64) -> Option<u64> {
        if self.interval == 0 {
            return None;
        }
        let relative = logical - self.member.logical_start();
        (relative / self.interval + 1)
            .checked_mul(self.interval)
            .map(|next| next + self.member.logical_start())
    }
}
