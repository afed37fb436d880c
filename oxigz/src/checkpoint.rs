//! Decompression checkpoints.
//!
//! A checkpoint is everything needed to continue decoding a member at a
//! known logical offset: the inflater (with its history window), the bits the
//! bit reader had already pulled, and the absolute source offset of the next
//! unread byte. Checkpoints live in a small LRU cache keyed by logical offset.

use log::trace;
use oxigz_core::BitState;
use oxigz_deflate::Inflater;
use std::collections::BTreeMap;

/// Saved decoder state at a logical offset.
#[derive(Debug, Clone)]
pub(crate) struct Checkpoint {
    /// Member being decoded.
    pub member: usize,
    /// Logical offset of the next byte the inflater produces.
    pub logical_offset: u64,
    /// Absolute source offset of the next byte to feed the bit reader.
    pub input_offset: u64,
    /// Bits already pulled from the source but not consumed.
    pub bits: BitState,
    pub inflater: Inflater,
}

impl Checkpoint {
    /// State at the first byte of a member.
    pub fn member_start(member: usize, logical_offset: u64, input_offset: u64) -> Self {
        Self {
            member,
            logical_offset,
            input_offset,
            bits: BitState::default(),
            inflater: Inflater::new(),
        }
    }
}

#[derive(Debug)]
struct Entry {
    checkpoint: Checkpoint,
    last_used: u64,
}

/// Bounded checkpoint store with least-recently-used eviction.
#[derive(Debug, Default)]
pub(crate) struct CheckpointCache {
    entries: BTreeMap<u64, Entry>,
    capacity: usize,
    tick: u64,
}

impl CheckpointCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: BTreeMap::new(),
            capacity,
            tick: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn contains(&self, logical_offset: u64) -> bool {
        self.entries.contains_key(&logical_offset)
    }

    /// Closest checkpoint at or before `logical_offset` inside `member`.
    pub fn nearest(&mut self, member: usize, logical_offset: u64) -> Option<&Checkpoint> {
        self.tick += 1;
        let tick = self.tick;

        let (_, entry) = self.entries.range_mut(..=logical_offset).next_back()?;
        if entry.checkpoint.member != member {
            return None;
        }
        entry.last_used = tick;
        trace!(
            "reusing checkpoint at {} for offset {}",
            entry.checkpoint.logical_offset, logical_offset
        );
        Some(&entry.checkpoint)
    }

    pub fn insert(&mut self, checkpoint: Checkpoint) {
        if self.capacity == 0 || self.contains(checkpoint.logical_offset) {
            return;
        }

        if self.entries.len() >= self.capacity {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_used)
                .map(|(&offset, _)| offset);
            if let Some(offset) = oldest {
                self.entries.remove(&offset);
                trace!("evicted checkpoint at {}", offset);
            }
        }

        self.tick += 1;
        trace!(
            "checkpoint at logical offset {} (member {}, input offset {})",
            checkpoint.logical_offset, checkpoint.member, checkpoint.input_offset
        );
        self.entries.insert(
            checkpoint.logical_offset,
            Entry {
                checkpoint,
                last_used: self.tick,
            },
        );
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(member: usize, logical_offset: u64) -> Checkpoint {
        Checkpoint::member_start(member, logical_offset, 0)
    }

    #[test]
    fn test_nearest_stays_in_member() {
        let mut cache = CheckpointCache::new(8);
        cache.insert(at(0, 100));
        cache.insert(at(0, 200));
        cache.insert(at(1, 300));

        assert_eq!(cache.nearest(0, 250).map(|c| c.logical_offset), Some(200));
        assert_eq!(cache.nearest(0, 200).map(|c| c.logical_offset), Some(200));
        assert_eq!(cache.nearest(0, 99).map(|c| c.logical_offset), None);
        assert_eq!(cache.nearest(2, 350).map(|c| c.logical_offset), None);
        assert_eq!(cache.nearest(1, 350).map(|c| c.logical_offset), Some(300));
    }

    #[test]
    fn test_lru_eviction() {
        let mut cache = CheckpointCache::new(2);
        cache.insert(at(0, 10));
        cache.insert(at(0, 20));
        assert!(cache.nearest(0, 10).is_some());

        cache.insert(at(0, 30));
        assert_eq!(cache.len(), 2);
        assert!(cache.contains(10));
        assert!(!cache.contains(20));
        assert!(cache.contains(30));
    }

    #[test]
    fn test_zero_capacity() {
        let mut cache = CheckpointCache::new(0);
        cache.insert(at(0, 10));
        assert_eq!(cache.len(), 0);
    }
}
