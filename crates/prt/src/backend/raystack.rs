//! Bounded ray-tree stack backed by an arena region.
//!
//! Entries are 16 bytes: ray id (`u64`), depth (`u32`), weight (`f32`).
//! A depth-first walk of a binary ray tree of depth `d` never holds more
//! than `d + 1` entries, which is the capacity [`RayTreeStack::with_depth`]
//! reserves.

use prt_arena::{ArenaError, ArenaRegion, GlobalArena};
use prt_core::RayId;

const ENTRY_BYTES: usize = 16;

/// One pending ray.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayEntry {
    /// Id drawn from the shared ray counter.
    pub ray: RayId,
    /// Bounces from the eye ray.
    pub depth: u32,
    /// Contribution of this ray to its pixel.
    pub weight: f32,
}

/// Fixed-capacity stack of [`RayEntry`].
#[derive(Debug)]
pub struct RayTreeStack {
    region: ArenaRegion,
    capacity: usize,
    len: usize,
}

impl RayTreeStack {
    /// Allocate a stack able to walk a ray tree of `max_depth` levels.
    pub fn with_depth(max_depth: u32, arena: &GlobalArena) -> Result<Self, ArenaError> {
        let capacity = max_depth as usize + 1;
        let region = arena.allocate(capacity * ENTRY_BYTES)?;
        Ok(Self {
            region,
            capacity,
            len: 0,
        })
    }

    /// Maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Entries currently held.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the stack is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Push `entry`, handing it back if the stack is full.
    pub fn push(&mut self, entry: RayEntry) -> Result<(), RayEntry> {
        if self.len == self.capacity {
            return Err(entry);
        }
        let i = self.len;
        self.region.write_u64(2 * i, entry.ray.0);
        self.region.write_u32(4 * i + 2, entry.depth);
        self.region.write_f32(4 * i + 3, entry.weight);
        self.len += 1;
        Ok(())
    }

    /// Pop the most recently pushed entry.
    pub fn pop(&mut self) -> Option<RayEntry> {
        let i = self.len.checked_sub(1)?;
        self.len = i;
        Some(RayEntry {
            ray: RayId(self.region.read_u64(2 * i)),
            depth: self.region.read_u32(4 * i + 2),
            weight: self.region.read_f32(4 * i + 3),
        })
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.len = 0;
    }
}
