//! The process-wide arena and its allocator bookkeeping.
//!
//! [`GlobalArena`] reserves its whole capacity once, then hands out
//! [`ArenaRegion`]s under its own lock. Fresh regions are bump-carved from
//! the untouched tail of the reservation; released regions go on a retired
//! list and are reused first-fit (splitting larger ranges) before the tail
//! is touched. Retired ranges are never merged, so a long alloc/release
//! churn of mixed sizes can fail a request that the free byte count alone
//! would satisfy.

use std::sync::Mutex;

use tracing::{debug, trace, warn};

use crate::config::ArenaConfig;
use crate::error::ArenaError;
use crate::region::ArenaRegion;

/// A released range waiting to be handed out again.
struct RetiredRange {
    offset: usize,
    bytes: &'static mut [u8],
}

/// Mutable allocator state, guarded by the arena lock.
struct ArenaState {
    /// Suffix of the reservation that has never been handed out.
    tail: &'static mut [u8],
    /// Arena offset of `tail[0]`.
    tail_offset: usize,
    /// Released ranges available for reuse.
    retired: Vec<RetiredRange>,
    in_use: usize,
    peak: usize,
    allocations: u64,
    releases: u64,
}

impl ArenaState {
    fn remaining(&self) -> usize {
        self.tail.len() + self.retired.iter().map(|r| r.bytes.len()).sum::<usize>()
    }

    fn commit(&mut self, offset: usize, bytes: &'static mut [u8]) -> ArenaRegion {
        self.in_use += bytes.len();
        self.peak = self.peak.max(self.in_use);
        self.allocations += 1;
        ArenaRegion::new(offset, bytes)
    }

    /// First-fit search of the retired list.
    fn take_retired(&mut self, len: usize) -> Option<(usize, &'static mut [u8])> {
        let pos = self.retired.iter().position(|r| r.bytes.len() >= len)?;
        let RetiredRange { offset, bytes } = self.retired.swap_remove(pos);
        let (head, rest) = bytes.split_at_mut(len);
        if !rest.is_empty() {
            self.retired.push(RetiredRange {
                offset: offset + len,
                bytes: rest,
            });
        }
        // Retired memory holds whatever its previous owner wrote.
        head.fill(0);
        Some((offset, head))
    }

    /// Bump-carve `len` bytes from the tail.
    ///
    /// When the capacity is not a multiple of the granularity the last
    /// piece of the tail is shorter than `len`; it is handed out whole as
    /// long as it still holds the `size` bytes actually requested.
    fn take_tail(&mut self, size: usize, len: usize) -> Option<(usize, &'static mut [u8])> {
        let len = if self.tail.len() >= len {
            len
        } else if self.tail.len() >= size {
            self.tail.len()
        } else {
            return None;
        };
        let (head, rest) = std::mem::take(&mut self.tail).split_at_mut(len);
        let offset = self.tail_offset;
        self.tail = rest;
        self.tail_offset += len;
        Some((offset, head))
    }
}

/// Snapshot of arena occupancy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArenaUsage {
    /// Total reserved bytes.
    pub capacity: usize,
    /// Bytes currently held by live regions.
    pub in_use: usize,
    /// High-water mark of `in_use`.
    pub peak: usize,
    /// Free bytes (untouched tail plus retired ranges).
    pub remaining: usize,
    /// Successful non-empty allocations so far.
    pub allocations: u64,
    /// Regions released so far.
    pub releases: u64,
}

/// The single shared memory arena of a render.
///
/// Created once by the main thread before any worker exists, then shared
/// by reference. `allocate` and `release` may be called from any thread;
/// they serialize on the arena's own lock, so concurrent callers always
/// receive disjoint regions.
///
/// The reservation lives until process exit. Dropping a `GlobalArena` does
/// not return its memory to the OS, because regions carved from it may
/// still be owned elsewhere.
pub struct GlobalArena {
    config: ArenaConfig,
    /// Address of the first reserved byte.
    base: usize,
    state: Mutex<ArenaState>,
}

// Compile-time assertion: GlobalArena must be Send + Sync.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<GlobalArena>();
    assert::<ArenaRegion>();
};

impl GlobalArena {
    /// Reserve the configured capacity from the OS.
    ///
    /// The whole reservation is zero-initialised up front.
    ///
    /// # Errors
    ///
    /// [`ArenaError::InvalidConfig`] if `config` is invalid, or
    /// [`ArenaError::Reservation`] if the OS cannot supply the capacity.
    pub fn init(config: ArenaConfig) -> Result<Self, ArenaError> {
        config.validate()?;
        let capacity = config.capacity_bytes;

        let mut buffer: Vec<u8> = Vec::new();
        buffer
            .try_reserve_exact(capacity)
            .map_err(|_| ArenaError::Reservation { capacity })?;
        buffer.resize(capacity, 0);
        let memory: &'static mut [u8] = Box::leak(buffer.into_boxed_slice());

        debug!(capacity, alignment = config.alignment, "global arena reserved");

        Ok(Self {
            base: memory.as_ptr() as usize,
            config,
            state: Mutex::new(ArenaState {
                tail: memory,
                tail_offset: 0,
                retired: Vec::new(),
                in_use: 0,
                peak: 0,
                allocations: 0,
                releases: 0,
            }),
        })
    }

    /// The arena's configuration.
    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    /// Total reserved bytes.
    pub fn capacity(&self) -> usize {
        self.config.capacity_bytes
    }

    /// Carve a zero-initialised region of at least `size` bytes.
    ///
    /// The region length is `size` rounded up to the configured granularity,
    /// except for the final piece of an arena whose capacity is not a
    /// multiple of it.
    /// A zero-byte request returns an empty region without consuming
    /// capacity.
    ///
    /// # Errors
    ///
    /// [`ArenaError::Exhausted`] if no free range is large enough.
    pub fn allocate(&self, size: usize) -> Result<ArenaRegion, ArenaError> {
        let capacity = self.capacity();
        let Some(len) = self.config.round_up(size) else {
            return Err(ArenaError::Exhausted {
                requested: size,
                remaining: self.usage().remaining,
                capacity,
            });
        };
        if len == 0 {
            return Ok(ArenaRegion::empty());
        }

        let mut state = self.state.lock().unwrap();
        let carved = match state.take_retired(len) {
            Some(found) => Some(found),
            None => state.take_tail(size, len),
        };
        match carved {
            Some((offset, bytes)) => {
                trace!(offset, len, "arena allocate");
                Ok(state.commit(offset, bytes))
            }
            None => {
                let remaining = state.remaining();
                warn!(requested = size, remaining, capacity, "global arena exhausted");
                Err(ArenaError::Exhausted {
                    requested: size,
                    remaining,
                    capacity,
                })
            }
        }
    }

    /// Return a region to the arena for reuse.
    ///
    /// Any region carved from this arena may be released, including the
    /// pieces of a split region.
    ///
    /// # Errors
    ///
    /// [`ArenaError::ForeignRegion`] if `region` does not lie inside this
    /// arena's reservation. The region is dropped in that case.
    pub fn release(&self, region: ArenaRegion) -> Result<(), ArenaError> {
        if region.is_empty() {
            return Ok(());
        }
        let addr = region.addr();
        let end = self.base + self.capacity();
        if addr < self.base || addr + region.len() > end || addr - self.base != region.offset() {
            return Err(ArenaError::ForeignRegion {
                offset: region.offset(),
                len: region.len(),
            });
        }

        let offset = region.offset();
        let bytes = region.into_bytes();
        trace!(offset, len = bytes.len(), "arena release");

        let mut state = self.state.lock().unwrap();
        state.in_use -= bytes.len();
        state.releases += 1;
        state.retired.push(RetiredRange { offset, bytes });
        Ok(())
    }

    /// Current occupancy.
    pub fn usage(&self) -> ArenaUsage {
        let state = self.state.lock().unwrap();
        ArenaUsage {
            capacity: self.capacity(),
            in_use: state.in_use,
            peak: state.peak,
            remaining: state.remaining(),
            allocations: state.allocations,
            releases: state.releases,
        }
    }
}

impl std::fmt::Debug for GlobalArena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlobalArena")
            .field("config", &self.config)
            .field("usage", &self.usage())
            .finish()
    }
}
