//! Exclusively owned regions carved out of the global arena.
//!
//! An [`ArenaRegion`] is the only handle to its bytes: it is `Send`, not
//! `Clone`, and splitting it consumes it. Ownership therefore enforces the
//! single-writer discipline for per-worker structures without any locking.

use std::fmt;
use std::ops::Range;

/// A contiguous, zero-initialised byte range of the global arena.
///
/// Word accessors use little-endian encoding and index in units of the
/// word size (`read_u32(3)` reads bytes `12..16`).
pub struct ArenaRegion {
    /// Byte offset of the first byte within the arena.
    offset: usize,
    bytes: &'static mut [u8],
}

impl ArenaRegion {
    pub(crate) fn new(offset: usize, bytes: &'static mut [u8]) -> Self {
        Self { offset, bytes }
    }

    /// A zero-length region that consumed no arena capacity.
    pub fn empty() -> Self {
        Self {
            offset: 0,
            bytes: Default::default(),
        }
    }

    /// Byte offset of this region within the arena.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether this region is zero-length.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The arena byte range `offset..offset + len`.
    pub fn range(&self) -> Range<usize> {
        self.offset..self.offset + self.bytes.len()
    }

    /// Shared view of the bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..]
    }

    /// Mutable view of the bytes.
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.bytes[..]
    }

    /// Number of whole `u32` words that fit in this region.
    pub fn u32_capacity(&self) -> usize {
        self.bytes.len() / 4
    }

    /// Read the `index`-th `u32` word.
    ///
    /// # Panics
    ///
    /// Panics if the word lies outside the region.
    pub fn read_u32(&self, index: usize) -> u32 {
        let start = index * 4;
        let mut word = [0u8; 4];
        word.copy_from_slice(&self.bytes[start..start + 4]);
        u32::from_le_bytes(word)
    }

    /// Write the `index`-th `u32` word.
    ///
    /// # Panics
    ///
    /// Panics if the word lies outside the region.
    pub fn write_u32(&mut self, index: usize, value: u32) {
        let start = index * 4;
        self.bytes[start..start + 4].copy_from_slice(&value.to_le_bytes());
    }

    /// Read the `index`-th `u64` word.
    ///
    /// # Panics
    ///
    /// Panics if the word lies outside the region.
    pub fn read_u64(&self, index: usize) -> u64 {
        let start = index * 8;
        let mut word = [0u8; 8];
        word.copy_from_slice(&self.bytes[start..start + 8]);
        u64::from_le_bytes(word)
    }

    /// Write the `index`-th `u64` word.
    ///
    /// # Panics
    ///
    /// Panics if the word lies outside the region.
    pub fn write_u64(&mut self, index: usize, value: u64) {
        let start = index * 8;
        self.bytes[start..start + 8].copy_from_slice(&value.to_le_bytes());
    }

    /// Read the `index`-th `u32` word reinterpreted as `f32`.
    pub fn read_f32(&self, index: usize) -> f32 {
        f32::from_bits(self.read_u32(index))
    }

    /// Write an `f32` into the `index`-th `u32` word.
    pub fn write_f32(&mut self, index: usize, value: f32) {
        self.write_u32(index, value.to_bits());
    }

    /// Split into `[0, mid)` and `[mid, len)`.
    ///
    /// # Panics
    ///
    /// Panics if `mid > len`.
    pub fn split_at(self, mid: usize) -> (ArenaRegion, ArenaRegion) {
        let ArenaRegion { offset, bytes } = self;
        let (head, tail) = bytes.split_at_mut(mid);
        (
            ArenaRegion::new(offset, head),
            ArenaRegion::new(offset + mid, tail),
        )
    }

    /// Split into consecutive regions of `chunk_len` bytes.
    ///
    /// The last region is shorter if `len` is not a multiple of
    /// `chunk_len`.
    ///
    /// # Panics
    ///
    /// Panics if `chunk_len` is zero.
    pub fn split_into_chunks(self, chunk_len: usize) -> Vec<ArenaRegion> {
        assert!(chunk_len > 0, "chunk_len must be non-zero");
        let mut chunks = Vec::with_capacity(self.len().div_ceil(chunk_len));
        let mut rest = self;
        while rest.len() > chunk_len {
            let (head, tail) = rest.split_at(chunk_len);
            chunks.push(head);
            rest = tail;
        }
        if !rest.is_empty() {
            chunks.push(rest);
        }
        chunks
    }

    /// Address of the first byte, used to check arena membership.
    pub(crate) fn addr(&self) -> usize {
        self.bytes.as_ptr() as usize
    }

    pub(crate) fn into_bytes(self) -> &'static mut [u8] {
        self.bytes
    }
}

impl fmt::Debug for ArenaRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArenaRegion")
            .field("offset", &self.offset)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl fmt::Display for ArenaRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ArenaRegion(off={}, len={})", self.offset, self.len())
    }
}
