//! Strongly-typed identifiers for workers and rays.

use std::fmt;

/// Ordinal identifier of one worker within a run.
///
/// Ids are handed out first-come-first-served under the coordination
/// state's id lock, so `WorkerId(n)` says nothing about which part of the
/// image the worker renders. Every run uses exactly the ids
/// `0..worker_count`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorkerId(pub u32);

impl WorkerId {
    /// The worker that always times itself and records the parallel-phase
    /// start reference.
    pub const PRIMARY: Self = Self(0);

    /// Whether this is worker 0.
    pub fn is_primary(self) -> bool {
        self == Self::PRIMARY
    }

    /// The id as a slot index into per-worker tables.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for WorkerId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Unique identifier of a traced ray.
///
/// Allocated from the shared ray counter, which starts at 1; `RayId(0)`
/// is never issued and can be used as a "no ray" marker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RayId(pub u64);

impl RayId {
    /// The first id the shared counter hands out.
    pub const FIRST: Self = Self(1);
}

impl fmt::Display for RayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for RayId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worker_zero_is_primary() {
        assert!(WorkerId(0).is_primary());
        assert!(!WorkerId(1).is_primary());
        assert_eq!(WorkerId::PRIMARY.index(), 0);
    }

    #[test]
    fn display_is_bare_number() {
        assert_eq!(WorkerId(7).to_string(), "7");
        assert_eq!(RayId(42).to_string(), "42");
    }

    #[test]
    fn first_ray_id_is_one() {
        assert_eq!(RayId::FIRST, RayId::from(1));
    }
}
