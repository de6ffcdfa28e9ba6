//! Arena configuration parameters.

use crate::error::ArenaError;

/// Configuration for the global arena.
///
/// Validated by [`GlobalArena::init`](crate::GlobalArena::init); all values
/// are immutable once the arena exists.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArenaConfig {
    /// Total bytes reserved from the OS.
    ///
    /// Default: 32MB.
    pub capacity_bytes: usize,

    /// Allocation granularity: every region length and offset is rounded
    /// up to a multiple of this many bytes. Offsets are relative to the
    /// reservation, whose base address carries no alignment guarantee.
    ///
    /// Default: 16. Must be a non-zero power of two.
    pub alignment: usize,
}

impl ArenaConfig {
    /// Default arena size in megabytes.
    pub const DEFAULT_MEGABYTES: usize = 32;

    /// Default allocation granularity in bytes.
    pub const DEFAULT_ALIGNMENT: usize = 16;

    /// Create a config reserving `capacity_bytes`.
    pub fn new(capacity_bytes: usize) -> Self {
        Self {
            capacity_bytes,
            alignment: Self::DEFAULT_ALIGNMENT,
        }
    }

    /// Create a config reserving `megabytes << 20` bytes.
    pub fn from_megabytes(megabytes: usize) -> Result<Self, ArenaError> {
        megabytes
            .checked_mul(1 << 20)
            .map(Self::new)
            .ok_or(ArenaError::CapacityOverflow { megabytes })
    }

    /// Check the structural invariants.
    pub fn validate(&self) -> Result<(), ArenaError> {
        if self.capacity_bytes == 0 {
            return Err(ArenaError::InvalidConfig {
                reason: "capacity must be at least 1 byte".into(),
            });
        }
        if !self.alignment.is_power_of_two() {
            return Err(ArenaError::InvalidConfig {
                reason: format!("alignment {} is not a power of two", self.alignment),
            });
        }
        Ok(())
    }

    /// Round `size` up to the allocation granularity.
    ///
    /// Returns `None` if the rounded size overflows `usize`.
    pub fn round_up(&self, size: usize) -> Option<usize> {
        let mask = self.alignment - 1;
        size.checked_add(mask).map(|s| s & !mask)
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MEGABYTES << 20)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_capacity_is_32mb() {
        let config = ArenaConfig::default();
        assert_eq!(config.capacity_bytes, 32 * 1024 * 1024);
        assert_eq!(config.alignment, 16);
    }

    #[test]
    fn from_megabytes_shifts_by_twenty() {
        let config = ArenaConfig::from_megabytes(72).unwrap();
        assert_eq!(config.capacity_bytes, 72 << 20);
    }

    #[test]
    fn from_megabytes_rejects_overflow() {
        let err = ArenaConfig::from_megabytes(usize::MAX).unwrap_err();
        assert!(matches!(err, ArenaError::CapacityOverflow { .. }));
    }

    #[test]
    fn round_up_to_alignment() {
        let config = ArenaConfig::new(1024);
        assert_eq!(config.round_up(0), Some(0));
        assert_eq!(config.round_up(1), Some(16));
        assert_eq!(config.round_up(16), Some(16));
        assert_eq!(config.round_up(17), Some(32));
        assert_eq!(config.round_up(usize::MAX), None);
    }

    #[test]
    fn validate_rejects_bad_alignment_and_zero_capacity() {
        let mut config = ArenaConfig::new(1024);
        config.alignment = 12;
        assert!(matches!(
            config.validate(),
            Err(ArenaError::InvalidConfig { .. })
        ));
        assert!(ArenaConfig::new(0).validate().is_err());
        assert!(ArenaConfig::new(1).validate().is_ok());
    }
}
