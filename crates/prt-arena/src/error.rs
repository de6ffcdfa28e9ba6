//! Arena-specific error types.

use thiserror::Error;

/// Errors that can occur while reserving or carving the arena.
///
/// [`Reservation`](Self::Reservation) means the environment could not
/// supply the arena; [`Exhausted`](Self::Exhausted) means the configured
/// capacity is too small for the scene. Both are fatal.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ArenaError {
    /// The OS refused to supply the requested capacity.
    #[error("Cannot initialize global heap ({capacity} bytes unavailable)")]
    Reservation {
        /// Bytes requested from the OS.
        capacity: usize,
    },

    /// The arena has no free range large enough for the request.
    #[error(
        "Cannot allocate global memory (requested {requested} bytes, \
         {remaining} of {capacity} bytes free)"
    )]
    Exhausted {
        /// Bytes requested by the caller (before alignment rounding).
        requested: usize,
        /// Free bytes left in the arena at the time of the request.
        remaining: usize,
        /// Total arena capacity.
        capacity: usize,
    },

    /// A megabyte count too large to express in bytes.
    #[error("Global memory size of {megabytes} MB is too large")]
    CapacityOverflow {
        /// The configured megabyte count.
        megabytes: usize,
    },

    /// The arena configuration violates an invariant.
    #[error("invalid arena configuration: {reason}")]
    InvalidConfig {
        /// Which invariant was violated.
        reason: String,
    },

    /// A region handed to `release` was not carved from this arena.
    #[error("region at offset {offset} ({len} bytes) does not belong to this arena")]
    ForeignRegion {
        /// The region's recorded offset.
        offset: usize,
        /// The region's length.
        len: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exhaustion_and_reservation_messages_differ() {
        let exhausted = ArenaError::Exhausted {
            requested: 64,
            remaining: 16,
            capacity: 1024,
        };
        let reservation = ArenaError::Reservation { capacity: 1024 };
        assert!(exhausted.to_string().starts_with("Cannot allocate global memory"));
        assert!(reservation
            .to_string()
            .starts_with("Cannot initialize global heap"));
    }
}
