//! Fixed-capacity shared memory arena for the prt parallel ray tracer.
//!
//! Every shared structure of a render (scene database, framebuffer,
//! per-worker work pools and ray-tree stacks) is carved out of one arena
//! reserved at startup. The arena never grows: a request that does not fit
//! is a fatal misconfiguration, reported separately from the OS refusing to
//! supply the arena in the first place.
//!
//! # Architecture
//!
//! ```text
//! GlobalArena (Sync, shared by reference)
//! ├── ArenaConfig (capacity, alignment)
//! └── Mutex<ArenaState>
//!     ├── tail: untouched suffix of the reservation (bump carved)
//!     └── retired: released regions, reused first-fit
//!
//! ArenaRegion (Send, move-only)
//! └── exclusive &mut [u8] view of one carved range
//! ```
//!
//! Regions are exclusively owned slices, so two callers can never hold
//! overlapping memory and a region handed to a worker is written by that
//! worker alone.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod global;
pub mod region;

pub use config::ArenaConfig;
pub use error::ArenaError;
pub use global::{ArenaUsage, GlobalArena};
pub use region::ArenaRegion;
