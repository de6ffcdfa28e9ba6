//! Core types for the prt parallel ray tracer.
//!
//! This is the leaf crate with zero internal dependencies. It defines the
//! identifiers shared by every layer of the renderer (worker and ray ids)
//! and the error type reported by scene-level collaborators.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod id;

pub use error::SceneError;
pub use id::{RayId, WorkerId};
