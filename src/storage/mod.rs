//! Index persistence
//!
//! Explicit, versioned snapshot format for saving and restoring a vector index.

pub mod snapshot;

pub use snapshot::{FORMAT_VERSION, IndexSnapshot, MAGIC};
