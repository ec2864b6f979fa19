//! # domains
//!
//! Models, port traits and the error type shared by every crate in the blob backend.
//! Nothing here performs I/O.

pub mod errors;
pub mod models;
pub mod pagination;
pub mod ports;

// Re-exporting for easier access in other crates
pub use errors::*;
pub use models::*;
pub use pagination::*;
pub use ports::*;
