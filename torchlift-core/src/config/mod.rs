//! Configuration types
//!
//! Boot-time configuration loaded by the command layer. Optionally
//! stored as postcard binary data (`serde` feature).

pub mod types;

pub use types::*;
