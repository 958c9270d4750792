//! Shared foundational types used across the Valence build engine.
//!
//! This crate provides the process-wide logical clock used for staleness
//! decisions, content hashing for document change detection, interned symbol
//! names, and the internal error type.

#![warn(missing_docs)]

pub mod clock;
pub mod hash;
pub mod name;
pub mod result;

pub use clock::{SharedStamp, Timestamp};
pub use hash::ContentHash;
pub use name::{NameId, NameTable};
pub use result::InternalError;
