//! Source documents and file identities for compilation units.
//!
//! This crate provides [`FileId`], the normalized identity of a file on disk,
//! [`SourceKind`] for recognizing source files by extension, the
//! [`SourceDocument`] owned by each compilation unit, and [`Location`] for
//! pointing diagnostics and symbols at a line and column.

#![warn(missing_docs)]

pub mod document;
pub mod file_id;
pub mod kind;
pub mod location;

pub use document::SourceDocument;
pub use file_id::{normalize_path, FileId};
pub use kind::{ParsePhase, SourceKind};
pub use location::Location;
