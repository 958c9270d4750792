//! Memoization of per-file analyses.
//!
//! An [`AnalysisCache`] maps a source file and an analysis kind to the last
//! computed result and the logical time it was computed at. A result is only
//! handed out while it is at least as new as the artifact it was derived from;
//! anything older is treated as absent and recomputed by the caller.

#![warn(missing_docs)]

pub mod cache;
pub mod diff;

pub use cache::{AnalysisCache, CachedAnalysis};
pub use diff::SourceSetDiff;
