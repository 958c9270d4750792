//! Incremental build and analysis engine.
//!
//! A [`Project`] owns a set of build targets: [`CompilationUnit`]s, which
//! drive an external language [`Frontend`] to produce a compiled
//! [`Artifact`], and [`BuildTask`]s, which run external commands to produce
//! generated sources. Every target rebuilds only when it is stale relative to
//! its inputs and the targets it depends on, and each unit caches per-file
//! analyses of its artifact until the next successful compile.
//!
//! All access to frontend state happens inside the process-wide
//! [build context scope](scope), so at most one compiler context is active
//! at a time.

#![warn(missing_docs)]

pub mod analysis;
pub mod cancel;
pub mod error;
pub mod frontend;
pub mod graph;
pub mod project;
pub mod scope;
pub mod symbol_index;
pub mod target;
pub mod task;
pub mod unit;

pub use analysis::{Analysis, AnalysisKind, CodeStyle, IndentStyle, Outline, OutlineEntry};
pub use cancel::CancelToken;
pub use error::BuildError;
pub use frontend::{Context, Frontend, SymbolInfo, SymbolKind};
pub use graph::{DependencyGraph, GraphError};
pub use project::{Project, Target};
pub use scope::{ContextId, ScopeError, ScopeGuard};
pub use symbol_index::SymbolIndex;
pub use target::{BuildStatus, BuildTarget, Dependency, TargetInfo};
pub use task::BuildTask;
pub use unit::{Artifact, CompilationUnit, CompileReport};
