//! Build configuration for compilation units.
//!
//! [`parse_arguments`] turns a unit's compiler-style flag list into a
//! [`BuildConfiguration`] plus its source references. The loaders read whole
//! project descriptions, either from a `valence.toml` file or from meson's
//! target introspection data, into a [`ProjectDescription`].

#![warn(missing_docs)]

pub mod error;
pub mod flags;
pub mod loader;
pub mod meson;
pub mod resolve;
pub mod types;

pub use error::ConfigError;
pub use flags::{collect_sources, parse_arguments, ArgumentBase, ParsedArguments};
pub use loader::{load_project, load_project_from_str};
pub use meson::{load_meson_targets, load_meson_targets_from_str};
pub use resolve::{resolve_project, ProjectDescription, TaskDescription, UnitDescription};
pub use types::*;
