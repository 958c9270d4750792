//! Source file kinds, recognized by extension.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// The kind of a source file handed to the frontend.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Vala source (`.vala`).
    Vala,
    /// Vala package interface (`.vapi`).
    Vapi,
    /// Genie source (`.gs`).
    Genie,
    /// GObject introspection repository (`.gir`).
    Gir,
}

impl SourceKind {
    /// Recognizes a source file by its extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "vala" => Some(SourceKind::Vala),
            "vapi" => Some(SourceKind::Vapi),
            "gs" => Some(SourceKind::Genie),
            "gir" => Some(SourceKind::Gir),
            _ => None,
        }
    }

    /// The parse phase this kind of file belongs to.
    pub fn phase(self) -> ParsePhase {
        match self {
            SourceKind::Vala | SourceKind::Vapi => ParsePhase::Primary,
            SourceKind::Genie => ParsePhase::Secondary,
            SourceKind::Gir => ParsePhase::Introspection,
        }
    }
}

/// The frontend parses sources in phases, in declaration order.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum ParsePhase {
    /// Primary-language sources and interfaces.
    Primary,
    /// Secondary-syntax sources.
    Secondary,
    /// Introspection-format sources.
    Introspection,
}

impl ParsePhase {
    /// All phases in the order the frontend runs them.
    pub const ALL: [ParsePhase; 3] = [
        ParsePhase::Primary,
        ParsePhase::Secondary,
        ParsePhase::Introspection,
    ];
}
