//! Diagnostic severity levels ordered from least to most severe.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The severity level of a diagnostic.
///
/// Declaration order is severity order, so the derived `Ord` can be used to
/// filter ("at least a warning").
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Additional context.
    Note,
    /// Use of a deprecated or experimental API.
    Deprecated,
    /// A likely problem that does not stop compilation.
    Warning,
    /// A definite problem in the user's code.
    Error,
}

impl Severity {
    /// Returns `true` for anything `--fatal-warnings` turns into a failure.
    pub fn is_warning_or_worse(self) -> bool {
        self >= Severity::Warning
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Note => write!(f, "note"),
            Severity::Deprecated => write!(f, "deprecated"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}
