//! Error types for argument parsing and project loading.

/// Errors produced while parsing a unit's arguments or loading a project.
///
/// Malformed individual flags are not errors: they are logged and skipped.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An I/O error occurred while reading a project file.
    #[error("failed to read configuration: {0}")]
    IoError(#[from] std::io::Error),

    /// A project file could not be parsed.
    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    /// `--profile` named a profile that does not exist.
    #[error("unknown profile '{0}', expected 'posix' or 'gobject'")]
    UnknownProfile(String),

    /// A required field is missing from a project file.
    #[error("missing required field: {0}")]
    MissingField(String),

    /// A project file is structurally invalid.
    #[error("validation error: {0}")]
    ValidationError(String),
}
