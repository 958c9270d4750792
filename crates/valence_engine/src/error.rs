//! Error types for building targets and serving analyses.

use crate::graph::GraphError;
use crate::scope::ScopeError;
use std::path::PathBuf;
use std::process::ExitStatus;
use valence_common::InternalError;
use valence_config::ConfigError;
use valence_source::FileId;

/// Errors that abort a build or an analysis request.
///
/// A failed build never touches the target's last successful state: its
/// artifact, freshness stamp and cached analyses stay valid. Problems in the
/// compiled sources are not errors; they are diagnostics.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// The unit's arguments could not be parsed.
    #[error("invalid configuration: {0}")]
    Configuration(#[from] ConfigError),

    /// A generated input was not present when the unit compiled.
    #[error("generated source {path} does not exist")]
    MissingGeneratedSource {
        /// The file that was expected.
        path: PathBuf,
    },

    /// Cancellation was requested at a safe point.
    #[error("build cancelled")]
    Cancelled,

    /// The build context scope could not be entered.
    #[error(transparent)]
    Scope(#[from] ScopeError),

    /// `compile` was called without a prepared context.
    #[error("unit has no configured context")]
    NotConfigured,

    /// An analysis was requested before the first successful build.
    #[error("unit has not been built")]
    NotBuilt,

    /// The file is not part of the unit (or of any unit).
    #[error("{0} is not a source of this unit")]
    UnknownSource(FileId),

    /// Generated sources are reread from disk before every compile and
    /// cannot be edited in memory.
    #[error("{0} is generated and cannot be edited")]
    GeneratedSource(FileId),

    /// No target with this id exists.
    #[error("unknown target '{0}'")]
    UnknownTarget(String),

    /// A build task's command exited unsuccessfully.
    #[error("task '{target}' failed ({status}): {stderr}")]
    TaskFailed {
        /// The task id.
        target: String,
        /// The exit status.
        status: ExitStatus,
        /// Captured standard error, trimmed.
        stderr: String,
    },

    /// Reading or writing a file failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The dependency graph is inconsistent.
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// An engine invariant was violated.
    #[error(transparent)]
    Internal(#[from] InternalError),
}

impl BuildError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BuildError::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_missing_generated() {
        let err = BuildError::MissingGeneratedSource {
            path: PathBuf::from("/p/build/config.vala"),
        };
        assert_eq!(
            err.to_string(),
            "generated source /p/build/config.vala does not exist"
        );
    }

    #[test]
    fn display_unknown_source() {
        let err = BuildError::UnknownSource(FileId::new("/p/src/other.vala"));
        assert_eq!(err.to_string(), "/p/src/other.vala is not a source of this unit");
    }

    #[test]
    fn display_generated_source() {
        let err = BuildError::GeneratedSource(FileId::new("/p/build/config.vala"));
        assert_eq!(
            err.to_string(),
            "/p/build/config.vala is generated and cannot be edited"
        );
    }

    #[test]
    fn config_error_converts() {
        let err: BuildError = ConfigError::UnknownProfile("dova".into()).into();
        assert!(matches!(err, BuildError::Configuration(_)));
        assert!(err.to_string().starts_with("invalid configuration: unknown profile"));
    }

    #[test]
    fn graph_error_is_transparent() {
        let err: BuildError = GraphError::Cycle {
            target: "app".into(),
        }
        .into();
        assert_eq!(err.to_string(), "dependency cycle through target 'app'");
    }
}
