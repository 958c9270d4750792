//! Internal error type for broken engine invariants.

/// An invariant violation inside the engine, as opposed to a problem with the
/// user's project. Project problems are reported as diagnostics or as
/// structured build errors.
#[derive(Debug, thiserror::Error)]
#[error("internal engine error: {message}")]
pub struct InternalError {
    /// Description of the violated invariant.
    pub message: String,
}

impl InternalError {
    /// Creates a new internal error.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for InternalError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_format() {
        let err = InternalError::new("scope stack underflow");
        assert_eq!(
            err.to_string(),
            "internal engine error: scope stack underflow"
        );
    }

    #[test]
    fn from_string() {
        let err: InternalError = "artifact missing after publish".to_string().into();
        assert_eq!(err.message, "artifact missing after publish");
    }
}
