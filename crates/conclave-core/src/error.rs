//! Error types for conclave-core

use thiserror::Error;

use crate::routing::RoutingError;

/// Core error type
#[derive(Debug, Error)]
pub enum Error {
    /// A required field is missing or malformed
    #[error("validation error: {0}")]
    Validation(String),

    /// Unknown identifier
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Entity kind ("agent", "group chat", ...)
        kind: &'static str,
        /// Identifier that was looked up
        id: String,
    },

    /// Duplicate name or membership
    #[error("conflict: {0}")]
    Conflict(String),

    /// The operation is not valid for the entity's current state
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Internal error (closed channels, poisoned state)
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Shorthand for [`Error::NotFound`]
    pub fn not_found(kind: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    /// Stable machine-readable code
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Error::Validation(_) => "VALIDATION_ERROR",
            Error::NotFound { .. } => "NOT_FOUND",
            Error::Conflict(_) => "CONFLICT",
            Error::InvalidState(_) => "INVALID_STATE",
            Error::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether the caller caused the error
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Error::Internal(_))
    }
}

impl From<RoutingError> for Error {
    fn from(err: RoutingError) -> Self {
        Error::InvalidState(err.to_string())
    }
}

impl From<conclave_sandbox::Error> for Error {
    fn from(err: conclave_sandbox::Error) -> Self {
        match err {
            conclave_sandbox::Error::UnsupportedLanguage(_) => Error::Validation(err.to_string()),
            other => Error::Internal(other.to_string()),
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Reject empty or whitespace-only strings
pub(crate) fn require_non_empty(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::Validation(format!("{} must not be empty", field)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_error_codes() {
        assert_eq!(Error::Validation("x".into()).code(), "VALIDATION_ERROR");
        assert_eq!(Error::not_found("agent", Uuid::nil()).code(), "NOT_FOUND");
        assert_eq!(Error::Conflict("x".into()).code(), "CONFLICT");
        assert_eq!(Error::InvalidState("x".into()).code(), "INVALID_STATE");
        assert_eq!(Error::Internal("x".into()).code(), "INTERNAL_ERROR");
    }

    #[test]
    fn test_not_found_message() {
        let err = Error::not_found("group chat", "abc");
        assert_eq!(err.to_string(), "group chat not found: abc");
        assert!(err.is_client_error());
        assert!(!Error::Internal("boom".into()).is_client_error());
    }

    #[test]
    fn test_routing_error_is_invalid_state() {
        let err: Error = RoutingError::NotAParticipant(Uuid::nil()).into();
        assert!(matches!(err, Error::InvalidState(_)));
    }

    #[test]
    fn test_unsupported_language_is_validation() {
        let err: Error = conclave_sandbox::Error::UnsupportedLanguage("cobol".into()).into();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_require_non_empty() {
        assert!(require_non_empty("name", "alice").is_ok());
        assert!(matches!(
            require_non_empty("name", "   "),
            Err(Error::Validation(msg)) if msg == "name must not be empty"
        ));
    }
}
