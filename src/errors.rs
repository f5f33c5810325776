//! Error handling for the polling core

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Result type alias for the polling core
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the polling core
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Malformed input; retrying without changing it will fail again
    #[error("Validation failed: {field}: {reason}")]
    Validation { field: String, reason: String },

    /// Missing or unusable caller identity
    #[error("Authentication required: {message}")]
    Auth { message: String },

    /// Referenced poll does not exist
    #[error("Poll {poll_id} not found")]
    NotFound { poll_id: Uuid },

    /// Caller is authenticated but may not perform this mutation
    #[error("Not allowed to modify poll {poll_id}")]
    Forbidden { poll_id: Uuid },

    /// Poll is closed for voting
    #[error("Poll {poll_id} is not active")]
    PollInactive { poll_id: Uuid },

    /// Selected option is not one of the poll's options
    #[error("Option '{option_id}' does not exist on poll {poll_id}")]
    InvalidOption { poll_id: Uuid, option_id: String },

    /// Caller already has a vote on this poll
    #[error("Already voted on poll {poll_id}")]
    AlreadyVoted { poll_id: Uuid },

    /// Poll was closed before
    #[error("Poll {poll_id} is already closed")]
    AlreadyClosed { poll_id: Uuid },

    /// Ledger-level uniqueness violation, translated to `AlreadyVoted` by the engine
    #[error("Duplicate vote for poll {poll_id}")]
    DuplicateVote { poll_id: Uuid },

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Snapshot file errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Stable, machine-readable error discriminant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    ValidationError,
    AuthError,
    NotFound,
    Forbidden,
    PollInactive,
    InvalidOption,
    AlreadyVoted,
    AlreadyClosed,
    DuplicateVote,
    Internal,
}

impl ErrorKind {
    /// Wire code for the kind
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ValidationError => "VALIDATION_ERROR",
            ErrorKind::AuthError => "AUTH_ERROR",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::Forbidden => "FORBIDDEN",
            ErrorKind::PollInactive => "POLL_INACTIVE",
            ErrorKind::InvalidOption => "INVALID_OPTION",
            ErrorKind::AlreadyVoted => "ALREADY_VOTED",
            ErrorKind::AlreadyClosed => "ALREADY_CLOSED",
            ErrorKind::DuplicateVote => "DUPLICATE_VOTE",
            ErrorKind::Internal => "INTERNAL",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Error {
    /// Create a new validation error
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create a new authentication error
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    /// Create a new internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Stable kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation { .. } => ErrorKind::ValidationError,
            Error::Auth { .. } => ErrorKind::AuthError,
            Error::NotFound { .. } => ErrorKind::NotFound,
            Error::Forbidden { .. } => ErrorKind::Forbidden,
            Error::PollInactive { .. } => ErrorKind::PollInactive,
            Error::InvalidOption { .. } => ErrorKind::InvalidOption,
            Error::AlreadyVoted { .. } => ErrorKind::AlreadyVoted,
            Error::AlreadyClosed { .. } => ErrorKind::AlreadyClosed,
            Error::DuplicateVote { .. } => ErrorKind::DuplicateVote,
            Error::Serialization(_) | Error::Io(_) | Error::Internal { .. } => {
                ErrorKind::Internal
            }
        }
    }
}

/// Convenience macros for creating specific error types
#[macro_export]
macro_rules! internal_error {
    ($msg:expr) => {
        $crate::Error::internal($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::Error::internal(format!($fmt, $($arg)*))
    };
}

#[macro_export]
macro_rules! validation_error {
    ($field:expr, $msg:expr) => {
        $crate::Error::validation($field, $msg)
    };
    ($field:expr, $fmt:expr, $($arg:tt)*) => {
        $crate::Error::validation($field, format!($fmt, $($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let validation_err = Error::validation("question", "must not be empty");
        assert!(matches!(validation_err, Error::Validation { .. }));
        assert_eq!(validation_err.kind(), ErrorKind::ValidationError);

        let auth_err = Error::auth("missing user id");
        assert_eq!(auth_err.kind(), ErrorKind::AuthError);

        let internal_err = Error::internal("lock poisoned");
        assert_eq!(internal_err.kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_error_macros() {
        let err = internal_error!("poll store {} poisoned", "read");
        assert!(matches!(err, Error::Internal { ref message } if message.contains("read")));

        let err = validation_error!("options", "expected at most {} options", 10);
        assert!(matches!(err, Error::Validation { ref reason, .. } if reason.contains("10")));
    }

    #[test]
    fn test_kinds_are_distinct() {
        let poll_id = Uuid::new_v4();
        let errors = [
            Error::NotFound { poll_id },
            Error::Forbidden { poll_id },
            Error::PollInactive { poll_id },
            Error::InvalidOption {
                poll_id,
                option_id: "9".to_string(),
            },
            Error::AlreadyVoted { poll_id },
            Error::AlreadyClosed { poll_id },
            Error::DuplicateVote { poll_id },
        ];

        let kinds: std::collections::HashSet<_> = errors.iter().map(Error::kind).collect();
        assert_eq!(kinds.len(), errors.len());
    }

    #[test]
    fn test_kind_serializes_as_code() {
        let json = serde_json::to_string(&ErrorKind::AlreadyVoted).unwrap();
        assert_eq!(json, "\"ALREADY_VOTED\"");
        assert_eq!(ErrorKind::PollInactive.to_string(), "POLL_INACTIVE");
    }
}
