//! Caller-facing failure taxonomy.
//!
//! # Responsibility
//! - Collapse layered service errors into a small, stable set of kinds.
//! - Give every kind a stable machine code and user-facing message.
//!
//! # Invariants
//! - `code()` and `user_message()` values never change once released;
//!   request layers and tests match on them.

use serde::Serialize;
use std::fmt::{Display, Formatter};

/// Stable classification of every core failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A referenced entity does not exist.
    NotFound,
    /// The session already has a student.
    AlreadyBooked,
    /// Input fails a domain constraint.
    ValidationError,
    /// A signed feedback link is older than its validity window.
    Expired,
    /// A signed feedback link fails verification or names no tutor.
    Invalid,
    /// The persistence layer failed.
    StorageFailure,
}

impl ErrorKind {
    /// Stable snake_case identifier.
    pub fn code(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::AlreadyBooked => "already_booked",
            Self::ValidationError => "validation_error",
            Self::Expired => "expired",
            Self::Invalid => "invalid",
            Self::StorageFailure => "storage_failure",
        }
    }

    /// Message safe to show to an end user.
    pub fn user_message(self) -> &'static str {
        match self {
            Self::NotFound => "The requested record could not be found.",
            Self::AlreadyBooked => "This session has already been booked.",
            Self::ValidationError => "The submitted information is not valid.",
            Self::Expired => "This feedback link has expired.",
            Self::Invalid => "This feedback link is not valid.",
            Self::StorageFailure => "The service is temporarily unavailable. Please try again.",
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::ErrorKind;
    use std::collections::HashSet;

    const ALL: [ErrorKind; 6] = [
        ErrorKind::NotFound,
        ErrorKind::AlreadyBooked,
        ErrorKind::ValidationError,
        ErrorKind::Expired,
        ErrorKind::Invalid,
        ErrorKind::StorageFailure,
    ];

    #[test]
    fn codes_and_messages_are_distinct() {
        let codes: HashSet<_> = ALL.iter().map(|kind| kind.code()).collect();
        let messages: HashSet<_> = ALL.iter().map(|kind| kind.user_message()).collect();
        assert_eq!(codes.len(), ALL.len());
        assert_eq!(messages.len(), ALL.len());
    }

    #[test]
    fn serde_name_matches_code() {
        for kind in ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.code()));
        }
    }
}
