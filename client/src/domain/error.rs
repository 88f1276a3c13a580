//! Domain-level error taxonomy.
//!
//! One enum covers every failure class the data layer can surface. The
//! variants deliberately mirror what the UI must be able to distinguish:
//! not-found, forbidden, validation, auth, connectivity, server error, and
//! local-storage trouble. Errors are `Clone` because a coalesced fetch fans
//! one failure out to every waiting caller.

use thiserror::Error;

/// Failure classes surfaced by resource clients, the collection cache, and
/// the mutation coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataError {
    /// The requested id does not exist upstream or locally.
    #[error("record not found: {message}")]
    NotFound {
        /// Description of what was missing.
        message: String,
    },
    /// Upstream rejected the operation as unauthorised for this record.
    #[error("forbidden: {message}")]
    Forbidden {
        /// Upstream refusal detail.
        message: String,
    },
    /// Upstream rejected the payload shape or content.
    #[error("validation rejected: {message}")]
    Validation {
        /// Upstream validation message, verbatim where available.
        message: String,
    },
    /// The caller's token is missing or expired.
    #[error("unauthorised: {message}")]
    Unauthorized {
        /// Detail of the auth failure.
        message: String,
    },
    /// Every candidate endpoint failed at the transport level.
    #[error("resource unavailable: {message}")]
    Unavailable {
        /// Summary of the failed attempts.
        message: String,
    },
    /// Upstream reported an internal error.
    #[error("server error: {message}")]
    Server {
        /// Upstream error detail.
        message: String,
    },
    /// A 2xx response body could not be parsed.
    #[error("malformed response: {message}")]
    Decode {
        /// Parser failure detail.
        message: String,
    },
    /// The local fallback or session store failed.
    #[error("local storage failure: {message}")]
    Storage {
        /// Underlying I/O or serialisation detail.
        message: String,
    },
}

impl DataError {
    /// Convenience constructor for [`DataError::NotFound`].
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Convenience constructor for [`DataError::Forbidden`].
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    /// Convenience constructor for [`DataError::Validation`].
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Convenience constructor for [`DataError::Unauthorized`].
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Convenience constructor for [`DataError::Unavailable`].
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Convenience constructor for [`DataError::Server`].
    pub fn server(message: impl Into<String>) -> Self {
        Self::Server {
            message: message.into(),
        }
    }

    /// Convenience constructor for [`DataError::Decode`].
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Convenience constructor for [`DataError::Storage`].
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// One human-readable line per failure class, suitable for direct
    /// display next to the control that triggered the operation.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::NotFound { .. } => "Record not found.".to_owned(),
            Self::Forbidden { message } => {
                format!("You do not have permission to do that: {message}")
            }
            Self::Validation { message } => {
                format!("The submitted data was rejected: {message}")
            }
            Self::Unauthorized { .. } => "Your session has expired. Please log in again.".to_owned(),
            Self::Unavailable { .. } => {
                "Could not reach the booking service. Check your connection and try again."
                    .to_owned()
            }
            Self::Server { .. } => {
                "The booking service reported an internal error. Try again later.".to_owned()
            }
            Self::Decode { .. } => {
                "The booking service returned an unreadable response.".to_owned()
            }
            Self::Storage { .. } => "Saving to local storage failed.".to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for error formatting and classification.
    use rstest::rstest;

    use super::DataError;

    #[test]
    fn display_includes_the_detail_message() {
        let err = DataError::not_found("room #7");
        assert_eq!(err.to_string(), "record not found: room #7");
    }

    #[rstest]
    #[case(DataError::not_found("x"), "Record not found.")]
    #[case(
        DataError::unauthorized("expired"),
        "Your session has expired. Please log in again."
    )]
    #[case(
        DataError::unavailable("3 endpoints failed"),
        "Could not reach the booking service. Check your connection and try again."
    )]
    #[case(
        DataError::server("boom"),
        "The booking service reported an internal error. Try again later."
    )]
    fn user_messages_distinguish_failure_classes(
        #[case] err: DataError,
        #[case] expected: &str,
    ) {
        assert_eq!(err.user_message(), expected);
    }

    #[test]
    fn validation_message_is_passed_through_verbatim() {
        let err = DataError::validation("email already exists");
        assert_eq!(
            err.user_message(),
            "The submitted data was rejected: email already exists"
        );
    }
}
