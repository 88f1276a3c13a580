//! Port for reading persisted login state.
//!
//! Injected everywhere the logged-in user matters (auth headers, forbidden
//! classification) instead of being read as ambient global state, so tests
//! can substitute a fixture.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::session::Session;

/// Errors raised by session-state adapters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The persisted login state could not be read.
    #[error("session state unreadable: {message}")]
    Storage {
        /// Underlying I/O detail.
        message: String,
    },
}

impl SessionError {
    /// Convenience constructor for [`SessionError::Storage`].
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }
}

/// Read-only access to the current login state.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// The current session, or `None` when nobody is logged in.
    async fn current(&self) -> Result<Option<Session>, SessionError>;
}

/// In-memory session source for tests and ephemeral shells.
#[derive(Debug, Clone, Default)]
pub struct FixtureSessionProvider {
    session: Option<Session>,
}

impl FixtureSessionProvider {
    /// A provider with nobody logged in.
    #[must_use]
    pub const fn anonymous() -> Self {
        Self { session: None }
    }

    /// A provider holding the given session.
    #[must_use]
    pub const fn logged_in(session: Session) -> Self {
        Self {
            session: Some(session),
        }
    }
}

#[async_trait]
impl SessionProvider for FixtureSessionProvider {
    async fn current(&self) -> Result<Option<Session>, SessionError> {
        Ok(self.session.clone())
    }
}
