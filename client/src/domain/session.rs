//! The authenticated caller, as read from persisted login state.
//!
//! The data layer never writes login state; it only reads what the login
//! flow persisted, to attach auth headers and to decide whether a forbidden
//! write may be recovered into the local fallback overlay.

use super::resource::RecordId;

/// Role granted by the upstream at login.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionRole {
    /// Full management access.
    Admin,
    /// Regular customer account.
    User,
}

impl SessionRole {
    /// Parse the upstream's role string; anything unrecognised is a plain
    /// user, matching how the login flow defaults the field.
    #[must_use]
    pub fn from_wire(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("ADMIN") {
            Self::Admin
        } else {
            Self::User
        }
    }

    /// The upstream's encoding of this role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::User => "USER",
        }
    }
}

/// Snapshot of the current login state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// The logged-in user's upstream id.
    pub user_id: RecordId,
    /// Display name, for greeting strips and audit lines.
    pub name: String,
    /// Granted role.
    pub role: SessionRole,
    /// Bearer token attached to authenticated calls.
    pub access_token: String,
    /// Whether the upstream refuses writes for these credentials. Set at
    /// login for shared demo accounts; consulted before recovering a
    /// forbidden create into the fallback store.
    pub write_restricted: bool,
}

impl Session {
    /// Whether this session may use the management screens.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self.role, SessionRole::Admin)
    }
}
