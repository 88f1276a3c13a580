//! Platform user accounts.

use serde::{Deserialize, Serialize};

use super::resource::{
    LIST_PROBE_QUERY, ListScope, RecordId, Resource, ResourceKind, ResourceRoutes,
};
use super::wire::null_to_empty;

fn default_role() -> String {
    "USER".to_owned()
}

/// A platform account as the upstream serialises it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Upstream-assigned id.
    pub id: RecordId,
    /// Display name.
    pub name: String,
    /// Login email.
    pub email: String,
    /// Contact phone number; the upstream sends `null` for unset.
    #[serde(default, deserialize_with = "null_to_empty")]
    pub phone: String,
    /// Birthday as the upstream's date string.
    #[serde(default, deserialize_with = "null_to_empty")]
    pub birthday: String,
    /// Upstream encodes gender as a boolean.
    #[serde(default)]
    pub gender: bool,
    /// Upstream role string, `ADMIN` or `USER`; defaults to `USER` when the
    /// upstream omits it.
    #[serde(default = "default_role")]
    pub role: String,
    /// Only present on create payloads echoed back by some endpoints.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Avatar image URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

/// Create payload for a new account. The upstream rejects unknown fields,
/// so this is exactly the accepted set.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UserDraft {
    /// Display name.
    pub name: String,
    /// Login email.
    pub email: String,
    /// Contact phone number.
    pub phone: String,
    /// Birthday as a date string.
    pub birthday: String,
    /// Gender flag as the upstream encodes it.
    pub gender: bool,
    /// Requested role.
    pub role: String,
    /// Initial password.
    pub password: String,
}

const ROUTES: ResourceRoutes = ResourceRoutes {
    detail: &["/users/{id}"],
    create: &["/users"],
    update: &["/users/{id}"],
    // The upstream deletes users via a query parameter, not a path segment.
    delete: &["/users?id={id}"],
    upload: &["/users/upload-avatar"],
};

impl Resource for User {
    const KIND: ResourceKind = ResourceKind::User;

    type Draft = UserDraft;

    fn id(&self) -> RecordId {
        self.id
    }

    fn with_id(mut self, id: RecordId) -> Self {
        self.id = id;
        self
    }

    fn from_draft(draft: &Self::Draft, id: RecordId) -> Self {
        Self {
            id,
            name: draft.name.clone(),
            email: draft.email.clone(),
            phone: draft.phone.clone(),
            birthday: draft.birthday.clone(),
            gender: draft.gender,
            role: draft.role.clone(),
            password: None,
            avatar: None,
        }
    }

    fn list_routes(scope: &ListScope) -> Vec<String> {
        match scope {
            ListScope::All => vec![
                format!("/users/phan-trang-tim-kiem?{LIST_PROBE_QUERY}"),
                format!("/users?{LIST_PROBE_QUERY}"),
                format!("/nguoi-dung?{LIST_PROBE_QUERY}"),
            ],
            ListScope::ForLocation(_) | ListScope::ForUser(_) => Vec::new(),
        }
    }

    fn routes() -> &'static ResourceRoutes {
        &ROUTES
    }

    fn search_haystacks(&self) -> Vec<String> {
        vec![self.name.clone(), self.email.clone(), self.phone.clone()]
    }

    fn filter_text(&self, field: &str) -> Option<String> {
        match field {
            "role" => Some(self.role.clone()),
            _ => None,
        }
    }
}
