//! Resource-agnostic primitives: record ids, resource kinds, list scopes,
//! and the [`Resource`] seam each concrete entity implements.
//!
//! The seam keeps the cache, the list controller, and the mutation
//! coordinator generic: everything resource-specific (wire routes, search
//! fields, draft materialisation) hangs off the entity types themselves.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Unique integer identifier assigned by the upstream system, or by the
/// fallback store for locally-created records. Immutable once assigned.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RecordId(i64);

impl RecordId {
    /// The placeholder id the upstream expects on create payloads.
    pub const ZERO: Self = Self(0);

    /// Wrap a raw upstream id.
    #[must_use]
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// The underlying integer value.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for RecordId {
    fn from(raw: i64) -> Self {
        Self(raw)
    }
}

/// Category of record managed by the data layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Platform accounts.
    User,
    /// Rentable rooms.
    Room,
    /// Geographic locations rooms belong to.
    Location,
    /// Room reservations.
    Booking,
}

impl ResourceKind {
    /// Stable key used for persisted storage and cache partitioning.
    #[must_use]
    pub const fn storage_key(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Room => "room",
            Self::Location => "location",
            Self::Booking => "booking",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.storage_key())
    }
}

/// Which slice of a collection a list call should fetch.
///
/// Scopes map one-to-one onto cache sub-keys, so "all rooms" and "rooms at
/// location 7" age and refresh independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListScope {
    /// The whole collection.
    All,
    /// Records belonging to one location (rooms).
    ForLocation(RecordId),
    /// Records belonging to one user (bookings).
    ForUser(RecordId),
}

impl ListScope {
    /// Cache sub-key for this scope.
    #[must_use]
    pub fn cache_key(&self) -> String {
        match self {
            Self::All => "all".to_owned(),
            Self::ForLocation(id) => format!("location:{id}"),
            Self::ForUser(id) => format!("user:{id}"),
        }
    }
}

/// Ordered candidate route templates for one resource.
///
/// The upstream's exact paths are not reliably known in advance, so each
/// logical operation carries every path observed to work, tried in order.
/// Templates may embed an `{id}` placeholder and a query string.
#[derive(Debug, Clone, Copy)]
pub struct ResourceRoutes {
    /// Single-record fetch candidates.
    pub detail: &'static [&'static str],
    /// Create candidates.
    pub create: &'static [&'static str],
    /// Update candidates.
    pub update: &'static [&'static str],
    /// Delete candidates.
    pub delete: &'static [&'static str],
    /// Asset-upload candidates.
    pub upload: &'static [&'static str],
}

/// Render a route template against a concrete record id.
#[must_use]
pub fn render_route(template: &str, id: RecordId) -> String {
    template.replace("{id}", &id.to_string())
}

/// Query string used by list probes: the upstream only exposes paged search
/// endpoints for some resources, so list calls ask for one oversized page
/// and leave paging to the list controller.
pub const LIST_PROBE_QUERY: &str = "pageIndex=1&pageSize=10000";

/// The seam between resource-agnostic services and concrete entities.
pub trait Resource:
    Clone + Send + Sync + Serialize + DeserializeOwned + 'static
{
    /// Which collection this record belongs to.
    const KIND: ResourceKind;

    /// Create payload accepted by the upstream for this resource.
    type Draft: Serialize + Clone + Send + Sync + 'static;

    /// The record's unique id.
    fn id(&self) -> RecordId;

    /// The same record under a different id. Used when the upstream requires
    /// the path id mirrored into the body, and when materialising drafts.
    #[must_use]
    fn with_id(self, id: RecordId) -> Self;

    /// Materialise a full record from a create payload and an assigned id.
    /// Used by the fallback path, where no upstream response exists.
    fn from_draft(draft: &Self::Draft, id: RecordId) -> Self;

    /// Candidate list routes for a scope, in trial order. An empty vector
    /// means the scope is not supported for this resource.
    fn list_routes(scope: &ListScope) -> Vec<String>;

    /// Candidate routes for the single-record operations.
    fn routes() -> &'static ResourceRoutes;

    /// Strings the free-text search term is matched against.
    fn search_haystacks(&self) -> Vec<String>;

    /// Canonical text for a filterable field, or `None` when the field does
    /// not apply to this resource.
    fn filter_text(&self, field: &str) -> Option<String>;
}

/// Binary payload for a secondary asset upload (room photo, user avatar).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetPayload {
    /// File name reported in the multipart form.
    pub file_name: String,
    /// MIME type of the payload.
    pub content_type: String,
    /// Raw file bytes.
    pub bytes: Vec<u8>,
}
