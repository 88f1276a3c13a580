//! Port for the persisted fallback overlay.
//!
//! When the upstream refuses a write (shared demo credentials are read
//! only), the mutation coordinator commits the record here instead, so the
//! screens keep presenting a working feature. The store is the single
//! source of truth for locally-originated records: every mutation of it is
//! explicit and logged, and entries only disappear through [`remove`] or
//! when a later successful upstream mutation supersedes them.
//!
//! [`remove`]: FallbackStore::remove

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::error::DataError;
use crate::domain::resource::{RecordId, Resource, ResourceKind};

/// Local ids are issued above this floor so they stay clear of the
/// upstream's id range. The floor matches the demo id range the original
/// screens reserved, but display logic must read [`FallbackOrigin`], never
/// compare against this value.
pub const LOCAL_ID_FLOOR: i64 = 999_000;

/// Why a record lives in the fallback store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FallbackOrigin {
    /// Created locally; the upstream holds no copy at all.
    LocalCreate,
    /// A local edit overlaying an upstream-owned record.
    LocalEdit,
}

/// One locally-held record, kind-scoped and persisted across sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FallbackEntry {
    /// Record id; unique within its resource kind.
    pub id: RecordId,
    /// Why the entry exists.
    pub origin: FallbackOrigin,
    /// When the entry was written.
    pub saved_at: DateTime<Utc>,
    /// The record body, stored as raw JSON so one store serves every
    /// resource kind.
    pub record: serde_json::Value,
}

impl FallbackEntry {
    /// Capture a typed record into an entry.
    ///
    /// # Errors
    ///
    /// Returns [`FallbackStoreError::Serialization`] when the record cannot
    /// be encoded.
    pub fn from_record<R: Resource>(
        record: &R,
        origin: FallbackOrigin,
        saved_at: DateTime<Utc>,
    ) -> Result<Self, FallbackStoreError> {
        let body = serde_json::to_value(record)
            .map_err(|err| FallbackStoreError::serialization(err.to_string()))?;
        Ok(Self {
            id: record.id(),
            origin,
            saved_at,
            record: body,
        })
    }

    /// Decode the stored body back into a typed record.
    ///
    /// # Errors
    ///
    /// Returns [`FallbackStoreError::Serialization`] when the stored JSON no
    /// longer matches the record shape.
    pub fn decode<R: Resource>(&self) -> Result<R, FallbackStoreError> {
        serde_json::from_value(self.record.clone())
            .map_err(|err| FallbackStoreError::serialization(err.to_string()))
    }
}

/// Errors raised by fallback store adapters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FallbackStoreError {
    /// The persisted document could not be read or written.
    #[error("fallback store I/O failed: {message}")]
    Io {
        /// Underlying I/O detail.
        message: String,
    },
    /// An entry or the document could not be (de)serialised.
    #[error("fallback store serialisation failed: {message}")]
    Serialization {
        /// Underlying serde detail.
        message: String,
    },
    /// The persisted document was written by an incompatible version.
    #[error("fallback store version unsupported: expected {expected}, found {actual}")]
    UnsupportedVersion {
        /// Version this build understands.
        expected: u32,
        /// Version found on disk.
        actual: u32,
    },
}

impl FallbackStoreError {
    /// Convenience constructor for [`FallbackStoreError::Io`].
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Convenience constructor for [`FallbackStoreError::Serialization`].
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }
}

impl From<FallbackStoreError> for DataError {
    fn from(err: FallbackStoreError) -> Self {
        Self::storage(err.to_string())
    }
}

/// Persisted overlay of locally-originated records, keyed by resource kind.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FallbackStore: Send + Sync {
    /// All entries for a kind, in insertion order. Restartable: repeated
    /// calls have no side effects.
    async fn read_all(&self, kind: ResourceKind) -> Result<Vec<FallbackEntry>, FallbackStoreError>;

    /// The entry with this id, if any.
    async fn find(
        &self,
        kind: ResourceKind,
        id: RecordId,
    ) -> Result<Option<FallbackEntry>, FallbackStoreError>;

    /// Insert the entry, or replace the existing entry with the same id in
    /// place (its insertion position is kept).
    async fn upsert(&self, kind: ResourceKind, entry: FallbackEntry)
    -> Result<(), FallbackStoreError>;

    /// Delete the entry if present; absent ids are a no-op, not an error.
    async fn remove(&self, kind: ResourceKind, id: RecordId) -> Result<(), FallbackStoreError>;

    /// Issue a fresh local id: strictly greater than every id this store
    /// has issued for the kind, greater than every upstream id observed
    /// this session, and at least [`LOCAL_ID_FLOOR`]. Never reused.
    async fn assign_local_id(&self, kind: ResourceKind) -> Result<RecordId, FallbackStoreError>;

    /// Report an upstream id seen in a fetch, so locally-issued ids stay
    /// above it.
    async fn note_observed_id(&self, kind: ResourceKind, id: RecordId);
}

#[derive(Debug, Default)]
struct KindState {
    entries: Vec<FallbackEntry>,
    last_issued: i64,
    observed: i64,
}

/// Fully-functional in-memory store: the adapter for tests and for shells
/// that do not want persistence across restarts.
#[derive(Debug, Default)]
pub struct InMemoryFallbackStore {
    kinds: Mutex<HashMap<ResourceKind, KindState>>,
}

impl InMemoryFallbackStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn with_kind<T>(&self, kind: ResourceKind, apply: impl FnOnce(&mut KindState) -> T) -> T {
        let mut kinds = self.kinds.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        apply(kinds.entry(kind).or_default())
    }
}

#[async_trait]
impl FallbackStore for InMemoryFallbackStore {
    async fn read_all(&self, kind: ResourceKind) -> Result<Vec<FallbackEntry>, FallbackStoreError> {
        Ok(self.with_kind(kind, |state| state.entries.clone()))
    }

    async fn find(
        &self,
        kind: ResourceKind,
        id: RecordId,
    ) -> Result<Option<FallbackEntry>, FallbackStoreError> {
        Ok(self.with_kind(kind, |state| {
            state.entries.iter().find(|entry| entry.id == id).cloned()
        }))
    }

    async fn upsert(
        &self,
        kind: ResourceKind,
        entry: FallbackEntry,
    ) -> Result<(), FallbackStoreError> {
        self.with_kind(kind, |state| {
            match state.entries.iter_mut().find(|existing| existing.id == entry.id) {
                Some(existing) => {
                    tracing::info!(resource = %kind, record_id = %entry.id, "fallback entry replaced");
                    *existing = entry;
                }
                None => {
                    tracing::info!(resource = %kind, record_id = %entry.id, "fallback entry created");
                    state.entries.push(entry);
                }
            }
        });
        Ok(())
    }

    async fn remove(&self, kind: ResourceKind, id: RecordId) -> Result<(), FallbackStoreError> {
        self.with_kind(kind, |state| {
            let before = state.entries.len();
            state.entries.retain(|entry| entry.id != id);
            if state.entries.len() < before {
                tracing::info!(resource = %kind, record_id = %id, "fallback entry deleted");
            }
        });
        Ok(())
    }

    async fn assign_local_id(&self, kind: ResourceKind) -> Result<RecordId, FallbackStoreError> {
        Ok(self.with_kind(kind, |state| {
            let next = state
                .last_issued
                .max(state.observed)
                .max(LOCAL_ID_FLOOR)
                .saturating_add(1);
            state.last_issued = next;
            tracing::info!(resource = %kind, record_id = next, "local id issued");
            RecordId::new(next)
        }))
    }

    async fn note_observed_id(&self, kind: ResourceKind, id: RecordId) {
        self.with_kind(kind, |state| {
            state.observed = state.observed.max(id.get());
        });
    }
}
