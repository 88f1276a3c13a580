//! Port for the typed per-resource upstream client.
//!
//! One logical operation maps to one or more HTTP calls behind this trait;
//! candidate-path failover and envelope normalisation are adapter concerns
//! and never leak past this boundary. No caching happens here either; that
//! is the collection cache's job.

use async_trait::async_trait;

use crate::domain::error::DataError;
use crate::domain::resource::{AssetPayload, ListScope, RecordId, Resource};

/// A normalised list response: whatever envelope or paging shape the
/// upstream used, callers see records plus the reported total.
#[derive(Debug, Clone, PartialEq)]
pub struct Listing<R> {
    /// Records in upstream list order.
    pub records: Vec<R>,
    /// Total row count reported by the upstream; falls back to the record
    /// count when the endpoint returned a bare array.
    pub total_count: u64,
}

impl<R> Listing<R> {
    /// A listing over in-memory records, with the total derived from them.
    #[must_use]
    pub fn of(records: Vec<R>) -> Self {
        let total_count = records.len() as u64;
        Self {
            records,
            total_count,
        }
    }
}

/// Typed upstream access for one resource kind.
///
/// Errors use the domain taxonomy directly: the client classifies transport
/// and status failures once, and everything downstream (coordinator, cache,
/// UI) branches on [`DataError`] variants rather than status codes.
#[async_trait]
pub trait ResourceClient<R: Resource>: Send + Sync {
    /// Fetch a collection slice.
    async fn list(&self, scope: &ListScope) -> Result<Listing<R>, DataError>;

    /// Fetch one record by id. A missing record surfaces as
    /// [`DataError::NotFound`], never silently.
    async fn get(&self, id: RecordId) -> Result<R, DataError>;

    /// Create a record, returning the upstream's authoritative copy
    /// including its assigned id.
    async fn create(&self, draft: &R::Draft) -> Result<R, DataError>;

    /// Update a record. Adapters mirror `id` into the body, as the upstream
    /// requires it in both path and body.
    async fn update(&self, id: RecordId, record: &R) -> Result<R, DataError>;

    /// Delete a record by id.
    async fn delete(&self, id: RecordId) -> Result<(), DataError>;

    /// Upload a binary asset tied to an existing record. Failure here never
    /// rolls back the owning record's mutation.
    async fn upload_asset(&self, id: RecordId, asset: AssetPayload) -> Result<R, DataError>;
}
