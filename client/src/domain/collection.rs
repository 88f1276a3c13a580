//! Collection snapshots and the upstream-plus-fallback merge rule.
//!
//! A snapshot is an immutable, timestamped copy of one collection; the
//! cache replaces snapshots wholesale and nothing ever patches one in
//! place. The merge is deterministic so tests can pin it: upstream records
//! keep their relative order, a fallback entry whose id collides replaces
//! the upstream record in place, and net-new fallback records append in
//! insertion order.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use super::ports::{FallbackEntry, FallbackOrigin};
use super::resource::{RecordId, Resource};

/// Where a snapshot's records came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotSource {
    /// Pure upstream data; no fallback entry applied.
    Upstream,
    /// Upstream data overlaid with at least one fallback entry.
    Merged,
}

/// An immutable, timestamped copy of one collection.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionSnapshot<R> {
    /// Records after merging, in the documented order.
    pub records: Vec<R>,
    /// When the underlying fetch completed.
    pub fetched_at: DateTime<Utc>,
    /// Whether fallback entries contributed.
    pub source: SnapshotSource,
    /// Size of the merged collection.
    pub total_count: usize,
    /// Origin tag per locally-originated id. Screens indicating "local
    /// only" rows read this, never id-value heuristics.
    origins: HashMap<RecordId, FallbackOrigin>,
}

impl<R: Resource> CollectionSnapshot<R> {
    /// Build a snapshot by merging upstream records with fallback entries.
    ///
    /// Entries that no longer decode into the record shape are skipped with
    /// a warning rather than poisoning the whole snapshot.
    #[must_use]
    pub fn merged(
        upstream: Vec<R>,
        overlays: &[FallbackEntry],
        fetched_at: DateTime<Utc>,
    ) -> Self {
        let mut records = upstream;
        let mut index: HashMap<RecordId, usize> = records
            .iter()
            .enumerate()
            .map(|(position, record)| (record.id(), position))
            .collect();
        let mut origins = HashMap::new();

        for entry in overlays {
            let record: R = match entry.decode() {
                Ok(record) => record,
                Err(err) => {
                    tracing::warn!(
                        resource = %R::KIND,
                        record_id = %entry.id,
                        error = %err,
                        "skipping undecodable fallback entry"
                    );
                    continue;
                }
            };
            origins.insert(entry.id, entry.origin);
            if let Some(position) = index.get(&entry.id).copied() {
                if let Some(slot) = records.get_mut(position) {
                    *slot = record;
                }
            } else {
                index.insert(entry.id, records.len());
                records.push(record);
            }
        }

        let source = if origins.is_empty() {
            SnapshotSource::Upstream
        } else {
            SnapshotSource::Merged
        };
        Self {
            total_count: records.len(),
            records,
            fetched_at,
            source,
            origins,
        }
    }

    /// The fallback origin of a record, or `None` for upstream-owned rows.
    #[must_use]
    pub fn origin_of(&self, id: RecordId) -> Option<FallbackOrigin> {
        self.origins.get(&id).copied()
    }

    /// Whether the record with this id is locally originated.
    #[must_use]
    pub fn is_local(&self, id: RecordId) -> bool {
        self.origins.contains_key(&id)
    }
}
