//! JSON-file adapter for the fallback store.
//!
//! One versioned document holds the per-kind entry arrays and the per-kind
//! local-id counters, so issued ids are never reused even across restarts.
//! The upstream-id watermark is deliberately session-only: it reflects what
//! this session has actually observed.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use camino::Utf8PathBuf;
use cap_std::ambient_authority;
use cap_std::fs::Dir;
use serde::{Deserialize, Serialize};

use super::atomic_io::write_atomic;
use crate::domain::ports::{FallbackEntry, FallbackStore, FallbackStoreError, LOCAL_ID_FLOOR};
use crate::domain::resource::{RecordId, ResourceKind};

const STORE_VERSION: u32 = 1;
const STORE_FILE: &str = "fallback-store.json";

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoreDocument {
    version: u32,
    /// Last issued local id per resource kind.
    #[serde(default)]
    counters: BTreeMap<String, i64>,
    /// Entries per resource kind, in insertion order.
    #[serde(default)]
    entries: BTreeMap<String, Vec<FallbackEntry>>,
}

impl Default for StoreDocument {
    fn default() -> Self {
        Self {
            version: STORE_VERSION,
            counters: BTreeMap::new(),
            entries: BTreeMap::new(),
        }
    }
}

#[derive(Debug)]
struct StoreState {
    document: StoreDocument,
    observed: HashMap<ResourceKind, i64>,
}

/// Fallback store persisted as one JSON document under the storage
/// directory.
#[derive(Debug)]
pub struct JsonFallbackStore {
    dir: Utf8PathBuf,
    state: tokio::sync::Mutex<StoreState>,
}

impl JsonFallbackStore {
    /// Open (or initialise) the store under `dir`.
    ///
    /// # Errors
    ///
    /// Fails when the directory cannot be created, the document cannot be
    /// read or parsed, or it was written by an incompatible version.
    pub fn open(dir: impl Into<Utf8PathBuf>) -> Result<Self, FallbackStoreError> {
        let dir = dir.into();
        std::fs::create_dir_all(dir.as_std_path())
            .map_err(|err| FallbackStoreError::io(format!("creating {dir}: {err}")))?;

        let path = dir.join(STORE_FILE);
        let document = match std::fs::read_to_string(path.as_std_path()) {
            Ok(text) => serde_json::from_str::<StoreDocument>(&text)
                .map_err(|err| FallbackStoreError::serialization(format!("{path}: {err}")))?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => StoreDocument::default(),
            Err(err) => return Err(FallbackStoreError::io(format!("reading {path}: {err}"))),
        };
        if document.version != STORE_VERSION {
            return Err(FallbackStoreError::UnsupportedVersion {
                expected: STORE_VERSION,
                actual: document.version,
            });
        }

        Ok(Self {
            dir,
            state: tokio::sync::Mutex::new(StoreState {
                document,
                observed: HashMap::new(),
            }),
        })
    }

    async fn persist(&self, document: &StoreDocument) -> Result<(), FallbackStoreError> {
        let contents = serde_json::to_string_pretty(document)
            .map_err(|err| FallbackStoreError::serialization(err.to_string()))?;
        let dir = self.dir.clone();
        tokio::task::spawn_blocking(move || {
            let dir = Dir::open_ambient_dir(dir.as_std_path(), ambient_authority())
                .map_err(|err| FallbackStoreError::io(format!("opening {dir}: {err}")))?;
            write_atomic(&dir, STORE_FILE, &contents)
                .map_err(|err| FallbackStoreError::io(err.to_string()))
        })
        .await
        .map_err(|err| FallbackStoreError::io(format!("persist task failed: {err}")))?
    }
}

#[async_trait]
impl FallbackStore for JsonFallbackStore {
    async fn read_all(&self, kind: ResourceKind) -> Result<Vec<FallbackEntry>, FallbackStoreError> {
        let state = self.state.lock().await;
        Ok(state
            .document
            .entries
            .get(kind.storage_key())
            .cloned()
            .unwrap_or_default())
    }

    async fn find(
        &self,
        kind: ResourceKind,
        id: RecordId,
    ) -> Result<Option<FallbackEntry>, FallbackStoreError> {
        let state = self.state.lock().await;
        Ok(state
            .document
            .entries
            .get(kind.storage_key())
            .and_then(|entries| entries.iter().find(|entry| entry.id == id).cloned()))
    }

    async fn upsert(
        &self,
        kind: ResourceKind,
        entry: FallbackEntry,
    ) -> Result<(), FallbackStoreError> {
        let mut state = self.state.lock().await;
        let entries = state
            .document
            .entries
            .entry(kind.storage_key().to_owned())
            .or_default();
        match entries.iter_mut().find(|existing| existing.id == entry.id) {
            Some(existing) => {
                tracing::info!(resource = %kind, record_id = %entry.id, "fallback entry replaced");
                *existing = entry;
            }
            None => {
                tracing::info!(resource = %kind, record_id = %entry.id, "fallback entry created");
                entries.push(entry);
            }
        }
        self.persist(&state.document).await
    }

    async fn remove(&self, kind: ResourceKind, id: RecordId) -> Result<(), FallbackStoreError> {
        let mut state = self.state.lock().await;
        let Some(entries) = state.document.entries.get_mut(kind.storage_key()) else {
            return Ok(());
        };
        let before = entries.len();
        entries.retain(|entry| entry.id != id);
        if entries.len() == before {
            return Ok(());
        }
        tracing::info!(resource = %kind, record_id = %id, "fallback entry deleted");
        self.persist(&state.document).await
    }

    async fn assign_local_id(&self, kind: ResourceKind) -> Result<RecordId, FallbackStoreError> {
        let mut state = self.state.lock().await;
        let observed = state.observed.get(&kind).copied().unwrap_or(0);
        let last_issued = state
            .document
            .counters
            .get(kind.storage_key())
            .copied()
            .unwrap_or(0);
        let next = last_issued
            .max(observed)
            .max(LOCAL_ID_FLOOR)
            .saturating_add(1);
        state
            .document
            .counters
            .insert(kind.storage_key().to_owned(), next);
        self.persist(&state.document).await?;
        tracing::info!(resource = %kind, record_id = next, "local id issued");
        Ok(RecordId::new(next))
    }

    async fn note_observed_id(&self, kind: ResourceKind, id: RecordId) {
        let mut state = self.state.lock().await;
        let watermark = state.observed.entry(kind).or_insert(0);
        *watermark = (*watermark).max(id.get());
    }
}

#[cfg(test)]
mod tests {
    use camino::Utf8PathBuf;
    use chrono::Utc;

    use super::{JsonFallbackStore, STORE_FILE};
    use crate::domain::ports::{FallbackEntry, FallbackOrigin, FallbackStore, FallbackStoreError};
    use crate::domain::resource::{RecordId, Resource, ResourceKind};
    use crate::domain::room::{Room, RoomDraft};

    fn storage_dir(tmp: &tempfile::TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).expect("utf-8 temp path")
    }

    fn entry(id: i64, name: &str) -> FallbackEntry {
        let room = Room::from_draft(
            &RoomDraft {
                name: name.to_owned(),
                ..RoomDraft::default()
            },
            RecordId::new(id),
        );
        FallbackEntry::from_record(&room, FallbackOrigin::LocalCreate, Utc::now())
            .expect("room encodes")
    }

    #[tokio::test]
    async fn entries_survive_a_reopen() {
        let tmp = tempfile::tempdir().expect("temp dir");
        let dir = storage_dir(&tmp);

        {
            let store = JsonFallbackStore::open(dir.clone()).expect("store opens");
            store
                .upsert(ResourceKind::Room, entry(999_001, "Demo Room"))
                .await
                .expect("upsert");
        }

        let reopened = JsonFallbackStore::open(dir).expect("store reopens");
        let entries = reopened
            .read_all(ResourceKind::Room)
            .await
            .expect("readable");
        assert_eq!(entries.len(), 1);
        let room: Room = entries[0].decode().expect("room decodes");
        assert_eq!(room.name, "Demo Room");
    }

    #[tokio::test]
    async fn issued_ids_stay_monotonic_across_reopens() {
        let tmp = tempfile::tempdir().expect("temp dir");
        let dir = storage_dir(&tmp);

        let first = {
            let store = JsonFallbackStore::open(dir.clone()).expect("store opens");
            store
                .assign_local_id(ResourceKind::Room)
                .await
                .expect("assign")
        };
        let second = {
            let store = JsonFallbackStore::open(dir).expect("store reopens");
            store
                .assign_local_id(ResourceKind::Room)
                .await
                .expect("assign")
        };
        assert!(second > first, "{second} must exceed {first}");
    }

    #[tokio::test]
    async fn absent_removes_do_not_touch_the_document() {
        let tmp = tempfile::tempdir().expect("temp dir");
        let dir = storage_dir(&tmp);
        let store = JsonFallbackStore::open(dir.clone()).expect("store opens");

        store
            .remove(ResourceKind::Room, RecordId::new(1))
            .await
            .expect("no-op remove");
        assert!(
            !dir.join(STORE_FILE).as_std_path().exists(),
            "a pure no-op must not create the document"
        );
    }

    #[tokio::test]
    async fn incompatible_versions_are_refused() {
        let tmp = tempfile::tempdir().expect("temp dir");
        let dir = storage_dir(&tmp);
        std::fs::write(
            dir.join(STORE_FILE).as_std_path(),
            r#"{"version": 99, "counters": {}, "entries": {}}"#,
        )
        .expect("seed file");

        let err = JsonFallbackStore::open(dir).expect_err("must refuse");
        assert_eq!(
            err,
            FallbackStoreError::UnsupportedVersion {
                expected: 1,
                actual: 99
            }
        );
    }

    #[tokio::test]
    async fn corrupt_documents_surface_as_serialisation_errors() {
        let tmp = tempfile::tempdir().expect("temp dir");
        let dir = storage_dir(&tmp);
        std::fs::write(dir.join(STORE_FILE).as_std_path(), "{ not json")
            .expect("seed file");

        let err = JsonFallbackStore::open(dir).expect_err("must refuse");
        assert!(matches!(err, FallbackStoreError::Serialization { .. }));
    }
}
