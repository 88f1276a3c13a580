//! The mutation coordinator: runs one mutation intent against the upstream,
//! classifies the outcome, and decides the recovery path.
//!
//! The states are `Idle -> Submitting -> {Succeeded, FailedRecoverable,
//! FailedFatal}`. Recoverable failures never reach the caller: a forbidden
//! create under write-restricted credentials commits to the fallback store
//! and reports success, and an update or delete of a record that already
//! lives in the fallback store is applied there. A forbidden write against
//! an upstream-owned record is fatal: faking success locally would hide a
//! real permission problem.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use mockable::Clock;
use thiserror::Error;
use tokio::sync::watch;

use super::cache::CollectionCache;
use super::error::DataError;
use super::ports::{FallbackEntry, FallbackOrigin, FallbackStore, ResourceClient, SessionProvider};
use super::resource::{AssetPayload, ListScope, RecordId, Resource};

/// Externally visible coordinator state, for disabling the triggering
/// control while a submission is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationPhase {
    /// No mutation in flight.
    Idle,
    /// A mutation is running; the UI must not double-submit.
    Submitting,
}

/// Where a successful mutation ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitPath {
    /// The upstream accepted the write.
    Upstream,
    /// The upstream refused; the write landed in the fallback overlay.
    Fallback,
}

/// Non-fatal trouble reported beside a successful mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationWarning {
    /// The secondary asset upload failed or was skipped; the primary
    /// mutation stands.
    AssetUploadFailed {
        /// Human-readable reason.
        message: String,
    },
}

/// A successful mutation: the authoritative record (where one exists), the
/// commit path, and any non-fatal warning.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationOutcome<R> {
    /// The record as the upstream or the fallback store now holds it.
    /// `None` for deletes.
    pub record: Option<R>,
    /// Where the write was committed.
    pub committed: CommitPath,
    /// Non-fatal trouble, currently only asset uploads.
    pub warning: Option<MutationWarning>,
}

/// A failed mutation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MutationError {
    /// Another submission is still in flight on this coordinator.
    #[error("a mutation is already in flight")]
    AlreadySubmitting,
    /// The mutation failed; see the wrapped classification.
    #[error(transparent)]
    Failed(#[from] DataError),
}

impl MutationError {
    /// One human-readable line for the UI.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::AlreadySubmitting => "Please wait for the current change to finish.".to_owned(),
            Self::Failed(err) => err.user_message(),
        }
    }
}

/// Coordinates mutations for one resource kind against one cache.
pub struct MutationCoordinator<R: Resource> {
    client: Arc<dyn ResourceClient<R>>,
    fallback: Arc<dyn FallbackStore>,
    cache: CollectionCache<R>,
    session: Arc<dyn SessionProvider>,
    clock: Arc<dyn Clock>,
    in_flight: AtomicBool,
    phase: watch::Sender<MutationPhase>,
}

struct FlightGuard<'a> {
    in_flight: &'a AtomicBool,
    phase: &'a watch::Sender<MutationPhase>,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.in_flight.store(false, Ordering::SeqCst);
        let _ = self.phase.send_replace(MutationPhase::Idle);
    }
}

impl<R: Resource> MutationCoordinator<R> {
    /// Build a coordinator over the same client and fallback store the
    /// cache uses.
    pub fn new(
        client: Arc<dyn ResourceClient<R>>,
        fallback: Arc<dyn FallbackStore>,
        cache: CollectionCache<R>,
        session: Arc<dyn SessionProvider>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let (phase, _) = watch::channel(MutationPhase::Idle);
        Self {
            client,
            fallback,
            cache,
            session,
            clock,
            in_flight: AtomicBool::new(false),
            phase,
        }
    }

    /// Watch the coordinator's phase; the UI disables the triggering
    /// control while it reads [`MutationPhase::Submitting`].
    #[must_use]
    pub fn phase(&self) -> watch::Receiver<MutationPhase> {
        self.phase.subscribe()
    }

    fn begin(&self) -> Result<FlightGuard<'_>, MutationError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(MutationError::AlreadySubmitting);
        }
        let _ = self.phase.send_replace(MutationPhase::Submitting);
        Ok(FlightGuard {
            in_flight: &self.in_flight,
            phase: &self.phase,
        })
    }

    /// Create a record, optionally uploading an asset afterwards.
    ///
    /// # Errors
    ///
    /// [`MutationError::AlreadySubmitting`] while another intent runs; a
    /// forbidden create outside write-restricted sessions and every other
    /// upstream failure surface as [`MutationError::Failed`].
    pub async fn create(
        &self,
        draft: &R::Draft,
        asset: Option<AssetPayload>,
    ) -> Result<MutationOutcome<R>, MutationError> {
        let _guard = self.begin()?;
        match self.client.create(draft).await {
            Ok(record) => {
                self.refresh_after_commit().await;
                let (record, warning) = self.upload_step(record, asset).await;
                Ok(MutationOutcome {
                    record: Some(record),
                    committed: CommitPath::Upstream,
                    warning,
                })
            }
            Err(DataError::Forbidden { message }) => {
                if self.session_is_write_restricted().await {
                    let record = self.commit_create_to_fallback(draft).await?;
                    self.refresh_after_commit().await;
                    Ok(MutationOutcome {
                        record: Some(record),
                        committed: CommitPath::Fallback,
                        warning: asset.map(|_| skipped_upload_warning()),
                    })
                } else {
                    Err(DataError::forbidden(message).into())
                }
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Update a record, optionally uploading an asset afterwards.
    ///
    /// # Errors
    ///
    /// A forbidden or not-found update of an upstream-owned record is
    /// fatal; one against a record already in the fallback store is applied
    /// there instead.
    pub async fn update(
        &self,
        id: RecordId,
        record: R,
        asset: Option<AssetPayload>,
    ) -> Result<MutationOutcome<R>, MutationError> {
        let _guard = self.begin()?;
        match self.client.update(id, &record).await {
            Ok(updated) => {
                // A successful upstream write supersedes any local overlay
                // for the same id.
                self.discard_overlay(id).await;
                self.refresh_after_commit().await;
                let (updated, warning) = self.upload_step(updated, asset).await;
                Ok(MutationOutcome {
                    record: Some(updated),
                    committed: CommitPath::Upstream,
                    warning,
                })
            }
            Err(err) if is_locally_recoverable(&err) => {
                match self.fallback.find(R::KIND, id).await {
                    Ok(Some(existing)) => {
                        let record = record.with_id(id);
                        // Keep the original origin: an edit of a locally
                        // created record is still a record the upstream has
                        // never seen.
                        let entry = FallbackEntry::from_record(
                            &record,
                            existing.origin,
                            self.clock.utc(),
                        )
                        .map_err(DataError::from)?;
                        self.fallback
                            .upsert(R::KIND, entry)
                            .await
                            .map_err(DataError::from)?;
                        self.refresh_after_commit().await;
                        Ok(MutationOutcome {
                            record: Some(record),
                            committed: CommitPath::Fallback,
                            warning: asset.map(|_| skipped_upload_warning()),
                        })
                    }
                    Ok(None) => Err(not_owned(id, err).into()),
                    Err(store_err) => Err(DataError::from(store_err).into()),
                }
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Delete a record.
    ///
    /// # Errors
    ///
    /// Same classification as [`update`](Self::update).
    pub async fn delete(&self, id: RecordId) -> Result<MutationOutcome<R>, MutationError> {
        let _guard = self.begin()?;
        match self.client.delete(id).await {
            Ok(()) => {
                self.discard_overlay(id).await;
                self.refresh_after_commit().await;
                Ok(MutationOutcome {
                    record: None,
                    committed: CommitPath::Upstream,
                    warning: None,
                })
            }
            Err(err) if is_locally_recoverable(&err) => {
                match self.fallback.find(R::KIND, id).await {
                    Ok(Some(_)) => {
                        self.fallback
                            .remove(R::KIND, id)
                            .await
                            .map_err(DataError::from)?;
                        self.refresh_after_commit().await;
                        Ok(MutationOutcome {
                            record: None,
                            committed: CommitPath::Fallback,
                            warning: None,
                        })
                    }
                    Ok(None) => Err(not_owned(id, err).into()),
                    Err(store_err) => Err(DataError::from(store_err).into()),
                }
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn commit_create_to_fallback(&self, draft: &R::Draft) -> Result<R, DataError> {
        let id = self
            .fallback
            .assign_local_id(R::KIND)
            .await
            .map_err(DataError::from)?;
        let record = R::from_draft(draft, id);
        let entry =
            FallbackEntry::from_record(&record, FallbackOrigin::LocalCreate, self.clock.utc())?;
        self.fallback
            .upsert(R::KIND, entry)
            .await
            .map_err(DataError::from)?;
        tracing::info!(
            resource = %R::KIND,
            record_id = %id,
            "upstream is write restricted; record committed to the fallback overlay"
        );
        Ok(record)
    }

    async fn session_is_write_restricted(&self) -> bool {
        match self.session.current().await {
            Ok(Some(session)) => session.write_restricted,
            Ok(None) => false,
            Err(err) => {
                tracing::warn!(error = %err, "session state unreadable; treating forbidden as fatal");
                false
            }
        }
    }

    /// Invalidate every scope, then refetch the primary listing so the UI
    /// reflects the mutation without waiting out the staleness window. A
    /// refresh failure is logged, never surfaced: the mutation itself has
    /// already settled.
    async fn refresh_after_commit(&self) {
        self.cache.invalidate_all();
        if let Err(err) = self.cache.refetch_now(&ListScope::All).await {
            tracing::warn!(
                resource = %R::KIND,
                error = %err,
                "post-mutation refetch failed"
            );
        }
    }

    async fn discard_overlay(&self, id: RecordId) {
        if let Err(err) = self.fallback.remove(R::KIND, id).await {
            tracing::warn!(
                resource = %R::KIND,
                record_id = %id,
                error = %err,
                "failed to discard superseded fallback entry"
            );
        }
    }

    /// The asset upload runs as a second, independent step after the record
    /// mutation settles; its failure reports a warning, never a rollback.
    async fn upload_step(
        &self,
        record: R,
        asset: Option<AssetPayload>,
    ) -> (R, Option<MutationWarning>) {
        let Some(asset) = asset else {
            return (record, None);
        };
        match self.client.upload_asset(record.id(), asset).await {
            Ok(updated) => {
                self.cache.invalidate_all();
                (updated, None)
            }
            Err(err) => {
                tracing::warn!(
                    resource = %R::KIND,
                    record_id = %record.id(),
                    error = %err,
                    "asset upload failed after a successful mutation"
                );
                (
                    record,
                    Some(MutationWarning::AssetUploadFailed {
                        message: err.user_message(),
                    }),
                )
            }
        }
    }
}

fn skipped_upload_warning() -> MutationWarning {
    MutationWarning::AssetUploadFailed {
        message: "the record was saved locally; the upstream holds no copy to attach the asset to"
            .to_owned(),
    }
}

/// Whether a failed update/delete may be retargeted at the fallback store.
/// Forbidden covers write-restricted credentials; not-found covers records
/// that only ever existed locally, which the upstream cannot know about.
fn is_locally_recoverable(err: &DataError) -> bool {
    matches!(
        err,
        DataError::Forbidden { .. } | DataError::NotFound { .. }
    )
}

fn not_owned(id: RecordId, err: DataError) -> DataError {
    match err {
        DataError::Forbidden { .. } => {
            DataError::forbidden(format!("record #{id} is not owned by you"))
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use mockable::{Clock, DefaultClock};
    use tokio::sync::Notify;

    use super::{CommitPath, MutationCoordinator, MutationError, MutationPhase, MutationWarning};
    use crate::domain::cache::CollectionCache;
    use crate::domain::error::DataError;
    use crate::domain::ports::{
        FallbackOrigin, FallbackStore, FixtureSessionProvider, InMemoryFallbackStore, Listing,
        ResourceClient, SessionProvider,
    };
    use crate::domain::resource::{AssetPayload, ListScope, RecordId, Resource};
    use crate::domain::room::{Room, RoomDraft};
    use crate::domain::session::{Session, SessionRole};

    /// Scriptable room client with per-operation outcomes and call counts.
    #[derive(Default)]
    struct ScriptedRoomClient {
        list_outcome: Mutex<Option<DataError>>,
        create_outcome: Mutex<Option<Result<Room, DataError>>>,
        update_outcome: Mutex<Option<Result<Room, DataError>>>,
        delete_outcome: Mutex<Option<Result<(), DataError>>>,
        upload_outcome: Mutex<Option<Result<Room, DataError>>>,
        list_calls: AtomicUsize,
        upload_calls: AtomicUsize,
        gate: Mutex<Option<Arc<Notify>>>,
    }

    impl ScriptedRoomClient {
        fn list_calls(&self) -> usize {
            self.list_calls.load(Ordering::SeqCst)
        }

        fn upload_calls(&self) -> usize {
            self.upload_calls.load(Ordering::SeqCst)
        }

        fn script_create(&self, outcome: Result<Room, DataError>) {
            *self.create_outcome.lock().expect("mutex") = Some(outcome);
        }

        fn script_update(&self, outcome: Result<Room, DataError>) {
            *self.update_outcome.lock().expect("mutex") = Some(outcome);
        }

        fn script_delete(&self, outcome: Result<(), DataError>) {
            *self.delete_outcome.lock().expect("mutex") = Some(outcome);
        }

        fn script_upload(&self, outcome: Result<Room, DataError>) {
            *self.upload_outcome.lock().expect("mutex") = Some(outcome);
        }

        fn gate_create(&self, gate: Arc<Notify>) {
            *self.gate.lock().expect("mutex") = Some(gate);
        }
    }

    #[async_trait]
    impl ResourceClient<Room> for ScriptedRoomClient {
        async fn list(&self, _scope: &ListScope) -> Result<Listing<Room>, DataError> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            match self.list_outcome.lock().expect("mutex").clone() {
                Some(err) => Err(err),
                None => Ok(Listing::of(Vec::new())),
            }
        }

        async fn get(&self, id: RecordId) -> Result<Room, DataError> {
            Err(DataError::not_found(format!("room #{id}")))
        }

        async fn create(&self, draft: &RoomDraft) -> Result<Room, DataError> {
            let gate = self.gate.lock().expect("mutex").clone();
            if let Some(gate) = gate {
                gate.notified().await;
            }
            self.create_outcome
                .lock()
                .expect("mutex")
                .clone()
                .unwrap_or_else(|| Ok(Room::from_draft(draft, RecordId::new(42))))
        }

        async fn update(&self, id: RecordId, record: &Room) -> Result<Room, DataError> {
            self.update_outcome
                .lock()
                .expect("mutex")
                .clone()
                .unwrap_or_else(|| Ok(record.clone().with_id(id)))
        }

        async fn delete(&self, _id: RecordId) -> Result<(), DataError> {
            self.delete_outcome
                .lock()
                .expect("mutex")
                .clone()
                .unwrap_or(Ok(()))
        }

        async fn upload_asset(
            &self,
            id: RecordId,
            _asset: AssetPayload,
        ) -> Result<Room, DataError> {
            self.upload_calls.fetch_add(1, Ordering::SeqCst);
            self.upload_outcome
                .lock()
                .expect("mutex")
                .clone()
                .unwrap_or_else(|| {
                    Ok(Room::from_draft(
                        &RoomDraft {
                            image_url: "https://cdn.example.com/new.jpg".to_owned(),
                            ..RoomDraft::default()
                        },
                        id,
                    ))
                })
        }
    }

    struct Harness {
        coordinator: MutationCoordinator<Room>,
        cache: CollectionCache<Room>,
        client: Arc<ScriptedRoomClient>,
        fallback: Arc<InMemoryFallbackStore>,
    }

    fn restricted_session() -> Session {
        Session {
            user_id: RecordId::new(7),
            name: "Demo Admin".to_owned(),
            role: SessionRole::Admin,
            access_token: "demo-token".to_owned(),
            write_restricted: true,
        }
    }

    fn unrestricted_session() -> Session {
        Session {
            write_restricted: false,
            ..restricted_session()
        }
    }

    fn harness(session: Option<Session>) -> Harness {
        let client = Arc::new(ScriptedRoomClient::default());
        let fallback = Arc::new(InMemoryFallbackStore::new());
        let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
        let session: Arc<dyn SessionProvider> = Arc::new(match session {
            Some(session) => FixtureSessionProvider::logged_in(session),
            None => FixtureSessionProvider::anonymous(),
        });
        let cache = CollectionCache::new(
            Arc::clone(&client) as Arc<dyn ResourceClient<Room>>,
            Arc::clone(&fallback) as Arc<dyn FallbackStore>,
            Arc::clone(&clock),
            Duration::from_secs(120),
        );
        let coordinator = MutationCoordinator::new(
            Arc::clone(&client) as Arc<dyn ResourceClient<Room>>,
            Arc::clone(&fallback) as Arc<dyn FallbackStore>,
            cache.clone(),
            session,
            clock,
        );
        Harness {
            coordinator,
            cache,
            client,
            fallback,
        }
    }

    fn draft(name: &str) -> RoomDraft {
        RoomDraft {
            name: name.to_owned(),
            ..RoomDraft::default()
        }
    }

    fn asset() -> AssetPayload {
        AssetPayload {
            file_name: "room.jpg".to_owned(),
            content_type: "image/jpeg".to_owned(),
            bytes: vec![0xff, 0xd8],
        }
    }

    #[tokio::test]
    async fn upstream_create_success_refetches_once_and_skips_the_fallback() {
        let h = harness(Some(unrestricted_session()));

        let outcome = h
            .coordinator
            .create(&draft("New Room"), None)
            .await
            .expect("create succeeds");

        assert_eq!(outcome.committed, CommitPath::Upstream);
        assert_eq!(
            outcome.record.as_ref().map(|r| r.id()),
            Some(RecordId::new(42)),
            "the upstream's record is authoritative"
        );
        assert_eq!(h.client.list_calls(), 1, "exactly one refetch");
        assert!(
            h.fallback
                .read_all(Room::KIND)
                .await
                .expect("readable")
                .is_empty(),
            "no fallback write on upstream success"
        );
    }

    #[tokio::test]
    async fn forbidden_create_under_restricted_session_commits_to_fallback() {
        let h = harness(Some(restricted_session()));
        h.client
            .script_create(Err(DataError::forbidden("read-only demo credentials")));

        let outcome = h
            .coordinator
            .create(&draft("Demo Room"), None)
            .await
            .expect("recovered create succeeds");

        assert_eq!(outcome.committed, CommitPath::Fallback);
        let record = outcome.record.expect("synthesised record");
        assert!(record.id().get() > 999_000, "id comes from the local counter");

        let entries = h.fallback.read_all(Room::KIND).await.expect("readable");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].origin, FallbackOrigin::LocalCreate);

        let snapshot = h.cache.get(&ListScope::All).await.expect("cache readable");
        assert!(
            snapshot.records.iter().any(|r| r.id() == record.id()),
            "the synthesised record is visible on the next cache read"
        );
    }

    #[tokio::test]
    async fn forbidden_create_without_restriction_is_fatal() {
        let h = harness(Some(unrestricted_session()));
        h.client
            .script_create(Err(DataError::forbidden("no permission")));

        let err = h
            .coordinator
            .create(&draft("Room"), None)
            .await
            .expect_err("must fail");
        assert!(matches!(
            err,
            MutationError::Failed(DataError::Forbidden { .. })
        ));
        assert_eq!(h.client.list_calls(), 0, "no cache refetch on fatal failure");
    }

    #[tokio::test]
    async fn forbidden_create_without_any_session_is_fatal() {
        let h = harness(None);
        h.client
            .script_create(Err(DataError::forbidden("no permission")));

        let err = h
            .coordinator
            .create(&draft("Room"), None)
            .await
            .expect_err("must fail");
        assert!(matches!(err, MutationError::Failed(_)));
    }

    #[tokio::test]
    async fn forbidden_update_of_upstream_record_is_fatal_and_does_not_touch_the_cache() {
        let h = harness(Some(restricted_session()));
        // Warm the cache so an (incorrect) invalidation would be visible as
        // a second list call.
        h.cache.get(&ListScope::All).await.expect("warm cache");
        h.client
            .script_update(Err(DataError::forbidden("not yours")));

        let room = Room::from_draft(&draft("Upstream Room"), RecordId::new(5));
        let err = h
            .coordinator
            .update(RecordId::new(5), room, None)
            .await
            .expect_err("must fail");

        match err {
            MutationError::Failed(DataError::Forbidden { message }) => {
                assert!(message.contains("not owned by you"), "got: {message}");
            }
            other => panic!("expected forbidden, got {other:?}"),
        }
        h.cache.get(&ListScope::All).await.expect("cache readable");
        assert_eq!(h.client.list_calls(), 1, "cache was not invalidated");
    }

    #[tokio::test]
    async fn forbidden_update_of_local_record_lands_in_the_fallback_store() {
        let h = harness(Some(restricted_session()));
        h.client
            .script_create(Err(DataError::forbidden("read-only demo credentials")));
        let created = h
            .coordinator
            .create(&draft("Demo Room"), None)
            .await
            .expect("recovered create")
            .record
            .expect("record");

        h.client.script_update(Err(DataError::forbidden("still read-only")));
        let edited = Room {
            name: "Demo Room (edited)".to_owned(),
            ..created.clone()
        };
        let outcome = h
            .coordinator
            .update(created.id(), edited, None)
            .await
            .expect("local edit succeeds");

        assert_eq!(outcome.committed, CommitPath::Fallback);
        let entry = h
            .fallback
            .find(Room::KIND, created.id())
            .await
            .expect("readable")
            .expect("entry exists");
        assert_eq!(
            entry.origin,
            FallbackOrigin::LocalCreate,
            "editing a locally created record keeps its origin"
        );
        let stored: Room = entry.decode().expect("room decodes");
        assert_eq!(stored.name, "Demo Room (edited)");
    }

    #[tokio::test]
    async fn not_found_delete_of_local_record_removes_the_overlay() {
        let h = harness(Some(restricted_session()));
        h.client
            .script_create(Err(DataError::forbidden("read-only demo credentials")));
        let created = h
            .coordinator
            .create(&draft("Demo Room"), None)
            .await
            .expect("recovered create")
            .record
            .expect("record");

        // The upstream never held this id, so its delete reports not-found.
        h.client
            .script_delete(Err(DataError::not_found("no such room")));
        let outcome = h
            .coordinator
            .delete(created.id())
            .await
            .expect("local delete succeeds");

        assert_eq!(outcome.committed, CommitPath::Fallback);
        assert!(
            h.fallback
                .read_all(Room::KIND)
                .await
                .expect("readable")
                .is_empty()
        );
    }

    #[tokio::test]
    async fn not_found_delete_of_upstream_record_is_fatal() {
        let h = harness(Some(restricted_session()));
        h.client
            .script_delete(Err(DataError::not_found("room #5 is gone")));

        let err = h
            .coordinator
            .delete(RecordId::new(5))
            .await
            .expect_err("must fail");
        assert!(matches!(
            err,
            MutationError::Failed(DataError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn successful_upstream_update_supersedes_the_overlay() {
        let h = harness(Some(restricted_session()));
        let room = Room::from_draft(&draft("Room"), RecordId::new(5));
        let entry = crate::domain::ports::FallbackEntry::from_record(
            &room,
            FallbackOrigin::LocalEdit,
            chrono::Utc::now(),
        )
        .expect("encodes");
        h.fallback.upsert(Room::KIND, entry).await.expect("upsert");

        h.coordinator
            .update(RecordId::new(5), room, None)
            .await
            .expect("update succeeds");

        assert!(
            h.fallback
                .read_all(Room::KIND)
                .await
                .expect("readable")
                .is_empty(),
            "upstream success supersedes the local overlay"
        );
    }

    #[tokio::test]
    async fn validation_failures_pass_through_untouched() {
        let h = harness(Some(restricted_session()));
        h.client
            .script_create(Err(DataError::validation("tenPhong must not be blank")));

        let err = h
            .coordinator
            .create(&draft(""), None)
            .await
            .expect_err("must fail");
        assert!(matches!(
            err,
            MutationError::Failed(DataError::Validation { .. })
        ));
        assert!(
            h.fallback
                .read_all(Room::KIND)
                .await
                .expect("readable")
                .is_empty(),
            "validation failures never fall back"
        );
    }

    #[tokio::test]
    async fn asset_upload_failure_is_a_warning_not_a_rollback() {
        let h = harness(Some(unrestricted_session()));
        h.client
            .script_upload(Err(DataError::server("upload service down")));

        let outcome = h
            .coordinator
            .create(&draft("Room"), Some(asset()))
            .await
            .expect("create still succeeds");

        assert_eq!(outcome.committed, CommitPath::Upstream);
        assert!(matches!(
            outcome.warning,
            Some(MutationWarning::AssetUploadFailed { .. })
        ));
        assert_eq!(h.client.upload_calls(), 1);
    }

    #[tokio::test]
    async fn asset_upload_success_returns_the_updated_record() {
        let h = harness(Some(unrestricted_session()));

        let outcome = h
            .coordinator
            .create(&draft("Room"), Some(asset()))
            .await
            .expect("create succeeds");

        assert!(outcome.warning.is_none());
        assert_eq!(
            outcome.record.map(|r| r.image_url),
            Some("https://cdn.example.com/new.jpg".to_owned())
        );
    }

    #[tokio::test]
    async fn fallback_commit_skips_the_asset_upload_with_a_warning() {
        let h = harness(Some(restricted_session()));
        h.client
            .script_create(Err(DataError::forbidden("read-only demo credentials")));

        let outcome = h
            .coordinator
            .create(&draft("Demo Room"), Some(asset()))
            .await
            .expect("recovered create succeeds");

        assert_eq!(outcome.committed, CommitPath::Fallback);
        assert!(matches!(
            outcome.warning,
            Some(MutationWarning::AssetUploadFailed { .. })
        ));
        assert_eq!(h.client.upload_calls(), 0, "nothing to upload against");
    }

    #[tokio::test]
    async fn concurrent_submissions_are_rejected() {
        let h = harness(Some(unrestricted_session()));
        let gate = Arc::new(Notify::new());
        h.client.gate_create(Arc::clone(&gate));

        let coordinator = Arc::new(h.coordinator);
        let first = {
            let coordinator = Arc::clone(&coordinator);
            tokio::spawn(async move { coordinator.create(&draft("One"), None).await })
        };
        tokio::task::yield_now().await;

        assert_eq!(*coordinator.phase().borrow(), MutationPhase::Submitting);
        let second = coordinator.create(&draft("Two"), None).await;
        assert!(matches!(second, Err(MutationError::AlreadySubmitting)));

        gate.notify_waiters();
        first.await.expect("task").expect("first create succeeds");
        assert_eq!(*coordinator.phase().borrow(), MutationPhase::Idle);
    }
}
