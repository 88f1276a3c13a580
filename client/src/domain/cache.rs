//! Per-resource collection cache with staleness, request coalescing, and
//! last-fetch-wins reconciliation.
//!
//! One cache owns one snapshot per list scope. Reads serve the cached
//! snapshot while it is fresh; a stale read triggers a single shared fetch
//! that every concurrent caller awaits. A generation counter per scope
//! discards fetches that were superseded by an invalidation while in
//! flight, so the stored snapshot is always at least as new as the last
//! mutation.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use mockable::Clock;

use super::collection::CollectionSnapshot;
use super::error::DataError;
use super::ports::{FallbackStore, ResourceClient};
use super::resource::{ListScope, Resource};

type SharedFetch<R> = Shared<BoxFuture<'static, Result<Arc<CollectionSnapshot<R>>, DataError>>>;

struct InFlight<R: Resource> {
    generation: u64,
    fetch: SharedFetch<R>,
}

struct ScopeState<R: Resource> {
    snapshot: Option<Arc<CollectionSnapshot<R>>>,
    stale: bool,
    generation: u64,
    in_flight: Option<InFlight<R>>,
}

impl<R: Resource> Default for ScopeState<R> {
    fn default() -> Self {
        Self {
            snapshot: None,
            stale: false,
            generation: 0,
            in_flight: None,
        }
    }
}

struct CacheShared<R: Resource> {
    client: Arc<dyn ResourceClient<R>>,
    fallback: Arc<dyn FallbackStore>,
    clock: Arc<dyn Clock>,
    stale_after: Duration,
    scopes: Mutex<HashMap<String, ScopeState<R>>>,
}

/// Cached snapshots for one resource kind, sub-keyed by list scope.
///
/// Cheap to clone; clones share the same cache state.
pub struct CollectionCache<R: Resource> {
    shared: Arc<CacheShared<R>>,
}

impl<R: Resource> Clone for CollectionCache<R> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<R: Resource> CollectionCache<R> {
    /// Build a cache over a resource client and the fallback overlay.
    /// `stale_after` is the per-resource staleness window; zero disables
    /// serving from cache entirely.
    pub fn new(
        client: Arc<dyn ResourceClient<R>>,
        fallback: Arc<dyn FallbackStore>,
        clock: Arc<dyn Clock>,
        stale_after: Duration,
    ) -> Self {
        Self {
            shared: Arc::new(CacheShared {
                client,
                fallback,
                clock,
                stale_after,
                scopes: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// The collection for a scope: the cached snapshot while fresh,
    /// otherwise a (coalesced) fetch merged with the fallback overlay.
    ///
    /// # Errors
    ///
    /// The first fetch of a scope propagates its failure. Once a good
    /// snapshot exists, a failing refresh logs a warning and serves the
    /// last good snapshot instead, so a background refresh can never blank
    /// an already-rendered screen.
    pub async fn get(
        &self,
        scope: &ListScope,
    ) -> Result<Arc<CollectionSnapshot<R>>, DataError> {
        let key = scope.cache_key();
        let (previous, fetch) = {
            let mut scopes = lock(&self.shared.scopes);
            let state = scopes.entry(key.clone()).or_default();

            if let Some(snapshot) = &state.snapshot {
                if !state.stale && self.shared.is_fresh(snapshot.fetched_at) {
                    return Ok(Arc::clone(snapshot));
                }
            }

            let previous = state.snapshot.clone();
            let fetch = match &state.in_flight {
                // Reuse the in-flight fetch only while it is still current;
                // an invalidation bumps the generation and forces a fresh
                // request that observes the mutation.
                Some(in_flight) if in_flight.generation == state.generation => {
                    in_flight.fetch.clone()
                }
                _ => {
                    let generation = state.generation;
                    let fetch = self.shared.clone().start_fetch(key.clone(), *scope, generation);
                    state.in_flight = Some(InFlight {
                        generation,
                        fetch: fetch.clone(),
                    });
                    fetch
                }
            };
            (previous, fetch)
        };

        match fetch.await {
            Ok(snapshot) => Ok(snapshot),
            Err(err) => previous.map_or(Err(err.clone()), |snapshot| {
                tracing::warn!(
                    resource = %R::KIND,
                    sub_key = %key,
                    error = %err,
                    "refresh failed; serving last good snapshot"
                );
                Ok(snapshot)
            }),
        }
    }

    /// Mark one scope stale; the next [`get`](Self::get) refetches. Any
    /// fetch currently in flight is superseded and its result discarded.
    pub fn invalidate(&self, scope: &ListScope) {
        let mut scopes = lock(&self.shared.scopes);
        let state = scopes.entry(scope.cache_key()).or_default();
        state.stale = true;
        state.generation += 1;
    }

    /// Mark every scope of this resource stale. Used after mutations, which
    /// may affect any scoped listing.
    pub fn invalidate_all(&self) {
        let mut scopes = lock(&self.shared.scopes);
        for state in scopes.values_mut() {
            state.stale = true;
            state.generation += 1;
        }
    }

    /// Force an immediate refetch regardless of staleness, returning the
    /// refreshed snapshot. Used right after a successful mutation so the
    /// next render reflects it without waiting out the staleness window.
    ///
    /// # Errors
    ///
    /// Same policy as [`get`](Self::get).
    pub async fn refetch_now(
        &self,
        scope: &ListScope,
    ) -> Result<Arc<CollectionSnapshot<R>>, DataError> {
        self.invalidate(scope);
        self.get(scope).await
    }
}

impl<R: Resource> CacheShared<R> {
    fn is_fresh(&self, fetched_at: chrono::DateTime<chrono::Utc>) -> bool {
        let Ok(window) = chrono::Duration::from_std(self.stale_after) else {
            // An unrepresentable window means "effectively forever fresh".
            return true;
        };
        self.clock.utc().signed_duration_since(fetched_at) < window
    }

    fn start_fetch(
        self: Arc<Self>,
        key: String,
        scope: ListScope,
        generation: u64,
    ) -> SharedFetch<R> {
        async move {
            let result = self.fetch_and_merge(&scope).await;
            self.settle(&key, generation, &result);
            result
        }
        .boxed()
        .shared()
    }

    async fn fetch_and_merge(
        &self,
        scope: &ListScope,
    ) -> Result<Arc<CollectionSnapshot<R>>, DataError> {
        let listing = self.client.list(scope).await?;
        if let Some(max_id) = listing.records.iter().map(Resource::id).max() {
            self.fallback.note_observed_id(R::KIND, max_id).await;
        }
        let overlays = self.fallback.read_all(R::KIND).await.map_err(DataError::from)?;
        let overlays = scope_overlays::<R>(scope, overlays);
        Ok(Arc::new(CollectionSnapshot::merged(
            listing.records,
            &overlays,
            self.clock.utc(),
        )))
    }

    fn settle(
        &self,
        key: &str,
        generation: u64,
        result: &Result<Arc<CollectionSnapshot<R>>, DataError>,
    ) {
        let mut scopes = lock(&self.scopes);
        let Some(state) = scopes.get_mut(key) else {
            return;
        };
        if let Some(in_flight) = &state.in_flight {
            if in_flight.generation == generation {
                state.in_flight = None;
            }
        }
        if state.generation == generation {
            if let Ok(snapshot) = result {
                state.snapshot = Some(Arc::clone(snapshot));
                state.stale = false;
            }
        } else {
            tracing::debug!(
                resource = %R::KIND,
                sub_key = %key,
                "discarding superseded fetch result"
            );
        }
    }
}

/// Keep only the overlay entries that belong in this scope: a room created
/// locally for location 5 must not surface in location 3's listing.
fn scope_overlays<R: Resource>(
    scope: &ListScope,
    overlays: Vec<crate::domain::ports::FallbackEntry>,
) -> Vec<crate::domain::ports::FallbackEntry> {
    let expected = match scope {
        ListScope::All => return overlays,
        ListScope::ForLocation(id) => ("location_id", id.to_string()),
        ListScope::ForUser(id) => ("user_id", id.to_string()),
    };
    overlays
        .into_iter()
        .filter(|entry| {
            entry
                .decode::<R>()
                .ok()
                .and_then(|record| record.filter_text(expected.0))
                .is_some_and(|text| text == expected.1)
        })
        .collect()
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
