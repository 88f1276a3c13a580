//! Composition root: builds the full data layer from configuration.
//!
//! A host shell calls [`DataLayer::build`] once at startup and hands the
//! per-resource handles to its screens. With a storage directory configured
//! the persisted adapters are used; without one the layer runs fully in
//! memory (useful for previews and tests).

use std::sync::Arc;

use mockable::{Clock, DefaultClock};
use thiserror::Error;

use crate::config::ClientConfig;
use crate::domain::cache::CollectionCache;
use crate::domain::mutation::MutationCoordinator;
use crate::domain::ports::{
    FallbackStore, FallbackStoreError, FixtureSessionProvider, InMemoryFallbackStore,
    ResourceClient, SessionProvider,
};
use crate::domain::resource::Resource;
use crate::domain::{Booking, Location, Room, User};
use crate::outbound::http::{RestResourceClient, RestTransport};
use crate::outbound::persistence::{JsonFallbackStore, JsonSessionProvider};

/// Errors raised while assembling the data layer.
#[derive(Debug, Error)]
pub enum BuildError {
    /// The persisted fallback store could not be opened.
    #[error("fallback store unusable: {0}")]
    Store(#[from] FallbackStoreError),
    /// The HTTP client could not be constructed.
    #[error("HTTP client construction failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Cache and coordinator for one resource kind.
pub struct ResourceAccess<R: Resource> {
    /// Cached collection reads.
    pub cache: CollectionCache<R>,
    /// Mutation entry point.
    pub coordinator: MutationCoordinator<R>,
}

impl<R: Resource> ResourceAccess<R> {
    fn build(
        config: &ClientConfig,
        transport: &Arc<RestTransport>,
        fallback: &Arc<dyn FallbackStore>,
        session: &Arc<dyn SessionProvider>,
        clock: &Arc<dyn Clock>,
    ) -> Self {
        let client: Arc<dyn ResourceClient<R>> =
            Arc::new(RestResourceClient::<R>::new(Arc::clone(transport)));
        let cache = CollectionCache::new(
            Arc::clone(&client),
            Arc::clone(fallback),
            Arc::clone(clock),
            config.stale_after(R::KIND),
        );
        let coordinator = MutationCoordinator::new(
            client,
            Arc::clone(fallback),
            cache.clone(),
            Arc::clone(session),
            Arc::clone(clock),
        );
        Self { cache, coordinator }
    }
}

/// The assembled data layer: one [`ResourceAccess`] per resource kind over
/// shared transport, session state, and fallback overlay.
pub struct DataLayer {
    /// User management access.
    pub users: ResourceAccess<User>,
    /// Room management access.
    pub rooms: ResourceAccess<Room>,
    /// Location management access.
    pub locations: ResourceAccess<Location>,
    /// Booking management access.
    pub bookings: ResourceAccess<Booking>,
    /// The shared login-state source, for screens that render the caller.
    pub session: Arc<dyn SessionProvider>,
}

impl DataLayer {
    /// Assemble the layer from configuration.
    ///
    /// # Errors
    ///
    /// Fails when the persisted fallback store is unreadable or the HTTP
    /// client cannot be built.
    pub fn build(config: &ClientConfig) -> Result<Self, BuildError> {
        let session: Arc<dyn SessionProvider> = match config.storage_dir() {
            Some(dir) => Arc::new(JsonSessionProvider::new(dir)),
            None => Arc::new(FixtureSessionProvider::anonymous()),
        };
        let fallback: Arc<dyn FallbackStore> = match config.storage_dir() {
            Some(dir) => Arc::new(JsonFallbackStore::open(dir)?),
            None => Arc::new(InMemoryFallbackStore::new()),
        };
        let transport = Arc::new(RestTransport::new(config, Arc::clone(&session))?);
        let clock: Arc<dyn Clock> = Arc::new(DefaultClock);

        Ok(Self {
            users: ResourceAccess::build(config, &transport, &fallback, &session, &clock),
            rooms: ResourceAccess::build(config, &transport, &fallback, &session, &clock),
            locations: ResourceAccess::build(config, &transport, &fallback, &session, &clock),
            bookings: ResourceAccess::build(config, &transport, &fallback, &session, &clock),
            session,
        })
    }
}

#[cfg(test)]
mod tests {
    use camino::Utf8PathBuf;
    use url::Url;

    use super::DataLayer;
    use crate::config::ClientConfig;
    use crate::domain::MutationPhase;

    fn base_config() -> ClientConfig {
        ClientConfig::new(
            Url::parse("https://api.example.com/api").expect("valid url"),
            "service-token",
        )
    }

    #[tokio::test]
    async fn builds_in_memory_without_a_storage_dir() {
        let layer = DataLayer::build(&base_config()).expect("layer builds");
        assert_eq!(
            *layer.rooms.coordinator.phase().borrow(),
            MutationPhase::Idle
        );
    }

    #[tokio::test]
    async fn builds_persisted_with_a_storage_dir() {
        let tmp = tempfile::tempdir().expect("temp dir");
        let dir = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).expect("utf-8 temp path");
        let config = base_config().with_storage_dir(dir);

        let layer = DataLayer::build(&config).expect("layer builds");
        assert_eq!(
            *layer.users.coordinator.phase().borrow(),
            MutationPhase::Idle
        );
    }
}
