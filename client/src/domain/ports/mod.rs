//! Domain ports for the hexagonal boundary.
//!
//! Inbound code (screens, view models) and domain services depend on these
//! traits; `outbound` provides the reqwest and JSON-file adapters. Each port
//! ships an in-memory implementation so tests never need the network or the
//! filesystem.

mod fallback_store;
mod resource_client;
mod session_provider;

#[cfg(test)]
pub use fallback_store::MockFallbackStore;
pub use fallback_store::{
    FallbackEntry, FallbackOrigin, FallbackStore, FallbackStoreError, InMemoryFallbackStore,
    LOCAL_ID_FLOOR,
};
pub use resource_client::{Listing, ResourceClient};
#[cfg(test)]
pub use session_provider::MockSessionProvider;
pub use session_provider::{FixtureSessionProvider, SessionError, SessionProvider};
