//! Domain types and services.
//!
//! Entities mirror the upstream's wire schema; the services (cache, list
//! controller, mutation coordinator) are generic over the [`Resource`] seam
//! and reach the outside world only through [`ports`].

pub mod booking;
pub mod cache;
pub mod collection;
pub mod error;
pub mod list_view;
pub mod location;
pub mod mutation;
pub mod ports;
pub mod resource;
pub mod room;
pub mod session;
pub mod user;
mod wire;

pub use booking::{Booking, BookingDraft};
pub use cache::CollectionCache;
pub use collection::{CollectionSnapshot, SnapshotSource};
pub use error::DataError;
pub use list_view::{FieldPredicate, ListController, ListQuery, apply_filter, head};
pub use location::{Location, LocationDraft};
pub use mutation::{
    CommitPath, MutationCoordinator, MutationError, MutationOutcome, MutationPhase,
    MutationWarning,
};
pub use resource::{AssetPayload, ListScope, RecordId, Resource, ResourceKind};
pub use room::{Room, RoomDraft};
pub use session::{Session, SessionRole};
pub use user::{User, UserDraft};
