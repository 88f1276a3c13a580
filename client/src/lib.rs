//! Data-access and list-synchronisation layer for the booking platform
//! frontend.
//!
//! The upstream REST API is shared, demo-grade, and write restricted for
//! most credentials, so every management screen needs the same survival kit:
//! typed resource clients that tolerate unreliable endpoint paths, a
//! persisted fallback overlay for writes the upstream refuses, a snapshot
//! cache with staleness and request coalescing, client-side list filtering
//! and pagination, and a mutation coordinator that decides between upstream
//! commits, local fallback commits, and honest failures.
//!
//! The crate is transport-agnostic at the domain boundary: UI shells depend
//! on the ports in [`domain::ports`] and the services in [`domain`], while
//! [`outbound`] provides the reqwest and JSON-file adapters.

pub mod config;
pub mod data_layer;
pub mod domain;
pub mod outbound;

pub use config::ClientConfig;
pub use data_layer::{DataLayer, ResourceAccess};
