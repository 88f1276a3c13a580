//! JSON-file persistence adapters: the fallback store document and the
//! login-state document, both living under the configured storage
//! directory.

mod atomic_io;
mod json_fallback_store;
mod json_session_provider;

pub use json_fallback_store::JsonFallbackStore;
pub use json_session_provider::JsonSessionProvider;
