//! Reqwest adapter for the upstream REST API.

mod envelope;
mod rest_client;

pub use rest_client::{RestResourceClient, RestTransport};
