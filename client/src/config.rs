//! Builder-style configuration for the data layer.
//!
//! The library never parses environment or files itself; the host shell
//! resolves its settings however it likes and hands them over here.

use std::collections::HashMap;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use url::Url;

use crate::domain::resource::ResourceKind;

/// Staleness window applied to resources without an explicit override.
/// Matches the two-minute window the management screens settled on.
pub const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(120);

const DEFAULT_SERVICE_TOKEN_HEADER: &str = "TokenCybersoft";
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for transports, caches, and the persisted stores.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    base_url: Url,
    service_token: String,
    service_token_header: String,
    request_timeout: Duration,
    stale_after: HashMap<ResourceKind, Duration>,
    storage_dir: Option<Utf8PathBuf>,
}

impl ClientConfig {
    /// Configuration with defaults for everything but the two values that
    /// have none: the upstream base URL and the service-identifying token.
    #[must_use]
    pub fn new(base_url: Url, service_token: impl Into<String>) -> Self {
        Self {
            base_url,
            service_token: service_token.into(),
            service_token_header: DEFAULT_SERVICE_TOKEN_HEADER.to_owned(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            stale_after: HashMap::new(),
            storage_dir: None,
        }
    }

    /// Override the header name the service token travels in.
    #[must_use]
    pub fn with_service_token_header(mut self, header: impl Into<String>) -> Self {
        self.service_token_header = header.into();
        self
    }

    /// Override the per-request timeout.
    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Override the staleness window for one resource kind. Zero disables
    /// cache hits for that resource entirely.
    #[must_use]
    pub fn with_stale_after(mut self, kind: ResourceKind, window: Duration) -> Self {
        self.stale_after.insert(kind, window);
        self
    }

    /// Directory for the persisted fallback store and login state.
    #[must_use]
    pub fn with_storage_dir(mut self, dir: impl Into<Utf8PathBuf>) -> Self {
        self.storage_dir = Some(dir.into());
        self
    }

    /// The upstream base URL.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The static service-identifying token.
    #[must_use]
    pub fn service_token(&self) -> &str {
        &self.service_token
    }

    /// The header name the service token travels in.
    #[must_use]
    pub fn service_token_header(&self) -> &str {
        &self.service_token_header
    }

    /// The per-request timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// The staleness window for a resource kind.
    #[must_use]
    pub fn stale_after(&self, kind: ResourceKind) -> Duration {
        self.stale_after
            .get(&kind)
            .copied()
            .unwrap_or(DEFAULT_STALE_AFTER)
    }

    /// Directory for the persisted stores, when one was configured.
    #[must_use]
    pub fn storage_dir(&self) -> Option<&Utf8Path> {
        self.storage_dir.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use url::Url;

    use super::{ClientConfig, DEFAULT_STALE_AFTER};
    use crate::domain::resource::ResourceKind;

    fn config() -> ClientConfig {
        ClientConfig::new(
            Url::parse("https://api.example.com/api").expect("valid url"),
            "service-token",
        )
    }

    #[test]
    fn sensible_defaults() {
        let config = config();
        assert_eq!(config.service_token_header(), "TokenCybersoft");
        assert_eq!(config.stale_after(ResourceKind::Room), DEFAULT_STALE_AFTER);
        assert!(config.storage_dir().is_none());
    }

    #[test]
    fn overrides_are_scoped_per_resource() {
        let config = config().with_stale_after(ResourceKind::Booking, Duration::ZERO);
        assert_eq!(config.stale_after(ResourceKind::Booking), Duration::ZERO);
        assert_eq!(config.stale_after(ResourceKind::User), DEFAULT_STALE_AFTER);
    }
}
