//! JSON-file adapter for persisted login state.
//!
//! The login flow owns this document and its format; the data layer only
//! reads it. An unreadable or half-written document therefore means
//! "logged out", not an error, which is exactly how the screens treat a
//! corrupt login entry.

use async_trait::async_trait;
use camino::Utf8PathBuf;
use serde::Deserialize;

use crate::domain::ports::{SessionError, SessionProvider};
use crate::domain::resource::RecordId;
use crate::domain::session::{Session, SessionRole};

const SESSION_FILE: &str = "session.json";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginStateDto {
    id: i64,
    #[serde(default)]
    name: String,
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    write_restricted: bool,
}

/// Read-only session source backed by the login flow's JSON document.
pub struct JsonSessionProvider {
    path: Utf8PathBuf,
}

impl JsonSessionProvider {
    /// A provider reading `session.json` under `dir`.
    #[must_use]
    pub fn new(dir: impl Into<Utf8PathBuf>) -> Self {
        Self {
            path: dir.into().join(SESSION_FILE),
        }
    }
}

#[async_trait]
impl SessionProvider for JsonSessionProvider {
    async fn current(&self) -> Result<Option<Session>, SessionError> {
        let path = self.path.clone();
        let text = tokio::task::spawn_blocking(move || {
            std::fs::read_to_string(path.as_std_path())
        })
        .await
        .map_err(|err| SessionError::storage(format!("read task failed: {err}")))?;

        let text = match text {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(SessionError::storage(format!("reading {}: {err}", self.path)));
            }
        };

        let dto: LoginStateDto = match serde_json::from_str(&text) {
            Ok(dto) => dto,
            Err(err) => {
                tracing::warn!(path = %self.path, error = %err, "login state unparseable; treating as logged out");
                return Ok(None);
            }
        };
        let Some(access_token) = dto.access_token else {
            return Ok(None);
        };

        Ok(Some(Session {
            user_id: RecordId::new(dto.id),
            name: dto.name,
            role: SessionRole::from_wire(dto.role.as_deref().unwrap_or_default()),
            access_token,
            write_restricted: dto.write_restricted,
        }))
    }
}
