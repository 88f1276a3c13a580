//! Reqwest-backed resource client adapter.
//!
//! This adapter owns transport details only: header wiring, candidate-path
//! failover, HTTP error mapping, and envelope decoding. Each logical
//! operation walks its resource's candidate routes in order; a failure
//! moves to the next candidate and the walk remembers the most meaningful
//! classification to surface if every candidate fails.

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use url::Url;

use super::envelope::{
    body_preview, classify_status, failure_message, parse_listing, parse_record, parse_unit,
};
use crate::config::ClientConfig;
use crate::domain::error::DataError;
use crate::domain::ports::{Listing, ResourceClient, SessionProvider};
use crate::domain::resource::{AssetPayload, ListScope, RecordId, Resource, render_route};

/// Header carrying the session's access token, as the upstream expects it.
const SESSION_TOKEN_HEADER: &str = "token";

/// Shared HTTP transport: one reqwest client, the base URL, and the header
/// wiring every resource client reuses.
pub struct RestTransport {
    http: reqwest::Client,
    base_url: Url,
    service_token_header: String,
    service_token: String,
    session: Arc<dyn SessionProvider>,
}

enum RequestBody {
    None,
    Json(serde_json::Value),
    Multipart(reqwest::multipart::Form),
}

impl RestTransport {
    /// Build the transport from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(
        config: &ClientConfig,
        session: Arc<dyn SessionProvider>,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url().clone(),
            service_token_header: config.service_token_header().to_owned(),
            service_token: config.service_token().to_owned(),
            session,
        })
    }

    fn url_for(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// The session token, if anyone is logged in. An unreadable session
    /// store downgrades to an unauthenticated call rather than failing it.
    async fn session_token(&self) -> Option<String> {
        match self.session.current().await {
            Ok(session) => session.map(|session| session.access_token),
            Err(err) => {
                tracing::warn!(error = %err, "session state unreadable; sending unauthenticated call");
                None
            }
        }
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: RequestBody,
    ) -> Result<Vec<u8>, DataError> {
        let mut request = self
            .http
            .request(method, self.url_for(path))
            .header(self.service_token_header.as_str(), self.service_token.as_str());
        if let Some(token) = self.session_token().await {
            request = request.header(SESSION_TOKEN_HEADER, token);
        }
        request = match body {
            RequestBody::None => request,
            RequestBody::Json(value) => request.json(&value),
            RequestBody::Multipart(form) => request.multipart(form),
        };

        let response = request.send().await.map_err(map_transport_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }
        Ok(body.to_vec())
    }
}

fn map_transport_error(error: reqwest::Error) -> DataError {
    if error.is_timeout() {
        DataError::unavailable(format!("request timed out: {error}"))
    } else {
        DataError::unavailable(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> DataError {
    let message = failure_message(body).unwrap_or_else(|| {
        let preview = body_preview(body);
        if preview.is_empty() {
            format!("status {}", status.as_u16())
        } else {
            preview
        }
    });
    classify_status(status.as_u16(), message)
}

/// How decisive a failure classification is when a candidate walk has to
/// pick one error to surface. A forbidden or validation answer proves the
/// request reached a real endpoint; connection-level noise proves nothing.
fn decisiveness(err: &DataError) -> u8 {
    match err {
        DataError::Forbidden { .. } => 6,
        DataError::Unauthorized { .. } => 5,
        DataError::Validation { .. } => 4,
        DataError::NotFound { .. } => 3,
        DataError::Server { .. } => 2,
        DataError::Decode { .. } => 1,
        _ => 0,
    }
}

/// Tracks failures across an ordered candidate walk.
struct CandidateWalk {
    best: Option<DataError>,
    attempts: usize,
}

impl CandidateWalk {
    const fn new() -> Self {
        Self {
            best: None,
            attempts: 0,
        }
    }

    fn record(&mut self, path: &str, err: DataError) {
        tracing::debug!(path, error = %err, "candidate endpoint failed");
        self.attempts += 1;
        let keep_existing = self
            .best
            .as_ref()
            .is_some_and(|best| decisiveness(best) >= decisiveness(&err));
        if !keep_existing {
            self.best = Some(err);
        }
    }

    /// The error to surface after exhausting every candidate: the most
    /// decisive classification seen, or `ResourceUnavailable` when every
    /// attempt failed at the connection level.
    fn into_error(self, operation: &str) -> DataError {
        match self.best {
            Some(err) if decisiveness(&err) > 0 => err,
            _ => DataError::unavailable(format!(
                "{operation} failed at all {} candidate endpoints",
                self.attempts
            )),
        }
    }
}

/// Typed upstream client for one resource kind over a shared transport.
pub struct RestResourceClient<R: Resource> {
    transport: Arc<RestTransport>,
    _marker: PhantomData<fn() -> R>,
}

impl<R: Resource> RestResourceClient<R> {
    /// Build a client over a shared transport.
    #[must_use]
    pub fn new(transport: Arc<RestTransport>) -> Self {
        Self {
            transport,
            _marker: PhantomData,
        }
    }

    fn encode<T: serde::Serialize>(payload: &T) -> Result<serde_json::Value, DataError> {
        serde_json::to_value(payload)
            .map_err(|err| DataError::validation(format!("payload could not be encoded: {err}")))
    }

    fn multipart_form(asset: &AssetPayload) -> Result<reqwest::multipart::Form, DataError> {
        let part = reqwest::multipart::Part::bytes(asset.bytes.clone())
            .file_name(asset.file_name.clone())
            .mime_str(&asset.content_type)
            .map_err(|err| {
                DataError::validation(format!("asset content type rejected: {err}"))
            })?;
        Ok(reqwest::multipart::Form::new().part("formFile", part))
    }
}

#[async_trait]
impl<R: Resource> ResourceClient<R> for RestResourceClient<R> {
    async fn list(&self, scope: &ListScope) -> Result<Listing<R>, DataError> {
        let routes = R::list_routes(scope);
        if routes.is_empty() {
            return Err(DataError::validation(format!(
                "{} listings do not support this scope",
                R::KIND
            )));
        }
        let mut walk = CandidateWalk::new();
        for path in &routes {
            match self.transport.send(Method::GET, path, RequestBody::None).await {
                Ok(body) => match parse_listing::<R>(&body) {
                    Ok(listing) => return Ok(listing),
                    Err(err) => walk.record(path, err),
                },
                Err(err) => walk.record(path, err),
            }
        }
        Err(walk.into_error("list"))
    }

    async fn get(&self, id: RecordId) -> Result<R, DataError> {
        let mut walk = CandidateWalk::new();
        for template in R::routes().detail {
            let path = render_route(template, id);
            match self.transport.send(Method::GET, &path, RequestBody::None).await {
                Ok(body) => match parse_record::<R>(&body) {
                    Ok(record) => return Ok(record),
                    Err(err) => walk.record(&path, err),
                },
                Err(err) => walk.record(&path, err),
            }
        }
        Err(walk.into_error("get"))
    }

    async fn create(&self, draft: &R::Draft) -> Result<R, DataError> {
        let payload = Self::encode(draft)?;
        let mut walk = CandidateWalk::new();
        for path in R::routes().create {
            let body = RequestBody::Json(payload.clone());
            match self.transport.send(Method::POST, path, body).await {
                Ok(body) => match parse_record::<R>(&body) {
                    Ok(record) => return Ok(record),
                    Err(err) => walk.record(path, err),
                },
                Err(err) => walk.record(path, err),
            }
        }
        Err(walk.into_error("create"))
    }

    async fn update(&self, id: RecordId, record: &R) -> Result<R, DataError> {
        // The upstream requires the id in both path and body.
        let payload = Self::encode(&record.clone().with_id(id))?;
        let mut walk = CandidateWalk::new();
        for template in R::routes().update {
            let path = render_route(template, id);
            let body = RequestBody::Json(payload.clone());
            match self.transport.send(Method::PUT, &path, body).await {
                Ok(body) => match parse_record::<R>(&body) {
                    Ok(updated) => return Ok(updated),
                    Err(err) => walk.record(&path, err),
                },
                Err(err) => walk.record(&path, err),
            }
        }
        Err(walk.into_error("update"))
    }

    async fn delete(&self, id: RecordId) -> Result<(), DataError> {
        let mut walk = CandidateWalk::new();
        for template in R::routes().delete {
            let path = render_route(template, id);
            match self.transport.send(Method::DELETE, &path, RequestBody::None).await {
                Ok(body) => match parse_unit(&body) {
                    Ok(()) => return Ok(()),
                    Err(err) => walk.record(&path, err),
                },
                Err(err) => walk.record(&path, err),
            }
        }
        Err(walk.into_error("delete"))
    }

    async fn upload_asset(&self, id: RecordId, asset: AssetPayload) -> Result<R, DataError> {
        let templates = R::routes().upload;
        if templates.is_empty() {
            return Err(DataError::validation(format!(
                "{} records do not support asset uploads",
                R::KIND
            )));
        }
        let mut walk = CandidateWalk::new();
        for template in templates {
            let path = render_route(template, id);
            // Multipart forms are single-use; rebuild per attempt.
            let form = Self::multipart_form(&asset)?;
            match self
                .transport
                .send(Method::POST, &path, RequestBody::Multipart(form))
                .await
            {
                Ok(body) => match parse_record::<R>(&body) {
                    Ok(record) => return Ok(record),
                    Err(err) => walk.record(&path, err),
                },
                Err(err) => walk.record(&path, err),
            }
        }
        Err(walk.into_error("upload"))
    }
}
