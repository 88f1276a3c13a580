//! Normalisation of the upstream's response envelopes.
//!
//! Successful bodies arrive either bare or wrapped in
//! `{statusCode, content}`, and list content arrives either as a bare array
//! or as `{data, totalRow}`. Everything funnels through here into one
//! canonical shape, so shape-sniffing never leaks into the rest of the
//! crate. The envelope's own `statusCode` is honoured too: some endpoints
//! report failures inside an HTTP 200.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::domain::error::DataError;
use crate::domain::ports::Listing;

/// Classify an upstream status code into the domain taxonomy.
pub(crate) fn classify_status(code: u16, message: String) -> DataError {
    match code {
        400 => DataError::validation(message),
        401 => DataError::unauthorized(message),
        403 => DataError::forbidden(message),
        404 => DataError::not_found(message),
        500..=599 => DataError::server(message),
        _ => DataError::unavailable(format!("status {code}: {message}")),
    }
}

/// The error detail the upstream tucks into failure bodies: `content` as a
/// string, or a `message` field.
pub(crate) fn failure_message(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    let object = value.as_object()?;
    object
        .get("content")
        .and_then(Value::as_str)
        .or_else(|| object.get("message").and_then(Value::as_str))
        .map(str::to_owned)
}

/// A compact, whitespace-collapsed preview of a response body for error
/// messages and logs.
pub(crate) fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}

/// Strip the `{statusCode, content}` envelope if present, honouring an
/// error code smuggled inside a 2xx response.
fn unwrap_content(value: Value) -> Result<Value, DataError> {
    let Some(object) = value.as_object() else {
        return Ok(value);
    };
    if !object.contains_key("content") {
        return Ok(value);
    }

    if let Some(code) = object.get("statusCode").and_then(Value::as_u64) {
        let code = u16::try_from(code).unwrap_or(u16::MAX);
        if code >= 400 {
            let message = object
                .get("content")
                .and_then(Value::as_str)
                .or_else(|| object.get("message").and_then(Value::as_str))
                .unwrap_or("upstream reported a failure")
                .to_owned();
            return Err(classify_status(code, message));
        }
    }

    Ok(object.get("content").cloned().unwrap_or(Value::Null))
}

/// Decode a single-record body, enveloped or bare.
pub(crate) fn parse_record<R: DeserializeOwned>(body: &[u8]) -> Result<R, DataError> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|err| DataError::decode(format!("invalid JSON body: {err}")))?;
    let content = unwrap_content(value)?;
    serde_json::from_value(content)
        .map_err(|err| DataError::decode(format!("unexpected record shape: {err}")))
}

/// Decode a list body into the canonical `{records, totalCount}` shape.
pub(crate) fn parse_listing<R: DeserializeOwned>(body: &[u8]) -> Result<Listing<R>, DataError> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|err| DataError::decode(format!("invalid JSON body: {err}")))?;
    let content = unwrap_content(value)?;

    let (raw_records, reported_total) = match content {
        Value::Array(items) => (items, None),
        Value::Object(mut object) => {
            let total = object.get("totalRow").and_then(Value::as_u64);
            match object.remove("data") {
                Some(Value::Array(items)) => (items, total),
                _ => {
                    return Err(DataError::decode(
                        "list content is neither an array nor a paged object",
                    ));
                }
            }
        }
        other => {
            return Err(DataError::decode(format!(
                "list content is neither an array nor a paged object: {other}"
            )));
        }
    };

    let records: Vec<R> = raw_records
        .into_iter()
        .map(|item| {
            serde_json::from_value(item)
                .map_err(|err| DataError::decode(format!("unexpected record shape: {err}")))
        })
        .collect::<Result<_, _>>()?;
    let total_count = reported_total.unwrap_or(records.len() as u64);
    Ok(Listing {
        records,
        total_count,
    })
}

/// Acknowledge a body-less or irrelevant-bodied success (deletes). The
/// envelope's own status code is still honoured when one is present.
pub(crate) fn parse_unit(body: &[u8]) -> Result<(), DataError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(());
    }
    let Ok(value) = serde_json::from_slice::<Value>(body) else {
        // A successful delete with a non-JSON body is still a delete.
        return Ok(());
    };
    unwrap_content(value).map(|_| ())
}
