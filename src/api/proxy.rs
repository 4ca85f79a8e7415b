use axum::response::Json;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};

use crate::{
    error::ApiError,
    management::SessionId,
    spotify::{SpotifyClient, UpstreamRequest, UpstreamResponse},
};

/// How a successful upstream reply is reshaped for the browser.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Return the upstream JSON body, or `{success: true}` when it is empty.
    Passthrough,
    /// Return `{success: true}` plus the given fields.
    Success(Map<String, Value>),
}

/// One forwarded call: what to send, how to answer, and the generic message
/// used when the upstream rejects it.
#[derive(Debug, Clone)]
pub struct Operation {
    pub request: UpstreamRequest,
    pub failure: &'static str,
    pub reply: Reply,
}

impl Operation {
    pub fn fetch(request: UpstreamRequest, failure: &'static str) -> Self {
        Self {
            request,
            failure,
            reply: Reply::Passthrough,
        }
    }

    pub fn command(request: UpstreamRequest, failure: &'static str) -> Self {
        Self {
            request,
            failure,
            reply: Reply::Success(Map::new()),
        }
    }

    /// Adds a field echoed back next to `success` on a command reply.
    pub fn echo(mut self, key: &str, value: Value) -> Self {
        if let Reply::Success(fields) = &mut self.reply {
            fields.insert(key.to_string(), value);
        }
        self
    }
}

pub async fn dispatch(
    client: &SpotifyClient,
    session: &SessionId,
    operation: Operation,
) -> Result<Json<Value>, ApiError> {
    let response = client.forward(session, &operation.request).await?;
    let response = ensure_success(response, operation.failure)?;

    let body = match operation.reply {
        Reply::Passthrough => response.body.unwrap_or_else(|| json!({ "success": true })),
        Reply::Success(fields) => {
            let mut reply = Map::new();
            reply.insert("success".to_string(), Value::Bool(true));
            reply.extend(fields);
            Value::Object(reply)
        }
    };

    Ok(Json(body))
}

/// Maps a non-2xx upstream reply to its status and a generic message.
pub fn ensure_success(
    response: UpstreamResponse,
    failure: &'static str,
) -> Result<UpstreamResponse, ApiError> {
    if response.is_success() {
        Ok(response)
    } else {
        Err(ApiError::Upstream {
            status: response.status.as_u16(),
            message: failure.to_string(),
        })
    }
}

/// Parses an optional JSON request body; an empty body yields the default.
pub fn json_body<T: DeserializeOwned + Default>(bytes: &[u8]) -> Result<T, ApiError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(bytes).map_err(|_| ApiError::BadRequest("Invalid JSON body".to_string()))
}
