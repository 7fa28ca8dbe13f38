//! Response handling shared by the HTTP clients.

use std::time::Instant;

use notebook_core::{defaults, Error, Result};
use reqwest::{Response, StatusCode};
use serde_json::Value;
use tracing::{debug, warn};

/// Turn a non-2xx response into `Error::Server`, preferring the backend's
/// `detail` message over the raw body.
pub(crate) async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(Error::Server {
        status: status.as_u16(),
        message: server_message(status, &body),
    })
}

pub(crate) fn server_message(status: StatusCode, body: &str) -> String {
    let detail = serde_json::from_str::<Value>(body).ok().and_then(|v| {
        v.get("detail")
            .and_then(Value::as_str)
            .map(str::to_string)
    });
    match detail {
        Some(detail) => detail,
        None if body.trim().is_empty() => status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string(),
        None => body.trim().to_string(),
    }
}

/// Read a success body as JSON. Interrupted bodies are network errors;
/// bodies that are not JSON are parse errors.
pub(crate) async fn read_json(response: Response) -> Result<Value> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| Error::Parse(format!("response body is not JSON: {}", e)))
}

/// Log request completion, flagging slow calls.
pub(crate) fn log_completion(endpoint: &str, start: Instant) {
    let elapsed = start.elapsed().as_millis() as u64;
    debug!(endpoint, duration_ms = elapsed, "Request complete");
    if elapsed > defaults::SLOW_REQUEST_MS {
        warn!(endpoint, duration_ms = elapsed, slow = true, "Slow request");
    }
}
