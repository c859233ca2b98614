//! Mapping MediaWiki and transport failures onto [`AdapterError`]

use reqwest::StatusCode;
use serde_json::Value;

use crate::api::adapter::AdapterError;

/// Error codes that mean the session or its rights are gone
const AUTH_CODES: [&str; 5] = [
    "badtoken",
    "notloggedin",
    "permissiondenied",
    "readapidenied",
    "writeapidenied",
];

const NOT_FOUND_CODES: [&str; 4] = [
    "no-such-entity",
    "no-such-claim",
    "no-such-property",
    "invalid-guid",
];

const MALFORMED_CODES: [&str; 6] = [
    "invalid-snak",
    "invalid-snak-value",
    "badvalue",
    "invalid-entity-id",
    "paramvalidationfailed",
    "not-recognized-string",
];

/// Map an API `error` object to an adapter error
pub fn from_api_error(code: &str, info: &str) -> AdapterError {
    let message = format!("{}: {}", code, info);

    if AUTH_CODES.contains(&code) || code.starts_with("assert") {
        return AdapterError::Auth(message);
    }
    if NOT_FOUND_CODES.contains(&code) {
        return AdapterError::not_found(message);
    }
    if MALFORMED_CODES.contains(&code) {
        return AdapterError::malformed(message);
    }
    if info.to_lowercase().contains("already") {
        return AdapterError::already_exists(message);
    }
    if code == "maxlag" || code == "readonly" {
        return AdapterError::Unreachable(message);
    }
    AdapterError::rejected(message)
}

/// Fail if an API response carries an `error` object
pub fn check_response(body: &Value) -> Result<(), AdapterError> {
    let Some(error) = body.get("error") else {
        return Ok(());
    };

    let code = error.get("code").and_then(Value::as_str).unwrap_or("unknown");
    let info = error
        .get("info")
        .and_then(Value::as_str)
        .unwrap_or("no details given");

    // Validator messages carry the precise reason, e.g. a label conflict
    let detail = error
        .get("messages")
        .and_then(Value::as_array)
        .and_then(|messages| messages.first())
        .and_then(|message| message.get("name"))
        .and_then(Value::as_str);

    match detail {
        Some(name) if name.contains("conflict") || name.contains("already") => Err(
            AdapterError::already_exists(format!("{}: {} ({})", code, info, name)),
        ),
        _ => Err(from_api_error(code, info)),
    }
}

pub fn from_status(status: StatusCode, body: &str) -> AdapterError {
    let message = format!("HTTP {}: {}", status, truncate(body, 200));
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AdapterError::Auth(message),
        StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT => {
            AdapterError::Unreachable(message)
        }
        StatusCode::NOT_FOUND => AdapterError::Unreachable(format!("endpoint not found ({})", message)),
        _ => AdapterError::rejected(message),
    }
}

pub fn from_transport(error: &reqwest::Error) -> AdapterError {
    if error.is_connect() || error.is_timeout() || error.is_request() {
        return AdapterError::Unreachable(error.to_string());
    }
    if let Some(status) = error.status() {
        return from_status(status, "");
    }
    if error.is_decode() {
        return AdapterError::rejected(format!("unreadable response: {}", error));
    }
    AdapterError::Unreachable(error.to_string())
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
