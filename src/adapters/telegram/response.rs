//! Bot API reply parsing.
//!
//! Replies look like `{"ok":true,"result":{...}}` or
//! `{"ok":false,"error_code":400,"description":"..."}`.

use crate::domain::{DomainError, TelegramResponse};
use reqwest::StatusCode;
use serde_json::Value;

/// Max body characters quoted in error messages.
const BODY_EXCERPT_CHARS: usize = 200;

/// Interprets one HTTP reply. Only 2xx replies whose `ok` is truthy are `Ok`.
pub fn parse_response(
    method: &'static str,
    status: StatusCode,
    body: &str,
) -> Result<TelegramResponse, DomainError> {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let description = parsed
        .as_ref()
        .and_then(|v| v.get("description"))
        .and_then(Value::as_str)
        .map(String::from);

    if !status.is_success() {
        let description = description.unwrap_or_else(|| {
            format!(
                "Unexpected response status: {} ({})",
                status.as_u16(),
                status.canonical_reason().unwrap_or("unknown")
            )
        });
        return Err(DomainError::TelegramApi {
            method,
            description,
        });
    }

    let Some(value) = parsed else {
        return Err(DomainError::TelegramApi {
            method,
            description: format!(
                "malformed response body: {}",
                body.chars().take(BODY_EXCERPT_CHARS).collect::<String>()
            ),
        });
    };

    if !value.get("ok").is_some_and(is_truthy) {
        return Err(DomainError::TelegramApi {
            method,
            description: description.unwrap_or_else(|| "response is not ok".to_string()),
        });
    }

    Ok(TelegramResponse {
        ok: true,
        result_message_id: value
            .get("result")
            .and_then(|r| r.get("message_id"))
            .and_then(Value::as_i64),
        error_description: description,
    })
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => s.eq_ignore_ascii_case("true"),
        _ => false,
    }
}
