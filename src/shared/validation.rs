//! Field validators for bot and job settings.
//!
//! Each check is pure and returns a `FormValidation`, like a settings form
//! would show next to the field.

use std::fmt;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormValidation {
    Ok(Option<String>),
    Error {
        message: String,
        /// Raw error detail (e.g. the full error chain), shown under the message.
        detail: Option<String>,
    },
}

impl FormValidation {
    pub fn ok() -> Self {
        FormValidation::Ok(None)
    }

    pub fn ok_with(message: impl Into<String>) -> Self {
        FormValidation::Ok(Some(message.into()))
    }

    pub fn error(message: impl Into<String>) -> Self {
        FormValidation::Error {
            message: message.into(),
            detail: None,
        }
    }

    pub fn error_with_detail(message: impl Into<String>, detail: impl Into<String>) -> Self {
        FormValidation::Error {
            message: message.into(),
            detail: Some(detail.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, FormValidation::Ok(_))
    }
}

impl fmt::Display for FormValidation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormValidation::Ok(None) => f.write_str("OK"),
            FormValidation::Ok(Some(msg)) => write!(f, "OK: {}", msg),
            FormValidation::Error {
                message,
                detail: None,
            } => write!(f, "ERROR: {}", message),
            FormValidation::Error {
                message,
                detail: Some(detail),
            } => write!(f, "ERROR: {}\n{}", message, detail),
        }
    }
}

/// Result of validating one named field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldCheck {
    pub field: &'static str,
    pub result: FormValidation,
}

pub fn check_chat_id(value: &str) -> FormValidation {
    if value.trim().is_empty() {
        return FormValidation::error("Cannot be empty");
    }
    FormValidation::ok()
}

pub fn check_bot_token(value: &str) -> FormValidation {
    if value.trim().is_empty() {
        return FormValidation::error("Bot token must not be empty");
    }
    FormValidation::ok()
}

pub fn check_api_base_uri(value: &str) -> FormValidation {
    check_absolute_uri(value, "API base URI")
}

pub fn check_http_proxy_uri(value: &str) -> FormValidation {
    check_absolute_uri(value, "HTTP proxy URI")
}

/// Empty is fine (the setting is optional); anything else must be an absolute URI.
fn check_absolute_uri(value: &str, what: &str) -> FormValidation {
    let value = value.trim();
    if value.is_empty() {
        return FormValidation::ok();
    }
    match Url::parse(value) {
        Ok(url) if url.has_host() => FormValidation::ok(),
        Ok(_) => FormValidation::error(format!("Invalid {}: URI must have a host", what)),
        Err(e) => FormValidation::error(format!("Invalid {}: {}", what, e)),
    }
}
