//! Domain errors. Used by ports and use cases.
//!
//! Adapters map infrastructure errors into these.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Can't list artifacts: {0}")]
    ArtifactList(String),

    #[error("No artifacts are matched by filter '{filter}'")]
    NoArtifacts { filter: String },

    #[error("Can't expand caption '{template}': {reason}")]
    CaptionExpansion { template: String, reason: String },

    #[error("Can't set up HTTP proxy: {0}")]
    ProxySetup(String),

    #[error("Telegram {method} failed: {description}")]
    TelegramApi {
        method: &'static str,
        description: String,
    },

    #[error("Artifact '{artifact}' is {size} bytes, over the {limit} byte upload limit")]
    UploadSizeExceeded {
        artifact: String,
        size: u64,
        limit: u64,
    },

    #[error("Artifact '{0}' is over the upload limit and has no public URL to link to")]
    MissingArtifactUrl(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Configuration error: {0}")]
    Config(String),

    /// Failure policy escalation: stops the whole run.
    #[error("Upload aborted: {0}")]
    Aborted(String),
}

impl DomainError {
    pub fn is_abort(&self) -> bool {
        matches!(self, DomainError::Aborted(_))
    }
}
