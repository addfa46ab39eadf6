//! Outbound ports. Application calls into infrastructure.
//!
//! Implemented by adapters.

use crate::domain::{Artifact, BuildChanges, BuildResult, DomainError, TelegramResponse};
use tokio::io::AsyncRead;

/// Byte stream of an artifact's content.
pub type ArtifactReader = Box<dyn AsyncRead + Send + Sync + Unpin>;

/// A document to upload. `size` is sent as the part length.
pub struct DocumentUpload {
    pub file_name: String,
    pub size: u64,
    pub content: ArtifactReader,
}

/// A link sent in place of an oversized document.
#[derive(Debug, Clone)]
pub struct ArtifactLink {
    pub file_name: String,
    pub url: String,
    pub size: u64,
}

/// Telegram Bot API. Each call is one multipart POST.
///
/// Implementations return `Ok` only for replies with `ok: true`; everything
/// else (non-2xx, `ok: false`, malformed body) is `DomainError::TelegramApi`.
#[async_trait::async_trait]
pub trait BotApi: Send + Sync {
    /// Largest document this API host accepts, in bytes.
    fn upload_size_limit(&self) -> u64;

    async fn send_document(
        &self,
        chat_id: &str,
        caption: Option<&str>,
        silent: bool,
        document: DocumentUpload,
    ) -> Result<TelegramResponse, DomainError>;

    /// Sends `[file](url) (size)` plus the caption, with link preview disabled.
    async fn send_link(
        &self,
        chat_id: &str,
        caption: Option<&str>,
        silent: bool,
        link: &ArtifactLink,
    ) -> Result<TelegramResponse, DomainError>;

    async fn forward_message(
        &self,
        chat_id: &str,
        from_chat_id: &str,
        message_id: i64,
        silent: bool,
    ) -> Result<TelegramResponse, DomainError>;

    /// Connectivity probe.
    async fn get_updates(&self) -> Result<TelegramResponse, DomainError>;

    /// Logs the bot out of the cloud Bot API server.
    async fn log_out(&self) -> Result<TelegramResponse, DomainError>;
}

/// Build artifact storage.
#[async_trait::async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Artifacts whose relative path matches `glob`, in enumeration order.
    async fn list(&self, glob: &str) -> Result<Vec<Artifact>, DomainError>;

    /// Opens an artifact for reading.
    async fn open(&self, artifact: &Artifact) -> Result<ArtifactReader, DomainError>;
}

/// The build being reported on.
#[async_trait::async_trait]
pub trait BuildSource: Send + Sync {
    /// Current outcome. `None` while the outcome is not yet decided.
    async fn result(&self) -> Result<Option<BuildResult>, DomainError>;

    /// Changes of the current build (index 0) followed by older builds, newest first.
    async fn change_history(&self) -> Result<Vec<BuildChanges>, DomainError>;
}

/// Build environment: expands `$VAR` references in templates.
#[async_trait::async_trait]
pub trait Environment: Send + Sync {
    async fn expand(&self, template: &str) -> Result<String, DomainError>;
}
