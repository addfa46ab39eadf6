//! Implements BotApi over HTTP with reqwest.
//!
//! Every call is a multipart POST to `<base>/bot<token>/<method>`. The token is
//! part of the URL, so transport errors are stripped of their URL before they
//! are logged or returned.

use crate::adapters::telegram::response::parse_response;
use crate::domain::limits::upload_size_limit;
use crate::domain::markdown::{escape_markdown, human_readable_size};
use crate::domain::{BotConfig, DomainError, ProxyConfig, TelegramResponse};
use crate::ports::{ArtifactLink, BotApi, DocumentUpload};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, Proxy};
use secrecy::{ExposeSecret, Secret};
use tokio_util::io::ReaderStream;
use tracing::debug;
use url::Url;

/// Bot API client. One per configuration; cheap to share behind `Arc`.
pub struct BotApiClient {
    client: Client,
    api_base_url: String,
    token: Secret<String>,
    upload_limit: u64,
}

impl BotApiClient {
    /// Builds the HTTP client, routing through the configured proxy if any.
    pub fn new(config: &BotConfig) -> Result<Self, DomainError> {
        let mut builder = Client::builder();
        if let Some(proxy) = &config.proxy {
            builder = builder.proxy(build_proxy(proxy)?);
        }
        let client = builder
            .build()
            .map_err(|e| DomainError::ProxySetup(e.without_url().to_string()))?;

        Ok(Self {
            client,
            api_base_url: config.api_base_url.clone(),
            token: config.bot_token.clone(),
            upload_limit: upload_size_limit(&config.api_base_url),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{}",
            self.api_base_url.trim_end_matches('/'),
            self.token.expose_secret(),
            method
        )
    }

    async fn call(&self, method: &'static str, form: Form) -> Result<TelegramResponse, DomainError> {
        debug!(method, base = %self.api_base_url, "calling Bot API");
        let response = self
            .client
            .post(self.method_url(method))
            .multipart(form)
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        let body = response.text().await.map_err(transport)?;
        debug!(method, status = %status, body_len = body.len(), "Bot API replied");
        parse_response(method, status, &body)
    }
}

fn build_proxy(config: &ProxyConfig) -> Result<Proxy, DomainError> {
    let uri = config.uri.trim();
    let parsed = Url::parse(uri).map_err(|e| DomainError::ProxySetup(e.to_string()))?;
    if !parsed.has_host() {
        return Err(DomainError::ProxySetup("proxy URI has no host".to_string()));
    }
    let mut proxy = Proxy::all(uri).map_err(|e| DomainError::ProxySetup(e.to_string()))?;
    if let Some(user) = config.user.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
        proxy = proxy.basic_auth(user, config.password.expose_secret());
    }
    Ok(proxy)
}

fn transport(err: reqwest::Error) -> DomainError {
    DomainError::Transport(err.without_url().to_string())
}

fn non_empty(caption: Option<&str>) -> Option<&str> {
    caption.filter(|c| !c.is_empty())
}

/// Percent-encodes the parentheses the url crate leaves alone; Markdown ends
/// the link target at the first `)`.
fn link_target(url: &str) -> String {
    url.replace('(', "%28").replace(')', "%29")
}

/// `[name](url) (size)`, then the caption on its own paragraph.
fn link_text(link: &ArtifactLink, caption: Option<&str>) -> String {
    let mut text = format!(
        "[{}]({}) ({})",
        escape_markdown(&link.file_name),
        link_target(&link.url),
        human_readable_size(link.size)
    );
    if let Some(caption) = non_empty(caption) {
        text.push_str("\n\n");
        text.push_str(caption);
    }
    text
}

#[async_trait]
impl BotApi for BotApiClient {
    fn upload_size_limit(&self) -> u64 {
        self.upload_limit
    }

    async fn send_document(
        &self,
        chat_id: &str,
        caption: Option<&str>,
        silent: bool,
        document: DocumentUpload,
    ) -> Result<TelegramResponse, DomainError> {
        let mut form = Form::new().text("chat_id", chat_id.to_string());
        if silent {
            form = form.text("disable_notification", "true");
        }
        if let Some(caption) = non_empty(caption) {
            form = form
                .text("parse_mode", "Markdown")
                .text("caption", caption.to_string());
        }

        let body = Body::wrap_stream(ReaderStream::new(document.content));
        let part = Part::stream_with_length(body, document.size)
            .file_name(document.file_name)
            .mime_str("application/octet-stream")
            .map_err(transport)?;
        form = form.part("document", part);

        self.call("sendDocument", form).await
    }

    async fn send_link(
        &self,
        chat_id: &str,
        caption: Option<&str>,
        silent: bool,
        link: &ArtifactLink,
    ) -> Result<TelegramResponse, DomainError> {
        let mut form = Form::new()
            .text("chat_id", chat_id.to_string())
            .text("parse_mode", "Markdown")
            .text("text", link_text(link, caption))
            .text("disable_web_page_preview", "true");
        if silent {
            form = form.text("disable_notification", "true");
        }
        self.call("sendMessage", form).await
    }

    async fn forward_message(
        &self,
        chat_id: &str,
        from_chat_id: &str,
        message_id: i64,
        silent: bool,
    ) -> Result<TelegramResponse, DomainError> {
        let mut form = Form::new()
            .text("from_chat_id", from_chat_id.to_string())
            .text("chat_id", chat_id.to_string())
            .text("message_id", message_id.to_string());
        if silent {
            form = form.text("disable_notification", "true");
        }
        self.call("forwardMessage", form).await
    }

    async fn get_updates(&self) -> Result<TelegramResponse, DomainError> {
        self.call("getUpdates", Form::new()).await
    }

    async fn log_out(&self) -> Result<TelegramResponse, DomainError> {
        self.call("logOut", Form::new()).await
    }
}
