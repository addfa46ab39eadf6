//! Domain entities. Pure data structures for the core business.
//!
//! No HTTP or filesystem types here; adapters map into these.

use chrono::{DateTime, Utc};
use secrecy::Secret;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::errors::DomainError;

/// Public cloud Bot API host.
pub const DEFAULT_API_BASE_URL: &str = "https://api.telegram.org";

/// One upload run: where to send, what to send, how to react to failures.
/// Built from configuration plus per-run overrides; never mutated during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadJob {
    pub chat_id: String,
    pub forward_chat_ids: Vec<String>,
    pub caption_template: Option<String>,
    pub filter_glob: String,
    pub silent: bool,
    pub fail_on_error: bool,
    pub link_on_oversize: bool,
}

impl UploadJob {
    pub fn new(chat_id: impl Into<String>) -> Self {
        Self {
            chat_id: chat_id.into(),
            forward_chat_ids: Vec::new(),
            caption_template: None,
            filter_glob: DEFAULT_FILTER.to_string(),
            silent: false,
            fail_on_error: false,
            link_on_oversize: false,
        }
    }
}

/// Filter used when the configured one is blank.
pub const DEFAULT_FILTER: &str = "**";

/// Normalizes a configured filter: blank means "everything".
pub fn effective_filter(raw: Option<&str>) -> String {
    match raw.map(str::trim) {
        Some(f) if !f.is_empty() => f.to_string(),
        _ => DEFAULT_FILTER.to_string(),
    }
}

/// Splits a comma-separated chat list, trimming entries and skipping blanks.
pub fn parse_chat_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// A file produced by the build, as enumerated by the artifact store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Path relative to the artifact root, `/`-separated.
    pub relative_path: String,
    pub size_bytes: u64,
    /// Opaque handle for the store to resolve (absolute path for the filesystem store).
    pub location: String,
    /// Publicly reachable URL, if the store knows one.
    pub public_url: Option<String>,
}

impl Artifact {
    /// Last path segment, used as the uploaded document name.
    pub fn file_name(&self) -> &str {
        self.relative_path
            .rsplit('/')
            .next()
            .unwrap_or(&self.relative_path)
    }
}

/// Optional HTTP proxy for all Bot API calls.
#[derive(Clone)]
pub struct ProxyConfig {
    pub uri: String,
    pub user: Option<String>,
    pub password: Secret<String>,
}

impl fmt::Debug for ProxyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyConfig")
            .field("uri", &self.uri)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Bot API access. Loaded once, shared read-only across runs.
#[derive(Clone)]
pub struct BotConfig {
    pub api_base_url: String,
    pub bot_token: Secret<String>,
    pub proxy: Option<ProxyConfig>,
}

impl BotConfig {
    pub fn new(bot_token: impl Into<String>) -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            bot_token: Secret::new(bot_token.into()),
            proxy: None,
        }
    }
}

impl fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotConfig")
            .field("api_base_url", &self.api_base_url)
            .field("bot_token", &"[REDACTED]")
            .field("proxy", &self.proxy)
            .finish()
    }
}

/// Parsed reply of a single Bot API call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TelegramResponse {
    pub ok: bool,
    pub result_message_id: Option<i64>,
    pub error_description: Option<String>,
}

/// Build outcome, ordered from best to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BuildResult {
    Success,
    Unstable,
    Failure,
    NotBuilt,
    Aborted,
}

impl BuildResult {
    pub fn is_worse_or_equal_to(self, other: BuildResult) -> bool {
        self >= other
    }

    pub fn is_worse_than(self, other: BuildResult) -> bool {
        self > other
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BuildResult::Success => "SUCCESS",
            BuildResult::Unstable => "UNSTABLE",
            BuildResult::Failure => "FAILURE",
            BuildResult::NotBuilt => "NOT_BUILT",
            BuildResult::Aborted => "ABORTED",
        }
    }
}

impl fmt::Display for BuildResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuildResult {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SUCCESS" => Ok(BuildResult::Success),
            "UNSTABLE" => Ok(BuildResult::Unstable),
            "FAILURE" => Ok(BuildResult::Failure),
            "NOT_BUILT" => Ok(BuildResult::NotBuilt),
            "ABORTED" => Ok(BuildResult::Aborted),
            other => Err(DomainError::Config(format!(
                "unknown build result '{}'",
                other
            ))),
        }
    }
}

/// A single source-control change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEntry {
    pub author: String,
    pub message: String,
}

/// Changes of one build, with that build's result (absent while running).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BuildChanges {
    #[serde(default)]
    pub result: Option<BuildResult>,
    #[serde(default)]
    pub changes: Vec<ChangeEntry>,
}

/// How an artifact reached the primary chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryKind {
    Document,
    Link,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub artifact: String,
    pub kind: DeliveryKind,
    pub message_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Forward {
    pub artifact: String,
    pub chat_id: String,
    pub message_id: i64,
}

/// Outcome of one workflow run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Set when the build result short-circuited the run.
    pub skipped: bool,
    pub delivered: Vec<Delivery>,
    pub forwarded: Vec<Forward>,
    /// Failures reported (not escalated) by the failure policy.
    pub failures: Vec<String>,
}

impl RunReport {
    pub fn start() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            skipped: false,
            delivered: Vec::new(),
            forwarded: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn finish(mut self) -> Self {
        self.finished_at = Some(Utc::now());
        self
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}
