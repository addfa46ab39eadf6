//! Application configuration. Bot credentials, proxy, job settings, artifact paths.

use crate::domain::{
    BotConfig, BuildResult, DEFAULT_API_BASE_URL, DomainError, ProxyConfig, UploadJob,
    effective_filter, parse_chat_list,
};
use crate::shared::validation::{
    FieldCheck, check_api_base_uri, check_bot_token, check_chat_id, check_http_proxy_uri,
};
use config::ConfigBuilder;
use config::builder::DefaultState;
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use std::path::PathBuf;

/// Artifact root used when `artifacts_dir` is unset.
pub const DEFAULT_ARTIFACTS_DIR: &str = "./artifacts";

/// Everything is optional at load time; helpers below resolve defaults and
/// report what is missing.
#[derive(Debug, Deserialize, Default)]
pub struct AppConfig {
    /// Read from TG_UPLOADER_BOT_TOKEN.
    #[serde(default)]
    pub bot_token: Option<Secret<String>>,

    /// Bot API server. Defaults to the public cloud API.
    #[serde(default)]
    pub api_base_url: Option<String>,

    #[serde(default)]
    pub http_proxy_uri: Option<String>,
    #[serde(default)]
    pub http_proxy_user: Option<String>,
    #[serde(default)]
    pub http_proxy_password: Option<Secret<String>>,

    #[serde(default)]
    pub chat_id: Option<String>,

    /// Comma-separated.
    #[serde(default)]
    pub forward_chat_ids: Option<String>,

    #[serde(default)]
    pub caption: Option<String>,

    /// Ant-style glob. Blank means `**`.
    #[serde(default)]
    pub filter: Option<String>,

    #[serde(default)]
    pub silent: bool,
    #[serde(default)]
    pub fail_build_if_upload_failed: bool,
    #[serde(default)]
    pub send_link_if_upload_size_limit_exceeded: bool,

    #[serde(default)]
    pub artifacts_dir: Option<String>,

    /// Public URL of the artifact root, for links to oversized artifacts.
    #[serde(default)]
    pub artifacts_url: Option<String>,

    /// SUCCESS, UNSTABLE, FAILURE, NOT_BUILT or ABORTED.
    #[serde(default)]
    pub build_result: Option<String>,

    /// Path to a JSON file with the build result and change history.
    #[serde(default)]
    pub build_info: Option<String>,
}

impl AppConfig {
    /// Loads `.env`, then TG_UPLOADER_* variables, then the file named by
    /// TG_UPLOADER_CONFIG (if any).
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenv::dotenv().ok();
        let mut c = config::Config::builder()
            .add_source(config::Environment::with_prefix("TG_UPLOADER"));
        if let Ok(path) = std::env::var("TG_UPLOADER_CONFIG") {
            c = c.add_source(config::File::with_name(&path));
        }
        Self::from_builder(c)
    }

    fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, config::ConfigError> {
        builder.build()?.try_deserialize()
    }

    pub fn api_base_url_or_default(&self) -> String {
        non_blank(self.api_base_url.as_deref())
            .unwrap_or(DEFAULT_API_BASE_URL)
            .to_string()
    }

    pub fn artifacts_dir_or_default(&self) -> PathBuf {
        PathBuf::from(non_blank(self.artifacts_dir.as_deref()).unwrap_or(DEFAULT_ARTIFACTS_DIR))
    }

    pub fn artifacts_url(&self) -> Option<String> {
        non_blank(self.artifacts_url.as_deref()).map(String::from)
    }

    pub fn build_info_path(&self) -> Option<PathBuf> {
        non_blank(self.build_info.as_deref()).map(PathBuf::from)
    }

    /// Parsed build result; `None` when unset.
    pub fn build_result(&self) -> Result<Option<BuildResult>, DomainError> {
        non_blank(self.build_result.as_deref())
            .map(str::parse)
            .transpose()
    }

    /// Bot API access settings. Fails when the token is missing.
    pub fn bot_config(&self) -> Result<BotConfig, DomainError> {
        let token = self
            .bot_token
            .as_ref()
            .map(|t| t.expose_secret().trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| DomainError::Config("Set TG_UPLOADER_BOT_TOKEN".to_string()))?;

        let mut bot = BotConfig::new(token);
        bot.api_base_url = self.api_base_url_or_default();
        bot.proxy = non_blank(self.http_proxy_uri.as_deref()).map(|uri| ProxyConfig {
            uri: uri.to_string(),
            user: non_blank(self.http_proxy_user.as_deref()).map(String::from),
            password: self
                .http_proxy_password
                .clone()
                .unwrap_or_else(|| Secret::new(String::new())),
        });
        Ok(bot)
    }

    /// The upload job described by this configuration. Fails when the chat id is missing.
    pub fn upload_job(&self) -> Result<UploadJob, DomainError> {
        let chat_id = non_blank(self.chat_id.as_deref())
            .ok_or_else(|| DomainError::Config("Set TG_UPLOADER_CHAT_ID".to_string()))?;

        let mut job = UploadJob::new(chat_id);
        job.forward_chat_ids = self
            .forward_chat_ids
            .as_deref()
            .map(parse_chat_list)
            .unwrap_or_default();
        job.caption_template = self.caption.clone();
        job.filter_glob = effective_filter(self.filter.as_deref());
        job.silent = self.silent;
        job.fail_on_error = self.fail_build_if_upload_failed;
        job.link_on_oversize = self.send_link_if_upload_size_limit_exceeded;
        Ok(job)
    }

    /// Runs every field validator.
    pub fn validate(&self) -> Vec<FieldCheck> {
        let token = self
            .bot_token
            .as_ref()
            .map(|t| t.expose_secret().as_str())
            .unwrap_or_default();
        let mut checks = vec![
            FieldCheck {
                field: "bot_token",
                result: check_bot_token(token),
            },
            FieldCheck {
                field: "api_base_url",
                result: check_api_base_uri(self.api_base_url.as_deref().unwrap_or_default()),
            },
            FieldCheck {
                field: "http_proxy_uri",
                result: check_http_proxy_uri(self.http_proxy_uri.as_deref().unwrap_or_default()),
            },
            FieldCheck {
                field: "chat_id",
                result: check_chat_id(self.chat_id.as_deref().unwrap_or_default()),
            },
        ];
        for forward in self
            .forward_chat_ids
            .as_deref()
            .map(parse_chat_list)
            .unwrap_or_default()
        {
            checks.push(FieldCheck {
                field: "forward_chat_ids",
                result: check_chat_id(&forward),
            });
        }
        checks
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
