//! Administrative Bot API actions: connection test and log out.
//!
//! Results are rendered as `FormValidation` so the caller can show raw error
//! detail next to the setting that produced it.

use crate::domain::DomainError;
use crate::ports::BotApi;
use crate::shared::validation::FormValidation;
use std::error::Error as _;
use std::sync::Arc;
use tracing::{info, warn};

pub struct AdminService {
    bot: Arc<dyn BotApi>,
}

impl AdminService {
    pub fn new(bot: Arc<dyn BotApi>) -> Self {
        Self { bot }
    }

    /// Calls `getUpdates`.
    pub async fn test_connection(&self) -> FormValidation {
        match self.bot.get_updates().await {
            Ok(_) => {
                info!("Bot API connection test succeeded");
                FormValidation::ok_with("Success")
            }
            Err(e) => {
                warn!(error = %e, "Bot API connection test failed");
                FormValidation::error_with_detail("Connection failed", error_detail(&e))
            }
        }
    }

    /// Calls `logOut`. Callers are expected to confirm with the operator first.
    pub async fn log_out(&self) -> FormValidation {
        match self.bot.log_out().await {
            Ok(_) => {
                info!("bot logged out from the cloud Bot API server");
                FormValidation::ok_with("Logged out")
            }
            Err(e) => {
                warn!(error = %e, "Bot API log out failed");
                FormValidation::error_with_detail("Log out failed", error_detail(&e))
            }
        }
    }
}

/// Full error chain plus the debug form, one cause per line.
fn error_detail(err: &DomainError) -> String {
    let mut lines = vec![err.to_string()];
    let mut source = err.source();
    while let Some(cause) = source {
        lines.push(format!("caused by: {}", cause));
        source = cause.source();
    }
    lines.push(format!("{:?}", err));
    lines.join("\n")
}
