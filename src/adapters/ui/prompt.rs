//! Inquire-based confirmations for destructive admin actions.

use crate::adapters::ui::banner::{CYBER_GREEN, NEON_PURPLE};
use crate::domain::DomainError;
use inquire::Confirm;
use inquire::ui::{Color, RenderConfig, StyleSheet, Styled};

fn rgb((r, g, b): (u8, u8, u8)) -> Color {
    Color::Rgb { r, g, b }
}

/// Applies the neon theme to every subsequent inquire prompt.
pub fn apply_theme() {
    let config = RenderConfig::default()
        .with_prompt_prefix(Styled::new("?").with_fg(rgb(NEON_PURPLE)))
        .with_answered_prompt_prefix(Styled::new("✔").with_fg(rgb(CYBER_GREEN)))
        .with_answer(StyleSheet::new().with_fg(rgb(CYBER_GREEN)));
    inquire::set_global_render_config(config);
}

/// Asks before logging the bot out of the cloud Bot API.
/// Returns `Ok(false)` when the operator declines.
pub fn confirm_log_out(api_base_url: &str) -> Result<bool, DomainError> {
    Confirm::new(&format!("Log the bot out of {}?", api_base_url))
        .with_default(false)
        .with_help_message("The bot can't use this server again for 10 minutes")
        .prompt()
        .map_err(|e| DomainError::Aborted(e.to_string()))
}
