//! Terminal UI: banner, progress bar, prompts.

pub mod banner;
pub mod progress;
pub mod prompt;

pub use progress::BarProgress;

/// Prints the welcome banner and applies the neon theme for all subsequent inquire prompts.
/// Call once at startup, only when attached to a terminal.
pub fn init_ui() {
    banner::print_welcome();
    prompt::apply_theme();
}
