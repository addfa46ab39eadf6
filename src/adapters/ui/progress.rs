//! Implements ProgressPort with an indicatif bar.

use crate::ports::ProgressPort;
use indicatif::{ProgressBar, ProgressStyle};

const TEMPLATE: &str = "{spinner:.magenta} [{bar:30.magenta/cyan}] {pos}/{len} {msg}";

/// Terminal progress bar, one tick per artifact.
pub struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    pub fn new() -> Self {
        let bar = ProgressBar::hidden();
        if let Ok(style) = ProgressStyle::with_template(TEMPLATE) {
            bar.set_style(style.progress_chars("=> "));
        }
        Self { bar }
    }
}

impl Default for BarProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressPort for BarProgress {
    fn started(&self, total: usize) {
        self.bar.set_draw_target(indicatif::ProgressDrawTarget::stderr());
        self.bar.set_length(total as u64);
        self.bar.set_position(0);
    }

    fn artifact_started(&self, relative_path: &str) {
        self.bar.set_message(relative_path.to_string());
    }

    fn artifact_finished(&self, relative_path: &str, ok: bool) {
        if !ok {
            self.bar.println(format!("✗ {}", relative_path));
        }
        self.bar.inc(1);
    }

    fn finished(&self) {
        self.bar.finish_and_clear();
    }
}
