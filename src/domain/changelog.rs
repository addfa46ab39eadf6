//! Changelog digest for captions.
//!
//! Collects changes of the current build plus the run of non-successful builds
//! right before it, newest first, and keeps as many as fit into the budget.

use super::entities::{BuildChanges, BuildResult, ChangeEntry};
use super::markdown::escape_markdown;

/// Telegram caption length limit, in characters.
pub const CAPTION_MAX_CHARS: usize = 1024;

/// Variable the digest is injected through.
pub const CHANGELOG_VARIABLE: &str = "TELEGRAM_UPLOADER_CHANGELOG";

/// Formats one entry as `\n* <author>: <first line>`, escaped for Markdown.
pub fn format_entry(entry: &ChangeEntry) -> String {
    let first_line = entry.message.lines().next().unwrap_or_default().trim_end();
    format!(
        "\n* {}: {}",
        escape_markdown(entry.author.trim()),
        escape_markdown(first_line)
    )
}

/// Builds whose changes belong to this run's digest: the current build (index 0)
/// followed by every directly preceding build that was worse than success.
pub fn relevant_builds(history: &[BuildChanges]) -> &[BuildChanges] {
    let Some((_, previous)) = history.split_first() else {
        return history;
    };
    let extra = previous
        .iter()
        .take_while(|b| {
            b.result
                .is_some_and(|r| r.is_worse_than(BuildResult::Success))
        })
        .count();
    &history[..1 + extra]
}

/// Assembles the digest, never longer than `budget` characters.
///
/// `history[0]` is the current build, older builds follow. Within a build,
/// entries are chronological. The newest entries win when the budget is tight;
/// the result is in chronological order.
pub fn digest(history: &[BuildChanges], budget: usize) -> String {
    let mut picked: Vec<String> = Vec::new();
    let mut used = 0usize;

    'builds: for build in relevant_builds(history) {
        for entry in build.changes.iter().rev() {
            let line = format_entry(entry);
            let len = line.chars().count();
            if used + len > budget {
                break 'builds;
            }
            used += len;
            picked.push(line);
        }
    }

    picked.reverse();
    picked.concat()
}
