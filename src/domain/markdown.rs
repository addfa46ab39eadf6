//! Telegram legacy Markdown helpers and size formatting.

/// Characters that open an entity in Telegram's legacy Markdown mode.
const MARKDOWN_SPECIALS: [char; 4] = ['_', '*', '[', '`'];

/// Prefixes every Markdown special character with a backslash.
/// Existing backslashes are kept as-is, so escaping twice only adds more of them.
pub fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if MARKDOWN_SPECIALS.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

/// Formats a byte count with binary units and at most two decimals, e.g. `52.43 MB`.
pub fn human_readable_size(bytes: u64) -> String {
    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let formatted = format!("{:.2}", value);
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, UNITS[unit])
}
