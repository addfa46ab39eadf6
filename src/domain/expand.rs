//! `$NAME` / `${NAME}` variable substitution.
//!
//! `$$` produces a literal `$`; unknown names are left untouched.

use regex::{Captures, Regex};
use std::sync::LazyLock;

static VARIABLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$(\$|[A-Za-z0-9_]+|\{[A-Za-z0-9_.]+\})").expect("variable pattern")
});

/// Expands variables in `template` using `lookup`.
pub fn expand_vars<'a, F>(template: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<&'a str>,
{
    substitute(template, lookup, true)
}

/// Expands a single variable, leaving every other token (including `$$`) as-is.
pub fn expand_one(template: &str, name: &str, value: &str) -> String {
    substitute(template, |n| (n == name).then_some(value), false)
}

/// Counts references to `name` (either form); `$$NAME` is not a reference.
pub fn count_references(template: &str, name: &str) -> usize {
    VARIABLE
        .captures_iter(template)
        .filter(|caps| variable_name(&caps[1]) == name)
        .count()
}

/// Escapes `$` so the text survives a later expansion unchanged.
pub fn escape_dollars(text: &str) -> String {
    text.replace('$', "$$")
}

fn variable_name(token: &str) -> &str {
    token
        .strip_prefix('{')
        .and_then(|t| t.strip_suffix('}'))
        .unwrap_or(token)
}

fn substitute<'a, F>(template: &str, lookup: F, collapse_dollars: bool) -> String
where
    F: Fn(&str) -> Option<&'a str>,
{
    VARIABLE
        .replace_all(template, |caps: &Captures<'_>| {
            let token = &caps[1];
            if token == "$" {
                return if collapse_dollars { "$" } else { "$$" }.to_string();
            }
            match lookup(variable_name(token)) {
                Some(value) => value.to_string(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}
