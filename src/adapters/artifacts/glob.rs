//! Ant-style path globs, compiled to regexes.
//!
//! `**` spans any number of directories, `*` stays within one segment, `?` is
//! one character. A trailing `/` means `/**`. Several patterns may be given
//! separated by commas; a path matches if any of them does.

use crate::domain::{DEFAULT_FILTER, DomainError};
use regex::Regex;

#[derive(Debug, Clone)]
pub struct AntGlob {
    patterns: Vec<Regex>,
}

impl AntGlob {
    pub fn new(filter: &str) -> Result<Self, DomainError> {
        let mut sources: Vec<&str> = filter
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();
        if sources.is_empty() {
            sources.push(DEFAULT_FILTER);
        }

        let patterns = sources
            .into_iter()
            .map(|p| {
                Regex::new(&to_regex(p)).map_err(|e| {
                    DomainError::ArtifactList(format!("invalid filter '{}': {}", p, e))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    /// `path` is relative and `/`-separated.
    pub fn is_match(&self, path: &str) -> bool {
        self.patterns.iter().any(|re| re.is_match(path))
    }
}

fn to_regex(pattern: &str) -> String {
    let slashed = pattern.replace('\\', "/");
    let mut relative = slashed.as_str();
    while let Some(rest) = relative.strip_prefix("./") {
        relative = rest;
    }
    let mut normalized = relative.trim_start_matches('/').to_string();
    if normalized.ends_with('/') {
        normalized.push_str("**");
    }

    let segments: Vec<&str> = normalized.split('/').collect();
    let mut re = String::from("^");
    for (i, segment) in segments.iter().enumerate() {
        let last = i + 1 == segments.len();
        if *segment == "**" {
            re.push_str(if last { ".*" } else { "(?:[^/]*/)*" });
            continue;
        }
        for c in segment.chars() {
            match c {
                '*' => re.push_str("[^/]*"),
                '?' => re.push_str("[^/]"),
                other => re.push_str(&regex::escape(&other.to_string())),
            }
        }
        if !last {
            re.push('/');
        }
    }
    re.push('$');
    re
}
