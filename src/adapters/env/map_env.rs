//! Implements Environment over a snapshot of variables.

use crate::domain::DomainError;
use crate::domain::expand::expand_vars;
use crate::ports::Environment;
use async_trait::async_trait;
use std::collections::HashMap;

/// Expands `$NAME` / `${NAME}` from a fixed variable map.
#[derive(Debug, Clone, Default)]
pub struct MapEnvironment {
    vars: HashMap<String, String>,
}

impl MapEnvironment {
    pub fn new(vars: HashMap<String, String>) -> Self {
        Self { vars }
    }

    /// Snapshot of the process environment, as seen by the CI job.
    pub fn from_process() -> Self {
        Self::new(std::env::vars().collect())
    }

    /// Adds or overrides one variable.
    pub fn with_var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }
}

#[async_trait]
impl Environment for MapEnvironment {
    async fn expand(&self, template: &str) -> Result<String, DomainError> {
        Ok(expand_vars(template, |name| self.get(name)))
    }
}
