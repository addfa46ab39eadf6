//! Implements BuildSource from values known up front (config, CLI flags, or a
//! build info file read at startup).

use crate::domain::{BuildChanges, BuildResult, DomainError};
use crate::ports::BuildSource;
use async_trait::async_trait;

#[derive(Debug, Clone, Default)]
pub struct StaticBuildSource {
    result: Option<BuildResult>,
    history: Vec<BuildChanges>,
}

impl StaticBuildSource {
    pub fn new(result: Option<BuildResult>) -> Self {
        Self {
            result,
            history: Vec::new(),
        }
    }

    /// `history[0]` is the current build, older builds follow.
    pub fn with_history(mut self, history: Vec<BuildChanges>) -> Self {
        self.history = history;
        self
    }

    /// Replaces the result, keeping the history.
    pub fn with_result(mut self, result: Option<BuildResult>) -> Self {
        self.result = result;
        self
    }
}

#[async_trait]
impl BuildSource for StaticBuildSource {
    async fn result(&self) -> Result<Option<BuildResult>, DomainError> {
        Ok(self.result)
    }

    async fn change_history(&self) -> Result<Vec<BuildChanges>, DomainError> {
        Ok(self.history.clone())
    }
}
