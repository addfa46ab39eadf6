//! Build info from a JSON file written by the CI job.
//!
//! ```json
//! {
//!   "result": "SUCCESS",
//!   "history": [
//!     { "changes": [ { "author": "ann", "message": "Add dark mode" } ] },
//!     { "result": "FAILURE", "changes": [ { "author": "bob", "message": "Break build" } ] }
//!   ]
//! }
//! ```
//!
//! `history[0]` is the current build; older builds follow, newest first.

use crate::adapters::build::StaticBuildSource;
use crate::domain::{BuildChanges, BuildResult, DomainError};
use serde::Deserialize;
use std::path::Path;
use tokio::fs;
use tracing::info;

#[derive(Debug, Default, Deserialize)]
struct BuildInfo {
    #[serde(default)]
    result: Option<BuildResult>,
    #[serde(default)]
    history: Vec<BuildChanges>,
}

/// Reads and parses the build info file.
pub async fn load_build_info(path: impl AsRef<Path>) -> Result<StaticBuildSource, DomainError> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path)
        .await
        .map_err(|e| DomainError::Config(format!("read {}: {}", path.display(), e)))?;
    let info: BuildInfo = serde_json::from_str(&raw)
        .map_err(|e| DomainError::Config(format!("parse {}: {}", path.display(), e)))?;

    info!(
        path = %path.display(),
        result = ?info.result,
        builds = info.history.len(),
        "loaded build info"
    );
    Ok(StaticBuildSource::new(info.result).with_history(info.history))
}
