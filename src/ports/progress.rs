//! Progress outbound port. Reports per-artifact progress to a UI.

/// Observer for a running upload. Optional; the workflow works without one.
pub trait ProgressPort: Send + Sync {
    /// Called once after artifacts are listed.
    fn started(&self, total: usize);

    /// Called before an artifact is processed.
    fn artifact_started(&self, relative_path: &str);

    /// Called after an artifact (and its forwards) finished, successfully or not.
    fn artifact_finished(&self, relative_path: &str, ok: bool);

    fn finished(&self);
}
