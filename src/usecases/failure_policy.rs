//! Uniform reaction to every error branch of an upload run.

use crate::domain::{DomainError, RunReport};
use tracing::{error, warn};

/// Either records a failure and lets the run continue, or escalates it into
/// `DomainError::Aborted`, which callers propagate with `?`.
#[derive(Debug, Clone, Copy)]
pub struct FailurePolicy {
    fail_on_error: bool,
}

impl FailurePolicy {
    pub fn new(fail_on_error: bool) -> Self {
        Self { fail_on_error }
    }

    /// Routes `err`. An abort signal always passes through unchanged.
    pub fn fail(&self, report: &mut RunReport, err: DomainError) -> Result<(), DomainError> {
        if err.is_abort() {
            return Err(err);
        }
        let message = err.to_string();
        if self.fail_on_error {
            error!(error = %message, "upload failed, aborting run");
            return Err(DomainError::Aborted(message));
        }
        warn!(error = %message, "upload step failed, continuing");
        report.failures.push(message);
        Ok(())
    }
}
