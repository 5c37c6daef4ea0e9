//! Fatal run errors

use crate::core::JobRun;
use std::time::Duration;
use thiserror::Error;

/// A partition never stabilized within the wait deadline
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Waited {waited:?} for {location}; data is still not available")]
pub struct DataTimeoutError {
    pub location: String,
    pub waited: Duration,
}

/// A jobflow that did not complete successfully
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Jobflow {job_name} failed: {reason}")]
pub struct JobFailure {
    pub job_name: String,
    pub reason: String,
    /// Present when the cluster reached a terminal state and was listed
    pub run: Option<JobRun>,
}

impl JobFailure {
    /// Notification body for this failure
    pub fn listing(&self) -> String {
        match &self.run {
            Some(run) => run.listing(),
            None => format!("Jobflow {}: {}\n", self.job_name, self.reason),
        }
    }
}
