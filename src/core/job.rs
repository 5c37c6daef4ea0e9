//! Jobflow status model and outcome classification

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status reported by the job-execution service for a cluster or a step
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
    Terminated,
    /// Any status string the service reports that we don't model
    Other(String),
}

impl JobStatus {
    /// Parse a service status string, case-insensitively
    pub fn parse(status: &str) -> Self {
        match status.trim().to_ascii_uppercase().as_str() {
            "PENDING" => JobStatus::Pending,
            "RUNNING" => JobStatus::Running,
            "COMPLETED" => JobStatus::Completed,
            "FAILED" => JobStatus::Failed,
            "CANCELLED" => JobStatus::Cancelled,
            "TERMINATED" => JobStatus::Terminated,
            _ => JobStatus::Other(status.trim().to_string()),
        }
    }

    /// FAILED, CANCELLED and TERMINATED mark a step as failed
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            JobStatus::Failed | JobStatus::Cancelled | JobStatus::Terminated
        )
    }

    pub fn as_str(&self) -> &str {
        match self {
            JobStatus::Pending => "PENDING",
            JobStatus::Running => "RUNNING",
            JobStatus::Completed => "COMPLETED",
            JobStatus::Failed => "FAILED",
            JobStatus::Cancelled => "CANCELLED",
            JobStatus::Terminated => "TERMINATED",
            JobStatus::Other(s) => s.as_str(),
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of one submitted step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepStatus {
    pub name: String,
    pub status: JobStatus,
}

impl StepStatus {
    pub fn new(name: impl Into<String>, status: JobStatus) -> Self {
        Self {
            name: name.into(),
            status,
        }
    }
}

/// A finished jobflow: terminal top-level status plus the ordered step listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRun {
    pub cluster_id: String,
    pub job_name: String,
    pub status: JobStatus,
    pub steps: Vec<StepStatus>,
}

impl JobRun {
    /// Whether this run counts as a success
    pub fn succeeded(&self) -> bool {
        classify(&self.status, &self.steps)
    }

    /// Render the step listing used as a notification body
    pub fn listing(&self) -> String {
        let mut out = format!(
            "Jobflow {} ({}): {}\n",
            self.job_name, self.cluster_id, self.status
        );
        for (i, step) in self.steps.iter().enumerate() {
            out.push_str(&format!("{}. {}: {}\n", i + 1, step.name, step.status));
        }
        out
    }
}

/// Classify a terminal jobflow.
///
/// Any failed step fails the run, even when the cluster reports COMPLETED.
/// Otherwise only an exact COMPLETED counts as success; unknown statuses fail.
pub fn classify(top_level: &JobStatus, steps: &[StepStatus]) -> bool {
    if steps.iter().any(|s| s.status.is_failure()) {
        return false;
    }
    *top_level == JobStatus::Completed
}
