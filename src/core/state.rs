//! Runner state and pipeline result models

use crate::core::job::JobRun;
use serde::{Deserialize, Serialize};
use std::fmt;

/// States of a report run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunnerState {
    LoadingConfig,
    WaitingForData,
    SubmittingJob,
    Escalating,
    Importing,
    /// Pipeline finished successfully
    Done,
    /// Pipeline aborted; nothing is retried or resumed
    Fatal,
}

impl RunnerState {
    /// Check if the state is terminal
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunnerState::Done | RunnerState::Fatal)
    }

    /// Whether the runner may move from `self` to `next`
    pub fn can_transition_to(&self, next: RunnerState) -> bool {
        use RunnerState::*;
        matches!(
            (self, next),
            (LoadingConfig, WaitingForData)
                | (WaitingForData, SubmittingJob)
                | (WaitingForData, Fatal)
                | (SubmittingJob, Escalating)
                | (Escalating, Importing)
                | (Escalating, Fatal)
                | (Importing, Done)
        )
    }
}

impl fmt::Display for RunnerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunnerState::LoadingConfig => "LOADING_CONFIG",
            RunnerState::WaitingForData => "WAITING_FOR_DATA",
            RunnerState::SubmittingJob => "SUBMITTING_JOB",
            RunnerState::Escalating => "ESCALATING",
            RunnerState::Importing => "IMPORTING",
            RunnerState::Done => "DONE",
            RunnerState::Fatal => "FATAL",
        };
        f.write_str(s)
    }
}

/// Overall terminal outcome of a report run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineOutcome {
    Success,
    DataTimeout,
    JobFailure,
}

impl PipelineOutcome {
    /// Process exit status for this outcome
    pub fn exit_code(&self) -> i32 {
        match self {
            PipelineOutcome::Success => 0,
            PipelineOutcome::DataTimeout | PipelineOutcome::JobFailure => 1,
        }
    }
}

/// Result of one importer invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportOutcome {
    pub table: String,
    pub collection: String,
    pub success: bool,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    /// Set when the importer could not be run at all
    pub error: Option<String>,
}

/// The single output of a report run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineResult {
    pub outcome: PipelineOutcome,
    pub state: RunnerState,
    pub job: Option<JobRun>,
    pub imports: Vec<ImportOutcome>,
}

impl PipelineResult {
    pub fn is_success(&self) -> bool {
        self.outcome == PipelineOutcome::Success
    }

    pub fn failed_imports(&self) -> impl Iterator<Item = &ImportOutcome> {
        self.imports.iter().filter(|i| !i.success)
    }
}
