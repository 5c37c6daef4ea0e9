//! Run events and the reporter that fans them out to handlers

use crate::core::{JobStatus, RunnerState};
use std::sync::Arc;
use std::time::Duration;

/// Events that can occur during a report run
#[derive(Debug, Clone, PartialEq)]
pub enum RunEvent {
    StateChanged {
        from: RunnerState,
        to: RunnerState,
    },
    MetadataRefreshed {
        success: bool,
    },
    PartitionWaiting {
        location: String,
        elapsed: Duration,
    },
    PartitionAvailable {
        location: String,
    },
    ClusterCreated {
        job_name: String,
        cluster_id: String,
    },
    StepSubmitted {
        index: usize,
        hive_script: String,
    },
    JobFinished {
        job_name: String,
        status: Option<JobStatus>,
        succeeded: bool,
    },
    NotificationSent {
        channel: String,
        subject: String,
    },
    NotificationFailed {
        channel: String,
        error: String,
    },
    ImportStarted {
        table: String,
        collection: String,
    },
    ImportFinished {
        table: String,
        collection: String,
        success: bool,
    },
}

/// Type for event handlers
pub type EventHandler = Arc<dyn Fn(&RunEvent) + Send + Sync>;

/// Explicit event sink handed to every component of the runner
#[derive(Clone, Default)]
pub struct Reporter {
    handlers: Vec<EventHandler>,
}

impl Reporter {
    /// A reporter that drops every event
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an event handler
    pub fn with_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&RunEvent) + Send + Sync + 'static,
    {
        self.handlers.push(Arc::new(handler));
        self
    }

    /// Emit an event to all handlers
    pub fn emit(&self, event: RunEvent) {
        for handler in &self.handlers {
            handler(&event);
        }
    }
}

impl std::fmt::Debug for Reporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reporter")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}
