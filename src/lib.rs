//! report-generator - waits for Hive partitions, runs the report jobflow and
//! loads the results into the serving store

pub mod cli;
pub mod core;
pub mod execution;
pub mod services;

// Re-export commonly used types
pub use crate::core::{ConfigError, PipelineConfig, PipelineOutcome, PipelineResult, RunnerState};
pub use execution::{Collaborators, PipelineRunner, Reporter, RunEvent, WaitOptions};
pub use services::ServiceError;
