//! Core domain models for report generation
//!
//! This module defines the report configuration, the jobflow status model
//! and the runner's state and result types.

pub mod config;
pub mod job;
pub mod state;

pub use config::{ConfigError, PipelineConfig, StepSpec, WaitSpec};
pub use job::*;
pub use state::*;
