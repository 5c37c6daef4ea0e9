//! External collaborators of the report runner
//!
//! Each collaborator is a trait so the runner can be driven by the bundled
//! adapters (local storage, Hive shell, command channels, report importer)
//! or by in-memory fakes in tests.

pub mod error;
pub mod hive;
pub mod importer;
pub mod notify;
pub mod storage;

use crate::core::{JobStatus, StepSpec, StepStatus};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use error::ServiceError;
pub use hive::{HiveJobRunner, HiveMetadata, HiveShell};
pub use importer::ReportImporter;
pub use notify::CommandChannel;
pub use storage::LocalStorage;

/// An object found under a storage prefix
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectEntry {
    pub key: String,
    pub last_modified: DateTime<Utc>,
}

/// Lists objects under a storage prefix
#[async_trait]
pub trait StorageListingService: Send + Sync {
    async fn list(&self, prefix: &str) -> Result<Vec<ObjectEntry>, ServiceError>;
}

/// Resolves logical tables to storage locations
#[async_trait]
pub trait TableMetadataService: Send + Sync {
    /// Storage location of a table, e.g. `s3://bucket/warehouse/table`
    async fn location(&self, table: &str) -> Result<String, ServiceError>;

    /// Bring the metastore up to date with data written by other clusters
    async fn refresh_metadata(&self) -> Result<(), ServiceError>;
}

/// Handle to a cluster created for one jobflow
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClusterHandle {
    pub id: String,
    pub name: String,
}

/// Creates clusters and runs ordered steps on them
#[async_trait]
pub trait JobExecutionService: Send + Sync {
    async fn create_cluster(&self, name: &str) -> Result<ClusterHandle, ServiceError>;

    /// Append a step; steps run in the order they were added
    async fn add_step(&self, cluster: &ClusterHandle, step: &StepSpec) -> Result<(), ServiceError>;

    /// Block until the cluster reaches a terminal status
    async fn await_completion(&self, cluster: &ClusterHandle) -> Result<JobStatus, ServiceError>;

    /// Per-step statuses, one entry per added step, in submission order
    async fn list_step_statuses(&self, cluster: &ClusterHandle) -> Result<Vec<StepStatus>, ServiceError>;
}

/// Whether a channel receives success reports too, or only failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelKind {
    /// Receives every report (email)
    Primary,
    /// Receives failure reports only (chat)
    Secondary,
}

/// One notification delivery channel
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    fn name(&self) -> &str;

    fn kind(&self) -> ChannelKind;

    async fn send(&self, subject: &str, body: &str) -> Result<(), ServiceError>;
}

/// Arguments for one importer invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRequest {
    /// Importer flags such as `--drop` and `--hive_init`
    pub options: Vec<String>,
    pub table: String,
    pub collection: String,
    pub args: Vec<String>,
}

/// Captured output of an importer process
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ImportOutput {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process was killed by a signal
    pub exit_code: Option<i32>,
}

impl ImportOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Runs the external importer that loads Hive results into the serving store
#[async_trait]
pub trait ImporterService: Send + Sync {
    async fn invoke(&self, request: &ImportRequest) -> Result<ImportOutput, ServiceError>;
}
