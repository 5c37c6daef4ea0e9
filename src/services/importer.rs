//! Report importer subprocess client

use crate::services::{ImportOutput, ImportRequest, ImporterService, ServiceError};
use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

/// Runs the report importer that loads a Hive table into a serving collection
#[derive(Debug, Clone)]
pub struct ReportImporter {
    /// Importer command line, e.g. `python /opt/analytics/report_importer.py`
    command: Vec<String>,
    master_node: String,
    database: String,
}

impl ReportImporter {
    pub fn new(command_line: &str, master_node: impl Into<String>) -> Self {
        Self {
            command: command_line.split_whitespace().map(str::to_string).collect(),
            master_node: master_node.into(),
            database: "report".to_string(),
        }
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    /// Full argument vector, program first:
    /// `<cmd> [options] <master> <table> <database> <collection> <args...>`
    pub fn command_line(&self, request: &ImportRequest) -> Vec<String> {
        let mut argv = self.command.clone();
        argv.extend(request.options.iter().cloned());
        argv.push(self.master_node.clone());
        argv.push(request.table.clone());
        argv.push(self.database.clone());
        argv.push(request.collection.clone());
        argv.extend(request.args.iter().cloned());
        argv
    }
}

#[async_trait]
impl ImporterService for ReportImporter {
    async fn invoke(&self, request: &ImportRequest) -> Result<ImportOutput, ServiceError> {
        let argv = self.command_line(request);
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| ServiceError::Unsupported("empty importer command".to_string()))?;

        info!("Running command: {}", argv.join(" "));
        let output = Command::new(program)
            .args(args)
            .kill_on_drop(true)
            .output()
            .await?;

        let result = ImportOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code(),
        };
        debug!(
            "importer returned {:?} with {} bytes of output",
            result.exit_code,
            result.stdout.len()
        );
        Ok(result)
    }
}
