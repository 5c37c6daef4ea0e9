//! Hive shell adapters - metastore lookups and step execution
//!
//! Hive runs either on this machine or on a cluster master node reached
//! over ssh. Both the table location lookup and the step runner go through
//! the same [`HiveShell`].

use crate::core::{JobStatus, StepSpec, StepStatus};
use crate::services::{
    ClusterHandle, JobExecutionService, ServiceError, TableMetadataService,
};
use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use tokio::process::Command;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Runs `hive` locally or on a remote master node
#[derive(Debug, Clone)]
pub struct HiveShell {
    master_node: String,
    ssh_keyfile: Option<String>,
    hive_bin: String,
}

impl HiveShell {
    /// Create a shell for the given master node.
    ///
    /// `localhost` (or an empty name) runs Hive directly; anything else is
    /// treated as an ssh destination.
    pub fn new(master_node: impl Into<String>) -> Self {
        Self {
            master_node: master_node.into(),
            ssh_keyfile: None,
            hive_bin: "hive".to_string(),
        }
    }

    pub fn with_ssh_keyfile(mut self, keyfile: Option<String>) -> Self {
        self.ssh_keyfile = keyfile;
        self
    }

    pub fn with_hive_bin(mut self, hive_bin: impl Into<String>) -> Self {
        self.hive_bin = hive_bin.into();
        self
    }

    pub fn master_node(&self) -> &str {
        &self.master_node
    }

    pub fn is_local(&self) -> bool {
        matches!(self.master_node.as_str(), "" | "localhost" | "local")
    }

    /// Program and arguments for a hive invocation
    pub fn command_line(&self, hive_args: &[String]) -> (String, Vec<String>) {
        if self.is_local() {
            return (self.hive_bin.clone(), hive_args.to_vec());
        }

        let mut args = vec!["-o".to_string(), "BatchMode=yes".to_string()];
        if let Some(keyfile) = &self.ssh_keyfile {
            args.push("-i".to_string());
            args.push(keyfile.clone());
        }
        args.push(self.master_node.clone());
        // The remote shell re-splits the command, so every word is quoted
        args.push(shell_quote(&self.hive_bin));
        args.extend(hive_args.iter().map(|a| shell_quote(a)));
        ("ssh".to_string(), args)
    }

    /// Run hive and return its stdout
    pub async fn run(&self, hive_args: &[String]) -> Result<String, ServiceError> {
        let (program, args) = self.command_line(hive_args);
        debug!(program = %program, args = ?args, "Running hive");

        let output = Command::new(&program)
            .args(&args)
            .kill_on_drop(true)
            .output()
            .await?;

        if !output.status.success() {
            let err = ServiceError::command(&program, &output);
            warn!("hive invocation failed: {}", err);
            return Err(err);
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Quote a word for a POSIX shell
fn shell_quote(word: &str) -> String {
    if !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:,@%+".contains(c))
    {
        return word.to_string();
    }
    format!("'{}'", word.replace('\'', r"'\''"))
}

/// Convert a step's `hive_args` into hive command-line arguments.
///
/// Objects become `-d key=value` definitions, arrays are passed verbatim and
/// a string is split on whitespace.
pub fn hive_arg_list(hive_args: &Value) -> Vec<String> {
    fn scalar(v: &Value) -> String {
        match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    match hive_args {
        Value::Null => Vec::new(),
        Value::Object(map) => map
            .iter()
            .flat_map(|(k, v)| ["-d".to_string(), format!("{}={}", k, scalar(v))])
            .collect(),
        Value::Array(items) => items.iter().map(scalar).collect(),
        Value::String(s) => s.split_whitespace().map(str::to_string).collect(),
        other => vec![other.to_string()],
    }
}

/// Metastore lookups through `hive -e`
#[derive(Debug, Clone)]
pub struct HiveMetadata {
    shell: HiveShell,
    init_script: String,
}

impl HiveMetadata {
    pub fn new(shell: HiveShell, init_script: impl Into<String>) -> Self {
        Self {
            shell,
            init_script: init_script.into(),
        }
    }
}

/// Extract the `Location:` row from `DESCRIBE FORMATTED` output
pub fn parse_location(describe_output: &str) -> Result<String, ServiceError> {
    let re = Regex::new(r"(?m)^\s*Location:\s*(\S+)")
        .map_err(|e| ServiceError::Parse(e.to_string()))?;
    re.captures(describe_output)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim_end_matches('/').to_string())
        .ok_or_else(|| ServiceError::Parse("no Location row in table description".to_string()))
}

fn is_valid_table_name(table: &str) -> bool {
    !table.is_empty()
        && table
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

#[async_trait]
impl TableMetadataService for HiveMetadata {
    async fn location(&self, table: &str) -> Result<String, ServiceError> {
        if !is_valid_table_name(table) {
            return Err(ServiceError::Unsupported(format!(
                "invalid table name '{}'",
                table
            )));
        }

        let output = self
            .shell
            .run(&[
                "-S".to_string(),
                "-e".to_string(),
                format!("DESCRIBE FORMATTED {}", table),
            ])
            .await?;
        let location = parse_location(&output)?;
        debug!(table = %table, location = %location, "Resolved table location");
        Ok(location)
    }

    async fn refresh_metadata(&self) -> Result<(), ServiceError> {
        info!(
            "Running {} on {} to refresh hive metadata",
            self.init_script,
            self.shell.master_node()
        );
        self.shell
            .run(&["-f".to_string(), self.init_script.clone()])
            .await?;
        Ok(())
    }
}

/// Bookkeeping for one jobflow
#[derive(Debug, Default)]
struct ClusterRun {
    steps: Vec<StepSpec>,
    status: Option<JobStatus>,
    statuses: Vec<StepStatus>,
}

/// Runs jobflow steps as sequential `hive -f` invocations
pub struct HiveJobRunner {
    shell: HiveShell,
    clusters: Mutex<HashMap<String, ClusterRun>>,
}

impl HiveJobRunner {
    pub fn new(shell: HiveShell) -> Self {
        Self {
            shell,
            clusters: Mutex::new(HashMap::new()),
        }
    }

    /// Hive arguments for one step
    pub fn step_args(step: &StepSpec) -> Vec<String> {
        let mut args = vec!["-f".to_string(), step.hive_script.clone()];
        args.extend(hive_arg_list(&step.hive_args));
        args
    }
}

#[async_trait]
impl JobExecutionService for HiveJobRunner {
    async fn create_cluster(&self, name: &str) -> Result<ClusterHandle, ServiceError> {
        let handle = ClusterHandle {
            id: format!("j-{}", Uuid::new_v4().simple()),
            name: name.to_string(),
        };
        self.clusters
            .lock()
            .await
            .insert(handle.id.clone(), ClusterRun::default());
        info!(cluster_id = %handle.id, "Created jobflow {}", name);
        Ok(handle)
    }

    async fn add_step(&self, cluster: &ClusterHandle, step: &StepSpec) -> Result<(), ServiceError> {
        let mut clusters = self.clusters.lock().await;
        let run = clusters
            .get_mut(&cluster.id)
            .ok_or_else(|| ServiceError::UnknownCluster(cluster.id.clone()))?;
        run.steps.push(step.clone());
        Ok(())
    }

    async fn await_completion(&self, cluster: &ClusterHandle) -> Result<JobStatus, ServiceError> {
        let steps = {
            let clusters = self.clusters.lock().await;
            let run = clusters
                .get(&cluster.id)
                .ok_or_else(|| ServiceError::UnknownCluster(cluster.id.clone()))?;
            if let Some(status) = &run.status {
                return Ok(status.clone());
            }
            run.steps.clone()
        };

        let mut statuses = Vec::with_capacity(steps.len());
        let mut failed = false;
        for step in &steps {
            if failed {
                statuses.push(StepStatus::new(&step.hive_script, JobStatus::Cancelled));
                continue;
            }

            info!(cluster_id = %cluster.id, "Running hive step {}", step.hive_script);
            match self.shell.run(&Self::step_args(step)).await {
                Ok(_) => statuses.push(StepStatus::new(&step.hive_script, JobStatus::Completed)),
                Err(e) => {
                    warn!(cluster_id = %cluster.id, "Step {} failed: {}", step.hive_script, e);
                    statuses.push(StepStatus::new(&step.hive_script, JobStatus::Failed));
                    failed = true;
                }
            }
        }

        let status = if failed {
            JobStatus::Failed
        } else {
            JobStatus::Completed
        };

        let mut clusters = self.clusters.lock().await;
        let run = clusters
            .get_mut(&cluster.id)
            .ok_or_else(|| ServiceError::UnknownCluster(cluster.id.clone()))?;
        run.statuses = statuses;
        run.status = Some(status.clone());
        Ok(status)
    }

    async fn list_step_statuses(&self, cluster: &ClusterHandle) -> Result<Vec<StepStatus>, ServiceError> {
        let clusters = self.clusters.lock().await;
        let run = clusters
            .get(&cluster.id)
            .ok_or_else(|| ServiceError::UnknownCluster(cluster.id.clone()))?;
        if run.status.is_none() {
            // Nothing has run yet
            return Ok(run
                .steps
                .iter()
                .map(|s| StepStatus::new(&s.hive_script, JobStatus::Pending))
                .collect());
        }
        Ok(run.statuses.clone())
    }
}
