//! Job orchestrator - submits a jobflow and classifies its outcome

use crate::{
    core::{classify, JobRun, StepSpec},
    execution::{JobFailure, Reporter, RunEvent},
    services::{ClusterHandle, JobExecutionService, ServiceError},
};
use std::sync::Arc;
use tracing::{error, info};

/// Runs an ordered list of steps on a fresh cluster
pub struct JobOrchestrator {
    jobs: Arc<dyn JobExecutionService>,
    reporter: Reporter,
}

impl JobOrchestrator {
    pub fn new(jobs: Arc<dyn JobExecutionService>, reporter: Reporter) -> Self {
        Self { jobs, reporter }
    }

    /// Submit `steps` in order under `job_name` and block until the cluster is done.
    ///
    /// There are no automatic retries. Service errors at any stage count as a
    /// job failure.
    pub async fn run(&self, job_name: &str, steps: &[StepSpec]) -> Result<JobRun, JobFailure> {
        let cluster = self
            .jobs
            .create_cluster(job_name)
            .await
            .map_err(|e| self.service_failure(job_name, "create cluster", e))?;

        info!(cluster_id = %cluster.id, "Created jobflow {} with {} steps", job_name, steps.len());
        self.reporter.emit(RunEvent::ClusterCreated {
            job_name: job_name.to_string(),
            cluster_id: cluster.id.clone(),
        });

        self.submit(&cluster, steps)
            .await
            .map_err(|e| self.service_failure(job_name, "submit step", e))?;

        let status = self
            .jobs
            .await_completion(&cluster)
            .await
            .map_err(|e| self.service_failure(job_name, "await completion", e))?;

        // Only read the listing once the cluster is terminal
        let listing = self
            .jobs
            .list_step_statuses(&cluster)
            .await
            .map_err(|e| self.service_failure(job_name, "list steps", e))?;

        let run = JobRun {
            cluster_id: cluster.id.clone(),
            job_name: job_name.to_string(),
            status,
            steps: listing,
        };
        let succeeded = classify(&run.status, &run.steps);

        self.reporter.emit(RunEvent::JobFinished {
            job_name: job_name.to_string(),
            status: Some(run.status.clone()),
            succeeded,
        });

        if succeeded {
            info!("Jobflow {} completed", job_name);
            return Ok(run);
        }

        let reason = match run.steps.iter().find(|s| s.status.is_failure()) {
            Some(step) => format!("step {} is {}", step.name, step.status),
            None => format!("jobflow status is {}", run.status),
        };
        error!("Hive jobs failed: {}", reason);
        error!("{}", run.listing());
        Err(JobFailure {
            job_name: job_name.to_string(),
            reason,
            run: Some(run),
        })
    }

    async fn submit(&self, cluster: &ClusterHandle, steps: &[StepSpec]) -> Result<(), ServiceError> {
        for (index, step) in steps.iter().enumerate() {
            self.jobs.add_step(cluster, step).await?;
            self.reporter.emit(RunEvent::StepSubmitted {
                index,
                hive_script: step.hive_script.clone(),
            });
        }
        Ok(())
    }

    fn service_failure(&self, job_name: &str, stage: &str, err: ServiceError) -> JobFailure {
        error!("Jobflow {} failed to {}: {}", job_name, stage, err);
        self.reporter.emit(RunEvent::JobFinished {
            job_name: job_name.to_string(),
            status: None,
            succeeded: false,
        });
        JobFailure {
            job_name: job_name.to_string(),
            reason: format!("failed to {}: {}", stage, err),
            run: None,
        }
    }
}
