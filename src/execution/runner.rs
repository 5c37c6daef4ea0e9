//! Pipeline runner - sequences waiting, the jobflow, escalation and imports

use crate::{
    core::{PipelineConfig, PipelineOutcome, PipelineResult, RunnerState},
    execution::{
        DataAvailabilityWaiter, FailureEscalator, ImporterDispatcher, JobOrchestrator, Reporter,
        RunEvent, WaitOptions,
    },
    services::{
        ImporterService, JobExecutionService, NotificationChannel, StorageListingService,
        TableMetadataService,
    },
};
use std::sync::Arc;
use tracing::{debug, error, info};

/// External services a report run talks to
#[derive(Clone)]
pub struct Collaborators {
    pub storage: Arc<dyn StorageListingService>,
    pub metadata: Arc<dyn TableMetadataService>,
    pub jobs: Arc<dyn JobExecutionService>,
    pub channels: Vec<Arc<dyn NotificationChannel>>,
    pub importer: Arc<dyn ImporterService>,
}

/// Top-level sequencer: waiter, orchestrator, escalator, dispatcher
pub struct PipelineRunner {
    waiter: DataAvailabilityWaiter,
    orchestrator: JobOrchestrator,
    escalator: FailureEscalator,
    dispatcher: ImporterDispatcher,
    reporter: Reporter,
}

impl PipelineRunner {
    pub fn new(collaborators: Collaborators, wait_options: WaitOptions, reporter: Reporter) -> Self {
        let Collaborators {
            storage,
            metadata,
            jobs,
            channels,
            importer,
        } = collaborators;

        Self {
            waiter: DataAvailabilityWaiter::new(storage, metadata, wait_options, reporter.clone()),
            orchestrator: JobOrchestrator::new(jobs, reporter.clone()),
            escalator: FailureEscalator::new(channels, reporter.clone()),
            dispatcher: ImporterDispatcher::new(importer, reporter.clone()),
            reporter,
        }
    }

    /// Run a loaded report configuration to completion.
    ///
    /// Import failures never change the outcome; a data timeout or a failed
    /// jobflow ends the run in `Fatal`.
    pub async fn run(&self, config: &PipelineConfig) -> PipelineResult {
        let mut state = RunnerState::LoadingConfig;

        info!("Step 1: Wait for data.");
        self.transition(&mut state, RunnerState::WaitingForData);
        if let Err(e) = self.waiter.await_data(&config.wait_for).await {
            error!("{}. Exiting...", e);
            self.transition(&mut state, RunnerState::Fatal);
            return PipelineResult {
                outcome: PipelineOutcome::DataTimeout,
                state,
                job: None,
                imports: Vec::new(),
            };
        }

        info!("Step 2: Run hive jobs and wait for completion.");
        self.transition(&mut state, RunnerState::SubmittingJob);
        let job = self.orchestrator.run(&config.name, &config.steps).await;

        self.transition(&mut state, RunnerState::Escalating);
        let run = match job {
            Ok(run) => {
                self.escalator.report(&config.name, true, &run.listing()).await;
                run
            }
            Err(failure) => {
                self.escalator
                    .report(&config.name, false, &failure.listing())
                    .await;
                error!("{}", failure);
                self.transition(&mut state, RunnerState::Fatal);
                return PipelineResult {
                    outcome: PipelineOutcome::JobFailure,
                    state,
                    job: failure.run,
                    imports: Vec::new(),
                };
            }
        };

        info!("Step 3: Load data from hive to mongo with report importer.");
        self.transition(&mut state, RunnerState::Importing);
        let imports = self.dispatcher.dispatch(&config.steps).await;

        self.transition(&mut state, RunnerState::Done);
        info!("Report generation finished.");

        PipelineResult {
            outcome: PipelineOutcome::Success,
            state,
            job: Some(run),
            imports,
        }
    }

    fn transition(&self, state: &mut RunnerState, next: RunnerState) {
        debug_assert!(
            state.can_transition_to(next),
            "invalid transition {} -> {}",
            state,
            next
        );
        debug!("Runner state {} -> {}", state, next);
        self.reporter.emit(RunEvent::StateChanged {
            from: *state,
            to: next,
        });
        *state = next;
    }
}
