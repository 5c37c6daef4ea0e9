//! Importer dispatcher - loads finished Hive tables into the serving store

use crate::{
    core::{ImportOutcome, StepSpec},
    execution::{Reporter, RunEvent},
    services::{ImportRequest, ImporterService},
};
use std::sync::Arc;
use tracing::{info, warn};

/// Build the importer request for a step, or `None` if it isn't importable
pub fn import_request(step: &StepSpec) -> Option<ImportRequest> {
    let (table, collection) = step.import_target()?;

    let mut options = Vec::new();
    if step.drop {
        options.push("--drop".to_string());
    }
    if step.hive_init {
        options.push("--hive_init".to_string());
    }

    let args = step
        .importer_args
        .as_deref()
        .unwrap_or_default()
        .split_whitespace()
        .map(str::to_string)
        .collect();

    Some(ImportRequest {
        options,
        table: table.to_string(),
        collection: collection.to_string(),
        args,
    })
}

/// Runs the importer for every importable step.
///
/// A failing import is logged and the remaining imports still run.
pub struct ImporterDispatcher {
    importer: Arc<dyn ImporterService>,
    reporter: Reporter,
}

impl ImporterDispatcher {
    pub fn new(importer: Arc<dyn ImporterService>, reporter: Reporter) -> Self {
        Self { importer, reporter }
    }

    pub async fn dispatch(&self, steps: &[StepSpec]) -> Vec<ImportOutcome> {
        let mut outcomes = Vec::new();
        for request in steps.iter().filter_map(import_request) {
            outcomes.push(self.import(&request).await);
        }
        outcomes
    }

    async fn import(&self, request: &ImportRequest) -> ImportOutcome {
        self.reporter.emit(RunEvent::ImportStarted {
            table: request.table.clone(),
            collection: request.collection.clone(),
        });

        let outcome = match self.importer.invoke(request).await {
            Ok(output) => {
                let success = output.success();
                if success {
                    info!("Imported {} into {}", request.table, request.collection);
                } else {
                    warn!(
                        "Importer for {} -> {} exited with {:?}: {}",
                        request.table,
                        request.collection,
                        output.exit_code,
                        output.stderr.trim()
                    );
                }
                ImportOutcome {
                    table: request.table.clone(),
                    collection: request.collection.clone(),
                    success,
                    exit_code: output.exit_code,
                    stdout: output.stdout,
                    stderr: output.stderr,
                    error: None,
                }
            }
            Err(e) => {
                warn!(
                    "Failed to run importer for {} -> {}: {}",
                    request.table, request.collection, e
                );
                ImportOutcome {
                    table: request.table.clone(),
                    collection: request.collection.clone(),
                    success: false,
                    exit_code: None,
                    stdout: String::new(),
                    stderr: String::new(),
                    error: Some(e.to_string()),
                }
            }
        };

        self.reporter.emit(RunEvent::ImportFinished {
            table: outcome.table.clone(),
            collection: outcome.collection.clone(),
            success: outcome.success,
        });
        outcome
    }
}
