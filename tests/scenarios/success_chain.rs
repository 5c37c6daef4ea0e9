//! Scenario: data is there, the jobflow completes and every table is imported

use crate::helpers::*;
use report_generator::core::{PipelineConfig, PipelineOutcome, RunnerState};
use report_generator::execution::{RunEvent, WaitOptions};
use std::sync::atomic::Ordering;
use std::time::Duration;

/// The daily report from partition check to import
#[tokio::test]
async fn test_daily_report_end_to_end() {
    let harness = Harness::new();
    let result = harness.run(&daily_config()).await;

    assert_eq!(result.outcome, PipelineOutcome::Success);
    assert_eq!(result.outcome.exit_code(), 0);
    assert_states(
        &harness,
        &[
            RunnerState::LoadingConfig,
            RunnerState::WaitingForData,
            RunnerState::SubmittingJob,
            RunnerState::Escalating,
            RunnerState::Importing,
            RunnerState::Done,
        ],
    );

    // Parameters were substituted before anything ran
    assert_eq!(
        harness.storage.prefixes(),
        vec!["s3://warehouse/raw_events/dt=2012-08-25/"]
    );
    assert_eq!(
        harness.jobs.calls(),
        vec![
            "create daily report 2012-08-25",
            "add daily_stats.q",
            "add cleanup.q",
            "await",
            "list",
        ]
    );

    // Only the step with both a table and a collection is imported
    let requests = harness.importer.requests.lock().unwrap().clone();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].table, "daily_stats");
    assert_eq!(requests[0].collection, "daily_stats_2012-08-25");
    assert_eq!(requests[0].options, vec!["--drop"]);

    let job = result.job.expect("successful run keeps the job listing");
    assert!(job.succeeded());
    assert_eq!(job.steps.len(), 2);
    assert_eq!(result.imports.len(), 1);
    assert!(result.imports[0].success);
}

/// Steps are only submitted after the partition stabilizes
#[tokio::test(start_paused = true)]
async fn test_waits_for_partition_before_submitting() {
    let harness = Harness::new().with_storage(FakeStorage::after(3));
    let result = harness.run(&daily_config()).await;

    assert_eq!(result.outcome, PipelineOutcome::Success);

    let events = harness.events();
    let waits: Vec<Duration> = events
        .iter()
        .filter_map(|e| match e {
            RunEvent::PartitionWaiting { elapsed, .. } => Some(*elapsed),
            _ => None,
        })
        .collect();
    assert_eq!(
        waits,
        vec![
            Duration::ZERO,
            Duration::from_secs(60),
            Duration::from_secs(120)
        ]
    );

    let available = events
        .iter()
        .position(|e| matches!(e, RunEvent::PartitionAvailable { .. }))
        .unwrap();
    let created = events
        .iter()
        .position(|e| matches!(e, RunEvent::ClusterCreated { .. }))
        .unwrap();
    assert!(available < created);
}

/// --hive-init refreshes metadata once before any partition is checked
#[tokio::test]
async fn test_metadata_refresh_before_waiting() {
    let harness = Harness::new().with_options(WaitOptions {
        refresh_metadata: true,
        ..WaitOptions::default()
    });
    let result = harness.run(&daily_config()).await;

    assert!(result.is_success());
    assert_eq!(harness.metadata.refreshes.load(Ordering::SeqCst), 1);
    assert!(matches!(
        harness.events()[1],
        RunEvent::MetadataRefreshed { success: true }
    ));
}

/// A report with nothing to wait for goes straight to the jobflow
#[tokio::test]
async fn test_no_partitions_to_wait_for() {
    let config = PipelineConfig::from_json(
        r#"{"name": "adhoc", "steps": [{"hive_script": "adhoc.q"}]}"#,
    )
    .unwrap();

    let harness = Harness::new();
    let result = harness.run(&config).await;

    assert!(result.is_success());
    assert!(harness.storage.prefixes().is_empty());
    assert_eq!(harness.jobs.calls(), vec!["create adhoc", "add adhoc.q", "await", "list"]);
    assert!(result.imports.is_empty());
}
