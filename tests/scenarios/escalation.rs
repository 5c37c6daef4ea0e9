//! Scenario: who hears about a jobflow and when

use crate::helpers::*;
use report_generator::core::{PipelineOutcome, RunnerState};
use report_generator::execution::RunEvent;
use report_generator::services::ChannelKind;

/// Successes go to email only
#[tokio::test]
async fn test_success_skips_chat() {
    let harness = Harness::new();
    harness.run(&daily_config()).await;

    assert_eq!(
        harness.email.subjects(),
        vec!["Reporting jobflow SUCCEEDED: daily report 2012-08-25"]
    );
    assert!(harness.chat.subjects().is_empty());

    let body = harness.email.sent.lock().unwrap()[0].1.clone();
    assert!(body.starts_with("Jobflow daily report 2012-08-25 (j-TEST): COMPLETED"));
}

/// Failures go to every channel
#[tokio::test]
async fn test_failure_reaches_all_channels() {
    let harness = Harness::new().with_jobs(FakeJobs::completing().failing_step("cleanup.q"));
    harness.run(&daily_config()).await;

    let subject = "Reporting jobflow FAILED: daily report 2012-08-25";
    assert_eq!(harness.email.subjects(), vec![subject]);
    assert_eq!(harness.chat.subjects(), vec![subject]);
}

/// A broken channel neither stops the other channels nor changes the outcome
#[tokio::test]
async fn test_broken_channel_is_tolerated() {
    let harness = Harness::new()
        .with_email(RecordingChannel::broken("email", ChannelKind::Primary))
        .with_jobs(FakeJobs::with_status(report_generator::core::JobStatus::Failed));
    let result = harness.run(&daily_config()).await;

    assert_eq!(result.outcome, PipelineOutcome::JobFailure);
    assert_eq!(harness.chat.subjects().len(), 1);
    assert!(harness.events().iter().any(|e| matches!(
        e,
        RunEvent::NotificationFailed { channel, .. } if channel == "email"
    )));
}

/// A broken channel on success still lets the imports run
#[tokio::test]
async fn test_broken_channel_on_success_still_imports() {
    let harness =
        Harness::new().with_email(RecordingChannel::broken("email", ChannelKind::Primary));
    let result = harness.run(&daily_config()).await;

    assert_eq!(result.outcome, PipelineOutcome::Success);
    assert_eq!(result.state, RunnerState::Done);
    assert_eq!(harness.importer.tables(), vec!["daily_stats"]);
}
