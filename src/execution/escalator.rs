//! Failure escalator - routes jobflow reports to notification channels

use crate::{
    execution::{Reporter, RunEvent},
    services::{ChannelKind, NotificationChannel},
};
use std::sync::Arc;
use tracing::{info, warn};

/// Subject line for a jobflow report
pub fn report_subject(job_name: &str, succeeded: bool) -> String {
    if succeeded {
        format!("Reporting jobflow SUCCEEDED: {}", job_name)
    } else {
        format!("Reporting jobflow FAILED: {}", job_name)
    }
}

/// Sends success and failure reports.
///
/// Failures go to every channel. Successes skip secondary (chat) channels.
pub struct FailureEscalator {
    channels: Vec<Arc<dyn NotificationChannel>>,
    reporter: Reporter,
}

impl FailureEscalator {
    pub fn new(channels: Vec<Arc<dyn NotificationChannel>>, reporter: Reporter) -> Self {
        Self { channels, reporter }
    }

    /// Deliver a report; delivery errors are logged and never propagated
    pub async fn report(&self, job_name: &str, succeeded: bool, listing: &str) {
        let subject = report_subject(job_name, succeeded);
        info!("{}", subject);

        if self.channels.is_empty() {
            info!("No notification channels configured");
            return;
        }

        for channel in &self.channels {
            if succeeded && channel.kind() == ChannelKind::Secondary {
                continue;
            }

            match channel.send(&subject, listing).await {
                Ok(()) => self.reporter.emit(RunEvent::NotificationSent {
                    channel: channel.name().to_string(),
                    subject: subject.clone(),
                }),
                Err(e) => {
                    warn!(channel = %channel.name(), "Failed to send notification: {}", e);
                    self.reporter.emit(RunEvent::NotificationFailed {
                        channel: channel.name().to_string(),
                        error: e.to_string(),
                    });
                }
            }
        }
    }
}
