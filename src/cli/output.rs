//! CLI output formatting

use crate::{
    core::{ImportOutcome, PipelineOutcome, PipelineResult, RunnerState},
    execution::RunEvent,
};
use console::Emoji;
use std::time::Duration;

// Re-export style
pub use console::style;

// Emojis for output
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static SPINNER: Emoji<'_, '_> = Emoji("⏳ ", "~ ");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "!");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", "> ");

/// Format a runner state for display
pub fn format_state(state: RunnerState) -> String {
    let name = state.to_string();
    match state {
        RunnerState::Done => style(name).green().to_string(),
        RunnerState::Fatal => style(name).red().to_string(),
        RunnerState::Escalating => style(name).yellow().to_string(),
        _ => style(name).cyan().to_string(),
    }
}

/// Format a run outcome for display
pub fn format_outcome(outcome: PipelineOutcome) -> String {
    match outcome {
        PipelineOutcome::Success => style("succeeded").green().to_string(),
        PipelineOutcome::DataTimeout => style("timed out waiting for data").red().to_string(),
        PipelineOutcome::JobFailure => style("jobflow failed").red().to_string(),
    }
}

/// Format one import result for display
pub fn format_import_outcome(import: &ImportOutcome) -> String {
    if import.success {
        return format!(
            "{} {} → {}",
            CHECK,
            style(&import.table).green(),
            style(&import.collection).cyan()
        );
    }

    let reason = match (&import.error, import.exit_code) {
        (Some(error), _) => error.clone(),
        (None, Some(code)) => format!("exit code {}", code),
        (None, None) => "terminated by signal".to_string(),
    };
    format!(
        "{} {} → {}: {}",
        CROSS,
        style(&import.table).red(),
        style(&import.collection).dim(),
        style(reason).dim()
    )
}

/// Format a run event for display
pub fn format_run_event(event: &RunEvent) -> String {
    match event {
        RunEvent::StateChanged { to, .. } => format!("{} {}", ROCKET, format_state(*to)),
        RunEvent::MetadataRefreshed { success: true } => {
            format!("{} Hive metadata refreshed", INFO)
        }
        RunEvent::MetadataRefreshed { success: false } => {
            format!("{} Hive metadata refresh failed", WARN)
        }
        RunEvent::PartitionWaiting { location, elapsed } => format!(
            "{} Waiting for {} ({})",
            SPINNER,
            style(location).cyan(),
            style(format_duration(*elapsed)).dim()
        ),
        RunEvent::PartitionAvailable { location } => {
            format!("{} {} is available", CHECK, style(location).green())
        }
        RunEvent::ClusterCreated {
            job_name,
            cluster_id,
        } => format!(
            "{} Created jobflow {} ({})",
            INFO,
            style(job_name).bold(),
            style(cluster_id).dim()
        ),
        RunEvent::StepSubmitted { index, hive_script } => format!(
            "{} Step {}: {}",
            INFO,
            index + 1,
            style(hive_script).cyan()
        ),
        RunEvent::JobFinished {
            job_name,
            status,
            succeeded,
        } => {
            let status = status
                .as_ref()
                .map(|s| s.to_string())
                .unwrap_or_else(|| "UNKNOWN".to_string());
            if *succeeded {
                format!("{} {} {}", CHECK, style(job_name).bold(), style(status).green())
            } else {
                format!("{} {} {}", CROSS, style(job_name).bold(), style(status).red())
            }
        }
        RunEvent::NotificationSent { channel, subject } => format!(
            "{} Notified {}: {}",
            INFO,
            style(channel).cyan(),
            style(subject).dim()
        ),
        RunEvent::NotificationFailed { channel, error } => format!(
            "{} Could not notify {}: {}",
            WARN,
            style(channel).yellow(),
            style(error).dim()
        ),
        RunEvent::ImportStarted { table, collection } => format!(
            "{} Importing {} → {}",
            SPINNER,
            style(table).cyan(),
            style(collection).cyan()
        ),
        RunEvent::ImportFinished {
            table,
            collection,
            success: true,
        } => format!("{} {} → {}", CHECK, style(table).green(), style(collection).green()),
        RunEvent::ImportFinished {
            table,
            collection,
            success: false,
        } => format!("{} {} → {}", CROSS, style(table).red(), style(collection).red()),
    }
}

/// Summary lines printed once a run has finished
pub fn format_result(name: &str, result: &PipelineResult) -> String {
    let icon = if result.is_success() { CHECK } else { CROSS };
    let mut out = format!(
        "{} {} {} ({})",
        icon,
        style(name).bold(),
        format_outcome(result.outcome),
        format_state(result.state)
    );

    for import in &result.imports {
        out.push_str("\n  ");
        out.push_str(&format_import_outcome(import));
    }
    out
}

fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
