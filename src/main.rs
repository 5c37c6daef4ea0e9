use anyhow::{Context, Result};
use report_generator::cli::commands::{RunCommand, ValidateCommand};
use report_generator::cli::output::*;
use report_generator::cli::{Cli, Command};
use report_generator::services::{
    CommandChannel, HiveJobRunner, HiveMetadata, HiveShell, LocalStorage, NotificationChannel,
    ReportImporter,
};
use report_generator::{Collaborators, PipelineConfig, PipelineRunner, Reporter, WaitOptions};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Exit code for unusable configuration or arguments
const EXIT_USAGE: i32 = 2;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::from_args();

    // Initialize logging; RUST_LOG wins over --verbose
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set logging subscriber")?;

    match &cli.command {
        Command::Run(cmd) => run_report(cmd).await?,
        Command::Validate(cmd) => validate_report(cmd)?,
    }

    Ok(())
}

async fn run_report(cmd: &RunCommand) -> Result<()> {
    let config = match PipelineConfig::load(&cmd.config, &cmd.params) {
        Ok(config) => config,
        Err(e) => {
            println!("{} Failed to load {}:", CROSS, style(&cmd.config).bold());
            println!("  {}", style(e).red());
            std::process::exit(EXIT_USAGE);
        }
    };

    println!("{} Loaded report: {}", INFO, style(&config.name).bold());

    let mut wait_options = match WaitOptions::with_max_wait_hours(cmd.max_wait) {
        Ok(options) => options,
        Err(e) => {
            println!("{} {}", CROSS, style(e).red());
            std::process::exit(EXIT_USAGE);
        }
    };
    wait_options.refresh_metadata = cmd.hive_init;

    let runner = PipelineRunner::new(collaborators(cmd), wait_options, console_reporter());

    println!();
    let result = runner.run(&config).await;

    println!("\n{}", format_result(&config.name, &result));

    let failed_imports = result.failed_imports().count();
    if failed_imports > 0 {
        println!(
            "{} {} import(s) failed; the report run itself {}",
            WARN,
            style(failed_imports).yellow(),
            format_outcome(result.outcome)
        );
    }

    if !result.is_success() {
        error!("Report {} ended in {}", config.name, result.state);
        std::process::exit(result.outcome.exit_code());
    }

    info!("Report {} finished", config.name);
    Ok(())
}

fn collaborators(cmd: &RunCommand) -> Collaborators {
    let shell = HiveShell::new(&cmd.master_node)
        .with_ssh_keyfile(cmd.ssh_keyfile.clone())
        .with_hive_bin(&cmd.hive_bin);

    let mut channels: Vec<Arc<dyn NotificationChannel>> = Vec::new();
    if let Some(recipient) = &cmd.email_to {
        channels.push(Arc::new(CommandChannel::email(recipient)));
    }
    if let Some(chat) = cmd.chat_command.as_deref().and_then(CommandChannel::chat) {
        channels.push(Arc::new(chat));
    }

    Collaborators {
        storage: Arc::new(LocalStorage::new()),
        metadata: Arc::new(HiveMetadata::new(shell.clone(), &cmd.hive_init_script)),
        jobs: Arc::new(HiveJobRunner::new(shell)),
        channels,
        importer: Arc::new(
            ReportImporter::new(&cmd.importer, &cmd.master_node).with_database(&cmd.mongo_db),
        ),
    }
}

fn console_reporter() -> Reporter {
    Reporter::new().with_handler(|event| println!("{}", format_run_event(event)))
}

fn validate_report(cmd: &ValidateCommand) -> Result<()> {
    println!("{} Validating report config...", INFO);

    match PipelineConfig::load(&cmd.config, &cmd.params) {
        Ok(config) => {
            println!("{} Report configuration is valid!", CHECK);
            println!("  Name: {}", style(&config.name).bold());
            println!("  Tables waited on: {}", style(config.wait_for.len()).cyan());
            println!("  Steps: {}", style(config.steps.len()).cyan());
            println!(
                "  Imports: {}",
                style(config.importable_steps().count()).cyan()
            );

            if cmd.json {
                let json = serde_json::to_string_pretty(&config)?;
                println!("\n{}", json);
            }
            Ok(())
        }
        Err(e) => {
            println!("{} Validation failed:", CROSS);
            println!("  {}", style(e).red());
            std::process::exit(EXIT_USAGE);
        }
    }
}
