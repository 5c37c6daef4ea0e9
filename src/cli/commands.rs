//! CLI command definitions

use crate::core::config::parse_key_value;
use clap::Args;

/// Wait for data, run the jobflow and import the results
#[derive(Debug, Args, Clone)]
pub struct RunCommand {
    /// Path to the report config (JSON)
    #[arg(short, long)]
    pub config: String,

    /// Hive master node; `localhost` runs hive locally, anything else over ssh
    #[arg(short = 'm', long, default_value = "localhost")]
    pub master_node: String,

    /// Max number of hours to wait for the data
    #[arg(short = 'w', long, default_value_t = 12.0)]
    pub max_wait: f64,

    /// SSH key used to reach the master node
    #[arg(short = 's', long)]
    pub ssh_keyfile: Option<String>,

    /// Refresh hive metadata before checking for data
    #[arg(long)]
    pub hive_init: bool,

    /// Hive script run by --hive-init
    #[arg(long, default_value = "hive_init.q")]
    pub hive_init_script: String,

    /// Hive executable on the master node
    #[arg(long, default_value = "hive")]
    pub hive_bin: String,

    /// Report importer command line
    #[arg(long, default_value = "report_importer")]
    pub importer: String,

    /// Serving database the importer loads into
    #[arg(long, default_value = "report")]
    pub mongo_db: String,

    /// Mail jobflow reports to this address
    #[arg(long)]
    pub email_to: Option<String>,

    /// Command receiving failure reports on stdin (chat notifications)
    #[arg(long)]
    pub chat_command: Option<String>,

    /// Config parameters (key=value), replaced textually before parsing
    #[arg(value_parser = parse_key_value)]
    pub params: Vec<(String, String)>,
}

/// Validate a report configuration
#[derive(Debug, Args, Clone)]
pub struct ValidateCommand {
    /// Path to the report config (JSON)
    #[arg(short, long)]
    pub config: String,

    /// Output the parsed config as JSON
    #[arg(long)]
    pub json: bool,

    /// Config parameters (key=value)
    #[arg(value_parser = parse_key_value)]
    pub params: Vec<(String, String)>,
}
