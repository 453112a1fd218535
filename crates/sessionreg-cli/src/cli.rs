//! Command line interface for the batch binary.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Which vendor account the pass talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Api {
    /// Microsoft Graph (Outlook calendar, contacts and mail).
    Graph,
    /// Google (Calendar, People and Gmail).
    Google,
}

/// Send session registration reminders for upcoming calendar events.
#[derive(Debug, Parser)]
#[command(name = "sessionreg", version, about)]
pub struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "sessionreg.toml")]
    pub config: PathBuf,

    /// OAuth bearer token for the vendor account
    #[arg(long, env = "SESSIONREG_TOKEN", hide_env_values = true)]
    pub token: String,

    /// Vendor API to use
    #[arg(long, value_enum, default_value_t = Api::Graph)]
    pub api: Api,

    /// Override the configured recipient address
    #[arg(long)]
    pub receiver: Option<String>,

    /// Enable debug logging to the terminal
    #[arg(short, long)]
    pub debug: bool,

    /// Emit JSON logs (for cron/scheduler collection)
    #[arg(long)]
    pub json_logs: bool,
}
