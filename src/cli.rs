//! CLI definitions for jobgate.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// jobgate CLI.
#[derive(Parser)]
#[command(name = "jobgate")]
#[command(about = "Approval gate for background job queues")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config/jobgate.toml", global = true, env = "JOBGATE_CONFIG")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Submit a job through the approval gate
    Submit {
        /// Job class
        #[arg(long)]
        class: String,

        /// Arguments as a JSON array (a single value is wrapped)
        #[arg(long)]
        args: Option<String>,

        /// Destination queue override
        #[arg(long)]
        queue: Option<String>,
    },

    /// Hold a job for approval
    Hold {
        /// Job class
        #[arg(long)]
        class: String,

        /// Arguments as a JSON array (a single value is wrapped)
        #[arg(long)]
        args: Option<String>,

        /// Message shown to approvers
        #[arg(long)]
        message: Option<String>,

        /// Seconds before the job is released without a decision
        #[arg(long)]
        timeout: Option<i64>,
    },

    /// List jobs waiting for approval
    List {
        /// Output format (table, json)
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Approve a pending job
    Approve {
        /// Encoded approval key, e.g. '{"id":0}'
        key: String,
    },

    /// Reject a pending job
    Reject {
        /// Encoded approval key, e.g. '{"id":0}'
        key: String,
    },

    /// Release delayed jobs whose timeout has elapsed
    Promote,
}
