//! CLI definition using clap

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use weee_types::OutputFormat;

#[derive(Parser)]
#[command(name = "weee-checker")]
#[command(version)]
#[command(about = "Classify e-waste photos into WEEE disposal categories")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (json, table). Uses config value if not specified.
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Classify a single detector payload (use '-' to read stdin)
    Classify {
        /// Path to the detection payload JSON
        payload: PathBuf,

        /// Force LLM arbitration even when the rule signal is conclusive
        #[arg(long)]
        llm: bool,

        /// Arbiter call timeout in seconds. Uses config value if not specified.
        #[arg(long, short = 't')]
        timeout_secs: Option<u64>,

        /// Arbiter command override (e.g. "llm-cli --model fast")
        #[arg(long)]
        arbiter_cmd: Option<String>,
    },

    /// Classify every *.json payload under a directory
    Batch {
        /// Directory containing detection payloads
        dir: PathBuf,

        /// Force LLM arbitration for every payload
        #[arg(long)]
        llm: bool,

        /// Arbiter command override
        #[arg(long)]
        arbiter_cmd: Option<String>,
    },

    /// Print the keyword rule table
    Rules,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show the current configuration
    Show,
    /// Print the configuration file path
    Path,
    /// Set a configuration value (margin, floor, disagreement_discount,
    /// arbiter_timeout_secs, arbiter_command, size_fallback, output_format)
    Set {
        key: String,
        value: String,
    },
}
