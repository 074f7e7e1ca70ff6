use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "deck")]
#[command(about = "Render, publish and verify slideshow batches", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Config file (default: platform config dir)
    #[arg(long, global = true, env = "DECK_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Publish a batch plan
    Publish {
        /// Plan file (JSON: topic, units[ordinal, text, source])
        plan: PathBuf,

        /// Destination folder name (default: derived from time and topic)
        #[arg(long)]
        folder: Option<String>,

        /// Ask for approval on stdin before rendering
        #[arg(long)]
        review: bool,

        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Continue a stored batch, optionally recording a review decision
    Resume {
        /// Batch ID
        batch: String,

        #[arg(long, conflicts_with = "reject")]
        approve: bool,

        /// Reject with feedback
        #[arg(long, value_name = "REASON")]
        reject: Option<String>,

        #[arg(long)]
        json: bool,
    },

    /// Show stored batches, or one batch record in full
    Status {
        /// Batch ID
        batch: Option<String>,
    },

    /// Check a destination folder without uploading
    Verify {
        /// Folder name under the storage root
        folder: String,

        /// Expected slide count
        #[arg(long, required_unless_present = "manifest")]
        count: Option<u32>,

        /// Local manifest to compare byte-for-byte
        #[arg(long)]
        manifest: Option<PathBuf>,
    },

    /// Inspect configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration
    Show,

    /// Print the config file location
    Path,
}
