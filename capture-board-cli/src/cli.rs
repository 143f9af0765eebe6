//! CLI definition for the capture board host.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Capture board - inspect and rearrange the acquisition pipeline.
///
/// Stages are columns and acquisitions are cards. Every change is applied
/// optimistically, persisted, and rolled back if the server refuses it.
#[derive(Parser, Debug)]
#[command(name = "capture-board")]
#[command(version)]
#[command(about = "Inspect and rearrange the acquisition pipeline board")]
#[command(
    long_about = "Inspect and rearrange the acquisition pipeline board.\n\n\
    Environment variables:\n  \
    CAPTURE_BASE_URL      Root URL of the REST API\n  \
    CAPTURE_TOKEN         Bearer token of the signed-in session\n  \
    CAPTURE_USER          Signed-in user identity\n  \
    CAPTURE_TIMEOUT_SECS  Per-request timeout"
)]
pub struct Cli {
    /// Enable debug output to stderr
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Config file (.toml, .yaml or .json)
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Override the API root URL
    #[arg(long, global = true, value_name = "URL")]
    pub base_url: Option<String>,

    /// Override the bearer token
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Override the signed-in user identity
    #[arg(long, global = true)]
    pub user: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show every stage with its acquisitions
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Move a stage to a new position (0-based)
    MoveColumn {
        /// Stage id
        column: String,
        /// Target position
        index: usize,
    },

    /// Move an acquisition to a stage, optionally at a position (0-based)
    MoveCard {
        /// Acquisition id
        card: String,
        /// Destination stage id
        column: String,
        /// Position in the destination stage; defaults to the end
        #[arg(long)]
        index: Option<usize>,
    },

    /// Append a new stage
    AddColumn {
        /// Stage title
        title: String,
    },

    /// Delete an empty stage
    DeleteColumn {
        /// Stage id
        column: String,
    },

    /// Delete an acquisition
    DeleteCard {
        /// Acquisition id
        card: String,
    },
}
