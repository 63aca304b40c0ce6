use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "goma")]
#[command(about = "Track production materials, online or off")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional path to local database file (overrides GOMA_DB_PATH)
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Register a new material
    #[command(alias = "new")]
    Add {
        /// Display name
        name: String,
        /// Internal code, e.g. FEC01
        #[arg(long)]
        code: String,
        /// Material category
        #[arg(long)]
        kind: Option<String>,
        /// Unit of measure (kg, L, un...)
        #[arg(long)]
        unit: Option<String>,
        /// Free-form description
        #[arg(long)]
        description: Option<String>,
    },
    /// List materials from the local mirror
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Update an existing material
    Update {
        /// Material ID
        id: String,
        /// New display name
        #[arg(long)]
        name: Option<String>,
        /// New internal code
        #[arg(long)]
        code: Option<String>,
        /// New category
        #[arg(long)]
        kind: Option<String>,
        /// New unit of measure
        #[arg(long)]
        unit: Option<String>,
        /// New description
        #[arg(long)]
        description: Option<String>,
    },
    /// Delete a material
    Delete {
        /// Material ID
        id: String,
    },
    /// Show connectivity and pending-operation status
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Replay queued offline operations against the remote backend
    Sync,
}
