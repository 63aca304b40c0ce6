//! goma CLI - materials tracking for the production floor
//!
//! Works against the managed backend when reachable and falls back to the
//! local mirror when it isn't; `goma sync` replays what queued up.

mod cli;
mod commands;
mod error;

use clap::Parser;

use crate::cli::{Cli, Commands};
use crate::commands::{
    run_add, run_delete, run_list, run_status, run_sync, run_update, AddArgs, UpdateArgs,
};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("goma_core=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();
    let db_path = cli.db_path;

    match cli.command {
        Commands::Add {
            name,
            code,
            kind,
            unit,
            description,
        } => {
            run_add(
                AddArgs {
                    name,
                    code,
                    kind,
                    unit,
                    description,
                },
                db_path,
            )
            .await?;
        }
        Commands::List { json } => run_list(json, db_path).await?,
        Commands::Update {
            id,
            name,
            code,
            kind,
            unit,
            description,
        } => {
            run_update(
                UpdateArgs {
                    id,
                    name,
                    code,
                    kind,
                    unit,
                    description,
                },
                db_path,
            )
            .await?;
        }
        Commands::Delete { id } => run_delete(&id, db_path).await?,
        Commands::Status { json } => run_status(json, db_path).await?,
        Commands::Sync => run_sync(db_path).await?,
    }

    Ok(())
}
