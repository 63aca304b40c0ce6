use std::path::PathBuf;

use goma_core::models::MaterialDraft;
use goma_core::SyncStatus;

use crate::commands::common::open_service;
use crate::error::CliError;

pub struct AddArgs {
    pub name: String,
    pub code: String,
    pub kind: Option<String>,
    pub unit: Option<String>,
    pub description: Option<String>,
}

pub async fn run_add(args: AddArgs, db_path: Option<PathBuf>) -> Result<(), CliError> {
    let service = open_service(db_path).await?;
    let adapter = service.adapter()?;

    let material = adapter
        .create(MaterialDraft {
            name: args.name,
            code: args.code,
            kind: args.kind,
            unit: args.unit,
            description: args.description,
        })
        .await?;

    println!("{}", material.id);
    if material.sync_status != SyncStatus::Synced {
        println!("Backend unreachable: saved locally, queued for sync");
    }
    Ok(())
}
