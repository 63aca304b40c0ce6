use std::path::PathBuf;

use goma_core::models::MaterialPatch;
use goma_core::SyncStatus;

use crate::commands::common::{open_service, parse_material_id};
use crate::error::CliError;

pub struct UpdateArgs {
    pub id: String,
    pub name: Option<String>,
    pub code: Option<String>,
    pub kind: Option<String>,
    pub unit: Option<String>,
    pub description: Option<String>,
}

pub async fn run_update(args: UpdateArgs, db_path: Option<PathBuf>) -> Result<(), CliError> {
    let id = parse_material_id(&args.id)?;
    let patch = MaterialPatch {
        name: args.name,
        code: args.code,
        kind: args.kind,
        unit: args.unit,
        description: args.description,
    };
    if patch.is_empty() {
        return Err(CliError::EmptyUpdate);
    }

    let service = open_service(db_path).await?;
    let material = service.adapter()?.update(id, patch).await?;

    println!("Updated {}", material.id);
    if material.sync_status != SyncStatus::Synced {
        println!("Backend unreachable: change saved locally, queued for sync");
    }
    Ok(())
}
