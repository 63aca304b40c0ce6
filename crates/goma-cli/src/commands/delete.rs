use std::path::PathBuf;

use crate::commands::common::{open_service, parse_material_id};
use crate::error::CliError;

pub async fn run_delete(raw_id: &str, db_path: Option<PathBuf>) -> Result<(), CliError> {
    let id = parse_material_id(raw_id)?;

    let service = open_service(db_path).await?;
    service.adapter()?.delete(id).await?;

    println!("Deleted {id}");
    Ok(())
}
