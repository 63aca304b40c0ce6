use std::path::PathBuf;

use crate::commands::common::{format_material_line, open_service};
use crate::error::CliError;

pub async fn run_list(json: bool, db_path: Option<PathBuf>) -> Result<(), CliError> {
    let service = open_service(db_path).await?;
    let materials = service.adapter()?.list().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&materials)?);
        return Ok(());
    }

    if materials.is_empty() {
        println!("No materials registered.");
        return Ok(());
    }

    for material in &materials {
        println!("{}", format_material_line(material));
    }
    Ok(())
}
