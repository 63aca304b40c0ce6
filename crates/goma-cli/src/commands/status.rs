use std::path::PathBuf;

use crate::commands::common::{format_timestamp, open_service};
use crate::error::CliError;

pub async fn run_status(json: bool, db_path: Option<PathBuf>) -> Result<(), CliError> {
    let service = open_service(db_path).await?;
    let stats = service.stats().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!(
        "Backend:            {}",
        if stats.online { "online" } else { "offline" }
    );
    println!("Pending operations: {}", stats.pending_operations);
    println!(
        "Last sync:          {}",
        stats
            .last_sync
            .map_or_else(|| "never".to_string(), format_timestamp)
    );
    Ok(())
}
