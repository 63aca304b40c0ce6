use std::path::PathBuf;

use goma_core::Error;

use crate::commands::common::open_service;
use crate::error::CliError;

pub async fn run_sync(db_path: Option<PathBuf>) -> Result<(), CliError> {
    let service = open_service(db_path).await?;
    let adapter = service.adapter()?;

    match adapter.sync_pending().await {
        Ok(report) => {
            let refreshed = adapter.refresh().await?;
            if report.synced == 0 && report.remaining == 0 {
                println!("Queue empty; refreshed {refreshed} record(s) from the backend");
            } else {
                println!(
                    "Synced {} operation(s), {} remaining; refreshed {refreshed} record(s)",
                    report.synced, report.remaining
                );
            }
            Ok(())
        }
        Err(Error::Connectivity(_)) => {
            println!("Backend unreachable; queued operations kept for the next sync");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
