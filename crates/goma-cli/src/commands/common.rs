use std::path::PathBuf;
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use goma_core::config::OfflineConfig;
use goma_core::offline::OfflineService;
use goma_core::remote::RestBackend;
use goma_core::{Material, MaterialId};

use crate::error::CliError;

/// Resolve config, build the REST backend, and bring the offline service up
pub async fn open_service(
    db_path: Option<PathBuf>,
) -> Result<OfflineService<RestBackend>, CliError> {
    let mut config = OfflineConfig::from_env()?;
    if let Some(path) = db_path {
        config.db_path = path;
    }

    let remote = Arc::new(RestBackend::new(&config)?);
    let service = OfflineService::new(config, remote);
    if !service.initialize().await {
        return Err(CliError::StoreInit);
    }
    Ok(service)
}

pub fn parse_material_id(raw: &str) -> Result<MaterialId, CliError> {
    raw.trim()
        .parse()
        .map_err(|_| CliError::InvalidMaterialId(raw.to_string()))
}

/// One human-readable line per material for `goma list`
pub fn format_material_line(material: &Material) -> String {
    let marker = match material.sync_status {
        goma_core::SyncStatus::Synced => "",
        _ => " [pending]",
    };
    let unit = material
        .unit
        .as_deref()
        .map(|u| format!(" ({u})"))
        .unwrap_or_default();
    format!(
        "{}  {}  {}{unit}{marker}",
        material.id, material.code, material.name
    )
}

/// Render a Unix-ms timestamp for status output
pub fn format_timestamp(ms: i64) -> String {
    Utc.timestamp_millis_opt(ms)
        .single()
        .map_or_else(|| ms.to_string(), |dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
}
