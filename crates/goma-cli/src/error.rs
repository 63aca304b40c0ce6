use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] goma_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Invalid material ID: {0}")]
    InvalidMaterialId(String),
    #[error("Update needs at least one of --name, --code, --kind, --unit, --description")]
    EmptyUpdate,
    #[error(
        "Could not open the local store. Check GOMA_DB_PATH (or --db-path) points to a writable location."
    )]
    StoreInit,
}
