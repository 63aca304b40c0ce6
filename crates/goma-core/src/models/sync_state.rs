//! Per-table sync bookkeeping

use serde::{Deserialize, Serialize};

/// Last successful drain for one mirrored table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncState {
    /// Mirrored remote table
    pub table_name: String,
    /// Timestamp of the last successful sync pass (Unix ms)
    pub last_synced_at: i64,
}
