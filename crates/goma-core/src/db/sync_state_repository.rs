//! Per-table sync bookkeeping repository

use libsql::{params, Connection};

use crate::error::Result;
use crate::models::SyncState;

/// libSQL-backed storage for last-sync timestamps
pub struct SyncStateRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SyncStateRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Get the sync state for one table
    pub async fn get(&self, table_name: &str) -> Result<Option<SyncState>> {
        let mut rows = self
            .conn
            .query(
                "SELECT table_name, last_synced_at FROM sync_state WHERE table_name = ?1",
                params![table_name],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(SyncState {
                table_name: row.get(0)?,
                last_synced_at: row.get(1)?,
            })),
            None => Ok(None),
        }
    }

    /// Latest sync timestamp across all tables
    pub async fn last_synced_at(&self) -> Result<Option<i64>> {
        let mut rows = self
            .conn
            .query("SELECT MAX(last_synced_at) FROM sync_state", ())
            .await?;

        match rows.next().await? {
            Some(row) => Ok(row.get(0)?),
            None => Ok(None),
        }
    }

    /// Record a successful drain for the table at the given timestamp
    pub async fn touch(&self, table_name: &str, synced_at: i64) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO sync_state (table_name, last_synced_at) VALUES (?1, ?2)
                 ON CONFLICT(table_name) DO UPDATE SET
                    last_synced_at = excluded.last_synced_at",
                params![table_name, synced_at],
            )
            .await?;
        Ok(())
    }

    /// Empty the collection; test/reset paths only
    pub async fn clear(&self) -> Result<()> {
        self.conn.execute("DELETE FROM sync_state", ()).await?;
        Ok(())
    }
}
