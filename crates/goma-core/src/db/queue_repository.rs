//! Pending-operation queue repository

use libsql::{params, Connection, Row};

use crate::error::{Error, Result};
use crate::models::{MaterialId, OperationId, PendingOperation};

/// libSQL-backed storage for the sync queue
pub struct QueueRepository<'a> {
    conn: &'a Connection,
}

impl<'a> QueueRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Insert a new queued operation
    pub async fn enqueue(&self, op: &PendingOperation) -> Result<()> {
        let payload = serde_json::to_string(&op.payload)?;
        self.conn
            .execute(
                "INSERT INTO sync_queue (
                    id, table_name, record_id, kind, payload, processed, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    op.id.as_str(),
                    op.table_name.clone(),
                    op.record_id.as_str(),
                    op.kind().as_str(),
                    payload,
                    i64::from(op.processed),
                    op.created_at,
                ],
            )
            .await?;
        Ok(())
    }

    /// Replace the payload (and kind) of an existing queued operation.
    ///
    /// Used when a later offline write folds into a still-unsent operation;
    /// the operation keeps its id and queue position.
    pub async fn replace_payload(&self, op: &PendingOperation) -> Result<()> {
        let payload = serde_json::to_string(&op.payload)?;
        let affected = self
            .conn
            .execute(
                "UPDATE sync_queue SET kind = ?1, payload = ?2
                 WHERE id = ?3 AND processed = 0",
                params![op.kind().as_str(), payload, op.id.as_str()],
            )
            .await?;
        if affected == 0 {
            return Err(Error::Storage(format!(
                "no unprocessed queue entry to replace: {}",
                op.id
            )));
        }
        Ok(())
    }

    /// Get a queued operation by ID
    pub async fn get(&self, id: &OperationId) -> Result<Option<PendingOperation>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, table_name, record_id, payload, processed, created_at
                 FROM sync_queue WHERE id = ?1",
                params![id.as_str()],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(Self::parse_operation(&row)?)),
            None => Ok(None),
        }
    }

    /// All unprocessed operations for a table, oldest first (replay order)
    pub async fn pending_for_table(&self, table_name: &str) -> Result<Vec<PendingOperation>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, table_name, record_id, payload, processed, created_at
                 FROM sync_queue
                 WHERE table_name = ?1 AND processed = 0
                 ORDER BY created_at ASC, id ASC",
                params![table_name],
            )
            .await?;

        let mut ops = Vec::new();
        while let Some(row) = rows.next().await? {
            ops.push(Self::parse_operation(&row)?);
        }
        Ok(ops)
    }

    /// The single unprocessed operation targeting a record, if any.
    ///
    /// The adapter maintains the invariant that at most one exists.
    pub async fn unprocessed_for_record(
        &self,
        record_id: &MaterialId,
    ) -> Result<Option<PendingOperation>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, table_name, record_id, payload, processed, created_at
                 FROM sync_queue
                 WHERE record_id = ?1 AND processed = 0
                 ORDER BY created_at ASC, id ASC
                 LIMIT 1",
                params![record_id.as_str()],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(Self::parse_operation(&row)?)),
            None => Ok(None),
        }
    }

    /// Mark a queued operation as replayed; the row is retained for audit
    pub async fn mark_processed(&self, id: &OperationId) -> Result<()> {
        self.conn
            .execute(
                "UPDATE sync_queue SET processed = 1 WHERE id = ?1",
                params![id.as_str()],
            )
            .await?;
        Ok(())
    }

    /// Drop a queued operation outright (create cancelled before any sync)
    pub async fn remove(&self, id: &OperationId) -> Result<()> {
        self.conn
            .execute(
                "DELETE FROM sync_queue WHERE id = ?1",
                params![id.as_str()],
            )
            .await?;
        Ok(())
    }

    /// Count unprocessed operations for one table
    pub async fn count_pending(&self, table_name: &str) -> Result<u64> {
        let mut rows = self
            .conn
            .query(
                "SELECT COUNT(*) FROM sync_queue WHERE table_name = ?1 AND processed = 0",
                params![table_name],
            )
            .await?;
        let count: i64 = match rows.next().await? {
            Some(row) => row.get(0)?,
            None => 0,
        };
        Ok(count.unsigned_abs())
    }

    /// Count unprocessed operations across all tables
    pub async fn count_pending_all(&self) -> Result<u64> {
        let mut rows = self
            .conn
            .query("SELECT COUNT(*) FROM sync_queue WHERE processed = 0", ())
            .await?;
        let count: i64 = match rows.next().await? {
            Some(row) => row.get(0)?,
            None => 0,
        };
        Ok(count.unsigned_abs())
    }

    /// Empty the queue; test/reset paths only
    pub async fn clear(&self) -> Result<()> {
        self.conn.execute("DELETE FROM sync_queue", ()).await?;
        Ok(())
    }

    fn parse_operation(row: &Row) -> Result<PendingOperation> {
        let id: String = row.get(0)?;
        let record_id: String = row.get(2)?;
        let payload: String = row.get(3)?;
        Ok(PendingOperation {
            id: id
                .parse()
                .map_err(|_| Error::Storage(format!("invalid operation id: {id}")))?,
            table_name: row.get(1)?,
            record_id: record_id
                .parse()
                .map_err(|_| Error::Storage(format!("invalid record id: {record_id}")))?,
            payload: serde_json::from_str(&payload)?,
            processed: row.get::<i64>(4)? != 0,
            created_at: row.get(5)?,
        })
    }
}
