//! Materials mirror repository

use libsql::{params, Connection, Row};

use crate::error::{Error, Result};
use crate::models::{Material, MaterialId, SyncStatus};

/// libSQL-backed storage for the local materials mirror
pub struct MaterialRepository<'a> {
    conn: &'a Connection,
}

impl<'a> MaterialRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Upsert a material by primary key; idempotent
    pub async fn upsert(&self, material: &Material) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO materials (
                    id, name, code, kind, unit, description,
                    sync_status, created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                ON CONFLICT(id) DO UPDATE SET
                    name = excluded.name,
                    code = excluded.code,
                    kind = excluded.kind,
                    unit = excluded.unit,
                    description = excluded.description,
                    sync_status = excluded.sync_status,
                    created_at = excluded.created_at,
                    updated_at = excluded.updated_at",
                params![
                    material.id.as_str(),
                    material.name.clone(),
                    material.code.clone(),
                    material.kind.clone(),
                    material.unit.clone(),
                    material.description.clone(),
                    material.sync_status.as_str(),
                    material.created_at,
                    material.updated_at,
                ],
            )
            .await?;
        Ok(())
    }

    /// Get a material by ID
    pub async fn get(&self, id: &MaterialId) -> Result<Option<Material>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, name, code, kind, unit, description,
                        sync_status, created_at, updated_at
                 FROM materials WHERE id = ?1",
                params![id.as_str()],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(Self::parse_material(&row)?)),
            None => Ok(None),
        }
    }

    /// List all mirrored materials, oldest first
    pub async fn list(&self) -> Result<Vec<Material>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, name, code, kind, unit, description,
                        sync_status, created_at, updated_at
                 FROM materials ORDER BY created_at ASC, id ASC",
                (),
            )
            .await?;

        let mut materials = Vec::new();
        while let Some(row) = rows.next().await? {
            materials.push(Self::parse_material(&row)?);
        }
        Ok(materials)
    }

    /// List materials matching a sync status (secondary-index query)
    pub async fn list_by_status(&self, status: SyncStatus) -> Result<Vec<Material>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, name, code, kind, unit, description,
                        sync_status, created_at, updated_at
                 FROM materials WHERE sync_status = ?1
                 ORDER BY created_at ASC, id ASC",
                params![status.as_str()],
            )
            .await?;

        let mut materials = Vec::new();
        while let Some(row) = rows.next().await? {
            materials.push(Self::parse_material(&row)?);
        }
        Ok(materials)
    }

    /// Remove a material; no-op when absent
    pub async fn remove(&self, id: &MaterialId) -> Result<()> {
        self.conn
            .execute(
                "DELETE FROM materials WHERE id = ?1",
                params![id.as_str()],
            )
            .await?;
        Ok(())
    }

    /// Empty the collection; test/reset paths only
    pub async fn clear(&self) -> Result<()> {
        self.conn.execute("DELETE FROM materials", ()).await?;
        Ok(())
    }

    fn parse_material(row: &Row) -> Result<Material> {
        let id: String = row.get(0)?;
        let sync_status: String = row.get(6)?;
        Ok(Material {
            id: id
                .parse()
                .map_err(|_| Error::Storage(format!("invalid material id: {id}")))?,
            name: row.get(1)?,
            code: row.get(2)?,
            kind: row.get(3)?,
            unit: row.get(4)?,
            description: row.get(5)?,
            sync_status: SyncStatus::parse(&sync_status)?,
            created_at: row.get(7)?,
            updated_at: row.get(8)?,
        })
    }
}
