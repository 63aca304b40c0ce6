//! Pending operation model: one deferred write destined for the remote

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{Material, MaterialId, MaterialPatch};
use crate::util::unix_timestamp_ms;

/// A unique identifier for a pending operation (UUID v7, time-sortable)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OperationId(Uuid);

impl OperationId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    #[must_use]
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for OperationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for OperationId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Operation kind, stored as its own column for index queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Create,
    Update,
    Delete,
}

impl OperationKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "create" => Ok(Self::Create),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            other => Err(Error::Storage(format!("unknown operation kind: {other}"))),
        }
    }
}

/// Typed payload snapshot for a deferred write.
///
/// Tagged variants instead of a loose JSON map, so replay code cannot be
/// handed a payload that does not match the operation kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum OperationPayload {
    /// Full record as it should exist remotely after the create
    Create { material: Material },
    /// Patch to apply to an already-known remote record
    Update {
        id: MaterialId,
        patch: MaterialPatch,
    },
    /// Remote record to remove
    Delete { id: MaterialId },
}

impl OperationPayload {
    /// Kind column value matching this payload
    #[must_use]
    pub const fn kind(&self) -> OperationKind {
        match self {
            Self::Create { .. } => OperationKind::Create,
            Self::Update { .. } => OperationKind::Update,
            Self::Delete { .. } => OperationKind::Delete,
        }
    }

    /// Identifier of the record this operation targets
    #[must_use]
    pub const fn record_id(&self) -> MaterialId {
        match self {
            Self::Create { material } => material.id,
            Self::Update { id, .. } | Self::Delete { id } => *id,
        }
    }
}

/// One queued, not-yet-confirmed write for the remote backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingOperation {
    /// Unique identifier (creation-ordered)
    pub id: OperationId,
    /// Remote table this write targets
    pub table_name: String,
    /// Identifier of the record being written
    pub record_id: MaterialId,
    /// Deferred write content
    pub payload: OperationPayload,
    /// Set once the drain replayed this operation successfully
    pub processed: bool,
    /// Creation timestamp (Unix ms); replay order is oldest-first
    pub created_at: i64,
}

impl PendingOperation {
    /// Queue a new unprocessed operation for the given table
    #[must_use]
    pub fn new(table_name: impl Into<String>, payload: OperationPayload) -> Self {
        Self {
            id: OperationId::new(),
            table_name: table_name.into(),
            record_id: payload.record_id(),
            payload,
            processed: false,
            created_at: unix_timestamp_ms(),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> OperationKind {
        self.payload.kind()
    }
}
