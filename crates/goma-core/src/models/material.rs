//! Material model and input validation

use std::fmt;
use std::str::FromStr;

use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::util::unix_timestamp_ms;

/// A unique identifier for a material, using UUID v7 (time-sortable)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MaterialId(Uuid);

impl MaterialId {
    /// Create a new unique material ID using UUID v7
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for MaterialId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MaterialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for MaterialId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Synchronization state of a locally mirrored record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    /// Local mirror matches the remote backend
    Synced,
    /// Created locally; the remote has never seen this record
    PendingCreate,
    /// Updated locally; the remote still holds an older version
    PendingUpdate,
    /// Deleted locally; kept until the remote delete is confirmed
    PendingDelete,
}

impl SyncStatus {
    /// Column value stored in the local database
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Synced => "synced",
            Self::PendingCreate => "pending_create",
            Self::PendingUpdate => "pending_update",
            Self::PendingDelete => "pending_delete",
        }
    }

    /// Parse a column value back into a status
    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "synced" => Ok(Self::Synced),
            "pending_create" => Ok(Self::PendingCreate),
            "pending_update" => Ok(Self::PendingUpdate),
            "pending_delete" => Ok(Self::PendingDelete),
            other => Err(Error::Storage(format!("unknown sync_status: {other}"))),
        }
    }
}

/// A raw material tracked by production (fécula, embalagem, insumo...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Material {
    /// Unique identifier
    pub id: MaterialId,
    /// Display name
    pub name: String,
    /// Short internal code, e.g. `FEC01`
    pub code: String,
    /// Material category (free-form, indexed locally)
    pub kind: Option<String>,
    /// Unit of measure (kg, L, un...)
    pub unit: Option<String>,
    /// Free-form description
    pub description: Option<String>,
    /// Synchronization marker for the local mirror
    pub sync_status: SyncStatus,
    /// Creation timestamp (Unix ms)
    pub created_at: i64,
    /// Last update timestamp (Unix ms)
    pub updated_at: i64,
}

impl Material {
    /// Build a new local material from a validated draft
    #[must_use]
    pub fn from_draft(draft: MaterialDraft, sync_status: SyncStatus) -> Self {
        let now = unix_timestamp_ms();
        Self {
            id: MaterialId::new(),
            name: draft.name,
            code: draft.code,
            kind: draft.kind,
            unit: draft.unit,
            description: draft.description,
            sync_status,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a patch in place, bumping `updated_at`
    pub fn apply_patch(&mut self, patch: &MaterialPatch) {
        if let Some(name) = &patch.name {
            self.name.clone_from(name);
        }
        if let Some(code) = &patch.code {
            self.code.clone_from(code);
        }
        if let Some(kind) = &patch.kind {
            self.kind = Some(kind.clone());
        }
        if let Some(unit) = &patch.unit {
            self.unit = Some(unit.clone());
        }
        if let Some(description) = &patch.description {
            self.description = Some(description.clone());
        }
        self.updated_at = unix_timestamp_ms();
    }
}

/// Input for creating a material, validated at the adapter boundary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialDraft {
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl MaterialDraft {
    /// Validate required fields; runs before any storage or network call
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::Validation("material name must not be empty".into()));
        }
        validate_code(&self.code)
    }
}

/// Partial update for a material; `None` fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl MaterialPatch {
    /// Check whether the patch changes anything at all
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.code.is_none()
            && self.kind.is_none()
            && self.unit.is_none()
            && self.description.is_none()
    }

    /// Validate the fields that are present
    pub fn validate(&self) -> Result<()> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(Error::Validation("material name must not be empty".into()));
            }
        }
        if let Some(code) = &self.code {
            validate_code(code)?;
        }
        Ok(())
    }

    /// Fold this patch into an earlier one, keeping the later values
    #[must_use]
    pub fn merged_over(&self, earlier: &Self) -> Self {
        Self {
            name: self.name.clone().or_else(|| earlier.name.clone()),
            code: self.code.clone().or_else(|| earlier.code.clone()),
            kind: self.kind.clone().or_else(|| earlier.kind.clone()),
            unit: self.unit.clone().or_else(|| earlier.unit.clone()),
            description: self
                .description
                .clone()
                .or_else(|| earlier.description.clone()),
        }
    }
}

/// Material codes: uppercase letters/digits, dash or underscore, e.g. `FEC01`
fn validate_code(code: &str) -> Result<()> {
    let re = Regex::new(r"^[A-Z][A-Z0-9_-]*$").expect("Invalid regex");
    if re.is_match(code) {
        Ok(())
    } else {
        Err(Error::Validation(format!(
            "material code must match [A-Z][A-Z0-9_-]*, got: {code:?}"
        )))
    }
}
