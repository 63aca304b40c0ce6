//! Remote backend contract and the managed REST implementation.
//!
//! The adapter talks to the backend only through [`RemoteBackend`], so tests
//! can substitute an in-memory double. The production implementation speaks
//! the managed backend's PostgREST dialect over HTTP.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::OfflineConfig;
use crate::models::{Material, MaterialId, MaterialPatch, SyncStatus};
use crate::util::compact_text;

/// Failures from remote calls, split so the adapter can tell the
/// recoverable offline case apart from a hard rejection
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Network/timeout failure; triggers the offline fallback path
    #[error("connectivity failure: {0}")]
    Connectivity(String),
    /// The backend answered and said no
    #[error("{message} ({status})")]
    Api { status: u16, message: String },
}

impl RemoteError {
    /// True for failures the offline fallback is allowed to absorb
    #[must_use]
    pub const fn is_connectivity(&self) -> bool {
        matches!(self, Self::Connectivity(_))
    }
}

pub type RemoteResult<T> = std::result::Result<T, RemoteError>;

/// Table-scoped CRUD against the managed backend plus a reachability probe
#[allow(async_fn_in_trait)]
pub trait RemoteBackend {
    /// Lightweight probe used only to decide online/offline status.
    /// Never errors; any failure resolves to `false`.
    async fn check_reachability(&self) -> bool;

    /// Insert a material; the returned record is the remote's authoritative copy
    async fn create_material(&self, material: &Material) -> RemoteResult<Material>;

    /// Patch a material by id
    async fn update_material(
        &self,
        id: &MaterialId,
        patch: &MaterialPatch,
    ) -> RemoteResult<Material>;

    /// Delete a material by id
    async fn delete_material(&self, id: &MaterialId) -> RemoteResult<()>;

    /// Fetch every material, oldest first
    async fn fetch_materials(&self) -> RemoteResult<Vec<Material>>;
}

/// Wire shape of a material row on the remote table.
///
/// `sync_status` is local bookkeeping and never crosses the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RemoteMaterial {
    id: MaterialId,
    name: String,
    code: String,
    #[serde(default)]
    kind: Option<String>,
    #[serde(default)]
    unit: Option<String>,
    #[serde(default)]
    description: Option<String>,
    created_at: i64,
    updated_at: i64,
}

impl RemoteMaterial {
    fn from_material(material: &Material) -> Self {
        Self {
            id: material.id,
            name: material.name.clone(),
            code: material.code.clone(),
            kind: material.kind.clone(),
            unit: material.unit.clone(),
            description: material.description.clone(),
            created_at: material.created_at,
            updated_at: material.updated_at,
        }
    }

    fn into_material(self) -> Material {
        Material {
            id: self.id,
            name: self.name,
            code: self.code,
            kind: self.kind,
            unit: self.unit,
            description: self.description,
            sync_status: SyncStatus::Synced,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// PostgREST client for the managed backend
#[derive(Clone)]
pub struct RestBackend {
    base_url: String,
    anon_key: String,
    probe_timeout: std::time::Duration,
    client: reqwest::Client,
}

impl RestBackend {
    /// Build a client from the resolved configuration
    pub fn new(config: &OfflineConfig) -> crate::Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| crate::Error::Connectivity(e.to_string()))?;
        Ok(Self {
            base_url: config.rest_base_url(),
            anon_key: config.supabase_anon_key.clone(),
            probe_timeout: config.probe_timeout(),
            client,
        })
    }

    fn table_url(&self) -> String {
        format!("{}/materials", self.base_url)
    }

    fn authed(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
            .header("Accept", "application/json")
    }

    async fn expect_success(response: reqwest::Response) -> RemoteResult<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(RemoteError::Api {
            status: status.as_u16(),
            message: parse_api_error(status, &body),
        })
    }

    async fn parse_single(response: reqwest::Response) -> RemoteResult<Material> {
        let rows = response
            .json::<Vec<RemoteMaterial>>()
            .await
            .map_err(|e| RemoteError::Api {
                status: 0,
                message: format!("invalid response payload: {e}"),
            })?;
        rows.into_iter()
            .next()
            .map(RemoteMaterial::into_material)
            .ok_or(RemoteError::Api {
                status: 404,
                message: "no matching row on remote".to_string(),
            })
    }
}

impl RemoteBackend for RestBackend {
    async fn check_reachability(&self) -> bool {
        let request = self
            .authed(self.client.get(self.table_url()))
            .query(&[("select", "id"), ("limit", "1")])
            .timeout(self.probe_timeout);

        match request.send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::debug!("Reachability probe failed: {e}");
                false
            }
        }
    }

    async fn create_material(&self, material: &Material) -> RemoteResult<Material> {
        let body = [RemoteMaterial::from_material(material)];
        let response = self
            .authed(self.client.post(self.table_url()))
            .header("Prefer", "return=representation")
            .json(&body)
            .send()
            .await
            .map_err(|e| RemoteError::Connectivity(e.to_string()))?;

        let response = Self::expect_success(response).await?;
        Self::parse_single(response).await
    }

    async fn update_material(
        &self,
        id: &MaterialId,
        patch: &MaterialPatch,
    ) -> RemoteResult<Material> {
        let response = self
            .authed(self.client.patch(self.table_url()))
            .query(&[("id", format!("eq.{id}"))])
            .header("Prefer", "return=representation")
            .json(patch)
            .send()
            .await
            .map_err(|e| RemoteError::Connectivity(e.to_string()))?;

        let response = Self::expect_success(response).await?;
        Self::parse_single(response).await
    }

    async fn delete_material(&self, id: &MaterialId) -> RemoteResult<()> {
        let response = self
            .authed(self.client.delete(self.table_url()))
            .query(&[("id", format!("eq.{id}"))])
            .send()
            .await
            .map_err(|e| RemoteError::Connectivity(e.to_string()))?;

        Self::expect_success(response).await?;
        Ok(())
    }

    async fn fetch_materials(&self) -> RemoteResult<Vec<Material>> {
        let response = self
            .authed(self.client.get(self.table_url()))
            .query(&[("select", "*"), ("order", "created_at.asc")])
            .send()
            .await
            .map_err(|e| RemoteError::Connectivity(e.to_string()))?;

        let response = Self::expect_success(response).await?;
        let rows = response
            .json::<Vec<RemoteMaterial>>()
            .await
            .map_err(|e| RemoteError::Api {
                status: 0,
                message: format!("invalid response payload: {e}"),
            })?;
        Ok(rows.into_iter().map(RemoteMaterial::into_material).collect())
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<String>,
    message: Option<String>,
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ApiErrorBody>(body) {
        if let Some(message) = payload.message.or(payload.error) {
            return compact_text(&message);
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        compact_text(trimmed)
    }
}

#[cfg(test)]
pub mod testing {
    //! In-memory backend double with a switchable online flag

    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    use super::{RemoteBackend, RemoteError, RemoteResult};
    use crate::models::{Material, MaterialId, MaterialPatch, SyncStatus};

    pub struct MockBackend {
        online: AtomicBool,
        records: Mutex<HashMap<MaterialId, Material>>,
        rejected: Mutex<Option<MaterialId>>,
    }

    impl MockBackend {
        pub fn new() -> Self {
            Self {
                online: AtomicBool::new(true),
                records: Mutex::new(HashMap::new()),
                rejected: Mutex::new(None),
            }
        }

        pub fn offline() -> Self {
            let backend = Self::new();
            backend.set_online(false);
            backend
        }

        pub fn set_online(&self, online: bool) {
            self.online.store(online, Ordering::SeqCst);
        }

        /// Make every write for this record fail with an API error,
        /// simulating e.g. a row deleted remotely by someone else
        pub fn reject_writes_for(&self, id: MaterialId) {
            *self.rejected.lock().unwrap() = Some(id);
        }

        /// Seed a record as if another client had created it
        pub fn insert_record(&self, mut material: Material) {
            material.sync_status = SyncStatus::Synced;
            self.records.lock().unwrap().insert(material.id, material);
        }

        /// Drop a record as if another client had deleted it
        pub fn remove_record(&self, id: &MaterialId) {
            self.records.lock().unwrap().remove(id);
        }

        pub fn record(&self, id: &MaterialId) -> Option<Material> {
            self.records.lock().unwrap().get(id).cloned()
        }

        pub fn record_count(&self) -> usize {
            self.records.lock().unwrap().len()
        }

        fn guard(&self, id: &MaterialId) -> RemoteResult<()> {
            if !self.online.load(Ordering::SeqCst) {
                return Err(RemoteError::Connectivity("backend unreachable".into()));
            }
            if self.rejected.lock().unwrap().as_ref() == Some(id) {
                return Err(RemoteError::Api {
                    status: 409,
                    message: "write rejected by backend".into(),
                });
            }
            Ok(())
        }
    }

    impl Default for MockBackend {
        fn default() -> Self {
            Self::new()
        }
    }

    impl RemoteBackend for MockBackend {
        async fn check_reachability(&self) -> bool {
            self.online.load(Ordering::SeqCst)
        }

        async fn create_material(&self, material: &Material) -> RemoteResult<Material> {
            self.guard(&material.id)?;
            let mut stored = material.clone();
            stored.sync_status = SyncStatus::Synced;
            self.records
                .lock()
                .unwrap()
                .insert(stored.id, stored.clone());
            Ok(stored)
        }

        async fn update_material(
            &self,
            id: &MaterialId,
            patch: &MaterialPatch,
        ) -> RemoteResult<Material> {
            self.guard(id)?;
            let mut records = self.records.lock().unwrap();
            let material = records.get_mut(id).ok_or(RemoteError::Api {
                status: 404,
                message: "no matching row on remote".into(),
            })?;
            material.apply_patch(patch);
            Ok(material.clone())
        }

        async fn delete_material(&self, id: &MaterialId) -> RemoteResult<()> {
            self.guard(id)?;
            self.records.lock().unwrap().remove(id);
            Ok(())
        }

        async fn fetch_materials(&self) -> RemoteResult<Vec<Material>> {
            if !self.online.load(Ordering::SeqCst) {
                return Err(RemoteError::Connectivity("backend unreachable".into()));
            }
            let mut all: Vec<Material> = self.records.lock().unwrap().values().cloned().collect();
            all.sort_by_key(|m| (m.created_at, m.id.as_str()));
            Ok(all)
        }
    }
}
