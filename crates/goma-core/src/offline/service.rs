//! Offline service: one-shot store bootstrap and aggregate status

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::OnceCell;

use crate::config::OfflineConfig;
use crate::db::{Database, QueueRepository, SyncStateRepository};
use crate::error::{Error, Result};
use crate::offline::adapter::MaterialsAdapter;
use crate::remote::RemoteBackend;

/// Aggregate status snapshot for connectivity badges and dashboards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OfflineStats {
    /// Local store opened and migrated successfully
    pub initialized: bool,
    /// Remote backend reachable right now
    pub online: bool,
    /// Unprocessed pending operations across all mirrored tables
    pub pending_operations: u64,
    /// Timestamp of the last successful drain (Unix ms), if any
    pub last_sync: Option<i64>,
}

impl OfflineStats {
    const fn uninitialized() -> Self {
        Self {
            initialized: false,
            online: false,
            pending_operations: 0,
            last_sync: None,
        }
    }
}

/// Bootstraps the local store once per process and hands out the adapter.
///
/// Injected as an explicit dependency instead of a module-level singleton, so
/// tests can run several isolated instances side by side. `initialize` is
/// idempotent: the first call opens the store, later calls return the cached
/// outcome. Browser-storage-style persistence comes from the database file
/// itself; there is no teardown call.
pub struct OfflineService<R: RemoteBackend> {
    config: OfflineConfig,
    remote: Arc<R>,
    state: OnceCell<Option<ServiceState<R>>>,
}

struct ServiceState<R: RemoteBackend> {
    // Keeps the database handle alive for the adapter's connection
    _database: Database,
    adapter: MaterialsAdapter<R>,
}

impl<R: RemoteBackend> OfflineService<R> {
    /// Create a service; no I/O happens until `initialize`
    pub fn new(config: OfflineConfig, remote: Arc<R>) -> Self {
        Self {
            config,
            remote,
            state: OnceCell::new(),
        }
    }

    /// Open the local store and probe the remote; idempotent.
    ///
    /// Returns `true` when the store is usable. A failed open is cached for
    /// the lifetime of the service rather than retried implicitly.
    pub async fn initialize(&self) -> bool {
        let state = self
            .state
            .get_or_init(|| async {
                match self.open_store().await {
                    Ok(state) => Some(state),
                    Err(e) => {
                        tracing::error!("Failed to initialize offline store: {e}");
                        None
                    }
                }
            })
            .await;
        state.is_some()
    }

    async fn open_store(&self) -> Result<ServiceState<R>> {
        if let Some(parent) = self.config.db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let database = Database::open(&self.config.db_path).await?;
        let adapter = MaterialsAdapter::new(database.connection().clone(), Arc::clone(&self.remote));
        let online = self.remote.check_reachability().await;
        tracing::info!(
            "Offline store initialized (remote {})",
            if online { "reachable" } else { "unreachable" }
        );
        Ok(ServiceState {
            _database: database,
            adapter,
        })
    }

    /// The materials adapter, available once `initialize` succeeded
    pub fn adapter(&self) -> Result<&MaterialsAdapter<R>> {
        self.state
            .get()
            .and_then(Option::as_ref)
            .map(|state| &state.adapter)
            .ok_or(Error::NotInitialized)
    }

    /// Aggregate status snapshot.
    ///
    /// Probes the remote live on every call; the probe is cheap and the
    /// snapshot is user-facing.
    pub async fn stats(&self) -> Result<OfflineStats> {
        let Some(state) = self.state.get().and_then(Option::as_ref) else {
            return Ok(OfflineStats::uninitialized());
        };

        let conn = state.adapter.connection();
        let pending_operations = QueueRepository::new(conn).count_pending_all().await?;
        let last_sync = SyncStateRepository::new(conn).last_synced_at().await?;
        let online = self.remote.check_reachability().await;

        Ok(OfflineStats {
            initialized: true,
            online,
            pending_operations,
            last_sync,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MaterialDraft;
    use crate::remote::testing::MockBackend;
    use pretty_assertions::assert_eq;

    fn memory_config() -> OfflineConfig {
        OfflineConfig::new("https://example.supabase.co", "anon-key", ":memory:").unwrap()
    }

    fn fecula_draft() -> MaterialDraft {
        MaterialDraft {
            name: "Fécula".to_string(),
            code: "FEC01".to_string(),
            kind: None,
            unit: None,
            description: None,
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn initialize_is_idempotent() {
        let service = OfflineService::new(memory_config(), Arc::new(MockBackend::new()));
        assert!(service.initialize().await);
        assert!(service.initialize().await);
        assert!(service.adapter().is_ok());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn adapter_before_initialize_is_an_error() {
        let service = OfflineService::new(memory_config(), Arc::new(MockBackend::new()));
        assert!(matches!(service.adapter(), Err(Error::NotInitialized)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn stats_before_initialize_report_uninitialized() {
        let service = OfflineService::new(memory_config(), Arc::new(MockBackend::new()));
        let stats = service.stats().await.unwrap();
        assert_eq!(stats, OfflineStats::uninitialized());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn stats_track_pending_operations_and_last_sync() {
        let remote = Arc::new(MockBackend::offline());
        let service = OfflineService::new(memory_config(), Arc::clone(&remote));
        assert!(service.initialize().await);

        service
            .adapter()
            .unwrap()
            .create(fecula_draft())
            .await
            .unwrap();

        let stats = service.stats().await.unwrap();
        assert!(stats.initialized);
        assert!(!stats.online);
        assert_eq!(stats.pending_operations, 1);
        assert_eq!(stats.last_sync, None);

        remote.set_online(true);
        service.adapter().unwrap().sync_pending().await.unwrap();

        let stats = service.stats().await.unwrap();
        assert!(stats.online);
        assert_eq!(stats.pending_operations, 0);
        assert!(stats.last_sync.is_some());
    }
}
