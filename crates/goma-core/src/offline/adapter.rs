//! Materials adapter: remote-first CRUD with an offline fallback queue

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use libsql::Connection;
use serde::Serialize;

use crate::db::{MaterialRepository, QueueRepository, SyncStateRepository};
use crate::error::{Error, Result};
use crate::models::{
    Material, MaterialDraft, MaterialId, MaterialPatch, OperationPayload, PendingOperation,
    SyncStatus,
};
use crate::remote::{RemoteBackend, RemoteError};
use crate::util::unix_timestamp_ms;

/// Remote table mirrored by this adapter
pub const MATERIALS_TABLE: &str = "materials";

/// Outcome of one drain pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Operations replayed successfully in this pass
    pub synced: u64,
    /// Unprocessed operations left after the pass
    pub remaining: u64,
}

/// Single entry point for CRUD on materials.
///
/// Every write tries the remote backend first; a connectivity failure is
/// absorbed into the local mirror plus one queued pending operation per
/// record. Reads always come from the local mirror so pending edits stay
/// visible while offline.
pub struct MaterialsAdapter<R: RemoteBackend> {
    conn: Connection,
    remote: Arc<R>,
    in_flight: Mutex<HashSet<MaterialId>>,
}

impl<R: RemoteBackend> MaterialsAdapter<R> {
    /// Create an adapter over an initialized local database connection
    pub fn new(conn: Connection, remote: Arc<R>) -> Self {
        Self {
            conn,
            remote,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Reachability probe; never errors, connectivity failures resolve to `false`
    pub async fn is_online(&self) -> bool {
        self.remote.check_reachability().await
    }

    pub(crate) const fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Create a material.
    ///
    /// Validation runs before any storage or network call. On remote success
    /// the authoritative copy is mirrored as `synced`; on connectivity failure
    /// the record is stored as `pending_create`, one create operation is
    /// queued, and the local record is returned so callers can proceed
    /// optimistically.
    pub async fn create(&self, draft: MaterialDraft) -> Result<Material> {
        draft.validate()?;
        let local = Material::from_draft(draft, SyncStatus::PendingCreate);
        let _guard = self.begin_write(local.id)?;

        let materials = MaterialRepository::new(&self.conn);
        match self.remote.create_material(&local).await {
            Ok(remote) => {
                materials.upsert(&remote).await?;
                Ok(remote)
            }
            Err(e) if e.is_connectivity() => {
                tracing::info!("Remote create unreachable, queueing material {}", local.id);
                materials.upsert(&local).await?;
                let op = PendingOperation::new(
                    MATERIALS_TABLE,
                    OperationPayload::Create {
                        material: local.clone(),
                    },
                );
                QueueRepository::new(&self.conn).enqueue(&op).await?;
                Ok(local)
            }
            Err(e) => Err(Error::Remote(e.to_string())),
        }
    }

    /// Update a material.
    ///
    /// A record with unsent queued state never touches the remote directly;
    /// the patch folds into the existing operation instead, so replay order
    /// is preserved and the record keeps exactly one unprocessed operation.
    pub async fn update(&self, id: MaterialId, patch: MaterialPatch) -> Result<Material> {
        patch.validate()?;
        if patch.is_empty() {
            return Err(Error::Validation("empty material patch".into()));
        }
        let _guard = self.begin_write(id)?;

        let materials = MaterialRepository::new(&self.conn);
        let mut current = materials
            .get(&id)
            .await?
            .filter(|m| m.sync_status != SyncStatus::PendingDelete)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;

        if current.sync_status != SyncStatus::Synced {
            return self.fold_offline_update(current, &patch).await;
        }

        match self.remote.update_material(&id, &patch).await {
            Ok(remote) => {
                materials.upsert(&remote).await?;
                Ok(remote)
            }
            Err(e) if e.is_connectivity() => {
                tracing::info!("Remote update unreachable, queueing material {id}");
                current.apply_patch(&patch);
                current.sync_status = SyncStatus::PendingUpdate;
                materials.upsert(&current).await?;
                let op =
                    PendingOperation::new(MATERIALS_TABLE, OperationPayload::Update { id, patch });
                QueueRepository::new(&self.conn).enqueue(&op).await?;
                Ok(current)
            }
            Err(e) => Err(Error::Remote(e.to_string())),
        }
    }

    /// Delete a material.
    ///
    /// An unsent `pending_create` is cancelled outright (record and queued
    /// operation both dropped — nothing was ever sent, so there is nothing to
    /// delete remotely). An unsent update operation is converted into the
    /// delete. A synced record goes remote-first, falling back to a
    /// `pending_delete` marker plus one queued delete operation.
    pub async fn delete(&self, id: MaterialId) -> Result<()> {
        let _guard = self.begin_write(id)?;

        let materials = MaterialRepository::new(&self.conn);
        let queue = QueueRepository::new(&self.conn);
        let mut current = materials
            .get(&id)
            .await?
            .ok_or_else(|| Error::NotFound(id.to_string()))?;

        match current.sync_status {
            SyncStatus::PendingDelete => Ok(()),
            SyncStatus::PendingCreate => {
                if let Some(op) = queue.unprocessed_for_record(&id).await? {
                    queue.remove(&op.id).await?;
                }
                materials.remove(&id).await?;
                Ok(())
            }
            SyncStatus::PendingUpdate => {
                let mut op = queue
                    .unprocessed_for_record(&id)
                    .await?
                    .ok_or_else(|| missing_queue_entry(&id))?;
                op.payload = OperationPayload::Delete { id };
                queue.replace_payload(&op).await?;
                current.sync_status = SyncStatus::PendingDelete;
                materials.upsert(&current).await?;
                Ok(())
            }
            SyncStatus::Synced => match self.remote.delete_material(&id).await {
                Ok(()) => {
                    materials.remove(&id).await?;
                    Ok(())
                }
                Err(e) if e.is_connectivity() => {
                    tracing::info!("Remote delete unreachable, queueing material {id}");
                    current.sync_status = SyncStatus::PendingDelete;
                    materials.upsert(&current).await?;
                    let op =
                        PendingOperation::new(MATERIALS_TABLE, OperationPayload::Delete { id });
                    queue.enqueue(&op).await?;
                    Ok(())
                }
                Err(e) => Err(Error::Remote(e.to_string())),
            },
        }
    }

    /// Get one material from the local mirror; `pending_delete` records read
    /// as absent
    pub async fn get(&self, id: MaterialId) -> Result<Option<Material>> {
        let material = MaterialRepository::new(&self.conn).get(&id).await?;
        Ok(material.filter(|m| m.sync_status != SyncStatus::PendingDelete))
    }

    /// List materials from the local mirror, pending local edits included,
    /// `pending_delete` records filtered out
    pub async fn list(&self) -> Result<Vec<Material>> {
        let all = MaterialRepository::new(&self.conn).list().await?;
        Ok(all
            .into_iter()
            .filter(|m| m.sync_status != SyncStatus::PendingDelete)
            .collect())
    }

    /// Unprocessed pending operations for materials, oldest first
    /// (replay order)
    pub async fn pending_operations(&self) -> Result<Vec<PendingOperation>> {
        QueueRepository::new(&self.conn)
            .pending_for_table(MATERIALS_TABLE)
            .await
    }

    /// One ordered drain pass over the pending-operation queue.
    ///
    /// Replays oldest first; each success marks the operation processed,
    /// settles the mirrored record, and advances the last-sync timestamp.
    /// The first failure stops the pass — a later operation must never be
    /// applied before an earlier one that failed — and already-replayed
    /// operations stay committed. Connectivity failures surface as
    /// [`Error::Connectivity`], anything else as [`Error::SyncConflict`].
    pub async fn sync_pending(&self) -> Result<SyncReport> {
        let materials = MaterialRepository::new(&self.conn);
        let queue = QueueRepository::new(&self.conn);
        let sync_state = SyncStateRepository::new(&self.conn);

        let ops = queue.pending_for_table(MATERIALS_TABLE).await?;
        let total = ops.len();
        let mut synced: u64 = 0;
        let mut failure: Option<Error> = None;

        for op in ops {
            let _guard = self.begin_write(op.record_id)?;

            let replayed = match &op.payload {
                OperationPayload::Create { material } => {
                    self.remote.create_material(material).await.map(Some)
                }
                OperationPayload::Update { id, patch } => {
                    self.remote.update_material(id, patch).await.map(Some)
                }
                OperationPayload::Delete { id } => {
                    self.remote.delete_material(id).await.map(|()| None)
                }
            };

            match replayed {
                Ok(settled) => {
                    queue.mark_processed(&op.id).await?;
                    if let Some(material) = settled {
                        materials.upsert(&material).await?;
                    } else {
                        materials.remove(&op.record_id).await?;
                    }
                    sync_state
                        .touch(MATERIALS_TABLE, unix_timestamp_ms())
                        .await?;
                    synced += 1;
                }
                Err(e) => {
                    failure = Some(replay_failure(&op, &e));
                    break;
                }
            }
        }

        let remaining = queue.count_pending(MATERIALS_TABLE).await?;
        if let Some(e) = failure {
            tracing::warn!(
                "Drain stopped after {synced}/{total} operations: {e}; {remaining} remaining"
            );
            return Err(e);
        }

        tracing::debug!("Drain replayed {synced} operations, {remaining} remaining");
        Ok(SyncReport { synced, remaining })
    }

    /// Pull the remote snapshot into the local mirror.
    ///
    /// Records with an unprocessed queued operation are left untouched; their
    /// local state is ahead of the remote until the queue drains. Synced
    /// local records missing from the snapshot were deleted remotely and are
    /// dropped from the mirror.
    pub async fn refresh(&self) -> Result<u64> {
        let snapshot = self.remote.fetch_materials().await.map_err(|e| {
            if e.is_connectivity() {
                Error::Connectivity(e.to_string())
            } else {
                Error::Remote(e.to_string())
            }
        })?;

        let materials = MaterialRepository::new(&self.conn);
        let queue = QueueRepository::new(&self.conn);

        let mut remote_ids = HashSet::new();
        let mut mirrored: u64 = 0;
        for material in snapshot {
            remote_ids.insert(material.id);
            if queue.unprocessed_for_record(&material.id).await?.is_some() {
                continue;
            }
            materials.upsert(&material).await?;
            mirrored += 1;
        }

        for local in materials.list().await? {
            if local.sync_status == SyncStatus::Synced && !remote_ids.contains(&local.id) {
                materials.remove(&local.id).await?;
            }
        }

        tracing::debug!("Mirror refreshed with {mirrored} remote records");
        Ok(mirrored)
    }

    /// Fold an update into the record's existing unprocessed operation.
    ///
    /// `pending_create`: the patch lands inside the still-unsent create
    /// payload, preserving "create, then this final state" semantics — the
    /// remote must never see an update for a record it has never seen.
    /// `pending_update`: the patches merge, later values winning.
    async fn fold_offline_update(
        &self,
        mut current: Material,
        patch: &MaterialPatch,
    ) -> Result<Material> {
        let materials = MaterialRepository::new(&self.conn);
        let queue = QueueRepository::new(&self.conn);

        let mut op = queue
            .unprocessed_for_record(&current.id)
            .await?
            .ok_or_else(|| missing_queue_entry(&current.id))?;

        current.apply_patch(patch);
        op.payload = match op.payload {
            OperationPayload::Create { .. } => OperationPayload::Create {
                material: current.clone(),
            },
            OperationPayload::Update {
                id,
                patch: earlier,
            } => OperationPayload::Update {
                id,
                patch: patch.merged_over(&earlier),
            },
            OperationPayload::Delete { .. } => {
                return Err(Error::NotFound(current.id.to_string()));
            }
        };
        queue.replace_payload(&op).await?;
        materials.upsert(&current).await?;
        Ok(current)
    }

    /// Mark the record as having a write in flight, or fail if one already is.
    ///
    /// Replaces UI-level discipline (disabled buttons) with an explicit
    /// per-record guard inside the adapter.
    fn begin_write(&self, id: MaterialId) -> Result<InFlightGuard<'_>> {
        let mut in_flight = self
            .in_flight
            .lock()
            .map_err(|_| Error::Storage("in-flight guard poisoned".into()))?;
        if !in_flight.insert(id) {
            return Err(Error::WriteInFlight(id.to_string()));
        }
        Ok(InFlightGuard {
            set: &self.in_flight,
            id,
        })
    }
}

fn replay_failure(op: &PendingOperation, e: &RemoteError) -> Error {
    if e.is_connectivity() {
        Error::Connectivity(e.to_string())
    } else {
        Error::SyncConflict(format!(
            "{} operation for material {} rejected: {e}",
            op.kind().as_str(),
            op.record_id
        ))
    }
}

fn missing_queue_entry(id: &MaterialId) -> Error {
    Error::Storage(format!(
        "material {id} is pending but has no unprocessed queue entry"
    ))
}

/// Releases the in-flight marker when the write settles
struct InFlightGuard<'a> {
    set: &'a Mutex<HashSet<MaterialId>>,
    id: MaterialId,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut set) = self.set.lock() {
            set.remove(&self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::remote::testing::MockBackend;
    use pretty_assertions::assert_eq;

    async fn setup(backend: MockBackend) -> (Database, Arc<MockBackend>, MaterialsAdapter<MockBackend>) {
        let db = Database::open_in_memory().await.unwrap();
        let remote = Arc::new(backend);
        let adapter = MaterialsAdapter::new(db.connection().clone(), Arc::clone(&remote));
        (db, remote, adapter)
    }

    fn fecula_draft() -> MaterialDraft {
        MaterialDraft {
            name: "Fécula".to_string(),
            code: "FEC01".to_string(),
            kind: Some("matéria-prima".to_string()),
            unit: Some("kg".to_string()),
            description: None,
        }
    }

    fn name_patch(name: &str) -> MaterialPatch {
        MaterialPatch {
            name: Some(name.to_string()),
            ..MaterialPatch::default()
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn validation_failure_touches_nothing() {
        let (_db, remote, adapter) = setup(MockBackend::new()).await;

        let draft = MaterialDraft {
            name: String::new(),
            ..fecula_draft()
        };
        assert!(matches!(
            adapter.create(draft).await,
            Err(Error::Validation(_))
        ));

        assert_eq!(remote.record_count(), 0);
        assert!(adapter.list().await.unwrap().is_empty());
        assert!(adapter.pending_operations().await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn online_create_round_trips_as_synced() {
        let (_db, remote, adapter) = setup(MockBackend::new()).await;

        let created = adapter.create(fecula_draft()).await.unwrap();
        assert_eq!(created.sync_status, SyncStatus::Synced);

        let listed = adapter.list().await.unwrap();
        assert_eq!(listed, vec![created.clone()]);
        assert_eq!(remote.record(&created.id).unwrap().code, "FEC01");
        assert!(adapter.pending_operations().await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn offline_create_queues_one_operation() {
        let (_db, remote, adapter) = setup(MockBackend::offline()).await;

        let created = adapter.create(fecula_draft()).await.unwrap();
        assert_eq!(created.sync_status, SyncStatus::PendingCreate);
        assert_eq!(remote.record_count(), 0);

        // Optimistic result stays visible in the local mirror
        assert_eq!(adapter.list().await.unwrap(), vec![created.clone()]);

        let pending = adapter.pending_operations().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].record_id, created.id);
        assert!(matches!(
            pending[0].payload,
            OperationPayload::Create { .. }
        ));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn offline_update_folds_into_pending_create() {
        let (_db, _remote, adapter) = setup(MockBackend::offline()).await;

        let created = adapter.create(fecula_draft()).await.unwrap();
        let updated = adapter
            .update(created.id, name_patch("Fécula doce"))
            .await
            .unwrap();
        assert_eq!(updated.name, "Fécula doce");
        assert_eq!(updated.sync_status, SyncStatus::PendingCreate);

        // Still exactly one operation: a create carrying the latest state
        let pending = adapter.pending_operations().await.unwrap();
        assert_eq!(pending.len(), 1);
        match &pending[0].payload {
            OperationPayload::Create { material } => {
                assert_eq!(material.name, "Fécula doce");
            }
            other => panic!("expected folded create, got {other:?}"),
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn offline_updates_merge_into_one_operation() {
        let (_db, remote, adapter) = setup(MockBackend::new()).await;

        let created = adapter.create(fecula_draft()).await.unwrap();
        remote.set_online(false);

        adapter
            .update(created.id, name_patch("Fécula doce"))
            .await
            .unwrap();
        adapter
            .update(
                created.id,
                MaterialPatch {
                    unit: Some("ton".to_string()),
                    ..MaterialPatch::default()
                },
            )
            .await
            .unwrap();

        let pending = adapter.pending_operations().await.unwrap();
        assert_eq!(pending.len(), 1);
        match &pending[0].payload {
            OperationPayload::Update { patch, .. } => {
                assert_eq!(patch.name.as_deref(), Some("Fécula doce"));
                assert_eq!(patch.unit.as_deref(), Some("ton"));
            }
            other => panic!("expected merged update, got {other:?}"),
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn offline_create_then_delete_cancels_everything() {
        let (_db, remote, adapter) = setup(MockBackend::offline()).await;

        let created = adapter.create(fecula_draft()).await.unwrap();
        adapter.delete(created.id).await.unwrap();

        assert!(adapter.pending_operations().await.unwrap().is_empty());
        assert!(adapter.get(created.id).await.unwrap().is_none());
        assert!(adapter.list().await.unwrap().is_empty());

        // Nothing is ever sent, even after reconnect
        remote.set_online(true);
        let report = adapter.sync_pending().await.unwrap();
        assert_eq!(report, SyncReport { synced: 0, remaining: 0 });
        assert_eq!(remote.record_count(), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn offline_delete_of_synced_record_stays_visible_as_pending() {
        let (_db, remote, adapter) = setup(MockBackend::new()).await;

        let created = adapter.create(fecula_draft()).await.unwrap();
        remote.set_online(false);
        adapter.delete(created.id).await.unwrap();

        // Hidden from normal reads, still present under the status filter
        assert!(adapter.get(created.id).await.unwrap().is_none());
        let db_view = MaterialRepository::new(&adapter.conn)
            .list_by_status(SyncStatus::PendingDelete)
            .await
            .unwrap();
        assert_eq!(db_view.len(), 1);

        let pending = adapter.pending_operations().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert!(matches!(
            pending[0].payload,
            OperationPayload::Delete { .. }
        ));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn offline_update_then_delete_leaves_single_delete_operation() {
        let (_db, remote, adapter) = setup(MockBackend::new()).await;

        let created = adapter.create(fecula_draft()).await.unwrap();
        remote.set_online(false);

        adapter
            .update(created.id, name_patch("Fécula doce"))
            .await
            .unwrap();
        adapter.delete(created.id).await.unwrap();

        let pending = adapter.pending_operations().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert!(matches!(
            pending[0].payload,
            OperationPayload::Delete { .. }
        ));

        remote.set_online(true);
        adapter.sync_pending().await.unwrap();
        assert_eq!(remote.record_count(), 0);
        assert!(adapter.list().await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn reconnect_scenario_drains_queue_and_settles_mirror() {
        let (_db, remote, adapter) = setup(MockBackend::offline()).await;

        let created = adapter
            .create(MaterialDraft {
                name: "Fécula".to_string(),
                code: "FEC01".to_string(),
                kind: None,
                unit: None,
                description: None,
            })
            .await
            .unwrap();

        let pending = adapter.pending_operations().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].kind().as_str(), "create");

        remote.set_online(true);
        let report = adapter.sync_pending().await.unwrap();
        assert_eq!(report, SyncReport { synced: 1, remaining: 0 });

        assert!(adapter.pending_operations().await.unwrap().is_empty());
        let listed = adapter.list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].sync_status, SyncStatus::Synced);
        assert_eq!(listed[0].id, created.id);
        assert_eq!(remote.record(&created.id).unwrap().name, "Fécula");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn queue_invariant_holds_per_non_synced_record() {
        let (_db, remote, adapter) = setup(MockBackend::offline()).await;

        let first = adapter.create(fecula_draft()).await.unwrap();
        let second = adapter
            .create(MaterialDraft {
                name: "Embalagem 25kg".to_string(),
                code: "EMB25".to_string(),
                kind: Some("embalagem".to_string()),
                unit: Some("un".to_string()),
                description: None,
            })
            .await
            .unwrap();
        adapter
            .update(first.id, name_patch("Fécula doce"))
            .await
            .unwrap();

        // One unprocessed operation per non-synced record, no more
        let pending = adapter.pending_operations().await.unwrap();
        assert_eq!(pending.len(), 2);
        let ids: Vec<MaterialId> = pending.iter().map(|op| op.record_id).collect();
        assert!(ids.contains(&first.id));
        assert!(ids.contains(&second.id));

        remote.set_online(true);
        adapter.sync_pending().await.unwrap();

        assert!(adapter.pending_operations().await.unwrap().is_empty());
        for material in adapter.list().await.unwrap() {
            assert_eq!(material.sync_status, SyncStatus::Synced);
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn failed_replay_blocks_later_operations() {
        let (_db, remote, adapter) = setup(MockBackend::offline()).await;

        let first = adapter.create(fecula_draft()).await.unwrap();
        let second = adapter
            .create(MaterialDraft {
                name: "Embalagem 25kg".to_string(),
                code: "EMB25".to_string(),
                kind: None,
                unit: None,
                description: None,
            })
            .await
            .unwrap();

        remote.set_online(true);
        remote.reject_writes_for(first.id);

        let err = adapter.sync_pending().await.unwrap_err();
        assert!(matches!(err, Error::SyncConflict(_)));

        // op2 was never attempted: both remain queued, nothing reached remote
        let pending = adapter.pending_operations().await.unwrap();
        assert_eq!(pending.len(), 2);
        assert!(remote.record(&second.id).is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn partial_progress_is_retained_when_drain_stops() {
        let (_db, remote, adapter) = setup(MockBackend::offline()).await;

        let first = adapter.create(fecula_draft()).await.unwrap();
        let second = adapter
            .create(MaterialDraft {
                name: "Embalagem 25kg".to_string(),
                code: "EMB25".to_string(),
                kind: None,
                unit: None,
                description: None,
            })
            .await
            .unwrap();

        remote.set_online(true);
        remote.reject_writes_for(second.id);

        let err = adapter.sync_pending().await.unwrap_err();
        assert!(matches!(err, Error::SyncConflict(_)));

        // First operation stays committed; only the rejected one remains
        let pending = adapter.pending_operations().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].record_id, second.id);
        assert_eq!(
            adapter.get(first.id).await.unwrap().unwrap().sync_status,
            SyncStatus::Synced
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn drain_stops_on_connectivity_loss() {
        let (_db, remote, adapter) = setup(MockBackend::offline()).await;
        adapter.create(fecula_draft()).await.unwrap();

        // Still offline: the pass fails closed with a connectivity error
        let err = adapter.sync_pending().await.unwrap_err();
        assert!(matches!(err, Error::Connectivity(_)));
        assert_eq!(adapter.pending_operations().await.unwrap().len(), 1);
        assert_eq!(remote.record_count(), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn refresh_mirrors_remote_and_keeps_pending_edits() {
        let (_db, remote, adapter) = setup(MockBackend::new()).await;

        let fecula = adapter.create(fecula_draft()).await.unwrap();
        remote.set_online(false);
        let queued = adapter
            .create(MaterialDraft {
                name: "Embalagem 25kg".to_string(),
                code: "EMB25".to_string(),
                kind: None,
                unit: None,
                description: None,
            })
            .await
            .unwrap();

        // Meanwhile another client deleted fécula and added a record
        remote.set_online(true);
        remote.remove_record(&fecula.id);
        let elsewhere = Material::from_draft(
            MaterialDraft {
                name: "Insumo X".to_string(),
                code: "INS01".to_string(),
                kind: None,
                unit: None,
                description: None,
            },
            SyncStatus::Synced,
        );
        remote.insert_record(elsewhere.clone());

        adapter.refresh().await.unwrap();

        let listed = adapter.list().await.unwrap();
        let ids: Vec<MaterialId> = listed.iter().map(|m| m.id).collect();
        assert!(!ids.contains(&fecula.id));
        assert!(ids.contains(&elsewhere.id));
        assert!(ids.contains(&queued.id));

        // The queued create is still pending and still queued
        let pending = adapter.pending_operations().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].record_id, queued.id);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn update_of_missing_record_is_not_found() {
        let (_db, _remote, adapter) = setup(MockBackend::new()).await;

        let err = adapter
            .update(MaterialId::new(), name_patch("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn in_flight_guard_blocks_second_write() {
        let (_db, _remote, adapter) = setup(MockBackend::new()).await;
        let created = adapter.create(fecula_draft()).await.unwrap();

        let _held = adapter.begin_write(created.id).unwrap();
        let err = adapter
            .update(created.id, name_patch("Fécula doce"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::WriteInFlight(_)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn in_flight_guard_releases_on_drop() {
        let (_db, _remote, adapter) = setup(MockBackend::new()).await;
        let created = adapter.create(fecula_draft()).await.unwrap();

        drop(adapter.begin_write(created.id).unwrap());
        adapter
            .update(created.id, name_patch("Fécula doce"))
            .await
            .unwrap();
    }
}
