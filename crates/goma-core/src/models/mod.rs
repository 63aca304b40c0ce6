//! Domain models for goma

mod material;
mod pending_op;
mod sync_state;

pub use material::{Material, MaterialDraft, MaterialId, MaterialPatch, SyncStatus};
pub use pending_op::{OperationId, OperationKind, OperationPayload, PendingOperation};
pub use sync_state::SyncState;
