//! Offline-first access layer
//!
//! [`MaterialsAdapter`] is the single entry point for materials CRUD: remote
//! first, local mirror + pending-operation queue when the backend is
//! unreachable. [`OfflineService`] bootstraps the local store once and
//! exposes the aggregate status snapshot.

mod adapter;
mod service;

pub use adapter::{MaterialsAdapter, SyncReport, MATERIALS_TABLE};
pub use service::{OfflineService, OfflineStats};
