//! Local database layer for goma
//!
//! One libSQL database holds the three mirrored collections: `materials`,
//! `sync_queue`, and `sync_state`. Repositories wrap a shared connection.

mod connection;
mod material_repository;
mod migrations;
mod queue_repository;
mod sync_state_repository;

pub use connection::Database;
pub use material_repository::MaterialRepository;
pub use queue_repository::QueueRepository;
pub use sync_state_repository::SyncStateRepository;
