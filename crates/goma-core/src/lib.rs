//! goma-core - Core library for goma
//!
//! This crate contains the shared models, local database layer, remote
//! backend client, and offline sync logic used by all goma interfaces.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod offline;
pub mod remote;
pub mod util;

pub use error::{Error, Result};
pub use models::{Material, MaterialId, SyncStatus};
