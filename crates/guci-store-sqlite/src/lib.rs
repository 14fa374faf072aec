//! SQLite backend for the guci card store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. That thread is the single writer: every
//! statement, including backup snapshots, is serialised through it.

pub mod backup;
mod encode;
mod schema;
mod store;

pub mod error;

pub use backup::BackupPolicy;
pub use error::{Error, Result};
pub use store::SqliteStore;
