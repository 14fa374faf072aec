//! Error type for `guci-store-sqlite`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("backup i/o error: {0}")]
  Io(#[from] std::io::Error),

  #[error("no backup found in {0}")]
  NoBackup(PathBuf),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
