//! Rolling on-disk snapshots of the card database.
//!
//! When a [`BackupPolicy`] is configured, the store snapshots the database
//! before the first write after opening and after each successful save. The
//! newest snapshot therefore holds the state from before the latest change.
//! Snapshot files are named by local timestamp, so sorting names sorts them
//! by age.

use std::{
  fs,
  path::{Path, PathBuf},
};

use chrono::Local;

use crate::{Error, Result};

const PREFIX: &str = "cards_backup_";
const SUFFIX: &str = ".sqlite3";

/// Where snapshots go and how many to keep.
#[derive(Debug, Clone)]
pub struct BackupPolicy {
  pub dir:  PathBuf,
  pub keep: usize,
}

impl BackupPolicy {
  pub fn new(dir: impl Into<PathBuf>, keep: usize) -> Self {
    Self { dir: dir.into(), keep }
  }
}

fn is_backup_name(name: &str) -> bool {
  name.starts_with(PREFIX) && name.ends_with(SUFFIX)
}

/// Write a snapshot of the live database into `policy.dir`, then prune the
/// oldest snapshots beyond `policy.keep`.
///
/// Returns `None` if a snapshot with the same timestamp already exists.
pub(crate) async fn snapshot(
  conn: &tokio_rusqlite::Connection,
  policy: &BackupPolicy,
) -> Result<Option<PathBuf>> {
  tokio::fs::create_dir_all(&policy.dir).await?;

  let stamp = Local::now().format("%Y%m%d_%H%M%S_%6f");
  let target = policy.dir.join(format!("{PREFIX}{stamp}{SUFFIX}"));
  if tokio::fs::try_exists(&target).await? {
    tracing::debug!(path = %target.display(), "backup already exists");
    return Ok(None);
  }

  let target_str = target.to_string_lossy().into_owned();
  conn
    .call(move |conn| {
      conn.execute("VACUUM INTO ?1", rusqlite::params![target_str])?;
      Ok(())
    })
    .await?;
  tracing::info!(path = %target.display(), "wrote backup");

  prune(&policy.dir, policy.keep).await?;
  Ok(Some(target))
}

/// Delete all but the `keep` newest snapshots in `dir`.
async fn prune(dir: &Path, keep: usize) -> Result<()> {
  let mut found = Vec::new();
  let mut entries = tokio::fs::read_dir(dir).await?;
  while let Some(entry) = entries.next_entry().await? {
    if is_backup_name(&entry.file_name().to_string_lossy()) {
      found.push(entry.path());
    }
  }
  found.sort_by(|a, b| b.file_name().cmp(&a.file_name()));

  for stale in found.into_iter().skip(keep) {
    tracing::debug!(path = %stale.display(), "pruning backup");
    tokio::fs::remove_file(&stale).await?;
  }
  Ok(())
}

/// Every snapshot in `dir`, newest first. A missing directory has none.
pub fn list_backups(dir: &Path) -> Result<Vec<PathBuf>> {
  let entries = match fs::read_dir(dir) {
    Ok(entries) => entries,
    Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(vec![]),
    Err(e) => return Err(e.into()),
  };

  let mut found = Vec::new();
  for entry in entries {
    let entry = entry?;
    if is_backup_name(&entry.file_name().to_string_lossy()) {
      found.push(entry.path());
    }
  }
  found.sort_by(|a, b| b.file_name().cmp(&a.file_name()));
  Ok(found)
}

/// The newest snapshot in `dir`.
pub fn latest_backup(dir: &Path) -> Result<PathBuf> {
  list_backups(dir)?
    .into_iter()
    .next()
    .ok_or_else(|| Error::NoBackup(dir.to_path_buf()))
}

/// Replace the database at `db_path` with `backup`.
///
/// Must run while no store has `db_path` open. Stale `-wal` and `-shm`
/// sidecar files are removed so SQLite does not replay them over the
/// restored data.
pub fn restore(backup: &Path, db_path: &Path) -> Result<()> {
  if let Some(parent) = db_path.parent()
    && !parent.as_os_str().is_empty()
  {
    fs::create_dir_all(parent)?;
  }
  fs::copy(backup, db_path)?;

  for suffix in ["-wal", "-shm"] {
    let mut sidecar = db_path.as_os_str().to_owned();
    sidecar.push(suffix);
    match fs::remove_file(&sidecar) {
      Ok(()) => {}
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
      Err(e) => return Err(e.into()),
    }
  }

  tracing::info!(
    from = %backup.display(),
    to = %db_path.display(),
    "restored backup"
  );
  Ok(())
}
