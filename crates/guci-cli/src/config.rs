//! Settings: an optional TOML file layered under `GUCI_*` environment
//! variables.
//!
//! ```toml
//! store_path          = "~/cards/guci.sqlite3"
//! backup_dir          = "~/cards/backups"
//! keep_backups        = 5
//! strategy            = "semantic"
//! max_prompt_attempts = 3
//! rosters             = "~/cards/rosters.toml"
//! conversion_table    = "~/cards/t2s.toml"
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use directories::ProjectDirs;
use guci_text::{Rosters, ScriptConverter, Strategy, TableConverter};
use serde::Deserialize;

const STORE_FILE: &str = "cards.sqlite3";
const BACKUP_DIR: &str = "backups";
const CONFIG_FILE: &str = "config.toml";

type BoxedConverter = Box<dyn ScriptConverter + Send + Sync>;

fn project_dirs() -> Option<ProjectDirs> { ProjectDirs::from("", "", "guci") }

/// Default config file location, if the platform has a config directory.
pub fn default_config_file() -> Option<PathBuf> {
  project_dirs().map(|p| p.config_dir().join(CONFIG_FILE))
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
  /// SQLite database file. Defaults to the platform data directory.
  pub store_path:          Option<PathBuf>,
  /// Where timestamped snapshots go. Defaults to `backups/` next to the
  /// platform data directory.
  pub backup_dir:          Option<PathBuf>,
  /// Snapshots kept after rotation. `0` disables backups.
  pub keep_backups:        usize,
  pub strategy:            Strategy,
  pub max_prompt_attempts: usize,
  /// Extra author and book names, merged into the builtin rosters.
  pub rosters:             Option<PathBuf>,
  /// Character table replacing the semantic strategy's builtin
  /// traditional-to-simplified conversion.
  pub conversion_table:    Option<PathBuf>,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      store_path:          None,
      backup_dir:          None,
      keep_backups:        5,
      strategy:            Strategy::default(),
      max_prompt_attempts: 3,
      rosters:             None,
      conversion_table:    None,
    }
  }
}

impl Settings {
  /// Read `file` (or the default config file; either may be missing) and
  /// the environment.
  pub fn load(file: Option<&Path>) -> Result<Self> {
    let mut builder = config::Config::builder();
    if let Some(path) = file.map(Path::to_path_buf).or_else(default_config_file)
    {
      builder = builder.add_source(config::File::from(path).required(false));
    }
    let settings = builder
      .add_source(config::Environment::with_prefix("GUCI"))
      .build()
      .context("failed to read config file")?;
    settings
      .try_deserialize()
      .context("failed to deserialise settings")
  }

  pub fn store_path(&self) -> Result<PathBuf> {
    match &self.store_path {
      Some(p) => Ok(expand_tilde(p)),
      None => Ok(data_dir()?.join(STORE_FILE)),
    }
  }

  pub fn backup_dir(&self) -> Result<PathBuf> {
    match &self.backup_dir {
      Some(p) => Ok(expand_tilde(p)),
      None => Ok(data_dir()?.join(BACKUP_DIR)),
    }
  }

  /// The builtin rosters, extended with the configured file if any.
  pub fn rosters(&self) -> Result<Rosters> {
    let mut rosters = Rosters::builtin();
    if let Some(path) = &self.rosters {
      let path = expand_tilde(path);
      let raw = std::fs::read_to_string(&path)
        .with_context(|| format!("reading rosters {}", path.display()))?;
      rosters.extend(Rosters::from_toml_str(&raw)?);
    }
    Ok(rosters)
  }

  /// The configured conversion table, or none to keep the strategy's
  /// default conversion.
  pub fn converter(&self) -> Result<Option<BoxedConverter>> {
    let Some(path) = &self.conversion_table else {
      return Ok(None);
    };
    let path = expand_tilde(path);
    let raw = std::fs::read_to_string(&path)
      .with_context(|| format!("reading conversion table {}", path.display()))?;
    let table = TableConverter::from_toml_str(&raw)?;
    tracing::debug!(entries = table.len(), "conversion table loaded");
    Ok(Some(Box::new(table)))
  }
}

fn data_dir() -> Result<PathBuf> {
  project_dirs()
    .map(|p| p.data_dir().to_path_buf())
    .context("could not determine a data directory; set store_path")
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_apply_to_missing_keys() {
    let s: Settings = config::Config::builder()
      .add_source(config::File::from_str(
        "strategy = \"semantic\"",
        config::FileFormat::Toml,
      ))
      .build()
      .unwrap()
      .try_deserialize()
      .unwrap();
    assert_eq!(s.strategy, Strategy::Semantic);
    assert_eq!(s.keep_backups, 5);
    assert_eq!(s.max_prompt_attempts, 3);
    assert!(s.store_path.is_none());
  }

  #[test]
  fn explicit_paths_win_over_defaults() {
    let s = Settings {
      store_path: Some("/tmp/guci/cards.sqlite3".into()),
      backup_dir: Some("/tmp/guci/bak".into()),
      ..Settings::default()
    };
    assert_eq!(s.store_path().unwrap(), Path::new("/tmp/guci/cards.sqlite3"));
    assert_eq!(s.backup_dir().unwrap(), Path::new("/tmp/guci/bak"));
  }

  #[test]
  fn tilde_only_expands_at_start() {
    assert_eq!(expand_tilde(Path::new("/a/~/b")), Path::new("/a/~/b"));
    if let Ok(home) = std::env::var("HOME") {
      assert_eq!(expand_tilde(Path::new("~/x")), Path::new(&home).join("x"));
    }
  }

  #[test]
  fn no_conversion_table_means_no_converter() {
    assert!(Settings::default().converter().unwrap().is_none());
  }
}
