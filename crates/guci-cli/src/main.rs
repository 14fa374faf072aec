//! `guci`: command-line front end for the guci flashcard store.
//!
//! # Usage
//!
//! ```text
//! guci import notes.txt --strategy semantic
//! guci import notes.txt --interactive
//! guci search 黝 --tag 文选
//! guci export --grouped > cards.txt
//! guci restore
//! ```
//!
//! Logs go to stderr; set `RUST_LOG=debug` to see which rule matched each
//! line.

mod commands;
mod config;
mod console;

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use guci_store_sqlite::{BackupPolicy, SqliteStore};
use guci_text::Strategy;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::config::Settings;

// ─── CLI args ────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
  name = "guci",
  version,
  about = "Classical-Chinese flashcard manager"
)]
struct Cli {
  /// Path to a TOML config file. Defaults to the platform config directory.
  #[arg(short, long, value_name = "FILE", env = "GUCI_CONFIG")]
  config: Option<PathBuf>,

  /// Database file, overriding the configured `store_path`.
  #[arg(long, value_name = "FILE")]
  store: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// List every card, sorted by keyword.
  List,
  /// Show one card in full.
  Show { id: String },
  /// Add a card; an existing card with the same keyword and definition
  /// absorbs it unless duplicates are allowed.
  Add(AddArgs),
  /// Change fields or tags of a card.
  Edit(EditArgs),
  /// Delete a card.
  Delete { id: String },
  /// Search keyword, definition, source, quote and notes.
  Search(SearchArgs),
  /// Import cards from free text.
  Import(ImportArgs),
  /// Write all cards as importable text.
  Export {
    /// Output file; stdout when omitted.
    file:    Option<PathBuf>,
    /// Group cards under keyword headings.
    #[arg(long)]
    grouped: bool,
  },
  /// Copy cards from a legacy `cards.json` file.
  Migrate { file: PathBuf },
  /// List backup snapshots, newest first.
  Backups,
  /// Replace the database with a backup snapshot.
  Restore {
    /// Snapshot to restore; the newest one when omitted.
    backup: Option<PathBuf>,
  },
}

#[derive(ClapArgs, Debug)]
pub struct AddArgs {
  #[arg(short, long)]
  pub keyword:          String,
  #[arg(short, long)]
  pub definition:       String,
  #[arg(short, long, default_value = "")]
  pub source:           String,
  #[arg(short, long, default_value = "")]
  pub quote:            String,
  #[arg(short, long, default_value = "")]
  pub notes:            String,
  #[arg(short, long = "tag")]
  pub tags:             Vec<String>,
  #[arg(long)]
  pub allow_duplicates: bool,
}

#[derive(ClapArgs, Debug)]
pub struct EditArgs {
  pub id:          String,
  #[arg(short, long)]
  pub keyword:     Option<String>,
  #[arg(short, long)]
  pub definition:  Option<String>,
  #[arg(short, long)]
  pub source:      Option<String>,
  #[arg(short, long)]
  pub quote:       Option<String>,
  #[arg(short, long)]
  pub notes:       Option<String>,
  #[arg(long = "add-tag")]
  pub add_tags:    Vec<String>,
  #[arg(long = "remove-tag")]
  pub remove_tags: Vec<String>,
}

#[derive(ClapArgs, Debug)]
pub struct SearchArgs {
  pub text:   Option<String>,
  /// Only cards carrying this tag; repeat to require several.
  #[arg(short, long = "tag")]
  pub tags:   Vec<String>,
  #[arg(long)]
  pub limit:  Option<usize>,
  #[arg(long)]
  pub offset: Option<usize>,
}

#[derive(ClapArgs, Debug)]
pub struct ImportArgs {
  /// Text file to import; `-` or nothing reads stdin.
  pub file:             Option<PathBuf>,
  /// Ask about lines no rule recognises.
  #[arg(short, long)]
  pub interactive:      bool,
  #[arg(long)]
  pub allow_duplicates: bool,
  /// `grammar` or `semantic`, overriding the configured strategy.
  #[arg(long)]
  pub strategy:         Option<Strategy>,
}

// ─── Entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let mut settings = Settings::load(cli.config.as_deref())?;
  if let Some(store) = cli.store {
    settings.store_path = Some(store);
  }

  // These work on files only and must not hold the database open.
  match &cli.command {
    Command::Backups => return commands::list_backups(&settings),
    Command::Restore { backup } => {
      return commands::restore(&settings, backup.as_deref());
    }
    _ => {}
  }

  let store = open_store(&settings).await?;
  let result = match cli.command {
    Command::List => commands::list(&store).await,
    Command::Show { id } => commands::show(&store, id.into()).await,
    Command::Add(args) => commands::add(&store, args).await,
    Command::Edit(args) => commands::edit(&store, args).await,
    Command::Delete { id } => commands::delete(&store, id.into()).await,
    Command::Search(args) => commands::search(&store, args).await,
    Command::Import(args) => commands::import(&store, &settings, args).await,
    Command::Export { file, grouped } => {
      commands::export(&store, file.as_deref(), grouped).await
    }
    Command::Migrate { file } => commands::migrate(&store, &file).await,
    Command::Backups | Command::Restore { .. } => Ok(()),
  };

  store.close().await.context("closing store")?;
  result
}

async fn open_store(settings: &Settings) -> Result<SqliteStore> {
  let path = settings.store_path()?;
  if let Some(parent) = path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("creating {}", parent.display()))?;
  }

  let mut store = SqliteStore::open(&path)
    .await
    .with_context(|| format!("failed to open store at {path:?}"))?;
  if settings.keep_backups > 0 {
    store = store.with_backups(BackupPolicy::new(
      settings.backup_dir()?,
      settings.keep_backups,
    ));
  }
  tracing::debug!(path = %path.display(), "store opened");
  Ok(store)
}
