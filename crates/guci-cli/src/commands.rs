//! Subcommand implementations.

use std::{
  fmt::Write as _,
  io::{self, Read as _},
  path::Path,
};

use anyhow::{Context as _, Result, bail};
use guci_core::{
  card::{Card, CardId, CardPatch, NewCard},
  store::{CardQuery, CardStore},
};
use guci_import::{CardSink, ImportOptions, SubmitOutcome};
use guci_store_sqlite::backup;
use guci_text::{CancelFlag, Disambiguator, ExportLayout, export_text};

use crate::{
  AddArgs, EditArgs, ImportArgs, SearchArgs, config::Settings,
  console::ConsoleDisambiguator,
};

// ─── Rendering ───────────────────────────────────────────────────────────────

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One line per card: id, keyword, definition and source.
fn summary(card: &Card) -> String {
  let mut line = format!("{}  {}  {}", card.id, card.keyword, card.definition);
  if !card.source.is_empty() {
    let _ = write!(line, "  {}", card.source);
  }
  line
}

fn detail(card: &Card) -> String {
  let mut out = String::new();
  let _ = writeln!(out, "id:         {}", card.id);
  let _ = writeln!(out, "keyword:    {}", card.keyword);
  let _ = writeln!(out, "definition: {}", card.definition);
  let _ = writeln!(out, "source:     {}", card.source);
  let _ = writeln!(out, "quote:      {}", card.quote);
  if !card.tags.is_empty() {
    let tags: Vec<_> = card.tags.iter().map(String::as_str).collect();
    let _ = writeln!(out, "tags:       {}", tags.join(", "));
  }
  let _ = writeln!(out, "created:    {}", card.created_at.format(TIME_FORMAT));
  let _ = writeln!(out, "updated:    {}", card.updated_at.format(TIME_FORMAT));
  if !card.notes.is_empty() {
    let _ = writeln!(out, "notes:");
    for line in card.notes.lines() {
      let _ = writeln!(out, "  {line}");
    }
  }
  out
}

fn print_summaries(cards: &[Card]) {
  for card in cards {
    println!("{}", summary(card));
  }
  eprintln!("{} card(s)", cards.len());
}

// ─── Cards ───────────────────────────────────────────────────────────────────

pub async fn list<S: CardStore>(store: &S) -> Result<()> {
  let cards = store.list_cards().await.context("listing cards")?;
  print_summaries(&cards);
  Ok(())
}

pub async fn show<S: CardStore>(store: &S, id: CardId) -> Result<()> {
  let card = store
    .get_card(&id)
    .await
    .context("reading card")?
    .with_context(|| format!("no card with id {id}"))?;
  print!("{}", detail(&card));
  Ok(())
}

pub async fn add<S: CardStore>(store: &S, args: AddArgs) -> Result<()> {
  let input = NewCard {
    keyword:    args.keyword,
    definition: args.definition,
    source:     args.source,
    quote:      args.quote,
    notes:      args.notes,
    tags:       args.tags.into_iter().collect(),
  };
  let mut sink = CardSink::load(store).await?;
  let (id, outcome) = sink.submit(&input, args.allow_duplicates).await?;
  match outcome {
    SubmitOutcome::Added => println!("added {id}"),
    SubmitOutcome::Merged => println!("merged into {id}"),
  }
  Ok(())
}

pub async fn edit<S: CardStore>(store: &S, args: EditArgs) -> Result<()> {
  let patch = CardPatch {
    keyword:     args.keyword,
    definition:  args.definition,
    source:      args.source,
    quote:       args.quote,
    notes:       args.notes,
    add_tags:    args.add_tags,
    remove_tags: args.remove_tags,
  };
  let card = guci_import::edit_card(store, &args.id.into(), patch).await?;
  print!("{}", detail(&card));
  Ok(())
}

pub async fn delete<S: CardStore>(store: &S, id: CardId) -> Result<()> {
  let card = guci_import::delete_card(store, &id).await?;
  println!("deleted {}", summary(&card));
  Ok(())
}

pub async fn search<S: CardStore>(store: &S, args: SearchArgs) -> Result<()> {
  let query = CardQuery {
    text:   args.text,
    tags:   args.tags,
    limit:  args.limit,
    offset: args.offset,
  };
  let cards = store.search(&query).await.context("searching cards")?;
  print_summaries(&cards);
  Ok(())
}

// ─── Text ────────────────────────────────────────────────────────────────────

pub async fn import<S: CardStore>(
  store: &S,
  settings: &Settings,
  args: ImportArgs,
) -> Result<()> {
  let from_stdin = args.file.as_deref().is_none_or(|p| p == Path::new("-"));
  if args.interactive && from_stdin {
    bail!("interactive import needs a file; stdin is used for the prompts");
  }
  let text = match args.file.as_deref().filter(|_| !from_stdin) {
    Some(path) => tokio::fs::read_to_string(path)
      .await
      .with_context(|| format!("reading {}", path.display()))?,
    None => {
      let mut text = String::new();
      io::stdin().read_to_string(&mut text).context("reading stdin")?;
      text
    }
  };

  let strategy = args.strategy.unwrap_or(settings.strategy);
  let parser = strategy.build(settings.rosters()?, settings.converter()?);
  let cancel = CancelFlag::new();
  let options = ImportOptions {
    allow_duplicates:    args.allow_duplicates,
    interactive:         args.interactive,
    strategy:            parser,
    max_prompt_attempts: settings.max_prompt_attempts,
    cancel:              cancel.clone(),
  };
  tracing::debug!(?options, %strategy, "importing");

  let watcher = tokio::spawn(async move {
    if tokio::signal::ctrl_c().await.is_ok() {
      tracing::warn!("interrupted; stopping after the current card");
      cancel.cancel();
    }
  });

  let mut console = args.interactive.then(ConsoleDisambiguator::stdio);
  let disambiguator = console.as_mut().map(|c| c as &mut dyn Disambiguator);
  let report =
    guci_import::import_from_text(store, &text, &options, disambiguator).await;
  watcher.abort();
  let report = report?;

  for failed in &report.failed_lines {
    eprintln!("line {}: {}", failed.number, failed.text);
  }
  println!("{}", report.stats);
  Ok(())
}

pub async fn export<S: CardStore>(
  store: &S,
  file: Option<&Path>,
  grouped: bool,
) -> Result<()> {
  let layout = if grouped { ExportLayout::Grouped } else { ExportLayout::Flat };
  let cards = store.list_cards().await.context("listing cards")?;
  let text = export_text(&cards, layout);
  match file {
    Some(path) => {
      tokio::fs::write(path, text)
        .await
        .with_context(|| format!("writing {}", path.display()))?;
      eprintln!("exported {} card(s) to {}", cards.len(), path.display());
    }
    None => print!("{text}"),
  }
  Ok(())
}

pub async fn migrate<S: CardStore>(store: &S, file: &Path) -> Result<()> {
  let json = tokio::fs::read_to_string(file)
    .await
    .with_context(|| format!("reading {}", file.display()))?;
  let stats = guci_import::migrate_legacy(store, &json).await?;
  println!(
    "{} total, {} added, {} already present, {} failed",
    stats.total, stats.added, stats.skipped, stats.failed
  );
  Ok(())
}

// ─── Backups ─────────────────────────────────────────────────────────────────

pub fn list_backups(settings: &Settings) -> Result<()> {
  let dir = settings.backup_dir()?;
  let backups = backup::list_backups(&dir)
    .with_context(|| format!("reading {}", dir.display()))?;
  for path in &backups {
    println!("{}", path.display());
  }
  eprintln!("{} backup(s) in {}", backups.len(), dir.display());
  Ok(())
}

pub fn restore(settings: &Settings, from: Option<&Path>) -> Result<()> {
  let from = match from {
    Some(path) => path.to_path_buf(),
    None => backup::latest_backup(&settings.backup_dir()?)?,
  };
  let db = settings.store_path()?;
  backup::restore(&from, &db)
    .with_context(|| format!("restoring {}", from.display()))?;
  println!("restored {} from {}", db.display(), from.display());
  Ok(())
}
