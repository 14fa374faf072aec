//! [`SqliteStore`], the SQLite implementation of [`CardStore`].

use std::{
  path::Path,
  sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
  },
};

use rusqlite::OptionalExtension as _;

use guci_core::{
  card::{Card, CardId},
  order::sort_by_reading,
  store::{CardQuery, CardStore},
};

use crate::{
  Result,
  backup::{self, BackupPolicy},
  encode::{CardRow, RawCard, like_pattern},
  schema::{CARD_COLUMNS, SCHEMA},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A guci card store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted and clones
/// share one backup schedule.
#[derive(Clone)]
pub struct SqliteStore {
  conn:         tokio_rusqlite::Connection,
  backups:      Option<BackupPolicy>,
  /// Set at open and by each save; the next write takes a snapshot first.
  snapshot_due: Arc<AtomicBool>,
}

impl SqliteStore {
  fn new(conn: tokio_rusqlite::Connection) -> Self {
    Self { conn, backups: None, snapshot_due: Arc::new(AtomicBool::new(true)) }
  }

  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self::new(conn);
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self::new(conn);
    store.init_schema().await?;
    Ok(store)
  }

  /// Snapshot the database into `policy.dir` before the first write that
  /// follows opening or a [`CardStore::persist`].
  pub fn with_backups(mut self, policy: BackupPolicy) -> Self {
    self.backups = Some(policy);
    self
  }

  /// Close the connection, waiting for the database thread to finish.
  pub async fn close(self) -> Result<()> {
    self.conn.close().await?;
    Ok(())
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run a single-row lookup with two text arguments.
  async fn find_one(
    &self,
    sql: String,
    a: String,
    b: String,
  ) -> Result<Option<Card>> {
    let raw: Option<RawCard> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(&sql, rusqlite::params![a, b], RawCard::from_row)
            .optional()?,
        )
      })
      .await?;

    raw.map(RawCard::into_card).transpose()
  }

  /// Take the pending snapshot, if any. A failed snapshot does not fail the
  /// write that triggered it.
  async fn snapshot_if_due(&self) {
    let Some(policy) = &self.backups else { return };
    if !self.snapshot_due.swap(false, Ordering::SeqCst) {
      return;
    }
    if let Err(e) = backup::snapshot(&self.conn, policy).await {
      tracing::warn!(dir = %policy.dir.display(), "backup failed: {e}");
    }
  }
}

fn into_sorted_cards(raws: Vec<RawCard>) -> Result<Vec<Card>> {
  let mut cards = raws
    .into_iter()
    .map(RawCard::into_card)
    .collect::<Result<Vec<_>>>()?;
  sort_by_reading(&mut cards);
  Ok(cards)
}

// ─── CardStore impl ──────────────────────────────────────────────────────────

impl CardStore for SqliteStore {
  type Error = crate::Error;

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn list_cards(&self) -> Result<Vec<Card>> {
    let raws: Vec<RawCard> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare(&format!("SELECT {CARD_COLUMNS} FROM cards"))?;
        let rows = stmt
          .query_map([], RawCard::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    into_sorted_cards(raws)
  }

  async fn get_card(&self, id: &CardId) -> Result<Option<Card>> {
    let id_str = id.as_str().to_owned();

    let raw: Option<RawCard> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {CARD_COLUMNS} FROM cards WHERE card_id = ?1"),
              rusqlite::params![id_str],
              RawCard::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawCard::into_card).transpose()
  }

  async fn find_by(&self, keyword: &str, source: &str) -> Result<Option<Card>> {
    self
      .find_one(
        format!(
          "SELECT {CARD_COLUMNS} FROM cards
           WHERE trim(keyword) = ?1 AND trim(source) = ?2
           ORDER BY created_at LIMIT 1"
        ),
        keyword.trim().to_owned(),
        source.trim().to_owned(),
      )
      .await
  }

  async fn find_duplicate(
    &self,
    keyword: &str,
    definition: &str,
  ) -> Result<Option<Card>> {
    self
      .find_one(
        format!(
          "SELECT {CARD_COLUMNS} FROM cards
           WHERE trim(keyword) = ?1 AND trim(definition) = ?2
           ORDER BY created_at LIMIT 1"
        ),
        keyword.trim().to_owned(),
        definition.trim().to_owned(),
      )
      .await
  }

  async fn search(&self, query: &CardQuery) -> Result<Vec<Card>> {
    // Build WHERE clause dynamically; every argument is text.
    let mut conds: Vec<String> = Vec::new();
    let mut args: Vec<String> = Vec::new();

    if let Some(text) = query.text.as_deref().map(str::trim)
      && !text.is_empty()
    {
      args.push(like_pattern(text));
      let n = args.len();
      let ors = ["keyword", "definition", "source", "quote", "notes"]
        .iter()
        .map(|col| format!("{col} LIKE ?{n} ESCAPE '\\'"))
        .collect::<Vec<_>>()
        .join(" OR ");
      conds.push(format!("({ors})"));
    }

    for tag in &query.tags {
      args.push(tag.trim().to_owned());
      let n = args.len();
      conds.push(format!(
        "EXISTS (SELECT 1 FROM json_each(cards.tags) \
         WHERE json_each.value = ?{n})"
      ));
    }

    let where_clause = if conds.is_empty() {
      String::new()
    } else {
      format!("WHERE {}", conds.join(" AND "))
    };
    let sql = format!("SELECT {CARD_COLUMNS} FROM cards {where_clause}");
    tracing::debug!(%sql, ?args, "card search");

    let raws: Vec<RawCard> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let params = rusqlite::params_from_iter(args.iter());
        let rows = stmt
          .query_map(params, RawCard::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    // Reading order is not expressible in SQL, so paging happens here.
    let cards = into_sorted_cards(raws)?;
    Ok(
      cards
        .into_iter()
        .skip(query.offset.unwrap_or(0))
        .take(query.limit.unwrap_or(usize::MAX))
        .collect(),
    )
  }

  // ── Writes ────────────────────────────────────────────────────────────────

  async fn insert(&self, card: &Card) -> Result<()> {
    let row = CardRow::encode(card)?;
    self.snapshot_if_due().await;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO cards (
             card_id, keyword, definition, source, quote,
             notes, tags, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
          rusqlite::params![
            row.card_id,
            row.keyword,
            row.definition,
            row.source,
            row.quote,
            row.notes,
            row.tags,
            row.created_at,
            row.updated_at,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn update(&self, card: &Card) -> Result<bool> {
    let row = CardRow::encode(card)?;
    self.snapshot_if_due().await;

    let changed: usize = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE cards SET
             keyword = ?2, definition = ?3, source = ?4, quote = ?5,
             notes = ?6, tags = ?7, created_at = ?8, updated_at = ?9
           WHERE card_id = ?1",
          rusqlite::params![
            row.card_id,
            row.keyword,
            row.definition,
            row.source,
            row.quote,
            row.notes,
            row.tags,
            row.created_at,
            row.updated_at,
          ],
        )?)
      })
      .await?;
    Ok(changed > 0)
  }

  async fn delete(&self, id: &CardId) -> Result<bool> {
    let id_str = id.as_str().to_owned();
    self.snapshot_if_due().await;

    let changed: usize = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM cards WHERE card_id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await?;
    Ok(changed > 0)
  }

  async fn persist(&self) -> Result<()> {
    // Statements auto-commit; a checkpoint folds the WAL back into the main
    // database file and surfaces I/O failures here rather than later.
    self
      .conn
      .call(|conn| {
        conn.query_row("PRAGMA wal_checkpoint(PASSIVE)", [], |_| Ok(()))?;
        Ok(())
      })
      .await?;

    self.snapshot_due.store(true, Ordering::SeqCst);
    Ok(())
  }
}
