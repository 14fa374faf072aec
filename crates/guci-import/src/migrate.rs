//! Migration from the legacy `cards.json` data file.

use guci_core::{card::parse_legacy_json, store::CardStore};

use crate::{Error, Result, sink::CardSink};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MigrationStats {
  pub total:   usize,
  pub added:   usize,
  /// Records whose keyword and source already exist in the store.
  pub skipped: usize,
  pub failed:  usize,
}

/// Copy the records of a legacy JSON document into `store`.
///
/// A record is skipped when a card with the same trimmed keyword and source
/// already exists, so running a migration twice adds nothing the second
/// time. Records without keyword or definition count as failed.
pub async fn migrate_legacy<S: CardStore>(
  store: &S,
  json: &str,
) -> Result<MigrationStats> {
  let records = parse_legacy_json(json)?;
  let mut stats = MigrationStats { total: records.len(), ..Default::default() };
  let mut sink = CardSink::load(store).await?;

  for record in records {
    let record = match record.validate() {
      Ok(r) => r,
      Err(e) => {
        tracing::warn!("skipping legacy record: {e}");
        stats.failed += 1;
        continue;
      }
    };

    if store
      .find_by(&record.keyword, &record.source)
      .await
      .map_err(Error::store)?
      .is_some()
    {
      stats.skipped += 1;
      continue;
    }

    match sink.submit(&record, true).await {
      Ok(_) => stats.added += 1,
      Err(e) => {
        tracing::warn!(
          keyword = %record.keyword,
          "could not migrate card: {e}"
        );
        stats.failed += 1;
      }
    }
  }

  tracing::info!(?stats, "migration finished");
  Ok(stats)
}
