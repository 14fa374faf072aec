//! The free-text import entry point.

use std::{fmt, sync::Arc};

use guci_core::{
  card::{CardId, NewCard},
  store::CardStore,
};
use guci_text::{
  CancelFlag, Disambiguator, FailedLine, GrammarStrategy, LineStrategy,
  WalkOptions, walk,
};

use crate::{
  Error, Result,
  sink::{CardSink, SubmitOutcome},
};

#[derive(Clone)]
pub struct ImportOptions {
  /// Store exact duplicates as new cards instead of merging them.
  pub allow_duplicates:    bool,
  /// Ask the disambiguator about unrecognised lines.
  pub interactive:         bool,
  pub strategy:            Arc<dyn LineStrategy + Send + Sync>,
  pub max_prompt_attempts: usize,
  pub cancel:              CancelFlag,
}

impl Default for ImportOptions {
  fn default() -> Self {
    Self {
      allow_duplicates:    false,
      interactive:         false,
      strategy:            Arc::new(GrammarStrategy),
      max_prompt_attempts: WalkOptions::default().max_prompt_attempts,
      cancel:              CancelFlag::default(),
    }
  }
}

impl fmt::Debug for ImportOptions {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ImportOptions")
      .field("allow_duplicates", &self.allow_duplicates)
      .field("interactive", &self.interactive)
      .field("max_prompt_attempts", &self.max_prompt_attempts)
      .field("cancelled", &self.cancel.is_cancelled())
      .finish_non_exhaustive()
  }
}

/// Counters for one import.
///
/// `total` counts every record the import tried to resolve: each draft
/// submitted to the sink and each line that produced nothing. So
/// `added + merged + failed == total`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportStats {
  pub total:             usize,
  pub added:             usize,
  pub merged:            usize,
  pub failed:            usize,
  pub interactive_fixed: usize,
  pub cancelled:         bool,
}

impl fmt::Display for ImportStats {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "{} total, {} added, {} merged, {} failed",
      self.total, self.added, self.merged, self.failed
    )?;
    if self.interactive_fixed > 0 {
      write!(f, ", {} fixed interactively", self.interactive_fixed)?;
    }
    if self.cancelled {
      f.write_str(" (cancelled)")?;
    }
    Ok(())
  }
}

#[derive(Debug, Clone, Default)]
pub struct ImportReport {
  pub stats:        ImportStats,
  /// Ids of cards added or merged into, in submission order.
  pub committed:    Vec<CardId>,
  /// Lines that produced no card.
  pub failed_lines: Vec<FailedLine>,
}

/// Parse `text` and store the resulting cards.
///
/// Unparseable lines and cards the store rejects are counted, not returned
/// as errors. Errors are reserved for a failing disambiguator, an unreadable
/// store, or interactive mode without a disambiguator. Cards committed
/// before an error stay committed.
///
/// The cancel flag is checked before each line is parsed and before each
/// card is stored. Cards stored before it was raised stay stored.
pub async fn import_from_text<S: CardStore>(
  store: &S,
  text: &str,
  options: &ImportOptions,
  disambiguator: Option<&mut dyn Disambiguator>,
) -> Result<ImportReport> {
  if options.interactive && disambiguator.is_none() {
    return Err(Error::MissingDisambiguator);
  }
  let disambiguator = disambiguator.filter(|_| options.interactive);

  let walk_options = WalkOptions {
    max_prompt_attempts: options.max_prompt_attempts,
    cancel:              options.cancel.clone(),
  };
  let outcome = walk(text, &*options.strategy, &walk_options, disambiguator)?;

  let mut report = ImportReport {
    stats: ImportStats {
      total: outcome.failed_lines.len(),
      failed: outcome.failed_lines.len(),
      interactive_fixed: outcome.interactive_fixed,
      cancelled: outcome.cancelled,
      ..ImportStats::default()
    },
    committed: Vec::with_capacity(outcome.drafts.len()),
    failed_lines: outcome.failed_lines,
  };

  let mut sink = CardSink::load(store).await?;
  for draft in outcome.drafts {
    if options.cancel.is_cancelled() {
      tracing::info!(
        submitted = report.committed.len(),
        "import cancelled before all cards were stored"
      );
      report.stats.cancelled = true;
      break;
    }
    let input: NewCard = draft.into();
    report.stats.total += 1;
    match sink.submit(&input, options.allow_duplicates).await {
      Ok((id, kind)) => {
        match kind {
          SubmitOutcome::Added => report.stats.added += 1,
          SubmitOutcome::Merged => report.stats.merged += 1,
        }
        report.committed.push(id);
      }
      Err(e) => {
        tracing::warn!(keyword = %input.keyword, "could not store card: {e}");
        report.stats.failed += 1;
      }
    }
  }

  tracing::info!(stats = %report.stats, "import finished");
  Ok(report)
}
