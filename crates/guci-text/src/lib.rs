//! Free-text card codec for guci.
//!
//! Turns pasted study notes into card drafts and renders cards back into the
//! same line grammar. Pure synchronous; no database dependencies.
//!
//! # Quick start
//!
//! ```no_run
//! use guci_text::{GrammarStrategy, WalkOptions, walk};
//!
//! let text = "黑色：黝。《闲居赋》:“浮梁黝以径度”。";
//! let options = WalkOptions::default();
//! let outcome = walk(text, &GrammarStrategy, &options, None).unwrap();
//! let failed = outcome.failed_lines.len();
//! println!("{} drafts, {failed} failed", outcome.drafts.len());
//! ```

pub mod classify;
pub mod convert;
pub mod disambiguate;
pub mod error;
pub mod matcher;
pub mod preprocess;
pub mod roster;
mod serialize;
pub mod strategy;
mod walk;

use guci_core::card::NewCard;

pub use classify::SemanticStrategy;
pub use convert::{HansConverter, ScriptConverter, TableConverter};
pub use disambiguate::{
  BoxError, Disambiguator, Prompt, Rejection, Resolution,
  ScriptedDisambiguator,
};
pub use error::{Error, Result};
pub use roster::Rosters;
pub use serialize::{ExportLayout, export_text};
pub use strategy::{GrammarStrategy, LineStrategy, Strategy};
pub use walk::{CancelFlag, FailedLine, WalkOptions, WalkOutcome, walk};

// ─── Public types ────────────────────────────────────────────────────────────

/// A card recognised in the input but not yet persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedCardDraft {
  pub keyword:       String,
  pub definition:    String,
  pub source:        String,
  pub quote:         String,
  pub notes:         String,
  /// The line resolved its own keyword; following lines must not inherit
  /// the current context keyword.
  pub reset_keyword: bool,
}

impl ParsedCardDraft {
  /// Append `line` to the notes, newline-joined.
  pub fn append_note(&mut self, line: &str) {
    if !self.notes.is_empty() {
      self.notes.push('\n');
    }
    self.notes.push_str(line);
  }
}

impl From<ParsedCardDraft> for NewCard {
  fn from(draft: ParsedCardDraft) -> Self {
    NewCard {
      keyword:    draft.keyword,
      definition: draft.definition,
      source:     draft.source,
      quote:      draft.quote,
      notes:      draft.notes,
      tags:       Default::default(),
    }
  }
}

/// Walk state shared with every matcher for one import.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseContext {
  /// Keyword inherited by lines that omit their own.
  pub current_keyword: Option<String>,
}

/// What a strategy made of one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineMatch {
  /// A bare keyword heading the lines that follow.
  Header(String),
  Card(ParsedCardDraft),
}

#[cfg(test)]
mod roundtrip_tests {
  use chrono::{TimeZone, Utc};
  use guci_core::card::{Card, CardId};

  use super::*;

  fn card(kw: &str, def: &str, src: &str, quote: &str, notes: &str) -> Card {
    let mut input = NewCard::new(kw, def);
    input.source = src.into();
    input.quote = quote.into();
    input.notes = notes.into();
    Card::from_new(
      CardId::random(),
      input,
      Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
    )
  }

  fn reimport(cards: &[Card], layout: ExportLayout) -> Vec<ParsedCardDraft> {
    let text = export_text(cards, layout);
    let outcome =
      walk(&text, &GrammarStrategy, &WalkOptions::default(), None).unwrap();
    assert!(
      outcome.failed_lines.is_empty(),
      "failed: {:?}\n{text}",
      outcome.failed_lines
    );
    outcome.drafts
  }

  fn fields(d: &ParsedCardDraft) -> (&str, &str, &str, &str, &str) {
    (
      d.keyword.as_str(),
      d.definition.as_str(),
      d.source.as_str(),
      d.quote.as_str(),
      d.notes.as_str(),
    )
  }

  fn sample() -> Vec<Card> {
    vec![
      card("黝", "黑色", "《闲居赋》", "浮梁黝以径度", ""),
      card("释", "解释", "《论语》", "释之", "a note\nsecond"),
      card("释", "放下", "", "释卷", ""),
      card("嗛", "不满：音切", "高启《书博鷄者事》", "知使意嗛守", ""),
      card("乘", "趁着", "", "", "one line"),
    ]
  }

  #[test]
  fn flat_export_reimports_same_fields() {
    let cards = sample();
    let drafts = reimport(&cards, ExportLayout::Flat);
    assert_eq!(drafts.len(), cards.len());
    let mut got: Vec<_> = drafts.iter().map(fields).collect();
    got.sort();
    let want_drafts: Vec<ParsedCardDraft> = cards
      .iter()
      .map(|c| ParsedCardDraft {
        keyword: c.keyword.clone(),
        definition: c.definition.clone(),
        source: c.source.clone(),
        quote: c.quote.clone(),
        notes: c.notes.clone(),
        reset_keyword: false,
      })
      .collect();
    let mut want: Vec<_> = want_drafts.iter().map(fields).collect();
    want.sort();
    assert_eq!(got, want);
  }

  #[test]
  fn grouped_export_reimports_same_fields() {
    let cards = sample();
    let drafts = reimport(&cards, ExportLayout::Grouped);
    assert_eq!(drafts.len(), cards.len());
    for c in &cards {
      assert!(
        drafts.iter().any(|d| d.keyword == c.keyword
          && d.definition == c.definition
          && d.source == c.source
          && d.quote == c.quote
          && d.notes == c.notes),
        "missing {c:?}"
      );
    }
  }
}
