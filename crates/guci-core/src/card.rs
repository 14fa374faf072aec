//! Card types, the unit of storage in the guci flashcard store.
//!
//! A card pairs a classical-Chinese keyword with its modern definition, the
//! work it was found in, the quoted passage, and free-form notes.

use std::{collections::BTreeSet, fmt};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Identity ────────────────────────────────────────────────────────────────

/// Opaque card identifier.
///
/// Normally a hyphenated UUID v4; the sink falls back to a time-plus-random
/// composite key when repeated UUID collisions occur, so callers must not
/// assume the UUID shape.
#[derive(
  Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct CardId(String);

impl CardId {
  /// A fresh random UUID v4 identifier.
  pub fn random() -> Self { Self(Uuid::new_v4().hyphenated().to_string()) }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl From<String> for CardId {
  fn from(s: String) -> Self { Self(s) }
}

impl From<&str> for CardId {
  fn from(s: &str) -> Self { Self(s.to_string()) }
}

impl fmt::Display for CardId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

// ─── Card ────────────────────────────────────────────────────────────────────

/// A persisted flashcard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
  pub id:         CardId,
  /// The vocabulary item, e.g. `黝`.
  pub keyword:    String,
  /// Modern-language gloss; the front of the card.
  pub definition: String,
  /// Bibliographic citation, e.g. `《闲居赋》`. May be empty.
  pub source:     String,
  /// Original-text excerpt. May be empty.
  pub quote:      String,
  /// Free-form annotation; may span several lines.
  pub notes:      String,
  pub tags:       BTreeSet<String>,
  pub created_at: DateTime<Utc>,
  /// Refreshed on every mutation.
  pub updated_at: DateTime<Utc>,
}

impl Card {
  /// Build a card from validated input. Both timestamps are set to `now`.
  pub fn from_new(id: CardId, input: NewCard, now: DateTime<Utc>) -> Self {
    Self {
      id,
      keyword: input.keyword,
      definition: input.definition,
      source: input.source,
      quote: input.quote,
      notes: input.notes,
      tags: input.tags,
      created_at: now,
      updated_at: now,
    }
  }

  /// Fold a duplicate into this card.
  ///
  /// Keyword, definition, source and quote are kept; non-empty notes are
  /// appended after a blank line and tags are unioned.
  pub fn merge(&mut self, other: &NewCard, now: DateTime<Utc>) {
    let incoming = other.notes.trim();
    if !incoming.is_empty() {
      if self.notes.is_empty() {
        self.notes = incoming.to_string();
      } else {
        self.notes.push_str("\n\n");
        self.notes.push_str(incoming);
      }
    }
    self.tags.extend(other.tags.iter().cloned());
    self.updated_at = now;
  }

  /// Apply a partial edit. The result must still have a keyword and a
  /// definition; on error the card is left untouched.
  pub fn apply(&mut self, patch: CardPatch, now: DateTime<Utc>) -> Result<()> {
    let keyword = patch.keyword.map(|k| k.trim().to_string());
    let definition = patch.definition.map(|d| d.trim().to_string());
    if keyword.as_deref().is_some_and(str::is_empty) {
      return Err(Error::EmptyKeyword);
    }
    if definition.as_deref().is_some_and(str::is_empty) {
      return Err(Error::EmptyDefinition);
    }

    if let Some(k) = keyword {
      self.keyword = k;
    }
    if let Some(d) = definition {
      self.definition = d;
    }
    if let Some(s) = patch.source {
      self.source = s.trim().to_string();
    }
    if let Some(q) = patch.quote {
      self.quote = q.trim().to_string();
    }
    if let Some(n) = patch.notes {
      self.notes = n.trim().to_string();
    }
    for tag in patch.remove_tags {
      self.tags.remove(tag.trim());
    }
    self.tags.extend(normalize_tags(patch.add_tags));
    self.updated_at = now;
    Ok(())
  }
}

// ─── NewCard ─────────────────────────────────────────────────────────────────

/// Input to card creation. Identity and timestamps are assigned by the sink.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCard {
  pub keyword:    String,
  pub definition: String,
  #[serde(default)]
  pub source:     String,
  #[serde(default)]
  pub quote:      String,
  #[serde(default)]
  pub notes:      String,
  #[serde(default)]
  pub tags:       BTreeSet<String>,
}

impl NewCard {
  /// Convenience constructor with all optional fields empty.
  pub fn new(
    keyword: impl Into<String>,
    definition: impl Into<String>,
  ) -> Self {
    Self {
      keyword: keyword.into(),
      definition: definition.into(),
      ..Self::default()
    }
  }

  /// Trim every field and reject a card without keyword or definition.
  pub fn validate(self) -> Result<Self> {
    let card = Self {
      keyword:    self.keyword.trim().to_string(),
      definition: self.definition.trim().to_string(),
      source:     self.source.trim().to_string(),
      quote:      self.quote.trim().to_string(),
      notes:      self.notes.trim().to_string(),
      tags:       normalize_tags(self.tags),
    };
    if card.keyword.is_empty() {
      return Err(Error::EmptyKeyword);
    }
    if card.definition.is_empty() {
      return Err(Error::EmptyDefinition);
    }
    Ok(card)
  }
}

/// A partial update; `None` leaves a field as it is.
#[derive(Debug, Clone, Default)]
pub struct CardPatch {
  pub keyword:     Option<String>,
  pub definition:  Option<String>,
  pub source:      Option<String>,
  pub quote:       Option<String>,
  pub notes:       Option<String>,
  pub add_tags:    Vec<String>,
  pub remove_tags: Vec<String>,
}

fn normalize_tags(tags: impl IntoIterator<Item = String>) -> BTreeSet<String> {
  tags
    .into_iter()
    .map(|t| t.trim().to_string())
    .filter(|t| !t.is_empty())
    .collect()
}

// ─── Legacy data file ────────────────────────────────────────────────────────

/// One record of the legacy `cards.json` data file: a JSON array of objects
/// with string fields. Ids and timestamps from that file are not carried
/// over.
#[derive(Debug, Deserialize)]
struct LegacyRecord {
  #[serde(default)]
  keyword:    String,
  #[serde(default)]
  definition: String,
  #[serde(default)]
  source:     String,
  #[serde(default)]
  quote:      String,
  #[serde(default)]
  notes:      String,
  #[serde(default)]
  tags:       Vec<String>,
}

/// Decode a legacy `cards.json` document into card inputs.
///
/// Records are returned unvalidated; the caller decides what to do with
/// records lacking a keyword or definition.
pub fn parse_legacy_json(input: &str) -> Result<Vec<NewCard>> {
  let records: Vec<LegacyRecord> = serde_json::from_str(input)?;
  Ok(
    records
      .into_iter()
      .map(|r| NewCard {
        keyword:    r.keyword,
        definition: r.definition,
        source:     r.source,
        quote:      r.quote,
        notes:      r.notes,
        tags:       r.tags.into_iter().collect(),
      })
      .collect(),
  )
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, hour, 0, 0).unwrap()
  }

  #[test]
  fn validate_trims_and_requires_keyword() {
    let card = NewCard::new("  黝 ", " 黑色 ").validate().unwrap();
    assert_eq!(card.keyword, "黝");
    assert_eq!(card.definition, "黑色");

    assert!(matches!(
      NewCard::new("  ", "黑色").validate(),
      Err(Error::EmptyKeyword)
    ));
    assert!(matches!(
      NewCard::new("黝", "").validate(),
      Err(Error::EmptyDefinition)
    ));
  }

  #[test]
  fn merge_appends_notes_and_unions_tags() {
    let mut base = NewCard::new("黝", "黑色");
    base.notes = "first".into();
    base.tags.insert("color".into());
    let mut card = Card::from_new(CardId::random(), base, at(1));

    let mut dup = NewCard::new("黝", "黑色");
    dup.notes = "second".into();
    dup.source = "ignored".into();
    dup.tags.insert("fu".into());
    dup.tags.insert("color".into());
    card.merge(&dup, at(2));

    assert_eq!(card.notes, "first\n\nsecond");
    assert_eq!(card.source, "");
    assert_eq!(card.tags.len(), 2);
    assert_eq!(card.created_at, at(1));
    assert_eq!(card.updated_at, at(2));
  }

  #[test]
  fn merge_with_empty_notes_keeps_existing() {
    let mut card =
      Card::from_new(CardId::random(), NewCard::new("黝", "黑色"), at(1));
    card.notes = "kept".into();
    card.merge(&NewCard::new("黝", "黑色"), at(2));
    assert_eq!(card.notes, "kept");
  }

  #[test]
  fn apply_rejects_blank_keyword_without_mutating() {
    let mut card =
      Card::from_new(CardId::random(), NewCard::new("黝", "黑色"), at(1));
    let patch = CardPatch {
      keyword: Some(" ".into()),
      notes: Some("changed".into()),
      ..CardPatch::default()
    };
    assert!(matches!(card.apply(patch, at(2)), Err(Error::EmptyKeyword)));
    assert_eq!(card.notes, "");
    assert_eq!(card.updated_at, at(1));
  }

  #[test]
  fn apply_updates_fields_and_tags() {
    let mut input = NewCard::new("黝", "黑色");
    input.tags.insert("old".into());
    let mut card = Card::from_new(CardId::random(), input, at(1));
    let patch = CardPatch {
      source: Some("《闲居赋》".into()),
      add_tags: vec!["new".into(), " ".into()],
      remove_tags: vec!["old".into()],
      ..CardPatch::default()
    };
    card.apply(patch, at(3)).unwrap();
    assert_eq!(card.source, "《闲居赋》");
    assert_eq!(card.tags.iter().collect::<Vec<_>>(), vec!["new"]);
    assert_eq!(card.updated_at, at(3));
  }

  #[test]
  fn legacy_json_records_decode() {
    let input = r#"[
      {"id": "x", "keyword": "学而时习之", "definition": "学习了知识然后按时复习它。",
       "source": "《论语·学而》", "quote": "子曰", "notes": "",
       "created_at": "2024-01-01T00:00:00"},
      {"keyword": "温故知新", "definition": "温习旧的知识", "tags": ["论语"]}
    ]"#;
    let cards = parse_legacy_json(input).unwrap();
    assert_eq!(cards.len(), 2);
    assert_eq!(cards[0].source, "《论语·学而》");
    assert_eq!(cards[1].quote, "");
    assert!(cards[1].tags.contains("论语"));
  }

  #[test]
  fn legacy_json_rejects_non_array() {
    assert!(matches!(
      parse_legacy_json("{}"),
      Err(Error::Serialization(_))
    ));
  }
}
