//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings so that text order
//! equals time order. Tags are stored as a compact JSON array.

use std::collections::BTreeSet;

use chrono::{DateTime, SecondsFormat, Utc};
use guci_core::card::{Card, CardId};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Tags ────────────────────────────────────────────────────────────────────

pub fn encode_tags(tags: &BTreeSet<String>) -> Result<String> {
  Ok(serde_json::to_string(tags)?)
}

pub fn decode_tags(s: &str) -> Result<BTreeSet<String>> {
  Ok(serde_json::from_str(s)?)
}

// ─── LIKE patterns ───────────────────────────────────────────────────────────

/// Wrap `needle` in `%…%`, escaping LIKE wildcards with `\`.
pub fn like_pattern(needle: &str) -> String {
  let mut out = String::with_capacity(needle.len() + 2);
  out.push('%');
  for c in needle.chars() {
    if matches!(c, '%' | '_' | '\\') {
      out.push('\\');
    }
    out.push(c);
  }
  out.push('%');
  out
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `cards` row.
pub struct RawCard {
  pub card_id:    String,
  pub keyword:    String,
  pub definition: String,
  pub source:     String,
  pub quote:      String,
  pub notes:      String,
  pub tags:       String,
  pub created_at: String,
  pub updated_at: String,
}

impl RawCard {
  /// Read a row selected with [`crate::schema::CARD_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      card_id:    row.get(0)?,
      keyword:    row.get(1)?,
      definition: row.get(2)?,
      source:     row.get(3)?,
      quote:      row.get(4)?,
      notes:      row.get(5)?,
      tags:       row.get(6)?,
      created_at: row.get(7)?,
      updated_at: row.get(8)?,
    })
  }

  pub fn into_card(self) -> Result<Card> {
    Ok(Card {
      id:         CardId::from(self.card_id),
      keyword:    self.keyword,
      definition: self.definition,
      source:     self.source,
      quote:      self.quote,
      notes:      self.notes,
      tags:       decode_tags(&self.tags)?,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

/// Owned column values for an `INSERT` or `UPDATE`, ready to move into a
/// connection closure.
pub struct CardRow {
  pub card_id:    String,
  pub keyword:    String,
  pub definition: String,
  pub source:     String,
  pub quote:      String,
  pub notes:      String,
  pub tags:       String,
  pub created_at: String,
  pub updated_at: String,
}

impl CardRow {
  pub fn encode(card: &Card) -> Result<Self> {
    Ok(Self {
      card_id:    card.id.as_str().to_owned(),
      keyword:    card.keyword.clone(),
      definition: card.definition.clone(),
      source:     card.source.clone(),
      quote:      card.quote.clone(),
      notes:      card.notes.clone(),
      tags:       encode_tags(&card.tags)?,
      created_at: encode_dt(card.created_at),
      updated_at: encode_dt(card.updated_at),
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn timestamps_are_fixed_width_and_round_trip() {
    let a = Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap();
    let b = a + chrono::Duration::microseconds(1500);
    let (ea, eb) = (encode_dt(a), encode_dt(b));
    assert_eq!(ea.len(), eb.len());
    assert!(ea < eb);
    assert_eq!(decode_dt(&eb).unwrap(), b);
  }

  #[test]
  fn like_pattern_escapes_wildcards() {
    assert_eq!(like_pattern("黝"), "%黝%");
    assert_eq!(like_pattern("50%_a\\"), "%50\\%\\_a\\\\%");
  }
}
