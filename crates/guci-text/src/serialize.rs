//! Cards back to text, in the grammar the matchers read.

use guci_core::{card::Card, order::sort_by_reading};

/// How [`export_text`] arranges cards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExportLayout {
  /// One self-contained line per card where the grammar allows it.
  #[default]
  Flat,
  /// A keyword header followed by the indented cards under it.
  Grouped,
}

const INDENT: &str = "  ";

/// Render `cards` in keyword reading order (see [`sort_by_reading`]).
/// Paragraphs are separated by blank lines.
///
/// Cards the grammar can only express under a header (no source, a colon in
/// the keyword or definition, or multi-line notes) are written as one-card
/// groups in the flat layout. Cards with neither source nor quote are written
/// as a standalone `def：kw。` line in both layouts.
pub fn export_text(cards: &[Card], layout: ExportLayout) -> String {
  let mut sorted: Vec<&Card> = cards.iter().collect();
  sort_by_reading(&mut sorted);

  let mut paragraphs: Vec<String> = Vec::new();
  match layout {
    ExportLayout::Flat => {
      for card in sorted {
        paragraphs.push(if stands_alone(card) {
          let mut out = full_line(card);
          push_notes(&mut out, &card.notes, "");
          out
        } else if is_bare(card) {
          bare_paragraph(card)
        } else {
          group_paragraph(&card.keyword, &[card])
        });
      }
    }
    ExportLayout::Grouped => {
      for group in sorted.chunk_by(|a, b| a.keyword == b.keyword) {
        let (bare, members): (Vec<&Card>, Vec<&Card>) =
          group.iter().copied().partition(|c| is_bare(c));
        if !members.is_empty() {
          paragraphs.push(group_paragraph(&members[0].keyword, &members));
        }
        paragraphs.extend(bare.into_iter().map(bare_paragraph));
      }
    }
  }

  paragraphs.join("\n")
}

fn has_colon(s: &str) -> bool { s.contains([':', '：']) }

fn note_lines(notes: &str) -> impl Iterator<Item = &str> {
  notes.lines().map(str::trim).filter(|l| !l.is_empty())
}

/// Expressible as a single `def：kw。src:“quote”。` line.
fn stands_alone(card: &Card) -> bool {
  !card.source.is_empty()
    && !has_colon(&card.keyword)
    && !has_colon(&card.definition)
    && note_lines(&card.notes).count() <= 1
}

fn is_bare(card: &Card) -> bool {
  card.source.is_empty() && card.quote.is_empty()
}

fn full_line(card: &Card) -> String {
  format!(
    "{}：{}。{}:“{}”。\n",
    card.definition, card.keyword, card.source, card.quote
  )
}

fn bare_paragraph(card: &Card) -> String {
  let mut out = format!("{}：{}。\n", card.definition, card.keyword);
  push_notes(&mut out, &card.notes, "");
  out
}

fn group_paragraph(keyword: &str, cards: &[&Card]) -> String {
  let mut out = format!("{keyword}\n");
  for card in cards {
    if card.source.is_empty() {
      out.push_str(&format!("{INDENT}{}：{}。\n", card.definition, card.quote));
    } else {
      out.push_str(&format!(
        "{INDENT}{}：{}:“{}”。\n",
        card.definition, card.source, card.quote
      ));
    }
    push_notes(&mut out, &card.notes, INDENT);
  }
  out
}

fn push_notes(out: &mut String, notes: &str, indent: &str) {
  for line in note_lines(notes) {
    out.push_str(indent);
    out.push_str(line);
    out.push('\n');
  }
}

#[cfg(test)]
mod tests {
  use chrono::{TimeZone, Utc};
  use guci_core::card::{CardId, NewCard};

  use super::*;

  fn card(kw: &str, def: &str, src: &str, quote: &str, minute: u32) -> Card {
    let mut input = NewCard::new(kw, def);
    input.source = src.into();
    input.quote = quote.into();
    Card::from_new(
      CardId::random(),
      input,
      Utc.with_ymd_and_hms(2024, 6, 1, 0, minute, 0).unwrap(),
    )
  }

  #[test]
  fn flat_layout_writes_full_lines() {
    let mut c = card("黝", "黑色", "《闲居赋》", "浮梁黝以径度", 0);
    c.notes = "注".into();
    assert_eq!(
      export_text(&[c], ExportLayout::Flat),
      "黑色：黝。《闲居赋》:“浮梁黝以径度”。\n注\n"
    );
  }

  #[test]
  fn flat_layout_groups_cards_without_source() {
    let cards = [
      card("释", "放下", "", "释卷", 0),
      card("乘", "趁着", "", "", 1),
    ];
    assert_eq!(
      export_text(&cards, ExportLayout::Flat),
      "趁着：乘。\n\n释\n  放下：释卷。\n"
    );
  }

  #[test]
  fn grouped_layout_orders_by_creation_within_keyword() {
    let cards = [
      card("释", "解释", "出处", "原文", 5),
      card("黝", "黑色", "《闲居赋》", "浮梁黝以径度", 0),
      card("释", "放下", "《庄子》", "释卷", 1),
    ];
    assert_eq!(
      export_text(&cards, ExportLayout::Grouped),
      "释\n  放下：《庄子》:“释卷”。\n  解释：出处:“原文”。\n\n\
       黝\n  黑色：《闲居赋》:“浮梁黝以径度”。\n"
    );
  }

  #[test]
  fn keywords_follow_reading_not_code_point() {
    let cards = [card("乘", "趁着", "", "", 0), card("安", "安定", "", "", 1)];
    assert_eq!(
      export_text(&cards, ExportLayout::Flat),
      "安定：安。\n\n趁着：乘。\n"
    );
  }

  #[test]
  fn empty_collection_exports_nothing() {
    assert_eq!(export_text(&[], ExportLayout::Grouped), "");
  }
}
