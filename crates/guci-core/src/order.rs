//! Display order for cards: by the keyword's Mandarin reading.

use std::borrow::Borrow;

use pinyin::ToPinyin;

use crate::card::Card;

/// Toneless pinyin of each character in `keyword`. Characters without a
/// reading (Latin letters, punctuation) stand for themselves, lowercased.
pub fn reading_key(keyword: &str) -> Vec<String> {
  keyword
    .chars()
    .map(|c| match c.to_pinyin() {
      Some(p) => p.plain().to_string(),
      None => c.to_lowercase().collect(),
    })
    .collect()
}

/// Sort by keyword reading. Homophones fall back to code point order and
/// equal keywords to creation time, so identical keywords stay adjacent.
pub fn sort_by_reading<C: Borrow<Card>>(cards: &mut [C]) {
  cards.sort_by_cached_key(|c| {
    let card = c.borrow();
    (reading_key(&card.keyword), card.keyword.clone(), card.created_at)
  });
}
