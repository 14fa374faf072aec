//! Semantic field classification.
//!
//! For input that does not follow the fixed grammar: the line is cut into
//! fragments on `，`, `。` and `；`, and each fragment's role is guessed from
//! its shape and content instead of its position.

use std::sync::LazyLock;

use regex::Regex;

use crate::{
  LineMatch, ParseContext, ParsedCardDraft,
  convert::{HansConverter, ScriptConverter},
  preprocess::split_fragments, roster::Rosters, strategy::LineStrategy,
};

/// A `《…》` book title.
static TITLE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"《[^》]+》").expect("valid title regex"));

/// Fewer fragments than this cannot hold keyword, definition and a source
/// or quote.
const MIN_FRAGMENTS: usize = 3;

/// Longest text still taken for a keyword when splitting `a：b`.
const MAX_KEYWORD_CHARS: usize = 4;

/// Classify the fragments of `line` into a card draft.
///
/// 1. The first fragment holding a colon splits into keyword and definition;
///    a short left side (at most four characters) facing a longer right side
///    is the keyword, otherwise the roles swap.
/// 2. The first remaining fragment that carries a `《…》` title, an author
///    or a book name is the source.
/// 3. All other remaining fragments, in order, form the quote.
///
/// The converter, when given, is applied to every field; a failed
/// conversion keeps the original text.
pub fn classify(
  line: &str,
  rosters: &Rosters,
  converter: Option<&dyn ScriptConverter>,
) -> Option<ParsedCardDraft> {
  let fragments = split_fragments(line);
  if fragments.len() < MIN_FRAGMENTS {
    return None;
  }

  let (split_at, pair) = fragments
    .iter()
    .enumerate()
    .find(|(_, f)| f.contains(['：', ':']))?;
  let colon = if pair.contains('：') { '：' } else { ':' };
  let (left, right) = pair.split_once(colon)?;
  let (left, right) = (left.trim(), right.trim());
  let (keyword, definition) = if left.chars().count() <= MAX_KEYWORD_CHARS
    && right.chars().count() > 1
  {
    (left, right)
  } else {
    (right, left)
  };
  if keyword.is_empty() || definition.is_empty() {
    return None;
  }

  let rest: Vec<&str> = fragments
    .iter()
    .enumerate()
    .filter(|(i, _)| *i != split_at)
    .map(|(_, f)| *f)
    .collect();
  let source_at = rest.iter().position(|f| {
    TITLE.is_match(f) || rosters.mentions_author(f) || rosters.mentions_book(f)
  });
  let source = source_at.map(|i| rest[i]).unwrap_or_default();
  let quote: String = rest
    .iter()
    .enumerate()
    .filter(|(i, _)| Some(*i) != source_at)
    .map(|(_, f)| *f)
    .collect();

  let convert = |text: &str| -> String {
    converter
      .and_then(|c| c.convert(text))
      .unwrap_or_else(|| text.to_string())
  };

  Some(ParsedCardDraft {
    keyword: convert(keyword),
    definition: convert(definition),
    source: convert(source),
    quote: convert(&quote),
    notes: String::new(),
    reset_keyword: true,
  })
}

// ─── Strategy ────────────────────────────────────────────────────────────────

/// [`classify`] as a [`LineStrategy`]. It never yields headers; the walker's
/// fallback adopts bare keywords instead.
pub struct SemanticStrategy {
  rosters:   Rosters,
  converter: Option<Box<dyn ScriptConverter + Send + Sync>>,
}

impl SemanticStrategy {
  /// Converts traditional characters to simplified with [`HansConverter`].
  pub fn new(rosters: Rosters) -> Self {
    Self { rosters, converter: Some(Box::new(HansConverter)) }
  }

  /// Classify text as written, without script conversion.
  pub fn unconverted(rosters: Rosters) -> Self {
    Self { rosters, converter: None }
  }

  pub fn with_converter(
    mut self,
    converter: Box<dyn ScriptConverter + Send + Sync>,
  ) -> Self {
    self.converter = Some(converter);
    self
  }
}

impl LineStrategy for SemanticStrategy {
  fn match_line(&self, line: &str, _ctx: &ParseContext) -> Option<LineMatch> {
    let converter = self
      .converter
      .as_deref()
      .map(|c| c as &dyn ScriptConverter);
    let draft = classify(line, &self.rosters, converter)?;
    tracing::debug!(line, keyword = %draft.keyword, "line classified");
    Some(LineMatch::Card(draft))
  }

  fn looks_like_record(&self, line: &str) -> bool {
    line.contains(['：', ':']) && split_fragments(line).len() >= MIN_FRAGMENTS
  }
}
