//! Line preprocessing: raw text into numbered, trimmed lines, and lines into
//! delimiter-separated fragments.

/// One trimmed input line. Blank lines are kept with empty `text`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line<'a> {
  /// 1-based position in the original text.
  pub number: usize,
  pub text:   &'a str,
}

impl Line<'_> {
  pub fn is_blank(&self) -> bool { self.text.is_empty() }
}

/// Split `text` on LF or CRLF and trim every line.
///
/// Leading and trailing blank lines are dropped; interior blank lines stay
/// in place as group separators.
pub fn split_lines(text: &str) -> Vec<Line<'_>> {
  let lines: Vec<Line<'_>> = text
    .lines()
    .enumerate()
    .map(|(i, raw)| Line { number: i + 1, text: raw.trim() })
    .collect();

  let Some(first) = lines.iter().position(|l| !l.is_blank()) else {
    return Vec::new();
  };
  let last = lines
    .iter()
    .rposition(|l| !l.is_blank())
    .unwrap_or(first);
  lines[first..=last].to_vec()
}

/// Fragment separators used when no fixed grammar is assumed.
const FRAGMENT_DELIMITERS: [char; 3] = ['，', '。', '；'];

/// Split a line on `，`, `。` and `；` alike, dropping empty fragments.
pub fn split_fragments(line: &str) -> Vec<&str> {
  line
    .split(FRAGMENT_DELIMITERS)
    .map(str::trim)
    .filter(|f| !f.is_empty())
    .collect()
}
